//! Deferred-task executor for send-later messages and standup finishes.
//!
//! Each task is a tokio timer keyed by the id it will act on, so a pending
//! task can be cancelled before it fires. A firing task reacquires the
//! latest snapshot, performs its validation-free mutation, and persists
//! (last-writer-wins on the whole-snapshot write). Pending tasks are
//! process-local; they do not survive a restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use huddle_core::message::PendingMessage;
use huddle_core::standup;
use huddle_store::SnapshotStore;

#[derive(Clone)]
pub struct Scheduler {
    store: Arc<Mutex<SnapshotStore>>,
    sends: Arc<Mutex<HashMap<i64, JoinHandle<()>>>>,
    standups: Arc<Mutex<HashMap<i64, JoinHandle<()>>>>,
}

fn delay_until(fire_at: i64) -> Duration {
    let now = chrono::Utc::now().timestamp();
    Duration::from_secs((fire_at - now).max(0) as u64)
}

impl Scheduler {
    pub fn new(store: Arc<Mutex<SnapshotStore>>) -> Self {
        Self {
            store,
            sends: Arc::new(Mutex::new(HashMap::new())),
            standups: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue a validated pending message, keyed by its minted id.
    pub async fn schedule_send(&self, pending: PendingMessage) {
        let store = self.store.clone();
        let message_id = pending.message_id;
        let delay = delay_until(pending.fire_at);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let guard = store.lock().await;
            let delivered = guard.load().and_then(|mut ws| {
                let now = chrono::Utc::now().timestamp();
                huddle_core::message::deliver_pending(&mut ws, &pending, now);
                guard.save(&ws)
            });
            if let Err(e) = delivered {
                error!(message_id = pending.message_id, error = %e, "deferred send failed");
            }
        });

        let mut sends = self.sends.lock().await;
        sends.retain(|_, h| !h.is_finished());
        sends.insert(message_id, handle);
    }

    /// Queue the finish of a channel's active standup.
    pub async fn schedule_standup_finish(&self, channel_id: i64, finish_at: i64) {
        let store = self.store.clone();
        let delay = delay_until(finish_at);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let guard = store.lock().await;
            let flushed = guard.load().and_then(|mut ws| {
                let now = chrono::Utc::now().timestamp();
                standup::standup_finish(&mut ws, channel_id, now);
                guard.save(&ws)
            });
            if let Err(e) = flushed {
                error!(channel_id, error = %e, "standup finish failed");
            }
        });

        let mut standups = self.standups.lock().await;
        standups.retain(|_, h| !h.is_finished());
        standups.insert(channel_id, handle);
    }

    /// Cancel a pending deferred send. Returns false when no such task is
    /// queued (unknown id, or it already fired).
    pub async fn cancel_send(&self, message_id: i64) -> bool {
        let mut sends = self.sends.lock().await;
        match sends.remove(&message_id) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                warn!(message_id, "pending deferred send cancelled");
                true
            }
            _ => false,
        }
    }

    /// Abort every pending task. Used when the workspace is cleared.
    pub async fn clear_all(&self) {
        for (_, handle) in self.sends.lock().await.drain() {
            handle.abort();
        }
        for (_, handle) in self.standups.lock().await.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::{auth, membership, message};

    fn seeded_store() -> (tempfile::TempDir, Arc<Mutex<SnapshotStore>>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("huddle.json")).unwrap();
        let mut ws = store.load().unwrap();
        auth::register(&mut ws, "a@example.com", "hunter22", "Ada", "Lovelace", 0).unwrap();
        membership::channels_create(&mut ws, 1, "general", true, 0).unwrap();
        store.save(&ws).unwrap();
        (dir, Arc::new(Mutex::new(store)))
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_send_fires_against_the_latest_snapshot() {
        let (_dir, store) = seeded_store();
        let scheduler = Scheduler::new(store.clone());

        let pending = {
            let guard = store.lock().await;
            let mut ws = guard.load().unwrap();
            let now = chrono::Utc::now().timestamp();
            let pending =
                message::channel_send_later(&mut ws, 1, 0, "later", now + 1, now).unwrap();
            guard.save(&ws).unwrap();
            pending
        };
        scheduler.schedule_send(pending.clone()).await;

        // A message sent while the timer is pending must survive the fire.
        {
            let guard = store.lock().await;
            let mut ws = guard.load().unwrap();
            message::channel_send(&mut ws, 1, 0, "interleaved", 0).unwrap();
            guard.save(&ws).unwrap();
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        let guard = store.lock().await;
        let ws = guard.load().unwrap();
        let channel = ws.channel(0).unwrap();
        assert_eq!(channel.messages.len(), 2);
        assert_eq!(channel.messages[0].message_id, pending.message_id);
        assert_eq!(channel.messages[0].message, "later");
        assert_eq!(channel.messages[1].message, "interleaved");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_send_never_fires() {
        let (_dir, store) = seeded_store();
        let scheduler = Scheduler::new(store.clone());

        let pending = {
            let guard = store.lock().await;
            let mut ws = guard.load().unwrap();
            let now = chrono::Utc::now().timestamp();
            let pending =
                message::channel_send_later(&mut ws, 1, 0, "never", now + 30, now).unwrap();
            guard.save(&ws).unwrap();
            pending
        };
        scheduler.schedule_send(pending.clone()).await;

        assert!(scheduler.cancel_send(pending.message_id).await);
        assert!(!scheduler.cancel_send(pending.message_id).await);

        tokio::time::sleep(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;

        let guard = store.lock().await;
        let ws = guard.load().unwrap();
        assert!(ws.channel(0).unwrap().messages.is_empty());
    }
}
