//! Tag & notification engine.
//!
//! Every text-producing event (send, non-empty edit, share) is scanned for
//! mention tokens. A mention is `@` followed by a run of alphanumerics;
//! duplicates within one text are collapsed, unknown handles are silently
//! ignored, and only current members of the container the text was posted
//! into are notified. Queues are newest-first and reads are bounded.

use crate::model::{limits, Notification, Workspace, INVALID};

/// Prepend a notification to a user's queue.
pub(crate) fn push(ws: &mut Workspace, uid: i64, notification: Notification) {
    if let Some(user) = ws.user_mut(uid) {
        user.notifications.insert(0, notification);
    }
}

/// The most recent notifications for a user, at most 20.
pub fn notifications_get(ws: &Workspace, uid: i64) -> Vec<Notification> {
    match ws.user(uid) {
        Some(user) => user
            .notifications
            .iter()
            .take(limits::NOTIFICATIONS_SHOWN)
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

/// Extract the de-duplicated mention handles from a text, in order of first
/// appearance.
fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '@' {
            continue;
        }
        let mut handle = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() {
                handle.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !handle.is_empty() && !mentions.contains(&handle) {
            mentions.push(handle);
        }
    }
    mentions
}

/// A truncated preview of the message body for tag notifications.
fn preview(text: &str) -> String {
    text.chars().take(limits::TAG_PREVIEW).collect()
}

/// Notify every mentioned member of a channel about a tag.
pub(crate) fn tag_channel_members(ws: &mut Workspace, channel_id: i64, text: &str, author: i64) {
    let Some(author_handle) = ws.handle_of(author).map(str::to_string) else {
        return;
    };
    let Some(channel) = ws.channel(channel_id) else {
        return;
    };
    let channel_name = channel.name.clone();

    let mut targets = Vec::new();
    for mention in extract_mentions(text) {
        if let Some(user) = ws.user_by_handle(&mention) {
            if channel.is_member(user.u_id) {
                targets.push(user.u_id);
            }
        }
    }

    for uid in targets {
        push(
            ws,
            uid,
            Notification {
                channel_id,
                dm_id: INVALID,
                notification_message: format!(
                    "{author_handle} tagged you in {channel_name}: {}",
                    preview(text)
                ),
            },
        );
    }
}

/// Notify every mentioned member of a dm about a tag.
pub(crate) fn tag_dm_members(ws: &mut Workspace, dm_id: i64, text: &str, author: i64) {
    let Some(author_handle) = ws.handle_of(author).map(str::to_string) else {
        return;
    };
    let Some(dm) = ws.dm(dm_id) else {
        return;
    };
    let dm_name = dm.name.clone();

    let mut targets = Vec::new();
    for mention in extract_mentions(text) {
        if let Some(user) = ws.user_by_handle(&mention) {
            if dm.is_member(user.u_id) {
                targets.push(user.u_id);
            }
        }
    }

    for uid in targets {
        push(
            ws,
            uid,
            Notification {
                channel_id: INVALID,
                dm_id,
                notification_message: format!(
                    "{author_handle} tagged you in {dm_name}: {}",
                    preview(text)
                ),
            },
        );
    }
}

/// "added you to" notice, used by channel invites and dm creation.
pub(crate) fn notify_added(
    ws: &mut Workspace,
    target: i64,
    actor: i64,
    channel_id: i64,
    dm_id: i64,
    container_name: &str,
) {
    let Some(actor_handle) = ws.handle_of(actor).map(str::to_string) else {
        return;
    };
    push(
        ws,
        target,
        Notification {
            channel_id,
            dm_id,
            notification_message: format!("{actor_handle} added you to {container_name}"),
        },
    );
}

/// "reacted to your message" notice, sent only while the author is still a
/// member of the container.
pub(crate) fn notify_reacted(
    ws: &mut Workspace,
    author: i64,
    reactor: i64,
    channel_id: i64,
    dm_id: i64,
    container_name: &str,
) {
    let Some(reactor_handle) = ws.handle_of(reactor).map(str::to_string) else {
        return;
    };
    push(
        ws,
        author,
        Notification {
            channel_id,
            dm_id,
            notification_message: format!(
                "{reactor_handle} reacted to your message in {container_name}"
            ),
        },
    );
}
