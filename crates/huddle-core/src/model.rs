//! The snapshot object graph.
//!
//! Every struct here is persisted as part of the whole-state snapshot, so
//! everything derives `Serialize`/`Deserialize`. Field names are rendered in
//! camelCase both in the snapshot file and over HTTP.

use serde::{Deserialize, Serialize};

/// Universal "not applicable / absent" sentinel for optional ids.
pub const INVALID: i64 = -1;

/// Workspace-wide owner permission level.
pub const PERMISSION_OWNER: i64 = 1;

/// Ordinary member permission level.
pub const PERMISSION_MEMBER: i64 = 2;

/// Replacement body and profile name for retracted users.
pub const REMOVED_USER: &str = "Removed user";

/// The single supported react kind.
pub const REACT_THUMBS_UP: i64 = 1;

/// Validation limits.
pub mod limits {
    pub const MIN_MESSAGE: usize = 1;
    pub const MAX_MESSAGE: usize = 1000;
    pub const PAGE_SIZE: usize = 50;
    pub const MIN_CHANNEL_NAME: usize = 1;
    pub const MAX_CHANNEL_NAME: usize = 20;
    pub const MIN_PASSWORD: usize = 6;
    pub const MAX_PASSWORD: usize = 200;
    pub const MIN_NAME: usize = 1;
    pub const MAX_NAME: usize = 50;
    pub const MAX_HANDLE: usize = 20;
    pub const MIN_SET_HANDLE: usize = 3;
    pub const NOTIFICATIONS_SHOWN: usize = 20;
    pub const TAG_PREVIEW: usize = 20;
}

/// A queued notification. Exactly one of `channel_id`/`dm_id` is meaningful;
/// the other holds [`INVALID`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub channel_id: i64,
    pub dm_id: i64,
    pub notification_message: String,
}

/// One react record: the kind plus the set of users who reacted with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct React {
    pub react_id: i64,
    pub u_ids: Vec<i64>,
}

/// A message, living inside exactly one channel or dm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: i64,
    pub u_id: i64,
    pub message: String,
    pub time_sent: i64,
    pub reacts: Vec<React>,
    pub is_pinned: bool,
}

impl Message {
    /// A fresh message with the single default react record and no reactors.
    pub fn new(message_id: i64, u_id: i64, message: String, time_sent: i64) -> Self {
        Self {
            message_id,
            u_id,
            message,
            time_sent,
            reacts: vec![React {
                react_id: REACT_THUMBS_UP,
                u_ids: Vec::new(),
            }],
            is_pinned: false,
        }
    }
}

/// One buffered standup line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StandupLine {
    pub u_id: i64,
    pub message: String,
}

/// Per-channel standup sub-state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Standup {
    pub is_active: bool,
    pub time_finish: Option<i64>,
    pub starter_uid: Option<i64>,
    pub lines: Vec<StandupLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: i64,
    pub name: String,
    pub is_public: bool,
    pub member_ids: Vec<i64>,
    pub owner_ids: Vec<i64>,
    /// Newest-first.
    pub messages: Vec<Message>,
    pub standup: Standup,
}

impl Channel {
    pub fn is_member(&self, uid: i64) -> bool {
        self.member_ids.contains(&uid)
    }

    pub fn is_owner(&self, uid: i64) -> bool {
        self.owner_ids.contains(&uid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dm {
    pub dm_id: i64,
    pub name: String,
    /// Creator first, then invitees.
    pub member_uids: Vec<i64>,
    pub creator_uid: i64,
    /// Newest-first.
    pub messages: Vec<Message>,
}

impl Dm {
    pub fn is_member(&self, uid: i64) -> bool {
        self.member_uids.contains(&uid)
    }
}

/// One point in a usage-counter time series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsagePoint {
    pub count: i64,
    pub time_stamp: i64,
}

impl UsagePoint {
    pub fn new(count: i64, time_stamp: i64) -> Self {
        Self { count, time_stamp }
    }
}

/// Per-user usage counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub channels_joined: Vec<UsagePoint>,
    pub dms_joined: Vec<UsagePoint>,
    pub messages_sent: Vec<UsagePoint>,
}

impl UserStats {
    pub fn seeded(now: i64) -> Self {
        Self {
            channels_joined: vec![UsagePoint::new(0, now)],
            dms_joined: vec![UsagePoint::new(0, now)],
            messages_sent: vec![UsagePoint::new(0, now)],
        }
    }
}

/// Workspace-wide usage counters. Bookkeeping only; there is no aggregation
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStats {
    pub channels_exist: Vec<UsagePoint>,
    pub dms_exist: Vec<UsagePoint>,
    pub messages_exist: Vec<UsagePoint>,
}

impl WorkspaceStats {
    pub fn seeded(now: i64) -> Self {
        Self {
            channels_exist: vec![UsagePoint::new(0, now)],
            dms_exist: vec![UsagePoint::new(0, now)],
            messages_exist: vec![UsagePoint::new(0, now)],
        }
    }
}

/// A registered account. Never physically deleted; removal soft-disables it
/// so historical message attribution stays resolvable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub u_id: i64,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    /// Generated base handle (before de-duplication).
    pub handle: String,
    /// Unique display handle: the base, possibly with an integer suffix.
    pub handle_display: String,
    /// The appended suffix, or -1 when the base handle was free.
    pub handle_suffix: i64,
    pub password_hash: String,
    pub permission: i64,
    pub global_owner: bool,
    pub active_tokens: Vec<String>,
    pub channel_ids: Vec<i64>,
    pub owned_channel_ids: Vec<i64>,
    pub dm_ids: Vec<i64>,
    pub owned_dm_ids: Vec<i64>,
    /// Newest-first; reads return at most the first 20.
    pub notifications: Vec<Notification>,
    pub is_active: bool,
    pub stats: UserStats,
}

/// The whole-state snapshot root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub users: Vec<User>,
    pub channels: Vec<Channel>,
    pub dms: Vec<Dm>,
    /// Monotonic message-id counter. Never reused, even after deletion.
    pub message_counter: i64,
    /// Next dm id. Starts at 1.
    pub dm_counter: i64,
    /// Number of currently existing messages.
    pub messages_live: i64,
    /// Emails currently held by an active account.
    pub emails: Vec<String>,
    pub stats: WorkspaceStats,
}

impl Workspace {
    pub fn new(now: i64) -> Self {
        Self {
            users: Vec::new(),
            channels: Vec::new(),
            dms: Vec::new(),
            message_counter: 0,
            dm_counter: 1,
            messages_live: 0,
            emails: Vec::new(),
            stats: WorkspaceStats::seeded(now),
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn user(&self, uid: i64) -> Option<&User> {
        self.users.iter().find(|u| u.u_id == uid)
    }

    pub fn user_mut(&mut self, uid: i64) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.u_id == uid)
    }

    pub fn channel(&self, channel_id: i64) -> Option<&Channel> {
        self.channels.iter().find(|c| c.channel_id == channel_id)
    }

    pub fn channel_mut(&mut self, channel_id: i64) -> Option<&mut Channel> {
        self.channels
            .iter_mut()
            .find(|c| c.channel_id == channel_id)
    }

    pub fn dm(&self, dm_id: i64) -> Option<&Dm> {
        self.dms.iter().find(|d| d.dm_id == dm_id)
    }

    pub fn dm_mut(&mut self, dm_id: i64) -> Option<&mut Dm> {
        self.dms.iter_mut().find(|d| d.dm_id == dm_id)
    }

    /// The display handle of a registered user, if any.
    pub fn handle_of(&self, uid: i64) -> Option<&str> {
        self.user(uid).map(|u| u.handle_display.as_str())
    }

    /// Resolve a display handle to an active user.
    pub fn user_by_handle(&self, handle: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.is_active && u.handle_display == handle)
    }
}
