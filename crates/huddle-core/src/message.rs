//! Message store: location-addressable messages across channels and dms.
//!
//! Message lists are newest-first; index 0 is the most recent message.
//! Deletion never frees a message id: the monotonic counter guarantees a
//! stale id fails validation instead of resolving to a newer message.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::ids::{self, MsgKind};
use crate::model::{limits, Message, Workspace, INVALID, PERMISSION_OWNER, REACT_THUMBS_UP};
use crate::{notifications, stats};

/// `end` value meaning "no more messages past this page".
pub const END_OF_MESSAGES: i64 = -1;

/// Where a pending (deferred) message will be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgLocation {
    Channel(i64),
    Dm(i64),
}

/// A deferred send: fully validated and id-minted at schedule time, inserted
/// at fire time against whatever snapshot is current then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub message_id: i64,
    pub location: MsgLocation,
    pub u_id: i64,
    pub message: String,
    pub fire_at: i64,
}

/// One react record as seen by a particular viewer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactView {
    pub react_id: i64,
    pub u_ids: Vec<i64>,
    pub is_this_user_reacted: bool,
}

/// A message as seen by a particular viewer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub message_id: i64,
    pub u_id: i64,
    pub message: String,
    pub time_sent: i64,
    pub reacts: Vec<ReactView>,
    pub is_pinned: bool,
}

impl MessageView {
    fn of(message: &Message, viewer: i64) -> Self {
        Self {
            message_id: message.message_id,
            u_id: message.u_id,
            message: message.message.clone(),
            time_sent: message.time_sent,
            reacts: message
                .reacts
                .iter()
                .map(|r| ReactView {
                    react_id: r.react_id,
                    u_ids: r.u_ids.clone(),
                    is_this_user_reacted: r.u_ids.contains(&viewer),
                })
                .collect(),
            is_pinned: message.is_pinned,
        }
    }
}

/// One page of messages.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Paginated {
    pub messages: Vec<MessageView>,
    pub start: i64,
    pub end: i64,
}

/// Mint the next message id for a container. The counter is global across
/// both container kinds and never rewinds.
pub(crate) fn mint_message_id(ws: &mut Workspace, kind: MsgKind, container_id: i64) -> i64 {
    let id = ids::encode(kind, container_id, ws.message_counter);
    ws.message_counter += 1;
    id
}

/// Prepend a message to a channel and record the send in the usage counters.
pub(crate) fn push_channel_message(ws: &mut Workspace, channel_id: i64, message: Message, now: i64) {
    let author = message.u_id;
    if let Some(channel) = ws.channel_mut(channel_id) {
        channel.messages.insert(0, message);
    }
    record_send(ws, author, now);
}

/// Prepend a message to a dm and record the send in the usage counters.
pub(crate) fn push_dm_message(ws: &mut Workspace, dm_id: i64, message: Message, now: i64) {
    let author = message.u_id;
    if let Some(dm) = ws.dm_mut(dm_id) {
        dm.messages.insert(0, message);
    }
    record_send(ws, author, now);
}

fn record_send(ws: &mut Workspace, author: i64, now: i64) {
    if let Some(user) = ws.user_mut(author) {
        stats::record_user_message(user, now);
    }
    ws.messages_live += 1;
    stats::record_messages_exist(ws, now);
}

fn check_send_length(text: &str) -> Result<()> {
    let len = text.chars().count();
    if len < limits::MIN_MESSAGE || len > limits::MAX_MESSAGE {
        return Err(CoreError::MessageLength);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

pub fn channel_send(
    ws: &mut Workspace,
    uid: i64,
    channel_id: i64,
    text: &str,
    now: i64,
) -> Result<i64> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    check_send_length(text)?;
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }

    let message_id = mint_message_id(ws, MsgKind::Channel, channel_id);
    push_channel_message(ws, channel_id, Message::new(message_id, uid, text.to_string(), now), now);
    notifications::tag_channel_members(ws, channel_id, text, uid);
    Ok(message_id)
}

pub fn dm_send(ws: &mut Workspace, uid: i64, dm_id: i64, text: &str, now: i64) -> Result<i64> {
    check_send_length(text)?;
    let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
    if !dm.is_member(uid) {
        return Err(CoreError::NotDmMember);
    }

    let message_id = mint_message_id(ws, MsgKind::Dm, dm_id);
    push_dm_message(ws, dm_id, Message::new(message_id, uid, text.to_string(), now), now);
    notifications::tag_dm_members(ws, dm_id, text, uid);
    Ok(message_id)
}

// ---------------------------------------------------------------------------
// Deferred send
// ---------------------------------------------------------------------------

/// Validate a deferred channel send and mint its id now; the record itself is
/// created when the pending message is delivered.
pub fn channel_send_later(
    ws: &mut Workspace,
    uid: i64,
    channel_id: i64,
    text: &str,
    send_at: i64,
    now: i64,
) -> Result<PendingMessage> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    check_send_length(text)?;
    if send_at < now {
        return Err(CoreError::TimeInPast);
    }
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }

    let message_id = mint_message_id(ws, MsgKind::Channel, channel_id);
    Ok(PendingMessage {
        message_id,
        location: MsgLocation::Channel(channel_id),
        u_id: uid,
        message: text.to_string(),
        fire_at: send_at,
    })
}

/// Validate a deferred dm send and mint its id now.
pub fn dm_send_later(
    ws: &mut Workspace,
    uid: i64,
    dm_id: i64,
    text: &str,
    send_at: i64,
    now: i64,
) -> Result<PendingMessage> {
    check_send_length(text)?;
    let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
    if send_at < now {
        return Err(CoreError::TimeInPast);
    }
    if !dm.is_member(uid) {
        return Err(CoreError::NotDmMember);
    }

    let message_id = mint_message_id(ws, MsgKind::Dm, dm_id);
    Ok(PendingMessage {
        message_id,
        location: MsgLocation::Dm(dm_id),
        u_id: uid,
        message: text.to_string(),
        fire_at: send_at,
    })
}

/// Insert a pending message. Validation already happened at schedule time;
/// the insert runs against the latest snapshot, and a container that has
/// vanished in the meantime swallows the delivery.
pub fn deliver_pending(ws: &mut Workspace, pending: &PendingMessage, now: i64) {
    let message = Message::new(
        pending.message_id,
        pending.u_id,
        pending.message.clone(),
        now,
    );
    match pending.location {
        MsgLocation::Channel(channel_id) => {
            if ws.channel(channel_id).is_none() {
                return;
            }
            push_channel_message(ws, channel_id, message, now);
            notifications::tag_channel_members(ws, channel_id, &pending.message, pending.u_id);
        }
        MsgLocation::Dm(dm_id) => {
            if ws.dm(dm_id).is_none() {
                return;
            }
            push_dm_message(ws, dm_id, message, now);
            notifications::tag_dm_members(ws, dm_id, &pending.message, pending.u_id);
        }
    }
}

// ---------------------------------------------------------------------------
// Edit / remove
// ---------------------------------------------------------------------------

/// Replace a message's text; empty text is the deletion path.
pub fn edit(ws: &mut Workspace, uid: i64, message_id: i64, text: &str, now: i64) -> Result<()> {
    if text.chars().count() > limits::MAX_MESSAGE {
        return Err(CoreError::MessageLength);
    }
    let decoded = ids::decode(message_id)?;
    match decoded.kind {
        MsgKind::Channel => {
            edit_in_channel(ws, uid, decoded.container_id, message_id, text, now)?;
            if !text.is_empty() {
                notifications::tag_channel_members(ws, decoded.container_id, text, uid);
            }
        }
        MsgKind::Dm => {
            edit_in_dm(ws, uid, decoded.container_id, message_id, text, now)?;
            if !text.is_empty() {
                notifications::tag_dm_members(ws, decoded.container_id, text, uid);
            }
        }
    }
    Ok(())
}

/// Remove a message: the empty-text edit.
pub fn remove(ws: &mut Workspace, uid: i64, message_id: i64, now: i64) -> Result<()> {
    edit(ws, uid, message_id, "", now)
}

fn edit_in_channel(
    ws: &mut Workspace,
    uid: i64,
    channel_id: i64,
    message_id: i64,
    text: &str,
    now: i64,
) -> Result<()> {
    let actor_is_global_owner = ws
        .user(uid)
        .is_some_and(|u| u.permission == PERMISSION_OWNER);
    let channel = ws.channel(channel_id).ok_or(CoreError::MessageNotFound)?;
    if !channel.is_member(uid) {
        return Err(CoreError::MessageNotFound);
    }
    let index = channel
        .messages
        .iter()
        .position(|m| m.message_id == message_id)
        .ok_or(CoreError::MessageNotFound)?;

    let message = &channel.messages[index];
    if message.u_id != uid && !actor_is_global_owner && !channel.is_owner(uid) {
        return Err(CoreError::NotMessageAuthor);
    }

    if text.is_empty() {
        ws.channel_mut(channel_id)
            .ok_or(CoreError::MessageNotFound)?
            .messages
            .remove(index);
        ws.messages_live -= 1;
        stats::record_messages_exist(ws, now);
    } else {
        ws.channel_mut(channel_id)
            .ok_or(CoreError::MessageNotFound)?
            .messages[index]
            .message = text.to_string();
    }
    Ok(())
}

fn edit_in_dm(
    ws: &mut Workspace,
    uid: i64,
    dm_id: i64,
    message_id: i64,
    text: &str,
    now: i64,
) -> Result<()> {
    let dm = ws.dm(dm_id).ok_or(CoreError::MessageNotFound)?;
    if !dm.is_member(uid) {
        return Err(CoreError::MessageNotFound);
    }
    let index = dm
        .messages
        .iter()
        .position(|m| m.message_id == message_id)
        .ok_or(CoreError::MessageNotFound)?;

    let message = &dm.messages[index];
    if message.u_id != uid && dm.creator_uid != uid {
        return Err(CoreError::NotMessageAuthor);
    }

    if text.is_empty() {
        ws.dm_mut(dm_id)
            .ok_or(CoreError::MessageNotFound)?
            .messages
            .remove(index);
        ws.messages_live -= 1;
        stats::record_messages_exist(ws, now);
    } else {
        ws.dm_mut(dm_id)
            .ok_or(CoreError::MessageNotFound)?
            .messages[index]
            .message = text.to_string();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// Locate a message by its decoded container.
fn find_message<'a>(ws: &'a Workspace, message_id: i64) -> Result<&'a Message> {
    let decoded = ids::decode(message_id)?;
    let found = match decoded.kind {
        MsgKind::Channel => ws
            .channel(decoded.container_id)
            .and_then(|c| c.messages.iter().find(|m| m.message_id == message_id)),
        MsgKind::Dm => ws
            .dm(decoded.container_id)
            .and_then(|d| d.messages.iter().find(|m| m.message_id == message_id)),
    };
    found.ok_or(CoreError::MessageNotFound)
}

fn find_message_mut<'a>(ws: &'a mut Workspace, message_id: i64) -> Result<&'a mut Message> {
    let decoded = ids::decode(message_id)?;
    let found = match decoded.kind {
        MsgKind::Channel => ws
            .channel_mut(decoded.container_id)
            .and_then(|c| c.messages.iter_mut().find(|m| m.message_id == message_id)),
        MsgKind::Dm => ws
            .dm_mut(decoded.container_id)
            .and_then(|d| d.messages.iter_mut().find(|m| m.message_id == message_id)),
    };
    found.ok_or(CoreError::MessageNotFound)
}

/// React to a message. The author is notified if they are still a member of
/// the container.
pub fn react(ws: &mut Workspace, uid: i64, message_id: i64, react_id: i64) -> Result<()> {
    let decoded = ids::decode(message_id)?;
    if react_id != REACT_THUMBS_UP {
        return Err(CoreError::InvalidReactId);
    }

    let message = find_message_mut(ws, message_id)?;
    let author = message.u_id;
    let record = message
        .reacts
        .iter_mut()
        .find(|r| r.react_id == react_id)
        .ok_or(CoreError::InvalidReactId)?;
    if record.u_ids.contains(&uid) {
        return Err(CoreError::AlreadyReacted);
    }
    record.u_ids.push(uid);

    match decoded.kind {
        MsgKind::Channel => {
            let (still_member, name) = match ws.channel(decoded.container_id) {
                Some(c) => (c.is_member(author), c.name.clone()),
                None => (false, String::new()),
            };
            if still_member {
                notifications::notify_reacted(
                    ws,
                    author,
                    uid,
                    decoded.container_id,
                    INVALID,
                    &name,
                );
            }
        }
        MsgKind::Dm => {
            let (still_member, name) = match ws.dm(decoded.container_id) {
                Some(d) => (d.is_member(author), d.name.clone()),
                None => (false, String::new()),
            };
            if still_member {
                notifications::notify_reacted(
                    ws,
                    author,
                    uid,
                    INVALID,
                    decoded.container_id,
                    &name,
                );
            }
        }
    }
    Ok(())
}

/// Withdraw a previous react.
pub fn unreact(ws: &mut Workspace, uid: i64, message_id: i64, react_id: i64) -> Result<()> {
    if react_id != REACT_THUMBS_UP {
        return Err(CoreError::InvalidReactId);
    }
    let message = find_message_mut(ws, message_id)?;
    let record = message
        .reacts
        .iter_mut()
        .find(|r| r.react_id == react_id)
        .ok_or(CoreError::InvalidReactId)?;
    let before = record.u_ids.len();
    record.u_ids.retain(|&id| id != uid);
    if record.u_ids.len() == before {
        return Err(CoreError::NotReacted);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pin / unpin
// ---------------------------------------------------------------------------

fn check_pin_authority(ws: &Workspace, uid: i64, message_id: i64) -> Result<()> {
    let decoded = ids::decode(message_id)?;
    let global_owner = ws.user(uid).is_some_and(|u| u.global_owner);
    match decoded.kind {
        MsgKind::Channel => {
            let channel = ws
                .channel(decoded.container_id)
                .ok_or(CoreError::MessageNotFound)?;
            if !channel.is_member(uid) {
                return Err(CoreError::TargetNotMember);
            }
            if !channel.is_owner(uid) && !global_owner {
                return Err(CoreError::NoOwnerPermission);
            }
        }
        MsgKind::Dm => {
            let dm = ws.dm(decoded.container_id).ok_or(CoreError::MessageNotFound)?;
            if !dm.is_member(uid) {
                return Err(CoreError::TargetNotMember);
            }
            if dm.creator_uid != uid && !global_owner {
                return Err(CoreError::NoOwnerPermission);
            }
        }
    }
    Ok(())
}

pub fn pin(ws: &mut Workspace, uid: i64, message_id: i64) -> Result<()> {
    if find_message(ws, message_id)?.is_pinned {
        return Err(CoreError::AlreadyPinned);
    }
    check_pin_authority(ws, uid, message_id)?;
    find_message_mut(ws, message_id)?.is_pinned = true;
    Ok(())
}

pub fn unpin(ws: &mut Workspace, uid: i64, message_id: i64) -> Result<()> {
    if !find_message(ws, message_id)?.is_pinned {
        return Err(CoreError::NotPinned);
    }
    check_pin_authority(ws, uid, message_id)?;
    find_message_mut(ws, message_id)?.is_pinned = false;
    Ok(())
}

// ---------------------------------------------------------------------------
// Share
// ---------------------------------------------------------------------------

/// Re-post a message into another container, prefixed by optional commentary.
/// Exactly one target must be given; the other slot holds -1.
pub fn share(
    ws: &mut Workspace,
    uid: i64,
    og_message_id: i64,
    extra: &str,
    channel_id: i64,
    dm_id: i64,
    now: i64,
) -> Result<i64> {
    let channel_target = channel_id != INVALID;
    let dm_target = dm_id != INVALID;
    if channel_target == dm_target {
        return Err(CoreError::ShareTargetInvalid);
    }

    let decoded = ids::decode(og_message_id)?;
    if extra.chars().count() > limits::MAX_MESSAGE {
        return Err(CoreError::MessageLength);
    }

    // Membership in the original message's container.
    match decoded.kind {
        MsgKind::Channel => {
            let channel = ws
                .channel(decoded.container_id)
                .ok_or(CoreError::MessageNotFound)?;
            if !channel.is_member(uid) {
                return Err(CoreError::TargetNotMember);
            }
        }
        MsgKind::Dm => {
            let dm = ws.dm(decoded.container_id).ok_or(CoreError::MessageNotFound)?;
            if !dm.is_member(uid) {
                return Err(CoreError::TargetNotMember);
            }
        }
    }

    let og_text = find_message(ws, og_message_id)?.message.clone();
    let body = format!("{extra}\n--------\n{og_text}\n--------");

    if channel_target {
        let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
        if !channel.is_member(uid) {
            return Err(CoreError::NotChannelMember);
        }
        let message_id = mint_message_id(ws, MsgKind::Channel, channel_id);
        push_channel_message(ws, channel_id, Message::new(message_id, uid, body, now), now);
        notifications::tag_channel_members(ws, channel_id, extra, uid);
        Ok(message_id)
    } else {
        let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
        if !dm.is_member(uid) {
            return Err(CoreError::NotDmMember);
        }
        let message_id = mint_message_id(ws, MsgKind::Dm, dm_id);
        push_dm_message(ws, dm_id, Message::new(message_id, uid, body, now), now);
        notifications::tag_dm_members(ws, dm_id, extra, uid);
        Ok(message_id)
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

fn paginate(messages: &[Message], viewer: i64, start: i64) -> Result<Paginated> {
    let total = messages.len() as i64;
    if start < 0 || start > total {
        return Err(CoreError::StartTooLarge);
    }

    let page = limits::PAGE_SIZE as i64;
    let end = if total - start <= page {
        END_OF_MESSAGES
    } else {
        start + page
    };
    let upto = total.min(start + page);
    let views = messages[start as usize..upto as usize]
        .iter()
        .map(|m| MessageView::of(m, viewer))
        .collect();

    Ok(Paginated {
        messages: views,
        start,
        end,
    })
}

/// Up to one page of channel messages beginning at `start` (0 = newest).
pub fn channel_messages(
    ws: &Workspace,
    uid: i64,
    channel_id: i64,
    start: i64,
) -> Result<Paginated> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if (channel.messages.len() as i64) < start {
        return Err(CoreError::StartTooLarge);
    }
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }
    paginate(&channel.messages, uid, start)
}

/// Up to one page of dm messages beginning at `start` (0 = newest).
pub fn dm_messages(ws: &Workspace, uid: i64, dm_id: i64, start: i64) -> Result<Paginated> {
    let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
    if (dm.messages.len() as i64) < start {
        return Err(CoreError::StartTooLarge);
    }
    if !dm.is_member(uid) {
        return Err(CoreError::NotDmMember);
    }
    paginate(&dm.messages, uid, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, membership};

    /// Three users; user 1 owns channel 0 with user 2 as a member; dm 1
    /// between users 1 and 2.
    fn seeded() -> Workspace {
        let mut ws = Workspace::new(0);
        for (email, first, last) in [
            ("a@example.com", "Ada", "Lovelace"),
            ("b@example.com", "Bob", "Byrne"),
            ("c@example.com", "Cleo", "Chen"),
        ] {
            auth::register(&mut ws, email, "hunter22", first, last, 0).unwrap();
        }
        membership::channels_create(&mut ws, 1, "general", true, 0).unwrap();
        membership::channel_join(&mut ws, 2, 0, 0).unwrap();
        membership::dm_create(&mut ws, 1, &[2], 0).unwrap();
        ws
    }

    #[test]
    fn sent_ids_decode_to_their_container() {
        let mut ws = seeded();
        let cid = channel_send(&mut ws, 1, 0, "hello", 100).unwrap();
        let did = dm_send(&mut ws, 1, 1, "hi there", 100).unwrap();

        let c = ids::decode(cid).unwrap();
        assert_eq!(c.kind, MsgKind::Channel);
        assert_eq!(c.container_id, 0);

        let d = ids::decode(did).unwrap();
        assert_eq!(d.kind, MsgKind::Dm);
        assert_eq!(d.container_id, 1);
    }

    #[test]
    fn send_validates_membership_and_length() {
        let mut ws = seeded();
        assert_eq!(
            channel_send(&mut ws, 3, 0, "hello", 0),
            Err(CoreError::NotChannelMember)
        );
        assert_eq!(
            channel_send(&mut ws, 1, 0, "", 0),
            Err(CoreError::MessageLength)
        );
        let long = "x".repeat(1001);
        assert_eq!(
            channel_send(&mut ws, 1, 0, &long, 0),
            Err(CoreError::MessageLength)
        );
        assert_eq!(
            dm_send(&mut ws, 3, 1, "hello", 0),
            Err(CoreError::NotDmMember)
        );
    }

    #[test]
    fn messages_are_newest_first() {
        let mut ws = seeded();
        channel_send(&mut ws, 1, 0, "first", 1).unwrap();
        channel_send(&mut ws, 1, 0, "second", 2).unwrap();
        let channel = ws.channel(0).unwrap();
        assert_eq!(channel.messages[0].message, "second");
        assert_eq!(channel.messages[1].message, "first");
    }

    #[test]
    fn edit_to_empty_removes_and_decrements_live_count() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 1, 0, "soon gone", 0).unwrap();
        assert_eq!(ws.messages_live, 1);

        edit(&mut ws, 1, id, "", 0).unwrap();
        assert!(ws.channel(0).unwrap().messages.is_empty());
        assert_eq!(ws.messages_live, 0);

        // The id is never reissued: a stale reference fails validation.
        assert_eq!(react(&mut ws, 1, id, 1), Err(CoreError::MessageNotFound));
        let next = channel_send(&mut ws, 1, 0, "another", 0).unwrap();
        assert_ne!(next, id);
    }

    #[test]
    fn edit_authorization_rules() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 2, 0, "from bob", 0).unwrap();

        // Channel member who is neither author, channel owner nor global
        // owner is rejected.
        membership::channel_join(&mut ws, 3, 0, 0).unwrap();
        assert_eq!(
            edit(&mut ws, 3, id, "nope", 0),
            Err(CoreError::NotMessageAuthor)
        );
        // The channel owner may edit.
        edit(&mut ws, 1, id, "fixed by owner", 0).unwrap();
        assert_eq!(ws.channel(0).unwrap().messages[0].message, "fixed by owner");

        // In a dm only the author or the creator may edit.
        let did = dm_send(&mut ws, 2, 1, "dm text", 0).unwrap();
        edit(&mut ws, 1, did, "creator edit", 0).unwrap();
        assert_eq!(ws.dm(1).unwrap().messages[0].message, "creator edit");
    }

    #[test]
    fn react_then_unreact_round_trip() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 1, 0, "hello", 0).unwrap();

        assert_eq!(react(&mut ws, 2, id, 7), Err(CoreError::InvalidReactId));
        react(&mut ws, 2, id, 1).unwrap();
        assert_eq!(react(&mut ws, 2, id, 1), Err(CoreError::AlreadyReacted));

        unreact(&mut ws, 2, id, 1).unwrap();
        assert_eq!(unreact(&mut ws, 2, id, 1), Err(CoreError::NotReacted));
    }

    #[test]
    fn react_notifies_the_author() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 1, 0, "hello", 0).unwrap();
        react(&mut ws, 2, id, 1).unwrap();

        let queue = &ws.user(1).unwrap().notifications;
        assert_eq!(
            queue[0].notification_message,
            "bobbyrne reacted to your message in general"
        );
        assert_eq!(queue[0].channel_id, 0);
        assert_eq!(queue[0].dm_id, INVALID);
    }

    #[test]
    fn react_notification_skipped_when_author_left() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 2, 0, "parting words", 0).unwrap();
        membership::channel_leave(&mut ws, 2, 0, 0).unwrap();

        react(&mut ws, 1, id, 1).unwrap();
        assert!(ws.user(2).unwrap().notifications.is_empty());
    }

    #[test]
    fn pin_rules() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 2, 0, "pin me", 0).unwrap();

        // An ordinary member lacks pin authority.
        assert_eq!(pin(&mut ws, 2, id), Err(CoreError::NoOwnerPermission));

        pin(&mut ws, 1, id).unwrap();
        assert!(ws.channel(0).unwrap().messages[0].is_pinned);
        assert_eq!(pin(&mut ws, 1, id), Err(CoreError::AlreadyPinned));

        unpin(&mut ws, 1, id).unwrap();
        assert_eq!(unpin(&mut ws, 1, id), Err(CoreError::NotPinned));
    }

    #[test]
    fn dm_pin_is_creator_gated() {
        let mut ws = seeded();
        let id = dm_send(&mut ws, 2, 1, "dm pin", 0).unwrap();
        assert_eq!(pin(&mut ws, 2, id), Err(CoreError::NoOwnerPermission));
        pin(&mut ws, 1, id).unwrap();
        assert!(ws.dm(1).unwrap().messages[0].is_pinned);
    }

    #[test]
    fn share_composes_a_quoted_body() {
        let mut ws = seeded();
        let og = channel_send(&mut ws, 1, 0, "original", 0).unwrap();
        let shared = share(&mut ws, 1, og, "look at this", INVALID, 1, 0).unwrap();

        let dm = ws.dm(1).unwrap();
        assert_eq!(dm.messages[0].message_id, shared);
        assert_eq!(
            dm.messages[0].message,
            "look at this\n--------\noriginal\n--------"
        );
    }

    #[test]
    fn share_target_rules() {
        let mut ws = seeded();
        let og = channel_send(&mut ws, 1, 0, "original", 0).unwrap();

        // Neither or both targets are rejected.
        assert_eq!(
            share(&mut ws, 1, og, "", INVALID, INVALID, 0),
            Err(CoreError::ShareTargetInvalid)
        );
        assert_eq!(
            share(&mut ws, 1, og, "", 0, 1, 0),
            Err(CoreError::ShareTargetInvalid)
        );
        // Must be a member of the target container.
        let mut ws2 = seeded();
        membership::channels_create(&mut ws2, 3, "cleos", true, 0).unwrap();
        let og2 = channel_send(&mut ws2, 1, 0, "original", 0).unwrap();
        assert_eq!(
            share(&mut ws2, 1, og2, "", 1, INVALID, 0),
            Err(CoreError::NotChannelMember)
        );
        // Must be a member of the original message's container.
        assert_eq!(
            share(&mut ws2, 3, og2, "", 1, INVALID, 0),
            Err(CoreError::TargetNotMember)
        );
    }

    #[test]
    fn pagination_page_boundaries() {
        let mut ws = seeded();
        for i in 0..50 {
            channel_send(&mut ws, 1, 0, &format!("message {i}"), i).unwrap();
        }
        let page = channel_messages(&ws, 1, 0, 0).unwrap();
        assert_eq!(page.messages.len(), 50);
        assert_eq!(page.end, END_OF_MESSAGES);

        channel_send(&mut ws, 1, 0, "one more", 50).unwrap();
        let page = channel_messages(&ws, 1, 0, 0).unwrap();
        assert_eq!(page.messages.len(), 50);
        assert_eq!(page.end, 50);

        let rest = channel_messages(&ws, 1, 0, 50).unwrap();
        assert_eq!(rest.messages.len(), 1);
        assert_eq!(rest.end, END_OF_MESSAGES);

        assert_eq!(
            channel_messages(&ws, 1, 0, 52),
            Err(CoreError::StartTooLarge)
        );
    }

    #[test]
    fn pagination_marks_own_reacts() {
        let mut ws = seeded();
        let id = channel_send(&mut ws, 1, 0, "hello", 0).unwrap();
        react(&mut ws, 2, id, 1).unwrap();

        let page = channel_messages(&ws, 2, 0, 0).unwrap();
        assert!(page.messages[0].reacts[0].is_this_user_reacted);
        let page = channel_messages(&ws, 1, 0, 0).unwrap();
        assert!(!page.messages[0].reacts[0].is_this_user_reacted);
    }

    #[test]
    fn send_later_validates_now_and_delivers_later() {
        let mut ws = seeded();
        assert_eq!(
            channel_send_later(&mut ws, 1, 0, "too late", 5, 10),
            Err(CoreError::TimeInPast)
        );
        assert_eq!(
            channel_send_later(&mut ws, 3, 0, "hi", 20, 10),
            Err(CoreError::NotChannelMember)
        );

        let pending = channel_send_later(&mut ws, 1, 0, "from the future", 20, 10).unwrap();
        // Not yet visible, but the id is already minted and reserved.
        assert!(ws.channel(0).unwrap().messages.is_empty());
        let next = channel_send(&mut ws, 1, 0, "interleaved", 11).unwrap();
        assert_ne!(next, pending.message_id);

        deliver_pending(&mut ws, &pending, 20);
        let channel = ws.channel(0).unwrap();
        assert_eq!(channel.messages[0].message, "from the future");
        assert_eq!(channel.messages[0].message_id, pending.message_id);
        assert_eq!(channel.messages[0].time_sent, 20);
    }

    #[test]
    fn pending_delivery_against_a_vanished_dm_is_dropped() {
        let mut ws = seeded();
        let pending = dm_send_later(&mut ws, 1, 1, "ghost", 20, 10).unwrap();
        membership::dm_remove(&mut ws, 1, 1, 10).unwrap();
        deliver_pending(&mut ws, &pending, 20);
        assert_eq!(ws.messages_live, 0);
    }
}
