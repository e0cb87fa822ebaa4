//! Channel standups: a timed buffer of one-line updates, flushed into the
//! channel as a single message when the standup finishes.
//!
//! The finish is a deferred task, scheduled through the same executor as
//! deferred sends so tests can drive it by calling [`standup_finish`]
//! directly.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::ids::MsgKind;
use crate::message;
use crate::model::{limits, Message, StandupLine, Workspace};

/// Returned by [`standup_start`]; tells the caller when to schedule the
/// finish task.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StandupStarted {
    pub time_finish: i64,
}

/// Current standup status for a channel.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StandupStatus {
    pub is_active: bool,
    pub time_finish: Option<i64>,
}

/// Open a standup in a channel for `length` seconds. The starter is anchored
/// to the channel until the standup completes.
pub fn standup_start(
    ws: &mut Workspace,
    uid: i64,
    channel_id: i64,
    length: i64,
    now: i64,
) -> Result<StandupStarted> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if length < 0 {
        return Err(CoreError::StandupLength);
    }
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }
    if channel.standup.is_active {
        return Err(CoreError::StandupAlreadyActive);
    }

    let time_finish = now + length;
    let standup = &mut ws
        .channel_mut(channel_id)
        .ok_or(CoreError::ChannelNotFound)?
        .standup;
    standup.is_active = true;
    standup.time_finish = Some(time_finish);
    standup.starter_uid = Some(uid);

    Ok(StandupStarted { time_finish })
}

/// Whether a standup is running in the channel, and until when.
pub fn standup_active(ws: &Workspace, uid: i64, channel_id: i64) -> Result<StandupStatus> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }
    Ok(StandupStatus {
        is_active: channel.standup.is_active,
        time_finish: if channel.standup.is_active {
            channel.standup.time_finish
        } else {
            None
        },
    })
}

/// Buffer one line into the channel's active standup.
pub fn standup_send(ws: &mut Workspace, uid: i64, channel_id: i64, line: &str) -> Result<()> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if line.chars().count() > limits::MAX_MESSAGE {
        return Err(CoreError::MessageLength);
    }
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }
    if !channel.standup.is_active {
        return Err(CoreError::StandupNotActive);
    }

    ws.channel_mut(channel_id)
        .ok_or(CoreError::ChannelNotFound)?
        .standup
        .lines
        .push(StandupLine {
            u_id: uid,
            message: line.to_string(),
        });
    Ok(())
}

/// Close a channel's standup and flush the buffer as one message authored by
/// the starter. An empty buffer produces no message. Safe to call on a
/// channel whose standup already ended.
pub fn standup_finish(ws: &mut Workspace, channel_id: i64, now: i64) {
    let Some(channel) = ws.channel_mut(channel_id) else {
        return;
    };
    if !channel.standup.is_active {
        return;
    }
    let Some(starter) = channel.standup.starter_uid else {
        return;
    };
    let lines = std::mem::take(&mut channel.standup.lines);
    channel.standup.is_active = false;
    channel.standup.time_finish = None;
    channel.standup.starter_uid = None;

    let mut body = String::new();
    for line in &lines {
        let handle = ws.handle_of(line.u_id).unwrap_or_default().to_string();
        body.push_str(&format!("{handle}: {}\n", line.message));
    }
    let body = body.trim_end().to_string();
    if body.is_empty() {
        return;
    }

    let message_id = message::mint_message_id(ws, MsgKind::Channel, channel_id);
    message::push_channel_message(
        ws,
        channel_id,
        Message::new(message_id, starter, body, now),
        now,
    );
}
