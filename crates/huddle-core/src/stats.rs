//! Usage-counter bookkeeping.
//!
//! Every membership or message mutation appends a point to the affected
//! user's time series and, where the workspace totals change, to the
//! workspace series. The counters are write-only from the engine's point of
//! view; no aggregation is exposed.

use crate::model::{UsagePoint, User, Workspace};

pub(crate) fn record_user_channels(user: &mut User, now: i64) {
    let count = user.channel_ids.len() as i64;
    user.stats.channels_joined.push(UsagePoint::new(count, now));
}

pub(crate) fn record_user_dms(user: &mut User, now: i64) {
    let count = user.dm_ids.len() as i64;
    user.stats.dms_joined.push(UsagePoint::new(count, now));
}

pub(crate) fn record_user_message(user: &mut User, now: i64) {
    let count = user.stats.messages_sent.len() as i64;
    user.stats.messages_sent.push(UsagePoint::new(count, now));
}

pub(crate) fn record_channels_exist(ws: &mut Workspace, now: i64) {
    let count = ws.channels.len() as i64;
    ws.stats.channels_exist.push(UsagePoint::new(count, now));
}

pub(crate) fn record_dms_exist(ws: &mut Workspace, now: i64) {
    let count = ws.dms.len() as i64;
    ws.stats.dms_exist.push(UsagePoint::new(count, now));
}

pub(crate) fn record_messages_exist(ws: &mut Workspace, now: i64) {
    let count = ws.messages_live;
    ws.stats.messages_exist.push(UsagePoint::new(count, now));
}
