//! Membership ledger: who belongs to, and who owns, a channel or dm.
//!
//! Every mutation keeps the container-side sets and the user-side membership
//! lists in step, and upholds the ledger invariants: no duplicate members,
//! owners are always members, and a channel keeps at least one owner while it
//! has any member.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::model::{
    limits, Channel, Dm, Standup, Workspace, INVALID, PERMISSION_OWNER,
};
use crate::user::Profile;
use crate::{notifications, stats, user};

/// Brief channel listing entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub channel_id: i64,
    pub name: String,
}

/// Full channel detail view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDetails {
    pub name: String,
    pub is_public: bool,
    pub owner_members: Vec<Profile>,
    pub all_members: Vec<Profile>,
}

/// Brief dm listing entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DmSummary {
    pub dm_id: i64,
    pub name: String,
}

/// Full dm detail view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DmDetails {
    pub name: String,
    pub members: Vec<Profile>,
}

/// True when the actor has owner authority over a channel: membership in the
/// owner set, or the workspace-wide owner permission level.
fn has_owner_authority(ws: &Workspace, channel: &Channel, uid: i64) -> bool {
    channel.is_owner(uid) || ws.user(uid).is_some_and(|u| u.permission == PERMISSION_OWNER)
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Create a channel. The creator becomes its first member and owner.
/// Channel ids are sequential from 0.
pub fn channels_create(
    ws: &mut Workspace,
    uid: i64,
    name: &str,
    is_public: bool,
    now: i64,
) -> Result<i64> {
    let len = name.chars().count();
    if len < limits::MIN_CHANNEL_NAME || len > limits::MAX_CHANNEL_NAME {
        return Err(CoreError::ChannelNameLength);
    }

    let channel_id = ws.channels.len() as i64;
    ws.channels.push(Channel {
        channel_id,
        name: name.to_string(),
        is_public,
        member_ids: vec![uid],
        owner_ids: vec![uid],
        messages: Vec::new(),
        standup: Standup::default(),
    });

    let creator = ws.user_mut(uid).ok_or(CoreError::UserNotFound)?;
    creator.channel_ids.push(channel_id);
    creator.owned_channel_ids.push(channel_id);
    stats::record_user_channels(creator, now);
    stats::record_channels_exist(ws, now);

    Ok(channel_id)
}

/// Channels the user is a member of.
pub fn channels_list(ws: &Workspace, uid: i64) -> Vec<ChannelSummary> {
    ws.channels
        .iter()
        .filter(|c| c.is_member(uid))
        .map(|c| ChannelSummary {
            channel_id: c.channel_id,
            name: c.name.clone(),
        })
        .collect()
}

/// Every channel in the workspace, private ones included.
pub fn channels_list_all(ws: &Workspace) -> Vec<ChannelSummary> {
    ws.channels
        .iter()
        .map(|c| ChannelSummary {
            channel_id: c.channel_id,
            name: c.name.clone(),
        })
        .collect()
}

/// Detail view, members only.
pub fn channel_details(ws: &Workspace, uid: i64, channel_id: i64) -> Result<ChannelDetails> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }

    let profiles = |ids: &[i64]| -> Result<Vec<Profile>> {
        ids.iter().map(|id| user::user_profile(ws, *id)).collect()
    };

    Ok(ChannelDetails {
        name: channel.name.clone(),
        is_public: channel.is_public,
        owner_members: profiles(&channel.owner_ids)?,
        all_members: profiles(&channel.member_ids)?,
    })
}

/// Self-join. Private channels only admit workspace-level owners this way.
pub fn channel_join(ws: &mut Workspace, uid: i64, channel_id: i64, now: i64) -> Result<()> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if channel.is_member(uid) {
        return Err(CoreError::AlreadyMember);
    }
    let is_global_owner = ws
        .user(uid)
        .is_some_and(|u| u.permission == PERMISSION_OWNER);
    if !channel.is_public && !is_global_owner {
        return Err(CoreError::PrivateChannel);
    }

    ws.channel_mut(channel_id)
        .ok_or(CoreError::ChannelNotFound)?
        .member_ids
        .push(uid);
    let user = ws.user_mut(uid).ok_or(CoreError::UserNotFound)?;
    user.channel_ids.push(channel_id);
    stats::record_user_channels(user, now);
    Ok(())
}

/// Invite an existing user into a channel. The invitee is notified.
pub fn channel_invite(
    ws: &mut Workspace,
    inviter: i64,
    channel_id: i64,
    invitee: i64,
    now: i64,
) -> Result<()> {
    let target = ws.user(invitee).ok_or(CoreError::UserNotFound)?;
    if !target.is_active {
        return Err(CoreError::InactiveUser);
    }
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if channel.is_member(invitee) {
        return Err(CoreError::AlreadyMember);
    }
    if !channel.is_member(inviter) {
        return Err(CoreError::NotChannelMember);
    }
    let channel_name = channel.name.clone();

    ws.channel_mut(channel_id)
        .ok_or(CoreError::ChannelNotFound)?
        .member_ids
        .push(invitee);
    let user = ws.user_mut(invitee).ok_or(CoreError::UserNotFound)?;
    user.channel_ids.push(channel_id);
    stats::record_user_channels(user, now);

    notifications::notify_added(ws, invitee, inviter, channel_id, INVALID, &channel_name);
    Ok(())
}

/// Leave a channel, dropping ownership along with membership. The starter of
/// an active standup is anchored until the standup completes.
pub fn channel_leave(ws: &mut Workspace, uid: i64, channel_id: i64, now: i64) -> Result<()> {
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if !channel.is_member(uid) {
        return Err(CoreError::NotChannelMember);
    }
    if channel.standup.starter_uid == Some(uid) {
        return Err(CoreError::StandupStarterCannotLeave);
    }
    detach_from_channel(ws, uid, channel_id, now);
    Ok(())
}

/// The moderation cascade's leave path: identical detachment, but without the
/// standup-starter guard, since an administrative removal outranks the anchor.
pub(crate) fn force_leave_channel(ws: &mut Workspace, uid: i64, channel_id: i64, now: i64) {
    if ws.channel(channel_id).is_some_and(|c| c.is_member(uid)) {
        detach_from_channel(ws, uid, channel_id, now);
    }
}

/// Remove every channel-side and user-side reference tying `uid` to the
/// channel. Caller has already validated membership.
fn detach_from_channel(ws: &mut Workspace, uid: i64, channel_id: i64, now: i64) {
    if let Some(channel) = ws.channel_mut(channel_id) {
        channel.member_ids.retain(|&id| id != uid);
        channel.owner_ids.retain(|&id| id != uid);
    }
    if let Some(user) = ws.user_mut(uid) {
        user.channel_ids.retain(|&id| id != channel_id);
        user.owned_channel_ids.retain(|&id| id != channel_id);
        stats::record_user_channels(user, now);
    }
}

/// Promote a member to channel owner.
pub fn channel_add_owner(
    ws: &mut Workspace,
    actor: i64,
    channel_id: i64,
    target: i64,
) -> Result<()> {
    ws.user(target).ok_or(CoreError::UserNotFound)?;
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if !channel.is_member(target) {
        return Err(CoreError::TargetNotMember);
    }
    if !channel.is_member(actor) {
        return Err(CoreError::NotChannelMember);
    }
    if !has_owner_authority(ws, channel, actor) {
        return Err(CoreError::NoOwnerPermission);
    }
    if channel.is_owner(target) {
        return Err(CoreError::AlreadyOwner);
    }

    ws.channel_mut(channel_id)
        .ok_or(CoreError::ChannelNotFound)?
        .owner_ids
        .push(target);
    ws.user_mut(target)
        .ok_or(CoreError::UserNotFound)?
        .owned_channel_ids
        .push(channel_id);
    Ok(())
}

/// Demote a channel owner. The last owner cannot be removed while the channel
/// still has members.
pub fn channel_remove_owner(
    ws: &mut Workspace,
    actor: i64,
    channel_id: i64,
    target: i64,
) -> Result<()> {
    ws.user(target).ok_or(CoreError::UserNotFound)?;
    let channel = ws.channel(channel_id).ok_or(CoreError::ChannelNotFound)?;
    if !channel.is_member(target) {
        return Err(CoreError::TargetNotMember);
    }
    if !channel.is_member(actor) {
        return Err(CoreError::NotChannelMember);
    }
    if !has_owner_authority(ws, channel, actor) {
        return Err(CoreError::NoOwnerPermission);
    }
    if !channel.is_owner(target) {
        return Err(CoreError::TargetNotOwner);
    }
    if channel.owner_ids.len() == 1 {
        return Err(CoreError::LastOwner);
    }

    ws.channel_mut(channel_id)
        .ok_or(CoreError::ChannelNotFound)?
        .owner_ids
        .retain(|&id| id != target);
    ws.user_mut(target)
        .ok_or(CoreError::UserNotFound)?
        .owned_channel_ids
        .retain(|&id| id != channel_id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Dms
// ---------------------------------------------------------------------------

/// Create a dm between the creator and `uids`. The dm name is the sorted,
/// comma-joined list of every member's display handle. Dm ids are sequential
/// from 1.
pub fn dm_create(ws: &mut Workspace, creator: i64, uids: &[i64], now: i64) -> Result<i64> {
    for uid in uids {
        let user = ws.user(*uid).ok_or(CoreError::UserNotFound)?;
        if !user.is_active {
            return Err(CoreError::InactiveUser);
        }
    }
    let mut seen = uids.to_vec();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != uids.len() {
        return Err(CoreError::DuplicateUids);
    }
    if uids.contains(&creator) {
        return Err(CoreError::DuplicateUids);
    }

    let mut handles: Vec<String> = Vec::with_capacity(uids.len() + 1);
    for uid in uids.iter().chain(std::iter::once(&creator)) {
        handles.push(
            ws.handle_of(*uid)
                .ok_or(CoreError::UserNotFound)?
                .to_string(),
        );
    }
    handles.sort();
    let name = handles.join(", ");

    let dm_id = ws.dm_counter;
    ws.dm_counter += 1;

    let mut member_uids = vec![creator];
    member_uids.extend_from_slice(uids);
    ws.dms.push(Dm {
        dm_id,
        name: name.clone(),
        member_uids,
        creator_uid: creator,
        messages: Vec::new(),
    });

    let creator_user = ws.user_mut(creator).ok_or(CoreError::UserNotFound)?;
    creator_user.dm_ids.push(dm_id);
    creator_user.owned_dm_ids.push(dm_id);
    stats::record_user_dms(creator_user, now);

    for uid in uids {
        let user = ws.user_mut(*uid).ok_or(CoreError::UserNotFound)?;
        user.dm_ids.push(dm_id);
        stats::record_user_dms(user, now);
    }
    for uid in uids {
        notifications::notify_added(ws, *uid, creator, INVALID, dm_id, &name);
    }

    stats::record_dms_exist(ws, now);
    Ok(dm_id)
}

/// Dms the user belongs to.
pub fn dm_list(ws: &Workspace, uid: i64) -> Vec<DmSummary> {
    ws.dms
        .iter()
        .filter(|d| d.is_member(uid))
        .map(|d| DmSummary {
            dm_id: d.dm_id,
            name: d.name.clone(),
        })
        .collect()
}

/// Detail view, members only.
pub fn dm_details(ws: &Workspace, uid: i64, dm_id: i64) -> Result<DmDetails> {
    let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
    if !dm.is_member(uid) {
        return Err(CoreError::NotDmMember);
    }
    let members = dm
        .member_uids
        .iter()
        .map(|id| user::user_profile(ws, *id))
        .collect::<Result<Vec<_>>>()?;
    Ok(DmDetails {
        name: dm.name.clone(),
        members,
    })
}

/// Leave a dm. The creator may leave; the dm survives without them.
pub fn dm_leave(ws: &mut Workspace, uid: i64, dm_id: i64, now: i64) -> Result<()> {
    let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
    if !dm.is_member(uid) {
        return Err(CoreError::NotDmMember);
    }
    detach_from_dm(ws, uid, dm_id, now);
    Ok(())
}

/// Dissolve a dm entirely. Creator-only, and the creator must still be a
/// member.
pub fn dm_remove(ws: &mut Workspace, uid: i64, dm_id: i64, now: i64) -> Result<()> {
    let dm = ws.dm(dm_id).ok_or(CoreError::DmNotFound)?;
    if dm.creator_uid != uid {
        return Err(CoreError::NotDmCreator);
    }
    if !dm.is_member(uid) {
        return Err(CoreError::NotDmMember);
    }
    let message_count = dm.messages.len() as i64;
    let members = dm.member_uids.clone();

    ws.messages_live -= message_count;
    stats::record_messages_exist(ws, now);

    for member in members {
        detach_from_dm(ws, member, dm_id, now);
    }
    ws.dms.retain(|d| d.dm_id != dm_id);
    stats::record_dms_exist(ws, now);
    Ok(())
}

/// The moderation cascade's dm-leave path; no-op when `uid` is not a member.
pub(crate) fn force_leave_dm(ws: &mut Workspace, uid: i64, dm_id: i64, now: i64) {
    if ws.dm(dm_id).is_some_and(|d| d.is_member(uid)) {
        detach_from_dm(ws, uid, dm_id, now);
    }
}

/// Remove every dm-side and user-side reference tying `uid` to the dm.
fn detach_from_dm(ws: &mut Workspace, uid: i64, dm_id: i64, now: i64) {
    if let Some(dm) = ws.dm_mut(dm_id) {
        dm.member_uids.retain(|&id| id != uid);
    }
    if let Some(user) = ws.user_mut(uid) {
        user.dm_ids.retain(|&id| id != dm_id);
        user.owned_dm_ids.retain(|&id| id != dm_id);
        stats::record_user_dms(user, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;

    fn seeded() -> Workspace {
        let mut ws = Workspace::new(0);
        for (email, first, last) in [
            ("a@example.com", "Ada", "Lovelace"),
            ("b@example.com", "Bob", "Byrne"),
            ("c@example.com", "Cleo", "Chen"),
        ] {
            auth::register(&mut ws, email, "hunter22", first, last, 0).unwrap();
        }
        ws
    }

    fn owners_subset_of_members(ws: &Workspace) -> bool {
        ws.channels
            .iter()
            .all(|c| c.owner_ids.iter().all(|o| c.member_ids.contains(o)))
    }

    #[test]
    fn channel_ids_are_sequential_from_zero() {
        let mut ws = seeded();
        assert_eq!(channels_create(&mut ws, 1, "general", true, 0), Ok(0));
        assert_eq!(channels_create(&mut ws, 1, "random", true, 0), Ok(1));
    }

    #[test]
    fn creator_is_member_and_owner() {
        let mut ws = seeded();
        channels_create(&mut ws, 1, "general", true, 0).unwrap();
        let channel = ws.channel(0).unwrap();
        assert!(channel.is_member(1));
        assert!(channel.is_owner(1));
        assert_eq!(ws.user(1).unwrap().channel_ids, vec![0]);
        assert_eq!(ws.user(1).unwrap().owned_channel_ids, vec![0]);
    }

    #[test]
    fn join_rejects_duplicates_and_private_channels() {
        let mut ws = seeded();
        channels_create(&mut ws, 2, "private", false, 0).unwrap();
        channels_create(&mut ws, 2, "public", true, 0).unwrap();

        assert_eq!(
            channel_join(&mut ws, 3, 0, 0),
            Err(CoreError::PrivateChannel)
        );
        // The global owner may self-join a private channel.
        channel_join(&mut ws, 1, 0, 0).unwrap();
        channel_join(&mut ws, 3, 1, 0).unwrap();
        assert_eq!(channel_join(&mut ws, 3, 1, 0), Err(CoreError::AlreadyMember));
        assert!(owners_subset_of_members(&ws));
    }

    #[test]
    fn invite_adds_and_notifies_the_invitee() {
        let mut ws = seeded();
        channels_create(&mut ws, 1, "general", true, 0).unwrap();
        channel_invite(&mut ws, 1, 0, 2, 0).unwrap();

        assert!(ws.channel(0).unwrap().is_member(2));
        let queue = &ws.user(2).unwrap().notifications;
        assert_eq!(
            queue[0].notification_message,
            "adalovelace added you to general"
        );
        assert_eq!(queue[0].channel_id, 0);
        assert_eq!(queue[0].dm_id, INVALID);

        assert_eq!(
            channel_invite(&mut ws, 1, 0, 2, 0),
            Err(CoreError::AlreadyMember)
        );
        assert_eq!(
            channel_invite(&mut ws, 3, 0, 3, 0),
            Err(CoreError::NotChannelMember)
        );
    }

    #[test]
    fn leave_detaches_membership_and_ownership() {
        let mut ws = seeded();
        channels_create(&mut ws, 1, "general", true, 0).unwrap();
        channel_join(&mut ws, 2, 0, 0).unwrap();
        channel_add_owner(&mut ws, 1, 0, 2).unwrap();

        channel_leave(&mut ws, 1, 0, 0).unwrap();
        let channel = ws.channel(0).unwrap();
        assert!(!channel.is_member(1));
        assert!(!channel.is_owner(1));
        assert!(ws.user(1).unwrap().channel_ids.is_empty());
        assert!(ws.user(1).unwrap().owned_channel_ids.is_empty());
        assert!(owners_subset_of_members(&ws));

        assert_eq!(
            channel_leave(&mut ws, 1, 0, 0),
            Err(CoreError::NotChannelMember)
        );
    }

    #[test]
    fn standup_starter_cannot_leave() {
        let mut ws = seeded();
        channels_create(&mut ws, 1, "general", true, 0).unwrap();
        ws.channel_mut(0).unwrap().standup.is_active = true;
        ws.channel_mut(0).unwrap().standup.starter_uid = Some(1);
        assert_eq!(
            channel_leave(&mut ws, 1, 0, 0),
            Err(CoreError::StandupStarterCannotLeave)
        );
    }

    #[test]
    fn owner_mutations_enforce_the_ledger_rules() {
        let mut ws = seeded();
        channels_create(&mut ws, 2, "general", true, 0).unwrap();
        channel_join(&mut ws, 3, 0, 0).unwrap();

        // Non-owner member cannot promote.
        assert_eq!(
            channel_add_owner(&mut ws, 3, 0, 3),
            Err(CoreError::NoOwnerPermission)
        );
        // Target must be a member.
        assert_eq!(
            channel_add_owner(&mut ws, 2, 0, 1),
            Err(CoreError::TargetNotMember)
        );

        channel_add_owner(&mut ws, 2, 0, 3).unwrap();
        assert_eq!(
            channel_add_owner(&mut ws, 2, 0, 3),
            Err(CoreError::AlreadyOwner)
        );
        assert!(owners_subset_of_members(&ws));

        channel_remove_owner(&mut ws, 2, 0, 3).unwrap();
        assert_eq!(
            channel_remove_owner(&mut ws, 2, 0, 3),
            Err(CoreError::TargetNotOwner)
        );
        // The sole remaining owner cannot be demoted.
        assert_eq!(
            channel_remove_owner(&mut ws, 2, 0, 2),
            Err(CoreError::LastOwner)
        );
    }

    #[test]
    fn global_owner_has_channel_owner_authority_once_a_member() {
        let mut ws = seeded();
        channels_create(&mut ws, 2, "general", true, 0).unwrap();
        channel_join(&mut ws, 1, 0, 0).unwrap();
        channel_join(&mut ws, 3, 0, 0).unwrap();
        // User 1 is not in owner_ids but holds the top permission level.
        channel_add_owner(&mut ws, 1, 0, 3).unwrap();
        assert!(ws.channel(0).unwrap().is_owner(3));
    }

    #[test]
    fn dm_name_is_sorted_joined_handles() {
        let mut ws = seeded();
        let dm_id = dm_create(&mut ws, 1, &[2, 3], 0).unwrap();
        assert_eq!(dm_id, 1);
        assert_eq!(
            ws.dm(1).unwrap().name,
            "adalovelace, bobbyrne, cleochen"
        );
        // Creator first in the member list.
        assert_eq!(ws.dm(1).unwrap().member_uids, vec![1, 2, 3]);
        assert_eq!(ws.user(1).unwrap().owned_dm_ids, vec![1]);
    }

    #[test]
    fn dm_create_notifies_invitees_only() {
        let mut ws = seeded();
        dm_create(&mut ws, 1, &[2], 0).unwrap();
        assert!(ws.user(1).unwrap().notifications.is_empty());
        let queue = &ws.user(2).unwrap().notifications;
        assert_eq!(
            queue[0].notification_message,
            "adalovelace added you to adalovelace, bobbyrne"
        );
        assert_eq!(queue[0].dm_id, 1);
        assert_eq!(queue[0].channel_id, INVALID);
    }

    #[test]
    fn dm_create_rejects_duplicates_and_unknown_users() {
        let mut ws = seeded();
        assert_eq!(
            dm_create(&mut ws, 1, &[2, 2], 0),
            Err(CoreError::DuplicateUids)
        );
        assert_eq!(
            dm_create(&mut ws, 1, &[99], 0),
            Err(CoreError::UserNotFound)
        );
    }

    #[test]
    fn dm_leave_and_remove() {
        let mut ws = seeded();
        dm_create(&mut ws, 1, &[2, 3], 0).unwrap();

        dm_leave(&mut ws, 2, 1, 0).unwrap();
        assert!(!ws.dm(1).unwrap().is_member(2));
        assert!(ws.user(2).unwrap().dm_ids.is_empty());

        // Only the creator may dissolve the dm.
        assert_eq!(dm_remove(&mut ws, 3, 1, 0), Err(CoreError::NotDmCreator));
        dm_remove(&mut ws, 1, 1, 0).unwrap();
        assert!(ws.dm(1).is_none());
        assert!(ws.user(3).unwrap().dm_ids.is_empty());
        assert!(ws.user(1).unwrap().owned_dm_ids.is_empty());
    }

    #[test]
    fn dm_remove_requires_creator_membership() {
        let mut ws = seeded();
        dm_create(&mut ws, 1, &[2], 0).unwrap();
        dm_leave(&mut ws, 1, 1, 0).unwrap();
        assert_eq!(dm_remove(&mut ws, 1, 1, 0), Err(CoreError::NotDmMember));
    }
}
