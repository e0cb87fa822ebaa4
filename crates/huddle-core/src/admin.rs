//! Moderation cascade: account removal and workspace permission changes.
//!
//! These are the only multi-step mutations in the engine. There is no
//! rollback, so every precondition is checked before the first write.

use tracing::info;

use crate::error::{CoreError, Result};
use crate::membership;
use crate::model::{Workspace, PERMISSION_MEMBER, PERMISSION_OWNER, REMOVED_USER};

/// Number of active accounts holding the workspace-owner permission level.
fn active_global_owners(ws: &Workspace) -> usize {
    ws.users
        .iter()
        .filter(|u| u.is_active && u.permission == PERMISSION_OWNER)
        .count()
}

fn check_actor_and_target(ws: &Workspace, actor: i64, target: i64) -> Result<()> {
    let target_user = ws.user(target).ok_or(CoreError::UserNotFound)?;
    let actor_user = ws.user(actor).ok_or(CoreError::UserNotFound)?;
    if !actor_user.is_active || !target_user.is_active {
        return Err(CoreError::InactiveUser);
    }
    if actor_user.permission != PERMISSION_OWNER {
        return Err(CoreError::NotGlobalOwner);
    }
    Ok(())
}

/// Retract an account from the workspace.
///
/// Every message the target authored, in every channel and dm they belong
/// to, is rewritten in place to the sentinel body (attribution preserved);
/// the target is then detached from each container through the ledger's
/// leave path. The profile is overwritten with sentinel names, the email and
/// display handle are released for reuse, and all sessions are invalidated.
/// The record itself is retained so lookups by id keep resolving.
pub fn remove_user(ws: &mut Workspace, actor: i64, target: i64, now: i64) -> Result<()> {
    check_actor_and_target(ws, actor, target)?;
    let target_user = ws.user(target).ok_or(CoreError::UserNotFound)?;
    if target_user.permission == PERMISSION_OWNER && active_global_owners(ws) == 1 {
        return Err(CoreError::SoleGlobalOwner);
    }

    let channel_ids = target_user.channel_ids.clone();
    let dm_ids = target_user.dm_ids.clone();

    for channel_id in channel_ids {
        if let Some(channel) = ws.channel_mut(channel_id) {
            for message in channel.messages.iter_mut().filter(|m| m.u_id == target) {
                message.message = REMOVED_USER.to_string();
            }
        }
        membership::force_leave_channel(ws, target, channel_id, now);
    }
    for dm_id in dm_ids {
        if let Some(dm) = ws.dm_mut(dm_id) {
            for message in dm.messages.iter_mut().filter(|m| m.u_id == target) {
                message.message = REMOVED_USER.to_string();
            }
        }
        membership::force_leave_dm(ws, target, dm_id, now);
    }

    let released_email = ws
        .user(target)
        .map(|u| u.email.clone())
        .unwrap_or_default();
    ws.emails.retain(|e| e != &released_email);

    let user = ws.user_mut(target).ok_or(CoreError::UserNotFound)?;
    user.name_first = "Removed".to_string();
    user.name_last = "user".to_string();
    user.is_active = false;
    user.active_tokens.clear();

    info!(target, actor, "user removed from workspace");
    Ok(())
}

/// Change an account's workspace-wide permission level.
pub fn change_permission(
    ws: &mut Workspace,
    actor: i64,
    target: i64,
    permission: i64,
) -> Result<()> {
    check_actor_and_target(ws, actor, target)?;
    if permission != PERMISSION_OWNER && permission != PERMISSION_MEMBER {
        return Err(CoreError::InvalidPermission);
    }
    let target_user = ws.user(target).ok_or(CoreError::UserNotFound)?;
    if target_user.permission == permission {
        return Err(CoreError::AlreadyHasPermission);
    }
    if target_user.permission == PERMISSION_OWNER
        && permission == PERMISSION_MEMBER
        && active_global_owners(ws) == 1
    {
        return Err(CoreError::SoleGlobalOwner);
    }

    let user = ws.user_mut(target).ok_or(CoreError::UserNotFound)?;
    user.permission = permission;
    user.global_owner = permission == PERMISSION_OWNER;

    info!(target, permission, "workspace permission changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, membership, message};

    /// User 1 is the global owner. Users 1 and 2 share channel 0 and dm 1;
    /// user 2 has posted in both.
    fn seeded() -> Workspace {
        let mut ws = Workspace::new(0);
        for (email, first, last) in [
            ("a@example.com", "Ada", "Lovelace"),
            ("b@example.com", "Bob", "Byrne"),
        ] {
            auth::register(&mut ws, email, "hunter22", first, last, 0).unwrap();
        }
        membership::channels_create(&mut ws, 1, "general", true, 0).unwrap();
        membership::channel_join(&mut ws, 2, 0, 0).unwrap();
        membership::dm_create(&mut ws, 1, &[2], 0).unwrap();
        message::channel_send(&mut ws, 2, 0, "channel words", 0).unwrap();
        message::dm_send(&mut ws, 2, 1, "dm words", 0).unwrap();
        ws
    }

    #[test]
    fn remove_user_cascades_across_every_collection() {
        let mut ws = seeded();
        remove_user(&mut ws, 1, 2, 0).unwrap();

        // Messages survive, with the sentinel body and original attribution.
        let channel = ws.channel(0).unwrap();
        assert_eq!(channel.messages[0].message, REMOVED_USER);
        assert_eq!(channel.messages[0].u_id, 2);
        let dm = ws.dm(1).unwrap();
        assert_eq!(dm.messages[0].message, REMOVED_USER);
        assert_eq!(dm.messages[0].u_id, 2);

        // No member or owner list still references the target.
        assert!(!channel.is_member(2));
        assert!(!channel.is_owner(2));
        assert!(!dm.is_member(2));

        // Profile is retained under sentinel names, sessions are gone.
        let user = ws.user(2).unwrap();
        assert!(!user.is_active);
        assert_eq!(user.name_first, "Removed");
        assert_eq!(user.name_last, "user");
        assert!(user.active_tokens.is_empty());
        assert!(user.channel_ids.is_empty());
        assert!(user.dm_ids.is_empty());

        // The released email can be registered again.
        auth::register(&mut ws, "b@example.com", "hunter22", "New", "Person", 0).unwrap();
    }

    #[test]
    fn remove_user_releases_the_display_handle() {
        let mut ws = seeded();
        remove_user(&mut ws, 1, 2, 0).unwrap();
        let session =
            auth::register(&mut ws, "b2@example.com", "hunter22", "Bob", "Byrne", 0).unwrap();
        assert_eq!(
            ws.user(session.auth_user_id).unwrap().handle_display,
            "bobbyrne"
        );
    }

    #[test]
    fn remove_user_spares_a_channel_owner_anchored_by_a_standup() {
        let mut ws = seeded();
        ws.channel_mut(0).unwrap().standup.is_active = true;
        ws.channel_mut(0).unwrap().standup.starter_uid = Some(2);
        // The cascade's leave path ignores the standup anchor.
        remove_user(&mut ws, 1, 2, 0).unwrap();
        assert!(!ws.channel(0).unwrap().is_member(2));
    }

    #[test]
    fn remove_user_guards() {
        let mut ws = seeded();
        assert_eq!(remove_user(&mut ws, 2, 1, 0), Err(CoreError::NotGlobalOwner));
        assert_eq!(remove_user(&mut ws, 1, 99, 0), Err(CoreError::UserNotFound));
        // The sole global owner cannot remove themselves.
        assert_eq!(remove_user(&mut ws, 1, 1, 0), Err(CoreError::SoleGlobalOwner));

        // With a second global owner the first can be removed.
        change_permission(&mut ws, 1, 2, PERMISSION_OWNER).unwrap();
        remove_user(&mut ws, 2, 1, 0).unwrap();
        assert!(!ws.user(1).unwrap().is_active);
    }

    #[test]
    fn removed_users_cannot_act_or_be_acted_on() {
        let mut ws = seeded();
        change_permission(&mut ws, 1, 2, PERMISSION_OWNER).unwrap();
        remove_user(&mut ws, 1, 2, 0).unwrap();
        assert_eq!(remove_user(&mut ws, 1, 2, 0), Err(CoreError::InactiveUser));
    }

    #[test]
    fn change_permission_rules() {
        let mut ws = seeded();
        assert_eq!(
            change_permission(&mut ws, 2, 1, PERMISSION_MEMBER),
            Err(CoreError::NotGlobalOwner)
        );
        assert_eq!(
            change_permission(&mut ws, 1, 2, 7),
            Err(CoreError::InvalidPermission)
        );
        assert_eq!(
            change_permission(&mut ws, 1, 2, PERMISSION_MEMBER),
            Err(CoreError::AlreadyHasPermission)
        );
        assert_eq!(
            change_permission(&mut ws, 1, 1, PERMISSION_MEMBER),
            Err(CoreError::SoleGlobalOwner)
        );

        change_permission(&mut ws, 1, 2, PERMISSION_OWNER).unwrap();
        let user = ws.user(2).unwrap();
        assert_eq!(user.permission, PERMISSION_OWNER);
        assert!(user.global_owner);

        // With two owners the demotion goes through.
        change_permission(&mut ws, 2, 1, PERMISSION_MEMBER).unwrap();
        assert!(!ws.user(1).unwrap().global_owner);
    }
}
