//! Profile and directory operations.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::model::{limits, Message, User, Workspace};

/// The externally visible shape of a user record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub u_id: i64,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub handle_str: String,
}

impl Profile {
    pub fn of(user: &User) -> Self {
        Self {
            u_id: user.u_id,
            email: user.email.clone(),
            name_first: user.name_first.clone(),
            name_last: user.name_last.clone(),
            handle_str: user.handle_display.clone(),
        }
    }
}

/// Look up any registered user, including removed ones; historical profile
/// lookups by id stay resolvable.
pub fn user_profile(ws: &Workspace, uid: i64) -> Result<Profile> {
    ws.user(uid).map(Profile::of).ok_or(CoreError::UserNotFound)
}

/// All currently active users.
pub fn users_all(ws: &Workspace) -> Vec<Profile> {
    ws.users
        .iter()
        .filter(|u| u.is_active)
        .map(Profile::of)
        .collect()
}

pub fn set_name(ws: &mut Workspace, uid: i64, name_first: &str, name_last: &str) -> Result<()> {
    if name_first.is_empty() || name_first.chars().count() > limits::MAX_NAME {
        return Err(CoreError::NameLength);
    }
    if name_last.is_empty() || name_last.chars().count() > limits::MAX_NAME {
        return Err(CoreError::NameLength);
    }
    let user = ws.user_mut(uid).ok_or(CoreError::UserNotFound)?;
    user.name_first = name_first.to_string();
    user.name_last = name_last.to_string();
    Ok(())
}

pub fn set_email(ws: &mut Workspace, uid: i64, email: &str) -> Result<()> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.rsplit_once('.').is_some_and(|(h, t)| !h.is_empty() && !t.is_empty())
            && !email.chars().any(char::is_whitespace)
    });
    if !valid {
        return Err(CoreError::EmailInvalid);
    }
    if ws.emails.iter().any(|e| e == email) {
        return Err(CoreError::EmailTaken);
    }

    let old = ws
        .user(uid)
        .map(|u| u.email.clone())
        .ok_or(CoreError::UserNotFound)?;
    if let Some(slot) = ws.emails.iter_mut().find(|e| **e == old) {
        *slot = email.to_string();
    }
    let user = ws.user_mut(uid).ok_or(CoreError::UserNotFound)?;
    user.email = email.to_string();
    Ok(())
}

pub fn set_handle(ws: &mut Workspace, uid: i64, handle: &str) -> Result<()> {
    if handle.len() < limits::MIN_SET_HANDLE || handle.len() > limits::MAX_HANDLE {
        return Err(CoreError::HandleLength);
    }
    if !handle.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::HandleNotAlphanumeric);
    }
    if ws.user_by_handle(handle).is_some() {
        return Err(CoreError::HandleTaken);
    }
    let user = ws.user_mut(uid).ok_or(CoreError::UserNotFound)?;
    user.handle_display = handle.to_string();
    Ok(())
}

/// Case-insensitive substring search over every container the caller is a
/// member of. Returns raw message records, unordered across containers.
pub fn search(ws: &Workspace, uid: i64, query: &str) -> Result<Vec<Message>> {
    if query.is_empty() || query.chars().count() > limits::MAX_MESSAGE {
        return Err(CoreError::MessageLength);
    }
    let needle = query.to_lowercase();
    let user = ws.user(uid).ok_or(CoreError::UserNotFound)?;

    let mut hits = Vec::new();
    for channel_id in &user.channel_ids {
        if let Some(channel) = ws.channel(*channel_id) {
            hits.extend(
                channel
                    .messages
                    .iter()
                    .filter(|m| m.message.to_lowercase().contains(&needle))
                    .cloned(),
            );
        }
    }
    for dm_id in &user.dm_ids {
        if let Some(dm) = ws.dm(*dm_id) {
            hits.extend(
                dm.messages
                    .iter()
                    .filter(|m| m.message.to_lowercase().contains(&needle))
                    .cloned(),
            );
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;

    fn seeded() -> Workspace {
        let mut ws = Workspace::new(0);
        auth::register(&mut ws, "a@example.com", "hunter22", "Ada", "Lovelace", 0).unwrap();
        auth::register(&mut ws, "b@example.com", "hunter22", "Bob", "Byrne", 0).unwrap();
        ws
    }

    #[test]
    fn profile_returns_display_handle() {
        let ws = seeded();
        let profile = user_profile(&ws, 1).unwrap();
        assert_eq!(profile.handle_str, "adalovelace");
        assert_eq!(user_profile(&ws, 99), Err(CoreError::UserNotFound));
    }

    #[test]
    fn set_name_validates_lengths() {
        let mut ws = seeded();
        set_name(&mut ws, 1, "Augusta", "King").unwrap();
        assert_eq!(ws.user(1).unwrap().name_first, "Augusta");
        assert_eq!(
            set_name(&mut ws, 1, "", "King"),
            Err(CoreError::NameLength)
        );
    }

    #[test]
    fn set_email_updates_the_held_registry() {
        let mut ws = seeded();
        set_email(&mut ws, 1, "ada@example.com").unwrap();
        assert!(ws.emails.iter().any(|e| e == "ada@example.com"));
        assert!(!ws.emails.iter().any(|e| e == "a@example.com"));
        assert_eq!(
            set_email(&mut ws, 2, "ada@example.com"),
            Err(CoreError::EmailTaken)
        );
        assert_eq!(set_email(&mut ws, 2, "nope"), Err(CoreError::EmailInvalid));
    }

    #[test]
    fn set_handle_enforces_shape_and_uniqueness() {
        let mut ws = seeded();
        set_handle(&mut ws, 2, "bobbytables").unwrap();
        assert_eq!(ws.user(2).unwrap().handle_display, "bobbytables");
        assert_eq!(set_handle(&mut ws, 2, "ab"), Err(CoreError::HandleLength));
        assert_eq!(
            set_handle(&mut ws, 2, "has spaces"),
            Err(CoreError::HandleNotAlphanumeric)
        );
        assert_eq!(
            set_handle(&mut ws, 2, "adalovelace"),
            Err(CoreError::HandleTaken)
        );
    }

    #[test]
    fn users_all_hides_removed_accounts() {
        let mut ws = seeded();
        ws.user_mut(2).unwrap().is_active = false;
        let all = users_all(&ws);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].u_id, 1);
    }
}
