//! Identity registry: registration, login, logout and session resolution.
//!
//! Session tokens are opaque strings; nothing in the engine inspects their
//! internals, it only matches them against the per-user active-token sets.

use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::model::{limits, User, UserStats, Workspace, PERMISSION_MEMBER, PERMISSION_OWNER};

/// A freshly issued session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub auth_user_id: i64,
    pub token: String,
}

/// Digest a password for storage. The digest algorithm is an implementation
/// detail of this module; callers only ever see the hex string.
fn hash_password(password: &str) -> String {
    hex::encode(blake3::hash(password.as_bytes()).as_bytes())
}

/// Structural email check: `local@domain.tld`, no whitespace.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Lowercased alphanumeric base handle, cut to the handle limit.
fn base_handle(name_first: &str, name_last: &str) -> String {
    let mut handle: String = format!("{name_first}{name_last}")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    handle.truncate(limits::MAX_HANDLE);
    handle
}

/// De-duplicate a base handle against every active user's display handle by
/// appending the smallest free integer suffix (starting at 0). The suffixed
/// form may exceed the base-handle length limit.
fn dedupe_handle(ws: &Workspace, base: &str) -> (String, i64) {
    if ws.user_by_handle(base).is_none() {
        return (base.to_string(), -1);
    }
    let mut suffix = 0i64;
    loop {
        let candidate = format!("{base}{suffix}");
        if ws.user_by_handle(&candidate).is_none() {
            return (candidate, suffix);
        }
        suffix += 1;
    }
}

/// Register a new account and open its first session.
///
/// The first account registered in the workspace receives the global-owner
/// permission level.
pub fn register(
    ws: &mut Workspace,
    email: &str,
    password: &str,
    name_first: &str,
    name_last: &str,
    now: i64,
) -> Result<AuthSession> {
    if ws.emails.iter().any(|e| e == email) {
        return Err(CoreError::EmailTaken);
    }
    if password.len() < limits::MIN_PASSWORD || password.len() > limits::MAX_PASSWORD {
        return Err(CoreError::PasswordLength);
    }
    if name_first.is_empty() || name_first.chars().count() > limits::MAX_NAME {
        return Err(CoreError::NameLength);
    }
    if name_last.is_empty() || name_last.chars().count() > limits::MAX_NAME {
        return Err(CoreError::NameLength);
    }
    if !is_valid_email(email) {
        return Err(CoreError::EmailInvalid);
    }

    let permission = if ws.users.is_empty() {
        PERMISSION_OWNER
    } else {
        PERMISSION_MEMBER
    };
    let u_id = ws.users.last().map_or(1, |u| u.u_id + 1);

    let handle = base_handle(name_first, name_last);
    let (handle_display, handle_suffix) = dedupe_handle(ws, &handle);

    let token = Uuid::new_v4().to_string();

    let user = User {
        u_id,
        email: email.to_string(),
        name_first: name_first.to_string(),
        name_last: name_last.to_string(),
        handle,
        handle_display,
        handle_suffix,
        password_hash: hash_password(password),
        permission,
        global_owner: permission == PERMISSION_OWNER,
        active_tokens: vec![token.clone()],
        channel_ids: Vec::new(),
        owned_channel_ids: Vec::new(),
        dm_ids: Vec::new(),
        owned_dm_ids: Vec::new(),
        notifications: Vec::new(),
        is_active: true,
        stats: UserStats::seeded(now),
    };

    ws.emails.push(email.to_string());
    ws.users.push(user);

    Ok(AuthSession {
        auth_user_id: u_id,
        token,
    })
}

/// Open a new session for an existing account.
pub fn login(ws: &mut Workspace, email: &str, password: &str) -> Result<AuthSession> {
    let digest = hash_password(password);
    let user = ws
        .users
        .iter_mut()
        .find(|u| u.is_active && u.email == email)
        .ok_or(CoreError::EmailUnknown)?;
    if user.password_hash != digest {
        return Err(CoreError::WrongPassword);
    }

    let token = Uuid::new_v4().to_string();
    user.active_tokens.push(token.clone());

    Ok(AuthSession {
        auth_user_id: user.u_id,
        token,
    })
}

/// Invalidate one session token.
pub fn logout(ws: &mut Workspace, token: &str) -> Result<()> {
    let uid = resolve_token(ws, token)?;
    let user = ws.user_mut(uid).ok_or(CoreError::InvalidToken)?;
    user.active_tokens.retain(|t| t != token);
    Ok(())
}

/// Map an opaque credential onto a user identity.
pub fn resolve_token(ws: &Workspace, token: &str) -> Result<i64> {
    ws.users
        .iter()
        .find(|u| u.active_tokens.iter().any(|t| t == token))
        .map(|u| u.u_id)
        .ok_or(CoreError::InvalidToken)
}
