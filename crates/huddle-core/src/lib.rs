//! # huddle-core
//!
//! Domain engine for the Huddle workspace backend: channels, dms, messages,
//! reactions, notifications and moderation over a single in-memory snapshot.
//!
//! The engine owns no I/O. Every operation takes `&mut Workspace` (plus the
//! current unix time where it matters), validates, mutates in place and
//! returns a typed result; persistence and HTTP live in the `huddle-store`
//! and `huddle-server` crates. Operations keep the cross-entity invariants
//! intact: membership sets stay duplicate-free, channel owners stay members,
//! a populated channel keeps at least one owner, and message ids are never
//! reused.

pub mod admin;
pub mod auth;
pub mod ids;
pub mod membership;
pub mod message;
pub mod model;
pub mod notifications;
pub mod standup;
pub mod user;

mod error;
mod stats;

pub use error::{CoreError, ErrorClass, Result};
pub use model::Workspace;
