pub mod admin;
pub mod auth;
pub mod channels;
pub mod dms;
pub mod messages;
pub mod misc;
pub mod standups;
pub mod users;
