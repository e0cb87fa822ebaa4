use thiserror::Error;

/// Which of the two user-visible failure classes an error belongs to.
///
/// Authorization failures cover invalid/absent sessions and insufficient
/// permission or ownership; everything else (bad ids, bad lengths, invalid
/// state transitions) is a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Authorization,
    Validation,
}

/// Errors produced by the domain engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    // -- sessions / identity --
    #[error("invalid session token")]
    InvalidToken,

    #[error("user id does not refer to a registered user")]
    UserNotFound,

    #[error("user account has been removed")]
    InactiveUser,

    #[error("email address is not valid")]
    EmailInvalid,

    #[error("email address is already in use")]
    EmailTaken,

    #[error("email address does not belong to a user")]
    EmailUnknown,

    #[error("password is incorrect")]
    WrongPassword,

    #[error("password must be between 6 and 200 characters")]
    PasswordLength,

    #[error("names must be between 1 and 50 characters")]
    NameLength,

    #[error("handle must be between 3 and 20 characters")]
    HandleLength,

    #[error("handle must be alphanumeric")]
    HandleNotAlphanumeric,

    #[error("handle is already taken")]
    HandleTaken,

    // -- channels & membership --
    #[error("channel id does not refer to an existing channel")]
    ChannelNotFound,

    #[error("channel name must be between 1 and 20 characters")]
    ChannelNameLength,

    #[error("user is already a member")]
    AlreadyMember,

    #[error("user is not a member of the channel")]
    NotChannelMember,

    #[error("user is not a member")]
    TargetNotMember,

    #[error("channel is private and user is not a global owner")]
    PrivateChannel,

    #[error("user is already an owner")]
    AlreadyOwner,

    #[error("user is not an owner")]
    TargetNotOwner,

    #[error("user is the only owner left in the channel")]
    LastOwner,

    #[error("user does not have owner permissions")]
    NoOwnerPermission,

    #[error("the starter of an active standup cannot leave the channel")]
    StandupStarterCannotLeave,

    // -- dms --
    #[error("dm id does not refer to an existing dm")]
    DmNotFound,

    #[error("user is not a member of the dm")]
    NotDmMember,

    #[error("user is not the creator of the dm")]
    NotDmCreator,

    #[error("duplicate user ids supplied")]
    DuplicateUids,

    // -- messages --
    #[error("invalid message id")]
    MessageNotFound,

    #[error("message must be between 1 and 1000 characters")]
    MessageLength,

    #[error("start is greater than the number of messages")]
    StartTooLarge,

    #[error("user does not have permission to modify the message")]
    NotMessageAuthor,

    #[error("invalid react id")]
    InvalidReactId,

    #[error("user already reacted to the message")]
    AlreadyReacted,

    #[error("user has not reacted to the message")]
    NotReacted,

    #[error("message is already pinned")]
    AlreadyPinned,

    #[error("message is not pinned")]
    NotPinned,

    #[error("send time cannot be in the past")]
    TimeInPast,

    #[error("exactly one share target must be specified")]
    ShareTargetInvalid,

    // -- admin --
    #[error("permission id is not valid")]
    InvalidPermission,

    #[error("user already has that permission level")]
    AlreadyHasPermission,

    #[error("user is the only global owner")]
    SoleGlobalOwner,

    #[error("user is not a global owner")]
    NotGlobalOwner,

    // -- standups --
    #[error("standup duration cannot be negative")]
    StandupLength,

    #[error("a standup is already in progress")]
    StandupAlreadyActive,

    #[error("no standup is in progress")]
    StandupNotActive,
}

impl CoreError {
    /// Map the error onto the two failure classes the HTTP surface exposes.
    pub fn class(&self) -> ErrorClass {
        use CoreError::*;
        match self {
            InvalidToken | InactiveUser | NotChannelMember | PrivateChannel
            | NoOwnerPermission | NotDmMember | NotDmCreator | NotMessageAuthor
            | NotGlobalOwner => ErrorClass::Authorization,
            _ => ErrorClass::Validation,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;
