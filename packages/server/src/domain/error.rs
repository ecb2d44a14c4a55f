//! Domain layer error definitions.

use thiserror::Error;

use super::entity::ConnectionState;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    #[error("UserId cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    /// Only ASCII letters, digits and `-` are allowed; `_` separates ids in a room key
    #[error("UserId contains invalid character {0:?}")]
    UserIdInvalidCharacter(char),

    #[error("ChatRoomKey cannot be empty")]
    ChatRoomKeyEmpty,

    #[error("ChatRoomKey cannot exceed {max} characters (got {actual})")]
    ChatRoomKeyTooLong { max: usize, actual: usize },

    #[error("MessageBody cannot be empty")]
    MessageBodyEmpty,

    #[error("MessageBody cannot exceed {max} bytes (got {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },

    /// Role string was neither `patient` nor `staff`
    #[error("unknown role: {0}")]
    RoleUnknown(String),
}

/// Errors raised while resolving a chat room for a connecting endpoint
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("patient not found: {0}")]
    PatientNotFound(String),
}

/// Errors raised by the connection state machine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid connection transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// Errors reported by external collaborators (persistence, classification, notification)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator rejected request: {0}")]
    Rejected(String),
}
