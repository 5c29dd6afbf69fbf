//! Error types shared by the game kinds, the relay and the orchestrator

use crate::types::{ParticipantId, RoomId};

/// Result type for pure room transitions
pub type RoomResult<T> = Result<T, RoomError>;

/// Errors returned by `derive`/`apply` functions. Never fatal: callers turn
/// them into an error frame or an idle view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Permission denied: {0}")]
    PermissionError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    InvalidStateError(String),

    #[error("Payload decoding failed: {0}")]
    DecodeError(String),
}

impl RoomError {
    /// Stable wire code for error frames
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::PermissionError(_) => "PERMISSION_DENIED",
            RoomError::ValidationError(_) => "VALIDATION_FAILED",
            RoomError::InvalidStateError(_) => "INVALID_STATE",
            RoomError::DecodeError(_) => "DECODE_FAILED",
        }
    }
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Store-level failures of the relay channel
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Room version conflict (expected {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Room is full ({0} participants)")]
    RoomFull(usize),
}

impl RelayError {
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            RelayError::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            RelayError::VersionConflict { .. } => "VERSION_CONFLICT",
            RelayError::RoomFull(_) => "ROOM_FULL",
        }
    }
}

/// Anything that can go wrong routing an action to a write
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ActionError {
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::Room(e) => e.code(),
            ActionError::Relay(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            RoomError::PermissionError("x".into()).code(),
            "PERMISSION_DENIED"
        );
        assert_eq!(RoomError::DecodeError("x".into()).code(), "DECODE_FAILED");
        let wrapped: ActionError = RelayError::VersionConflict {
            expected: 2,
            actual: 3,
        }
        .into();
        assert_eq!(wrapped.code(), "VERSION_CONFLICT");
        assert_eq!(
            wrapped.to_string(),
            "Room version conflict (expected 2, found 3)"
        );
    }
}
