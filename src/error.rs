//! Error types for Sthana

use thiserror::Error;

use crate::cloud::{CloudAction, CloudAnchorState, CloudState};

/// Sthana error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SthanaError {
    /// The tracking subsystem never reported the anchor as attached.
    #[error("Anchor '{name}' was not attached within {waited_ms}ms")]
    AttachTimeout {
        /// Anchor name
        name: String,
        /// Total wait budget in milliseconds
        waited_ms: u64,
    },

    /// A newer `add` for the same name replaced this pending one.
    #[error("Anchor '{0}' was superseded by a newer add")]
    Superseded(String),

    /// The session was reset while the add was waiting for attachment.
    #[error("Attach of anchor '{0}' cancelled by session reset")]
    AttachCancelled(String),

    /// Named anchor does not exist.
    #[error("Unknown anchor: {0}")]
    UnknownAnchor(String),

    /// A host or resolve request is already in flight.
    #[error("Operation in progress (state: {0})")]
    OperationInProgress(CloudState),

    /// The action is not valid from the current state.
    #[error("Cannot {action} from state {state}")]
    InvalidTransition {
        /// Current coordinator state
        state: CloudState,
        /// Rejected action
        action: CloudAction,
    },

    /// The room code does not map to a remote anchor.
    #[error("Invalid room code: {0}")]
    InvalidRoomCode(String),

    /// The remote service refused the request synchronously.
    #[error("Remote service rejected request: {}", .0.failure_reason())]
    RemoteRejected(CloudAnchorState),

    /// The delivery thread did not answer in time.
    #[error("No reply to {0} within the command timeout")]
    ReplyTimeout(String),

    /// The session runtime is gone (shut down or crashed).
    #[error("Session closed")]
    SessionClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for SthanaError {
    fn from(e: toml::de::Error) -> Self {
        SthanaError::Config(e.to_string())
    }
}

impl From<std::io::Error> for SthanaError {
    fn from(e: std::io::Error) -> Self {
        SthanaError::Config(e.to_string())
    }
}

impl SthanaError {
    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AttachTimeout { .. } => "ATTACH_TIMEOUT",
            Self::Superseded(_) => "SUPERSEDED",
            Self::AttachCancelled(_) => "ATTACH_CANCELLED",
            Self::UnknownAnchor(_) => "UNKNOWN_ANCHOR",
            Self::OperationInProgress(_) => "OPERATION_IN_PROGRESS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidRoomCode(_) => "INVALID_ROOM_CODE",
            Self::RemoteRejected(_) => "REMOTE_REJECTED",
            Self::ReplyTimeout(_) => "REPLY_TIMEOUT",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::Config(_) => "CONFIG",
        }
    }
}

pub type Result<T> = std::result::Result<T, SthanaError>;
