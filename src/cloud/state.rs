//! Cloud anchor coordinator states, actions and remote result taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinator state
///
/// ```text
/// Default ───► CreatingRoom ───► RoomCreated ───► Hosting ───► HostingFinished
///    │                                               ▲
///    ├───────────────────────────────────────────────┘
///    │
///    ├───► EnterRoomCode ───► Resolving ───► ResolvingFinished
///    │                           ▲
///    └───────────────────────────┘
///
/// reset(): any ───► Default
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloudState {
    /// Idle
    #[default]
    Default,
    /// User started creating a room
    CreatingRoom,
    /// Room ready for hosting
    RoomCreated,
    /// Host request in flight
    Hosting,
    /// Host request finished (success or failure)
    HostingFinished,
    /// User is entering a room code
    EnterRoomCode,
    /// Resolve request in flight
    Resolving,
    /// Resolve request finished (success or failure)
    ResolvingFinished,
}

impl CloudState {
    /// Get state name for logging and status reports
    pub fn name(&self) -> &'static str {
        match self {
            CloudState::Default => "default",
            CloudState::CreatingRoom => "creatingRoom",
            CloudState::RoomCreated => "roomCreated",
            CloudState::Hosting => "hosting",
            CloudState::HostingFinished => "hostingFinished",
            CloudState::EnterRoomCode => "enterRoomCode",
            CloudState::Resolving => "resolving",
            CloudState::ResolvingFinished => "resolvingFinished",
        }
    }

    /// True while a remote request is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, CloudState::Hosting | CloudState::Resolving)
    }

    /// True once a host or resolve request has completed
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            CloudState::HostingFinished | CloudState::ResolvingFinished
        )
    }
}

impl fmt::Display for CloudState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller action driving a state transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloudAction {
    HostAnchor,
    ResolveAnchor,
    CreateRoom,
    RoomReady,
    EnterRoomCode,
}

impl CloudAction {
    /// Get action name for logging
    pub fn name(&self) -> &'static str {
        match self {
            CloudAction::HostAnchor => "host anchor",
            CloudAction::ResolveAnchor => "resolve anchor",
            CloudAction::CreateRoom => "create room",
            CloudAction::RoomReady => "mark room ready",
            CloudAction::EnterRoomCode => "enter room code",
        }
    }
}

impl fmt::Display for CloudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result state reported by the remote anchor-hosting service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloudAnchorState {
    #[default]
    None,
    Success,
    TaskInProgress,
    ErrorInternal,
    ErrorNotAuthorized,
    ErrorResourceExhausted,
    ErrorHostingDatasetProcessingFailed,
    ErrorCloudIdNotFound,
    ErrorResolvingSdkVersionTooNew,
    ErrorResolvingSdkVersionTooOld,
    ErrorHostingServiceUnavailable,
    ErrorServiceUnavailable,
    ErrorResolvingLocalizationNoMatch,
}

impl CloudAnchorState {
    /// Human readable reason shown to the user
    pub fn failure_reason(&self) -> &'static str {
        match self {
            CloudAnchorState::ErrorCloudIdNotFound => "Cloud anchor id not found",
            CloudAnchorState::ErrorHostingDatasetProcessingFailed => {
                "Dataset processing failed, feature map insufficient"
            }
            CloudAnchorState::ErrorHostingServiceUnavailable => "Hosting service unavailable",
            CloudAnchorState::ErrorInternal => "Internal error",
            CloudAnchorState::ErrorNotAuthorized => "Authentication failed: Not Authorized",
            CloudAnchorState::ErrorResolvingSdkVersionTooNew => "Resolving Sdk version too new",
            CloudAnchorState::ErrorResolvingSdkVersionTooOld => "Resolving Sdk version too old",
            CloudAnchorState::ErrorResourceExhausted => "Resource exhausted",
            CloudAnchorState::None => "Empty state",
            CloudAnchorState::TaskInProgress => "Task in progress",
            CloudAnchorState::Success => "Success",
            CloudAnchorState::ErrorServiceUnavailable => "Cloud Anchor Service unavailable",
            CloudAnchorState::ErrorResolvingLocalizationNoMatch => "No match",
        }
    }

    /// True for every `Error*` variant
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            CloudAnchorState::None | CloudAnchorState::Success | CloudAnchorState::TaskInProgress
        )
    }
}

impl fmt::Display for CloudAnchorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_reason())
    }
}
