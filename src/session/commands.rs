//! Caller commands for the delivery thread.
//!
//! Each command carries its own reply channel; [`SessionHandle`] methods
//! send a command and block on the reply.
//!
//! [`SessionHandle`]: super::SessionHandle

use std::time::Instant;

use crossbeam_channel::Sender;

use crate::anchors::AnchorRecord;
use crate::cloud::CloudStatus;
use crate::core::{AnchorId, RequestId, RoomCode, ScreenPoint, Transform, Vec3};
use crate::error::Result;
use crate::mesh::FaceMatch;

/// Reply channel for a command
pub type Reply<T> = Sender<Result<T>>;

/// Callback run on the delivery thread with a lookup result
pub type FaceCallback = Box<dyn FnOnce(FaceMatch) + Send>;

/// Plane diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PlaneStats {
    pub records: usize,
    pub visuals: usize,
    pub visualization_enabled: bool,
}

/// Commands handled by the delivery thread
pub enum SessionCommand {
    HostAnchor {
        transform: Transform,
        reply: Reply<RequestId>,
    },
    ResolveAnchor {
        code: RoomCode,
        reply: Reply<RequestId>,
    },
    ResetCloud {
        reply: Reply<()>,
    },
    BeginRoomCreation {
        reply: Reply<()>,
    },
    RoomReady {
        reply: Reply<()>,
    },
    BeginRoomCodeEntry {
        reply: Reply<()>,
    },
    /// Replied once the anchor attaches, times out or is superseded.
    /// `deadline` is set by the caller when it starts waiting.
    AddNamedAnchor {
        name: String,
        transform: Transform,
        deadline: Instant,
        reply: Reply<AnchorId>,
    },
    RemoveNamedAnchor {
        name: String,
        reply: Reply<()>,
    },
    SetNamedAnchorTransform {
        name: String,
        transform: Transform,
        reply: Reply<()>,
    },
    NamedAnchor {
        name: String,
        reply: Reply<Option<AnchorRecord>>,
    },
    NamedAnchors {
        reply: Reply<Vec<String>>,
    },
    SetPlaneVisualization {
        enabled: bool,
        reply: Reply<()>,
    },
    NearestClassifiedFace {
        point: Vec3,
        callback: FaceCallback,
    },
    ClassifyScreenPoint {
        point: ScreenPoint,
        callback: FaceCallback,
    },
    CloudStatus {
        reply: Reply<CloudStatus>,
    },
    PlaneStats {
        reply: Reply<PlaneStats>,
    },
    ResetSession {
        reply: Reply<()>,
    },
}

impl SessionCommand {
    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::HostAnchor { .. } => "HostAnchor",
            SessionCommand::ResolveAnchor { .. } => "ResolveAnchor",
            SessionCommand::ResetCloud { .. } => "ResetCloud",
            SessionCommand::BeginRoomCreation { .. } => "BeginRoomCreation",
            SessionCommand::RoomReady { .. } => "RoomReady",
            SessionCommand::BeginRoomCodeEntry { .. } => "BeginRoomCodeEntry",
            SessionCommand::AddNamedAnchor { .. } => "AddNamedAnchor",
            SessionCommand::RemoveNamedAnchor { .. } => "RemoveNamedAnchor",
            SessionCommand::SetNamedAnchorTransform { .. } => "SetNamedAnchorTransform",
            SessionCommand::NamedAnchor { .. } => "NamedAnchor",
            SessionCommand::NamedAnchors { .. } => "NamedAnchors",
            SessionCommand::SetPlaneVisualization { .. } => "SetPlaneVisualization",
            SessionCommand::NearestClassifiedFace { .. } => "NearestClassifiedFace",
            SessionCommand::ClassifyScreenPoint { .. } => "ClassifyScreenPoint",
            SessionCommand::CloudStatus { .. } => "CloudStatus",
            SessionCommand::PlaneStats { .. } => "PlaneStats",
            SessionCommand::ResetSession { .. } => "ResetSession",
        }
    }
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCommand")
            .field("command", &self.name())
            .field("reply", &"...")
            .finish()
    }
}
