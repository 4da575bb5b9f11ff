//! Caller-side handle to a running session.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, bounded};

use crate::anchors::AnchorRecord;
use crate::cloud::CloudStatus;
use crate::config::SthanaConfig;
use crate::core::{AnchorId, RequestId, RoomCode, ScreenPoint, Transform, Vec3};
use crate::error::{Result, SthanaError};
use crate::mesh::FaceMatch;

use super::commands::{PlaneStats, Reply, SessionCommand};
use super::events::{EventSink, SessionEvent};

/// Handle returned by [`SessionRuntime::spawn`](super::SessionRuntime::spawn).
///
/// Every method sends a command to the delivery thread and blocks until it
/// replies. Lookup callbacks run on the delivery thread and must not call
/// back into the handle.
pub struct SessionHandle {
    sink: EventSink,
    delivery: Option<JoinHandle<()>>,
    command_timeout: Duration,
    attach_budget: Duration,
    reply_slack: Duration,
}

impl SessionHandle {
    pub(crate) fn new(sink: EventSink, delivery: JoinHandle<()>, config: &SthanaConfig) -> Self {
        Self {
            sink,
            delivery: Some(delivery),
            command_timeout: config.session.command_timeout(),
            attach_budget: config.anchors.attach_budget(),
            reply_slack: config.session.reply_slack(),
        }
    }

    /// Publishing end of the session queue, for collaborators wired later
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    fn request<T>(
        &self,
        until: Instant,
        make: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T> {
        let (tx, rx) = bounded(1);
        let command = make(tx);
        let name = command.name();
        if !self.sink.command(command) {
            return Err(SthanaError::SessionClosed);
        }
        match rx.recv_deadline(until) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SthanaError::ReplyTimeout(name.to_string())),
            Err(RecvTimeoutError::Disconnected) => Err(SthanaError::SessionClosed),
        }
    }

    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> SessionCommand) -> Result<T> {
        self.request(Instant::now() + self.command_timeout, make)
    }

    // ------------------------------------------------------------------
    // Cloud anchors
    // ------------------------------------------------------------------

    /// Create the shared anchor at `transform` and start hosting it.
    ///
    /// Returns once the request is issued; watch [`cloud_status`](Self::cloud_status)
    /// for the result.
    pub fn host_anchor(&self, transform: Transform) -> Result<RequestId> {
        self.call(|reply| SessionCommand::HostAnchor { transform, reply })
    }

    /// Start resolving the anchor behind `code`.
    pub fn resolve_anchor(&self, code: &RoomCode) -> Result<RequestId> {
        let code = code.clone();
        self.call(|reply| SessionCommand::ResolveAnchor { code, reply })
    }

    /// Return the cloud coordinator to its idle state.
    pub fn reset(&self) -> Result<()> {
        self.call(|reply| SessionCommand::ResetCloud { reply })
    }

    /// Start the room creation flow
    pub fn begin_room_creation(&self) -> Result<()> {
        self.call(|reply| SessionCommand::BeginRoomCreation { reply })
    }

    /// Room is ready to host into
    pub fn room_ready(&self) -> Result<()> {
        self.call(|reply| SessionCommand::RoomReady { reply })
    }

    /// Start the room code entry flow
    pub fn begin_room_code_entry(&self) -> Result<()> {
        self.call(|reply| SessionCommand::BeginRoomCodeEntry { reply })
    }

    /// Coordinator snapshot
    pub fn cloud_status(&self) -> Result<CloudStatus> {
        self.call(|reply| SessionCommand::CloudStatus { reply })
    }

    // ------------------------------------------------------------------
    // Named anchors
    // ------------------------------------------------------------------

    /// Add (or replace) a named anchor and wait until it is attached.
    ///
    /// The attach budget runs from this call, not from when the delivery
    /// thread reaches the command. An add that reaches it late fails with
    /// `AttachTimeout` and leaves nothing behind.
    pub fn add_named_anchor(&self, name: &str, transform: Transform) -> Result<AnchorId> {
        let name = name.to_string();
        let deadline = Instant::now() + self.attach_budget;
        self.request(deadline + self.reply_slack, |reply| {
            SessionCommand::AddNamedAnchor {
                name,
                transform,
                deadline,
                reply,
            }
        })
    }

    /// Remove a named anchor. Absent names are ignored.
    pub fn remove_named_anchor(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.call(|reply| SessionCommand::RemoveNamedAnchor { name, reply })
    }

    /// Re-pose a named anchor
    pub fn set_named_anchor_transform(&self, name: &str, transform: Transform) -> Result<()> {
        let name = name.to_string();
        self.call(|reply| SessionCommand::SetNamedAnchorTransform {
            name,
            transform,
            reply,
        })
    }

    /// Look up a named anchor
    pub fn named_anchor(&self, name: &str) -> Result<Option<AnchorRecord>> {
        let name = name.to_string();
        self.call(|reply| SessionCommand::NamedAnchor { name, reply })
    }

    /// All named anchors, sorted
    pub fn named_anchors(&self) -> Result<Vec<String>> {
        self.call(|reply| SessionCommand::NamedAnchors { reply })
    }

    // ------------------------------------------------------------------
    // Planes
    // ------------------------------------------------------------------

    /// Show or hide plane overlays
    pub fn set_plane_visualization_enabled(&self, enabled: bool) -> Result<()> {
        self.call(|reply| SessionCommand::SetPlaneVisualization { enabled, reply })
    }

    /// Number of tracked planes
    pub fn plane_count(&self) -> Result<usize> {
        self.plane_stats().map(|stats| stats.records)
    }

    /// Plane record and overlay counts
    pub fn plane_stats(&self) -> Result<PlaneStats> {
        self.call(|reply| SessionCommand::PlaneStats { reply })
    }

    // ------------------------------------------------------------------
    // Mesh lookup
    // ------------------------------------------------------------------

    /// Look up the classified face near `point`; `callback` runs on the
    /// delivery thread with the result.
    pub fn nearest_classified_face<F>(&self, point: Vec3, callback: F) -> Result<()>
    where
        F: FnOnce(FaceMatch) + Send + 'static,
    {
        let command = SessionCommand::NearestClassifiedFace {
            point,
            callback: Box::new(callback),
        };
        if self.sink.command(command) {
            Ok(())
        } else {
            Err(SthanaError::SessionClosed)
        }
    }

    /// Raycast a screen point and look up the classified face at the hit.
    /// A miss reports [`FaceMatch::NOT_FOUND`].
    pub fn classify_screen_point<F>(&self, point: ScreenPoint, callback: F) -> Result<()>
    where
        F: FnOnce(FaceMatch) + Send + 'static,
    {
        let command = SessionCommand::ClassifyScreenPoint {
            point,
            callback: Box::new(callback),
        };
        if self.sink.command(command) {
            Ok(())
        } else {
            Err(SthanaError::SessionClosed)
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Drop all anchors, planes and cloud state and restart tracking.
    pub fn reset_session(&self) -> Result<()> {
        self.call(|reply| SessionCommand::ResetSession { reply })
    }

    /// Stop the delivery and search threads and wait for them.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(delivery) = self.delivery.take() else {
            return Ok(());
        };
        self.sink.publish(SessionEvent::Shutdown);
        delivery.join().map_err(|_| {
            log::error!("[Session] Delivery thread panicked");
            SthanaError::SessionClosed
        })
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.stop().is_err() {
            log::warn!("[Session] Delivery thread did not stop cleanly");
        }
    }
}
