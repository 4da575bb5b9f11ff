//! Cloud anchor host/resolve state machine.
//!
//! The coordinator drives one host or resolve request at a time against the
//! [`AnchorHostingService`] and keeps the local tracking anchor for it in the
//! [`AnchorTable`]'s shared slot. Remote completions are matched against the
//! current [`RequestId`]; anything else is stale and dropped.

use std::sync::Arc;

use crate::anchors::{AnchorRecord, AnchorTable, CloudBinding, RemoteState};
use crate::core::{AnchorId, CloudAnchorId, RequestId, RoomCode, Transform};
use crate::error::{Result, SthanaError};
use crate::session::TrackingSession;

use super::room::RoomCodec;
use super::service::{AnchorHostingService, RemoteEvent, ResolvedAnchor};
use super::state::{CloudAction, CloudAnchorState, CloudState};

/// Name of the shared anchor record
pub const SHARED_ANCHOR_NAME: &str = "cloud-anchor";

/// Snapshot of the coordinator for callers
#[derive(Clone, Debug, PartialEq)]
pub struct CloudStatus {
    pub state: CloudState,
    /// Request in flight or last completed
    pub request: Option<RequestId>,
    /// Code to share after a successful host
    pub room_code: Option<RoomCode>,
    /// Remote id being resolved, or retained after success
    pub cloud_id: Option<CloudAnchorId>,
    /// Last remote result
    pub last_remote_state: CloudAnchorState,
    /// Local tracking anchor in the shared slot
    pub shared_anchor: Option<AnchorId>,
}

impl CloudStatus {
    /// Human readable reason when the last remote call failed
    pub fn failure_reason(&self) -> Option<&'static str> {
        self.last_remote_state
            .is_error()
            .then(|| self.last_remote_state.failure_reason())
    }
}

/// Host/resolve state machine
pub struct CloudAnchorCoordinator {
    state: CloudState,
    service: Box<dyn AnchorHostingService>,
    codec: Arc<dyn RoomCodec>,
    generation: u64,
    current: Option<RequestId>,
    cloud_id: Option<CloudAnchorId>,
    room_code: Option<RoomCode>,
    last_remote_state: CloudAnchorState,
}

impl CloudAnchorCoordinator {
    /// Create an idle coordinator
    pub fn new(service: Box<dyn AnchorHostingService>, codec: Arc<dyn RoomCodec>) -> Self {
        Self {
            state: CloudState::Default,
            service,
            codec,
            generation: 0,
            current: None,
            cloud_id: None,
            room_code: None,
            last_remote_state: CloudAnchorState::None,
        }
    }

    /// Current state
    pub fn state(&self) -> CloudState {
        self.state
    }

    /// Request whose completion is awaited (or last completed)
    pub fn current_request(&self) -> Option<RequestId> {
        self.current
    }

    /// Snapshot for callers
    pub fn status(&self, table: &AnchorTable) -> CloudStatus {
        CloudStatus {
            state: self.state,
            request: self.current,
            room_code: self.room_code.clone(),
            cloud_id: self.cloud_id.clone(),
            last_remote_state: self.last_remote_state,
            shared_anchor: table.shared().map(|r| r.anchor),
        }
    }

    fn next_request(&mut self) -> RequestId {
        self.generation += 1;
        RequestId(self.generation)
    }

    fn set_state(&mut self, state: CloudState) {
        if self.state != state {
            log::info!("[Cloud] {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Common gate for host/resolve: reject while busy, allow `allowed`
    /// states and finished states (which reset first).
    fn check_start(&self, action: CloudAction, allowed: &[CloudState]) -> Result<()> {
        if self.state.is_busy() {
            return Err(SthanaError::OperationInProgress(self.state));
        }
        if allowed.contains(&self.state) || self.state.is_finished() {
            Ok(())
        } else {
            Err(SthanaError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    /// Create a shared anchor at `transform` and host it.
    pub fn host_anchor(
        &mut self,
        transform: Transform,
        table: &mut AnchorTable,
        tracking: &dyn TrackingSession,
    ) -> Result<RequestId> {
        self.check_start(
            CloudAction::HostAnchor,
            &[CloudState::Default, CloudState::RoomCreated],
        )?;
        if self.state.is_finished() {
            self.reset(table, tracking);
        }

        let anchor = tracking.add_anchor(transform);
        let record = AnchorRecord::new(SHARED_ANCHOR_NAME, transform, anchor).with_cloud(
            CloudBinding {
                cloud_id: None,
                state: RemoteState::InProgress,
            },
        );
        table.install_shared(record, tracking);

        let request = self.next_request();
        if let Err(rejected) = self.service.host(request, anchor, transform) {
            log::warn!(
                "[Cloud] Host {} rejected: {}",
                request,
                rejected.failure_reason()
            );
            table.remove_shared(tracking);
            self.last_remote_state = rejected;
            return Err(SthanaError::RemoteRejected(rejected));
        }

        log::info!("[Cloud] Hosting {} as {}", anchor, request);
        self.current = Some(request);
        self.last_remote_state = CloudAnchorState::TaskInProgress;
        self.set_state(CloudState::Hosting);
        Ok(request)
    }

    /// Resolve the anchor behind a room code.
    pub fn resolve_anchor(
        &mut self,
        code: &RoomCode,
        table: &mut AnchorTable,
        tracking: &dyn TrackingSession,
    ) -> Result<RequestId> {
        self.check_start(
            CloudAction::ResolveAnchor,
            &[CloudState::Default, CloudState::EnterRoomCode],
        )?;
        let cloud_id = self
            .codec
            .decode(code)
            .ok_or_else(|| SthanaError::InvalidRoomCode(code.to_string()))?;
        if self.state.is_finished() {
            self.reset(table, tracking);
        }

        let request = self.next_request();
        if let Err(rejected) = self.service.resolve(request, &cloud_id) {
            log::warn!(
                "[Cloud] Resolve {} rejected: {}",
                request,
                rejected.failure_reason()
            );
            self.last_remote_state = rejected;
            return Err(SthanaError::RemoteRejected(rejected));
        }

        log::info!("[Cloud] Resolving room {} ({}) as {}", code, cloud_id, request);
        self.current = Some(request);
        self.cloud_id = Some(cloud_id);
        self.room_code = Some(code.clone());
        self.last_remote_state = CloudAnchorState::TaskInProgress;
        self.set_state(CloudState::Resolving);
        Ok(request)
    }

    /// Apply a remote completion. Stale and duplicate completions are
    /// ignored.
    pub fn on_remote(
        &mut self,
        event: RemoteEvent,
        table: &mut AnchorTable,
        tracking: &dyn TrackingSession,
    ) {
        let request = event.request();
        let expected = match &event {
            RemoteEvent::Hosted { .. } => CloudState::Hosting,
            RemoteEvent::Resolved { .. } => CloudState::Resolving,
        };
        if self.current != Some(request) || self.state != expected {
            log::debug!(
                "[Cloud] Ignoring stale completion for {} (current {:?}, state {})",
                request,
                self.current,
                self.state
            );
            return;
        }

        match event {
            RemoteEvent::Hosted { outcome, .. } => self.finish_host(outcome, table),
            RemoteEvent::Resolved { outcome, .. } => self.finish_resolve(outcome, table, tracking),
        }
    }

    fn finish_host(
        &mut self,
        outcome: std::result::Result<CloudAnchorId, CloudAnchorState>,
        table: &mut AnchorTable,
    ) {
        match outcome {
            Ok(cloud_id) => {
                let code = self.codec.encode(&cloud_id);
                log::info!("[Cloud] Hosted {} with room code {}", cloud_id, code);
                if let Some(binding) = table.shared_mut().and_then(|r| r.cloud.as_mut()) {
                    binding.cloud_id = Some(cloud_id.clone());
                    binding.state = RemoteState::Hosted;
                }
                self.cloud_id = Some(cloud_id);
                self.room_code = Some(code);
                self.last_remote_state = CloudAnchorState::Success;
            }
            Err(failure) => {
                let failure = Self::terminal_failure(failure);
                log::warn!("[Cloud] Hosting failed: {}", failure.failure_reason());
                if let Some(binding) = table.shared_mut().and_then(|r| r.cloud.as_mut()) {
                    binding.state = RemoteState::Error(failure);
                }
                self.last_remote_state = failure;
            }
        }
        self.set_state(CloudState::HostingFinished);
    }

    fn finish_resolve(
        &mut self,
        outcome: std::result::Result<ResolvedAnchor, CloudAnchorState>,
        table: &mut AnchorTable,
        tracking: &dyn TrackingSession,
    ) {
        match outcome {
            Ok(resolved) => {
                let anchor = tracking.add_anchor(resolved.transform);
                log::info!("[Cloud] Resolved {} as {}", resolved.cloud_id, anchor);
                let record = AnchorRecord::new(SHARED_ANCHOR_NAME, resolved.transform, anchor)
                    .with_cloud(CloudBinding {
                        cloud_id: Some(resolved.cloud_id.clone()),
                        state: RemoteState::Resolved,
                    });
                table.install_shared(record, tracking);
                self.cloud_id = Some(resolved.cloud_id);
                self.last_remote_state = CloudAnchorState::Success;
            }
            Err(failure) => {
                let failure = Self::terminal_failure(failure);
                log::warn!("[Cloud] Resolving failed: {}", failure.failure_reason());
                self.last_remote_state = failure;
            }
        }
        self.set_state(CloudState::ResolvingFinished);
    }

    /// `TaskInProgress` is not a terminal result; record it as internal.
    fn terminal_failure(state: CloudAnchorState) -> CloudAnchorState {
        if state == CloudAnchorState::TaskInProgress {
            log::error!("[Cloud] Terminal callback reported task in progress");
            CloudAnchorState::ErrorInternal
        } else {
            state
        }
    }

    /// Return to `Default`: remove the shared anchor, release remote
    /// handles. In-flight work is left to complete and is ignored.
    pub fn reset(&mut self, table: &mut AnchorTable, tracking: &dyn TrackingSession) {
        if let Some(record) = table.remove_shared(tracking) {
            log::debug!("[Cloud] Removed shared anchor {}", record.anchor);
        }
        if let Some(request) = self.current.take() {
            self.service.cancel(request);
        }
        self.cloud_id = None;
        self.room_code = None;
        self.last_remote_state = CloudAnchorState::None;
        self.set_state(CloudState::Default);
    }

    /// `Default -> CreatingRoom`
    pub fn begin_room_creation(&mut self) -> Result<()> {
        self.transition(CloudAction::CreateRoom, CloudState::Default, CloudState::CreatingRoom)
    }

    /// `CreatingRoom -> RoomCreated`
    pub fn room_ready(&mut self) -> Result<()> {
        self.transition(
            CloudAction::RoomReady,
            CloudState::CreatingRoom,
            CloudState::RoomCreated,
        )
    }

    /// `Default -> EnterRoomCode`
    pub fn begin_room_code_entry(&mut self) -> Result<()> {
        self.transition(
            CloudAction::EnterRoomCode,
            CloudState::Default,
            CloudState::EnterRoomCode,
        )
    }

    fn transition(&mut self, action: CloudAction, from: CloudState, to: CloudState) -> Result<()> {
        if self.state != from {
            return Err(SthanaError::InvalidTransition {
                state: self.state,
                action,
            });
        }
        self.set_state(to);
        Ok(())
    }
}
