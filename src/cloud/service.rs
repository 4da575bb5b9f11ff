//! Remote anchor-hosting service seam.

use crate::core::{AnchorId, CloudAnchorId, RequestId, Transform};

use super::state::CloudAnchorState;

/// Remote service that stores anchors and resolves them on other devices.
///
/// Every accepted call (returning `Ok`) must eventually produce exactly one
/// terminal [`RemoteEvent`] carrying the same [`RequestId`], published
/// through the session's [`EventSink`](crate::session::EventSink). The event
/// must be published from a thread of the service's own, never from inside
/// these methods.
pub trait AnchorHostingService: Send {
    /// Upload the anchor so it can be shared.
    ///
    /// `Err` means the request was refused up front and no event will follow.
    fn host(
        &mut self,
        request: RequestId,
        anchor: AnchorId,
        transform: Transform,
    ) -> Result<(), CloudAnchorState>;

    /// Look up a hosted anchor by remote id.
    fn resolve(&mut self, request: RequestId, cloud_id: &CloudAnchorId)
    -> Result<(), CloudAnchorState>;

    /// Release whatever the service holds for `request`. Late completions
    /// may still arrive.
    fn cancel(&mut self, request: RequestId);
}

/// Successful resolve payload
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAnchor {
    pub cloud_id: CloudAnchorId,
    /// Pose of the anchor in this device's session space
    pub transform: Transform,
}

/// Terminal result of a host or resolve request
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteEvent {
    Hosted {
        request: RequestId,
        outcome: Result<CloudAnchorId, CloudAnchorState>,
    },
    Resolved {
        request: RequestId,
        outcome: Result<ResolvedAnchor, CloudAnchorState>,
    },
}

impl RemoteEvent {
    /// Request this event completes
    pub fn request(&self) -> RequestId {
        match self {
            RemoteEvent::Hosted { request, .. } | RemoteEvent::Resolved { request, .. } => *request,
        }
    }
}
