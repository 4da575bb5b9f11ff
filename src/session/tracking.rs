//! Tracking subsystem abstraction.

use crate::config::{PlaneDetection, SthanaConfig};
use crate::core::{AnchorId, ScreenPoint, Transform, Vec3};
use crate::mesh::MeshAnchor;

/// Options passed to [`TrackingSession::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackingOptions {
    /// Plane alignments to detect
    pub plane_detection: PlaneDetection,
    /// Produce classified mesh anchors
    pub scene_reconstruction: bool,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            plane_detection: PlaneDetection::Horizontal,
            scene_reconstruction: true,
        }
    }
}

impl From<&SthanaConfig> for TrackingOptions {
    fn from(config: &SthanaConfig) -> Self {
        Self {
            plane_detection: config.planes.detection,
            scene_reconstruction: config.mesh.scene_reconstruction,
        }
    }
}

/// Live spatial-tracking session.
///
/// Implement this trait to connect the runtime to a device tracking stack or
/// a simulator. Calls arrive from the delivery thread (and, for
/// [`mesh_anchors`](Self::mesh_anchors), occasionally from callers), so the
/// implementation must be thread-safe.
///
/// Asynchronous notifications (plane changes, anchor attachment, frame
/// ticks) are not returned from these methods. The implementation publishes
/// them through the [`EventSink`](super::EventSink) it was given.
pub trait TrackingSession: Send + Sync {
    /// Start or restart tracking with the given options.
    fn run(&self, options: &TrackingOptions);

    /// Drop all tracking state (anchors, planes, mesh) and start over.
    fn reset(&self);

    /// Create a tracking anchor at `transform`.
    ///
    /// The anchor is live immediately but may only become attached (with a
    /// scene node) some time later.
    fn add_anchor(&self, transform: Transform) -> AnchorId;

    /// Remove a tracking anchor. Unknown ids are ignored.
    fn remove_anchor(&self, anchor: AnchorId);

    /// True once the anchor has a scene node attached.
    fn is_anchor_attached(&self, anchor: AnchorId) -> bool;

    /// Detach all child visual content from the anchor's node.
    fn detach_children(&self, anchor: AnchorId);

    /// Re-pose the anchor's node.
    fn set_node_transform(&self, anchor: AnchorId, transform: Transform);

    /// Snapshot of the current mesh anchors.
    fn mesh_anchors(&self) -> Vec<MeshAnchor>;

    /// Hit-test a screen point against reconstructed geometry.
    ///
    /// Returns `None` when nothing was hit.
    fn raycast(&self, point: ScreenPoint) -> Option<Vec3>;
}
