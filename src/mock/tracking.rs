//! Simulated tracking session.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::{AnchorId, PlaneId, ScreenPoint, Transform, Vec3};
use crate::mesh::MeshAnchor;
use crate::planes::{PlaneAlignment, PlaneEvent, PlaneExtent};
use crate::session::{EventSink, TrackingOptions, TrackingSession};

/// When simulated anchors become attached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AttachBehavior {
    /// Attached as soon as they are added
    #[default]
    Immediate,
    /// Attached after a delay, announced with an `AnchorAttached` event
    Delayed(Duration),
    /// Attached only through [`MockTracking::mark_attached`]
    Manual,
    /// Never attached
    Never,
}

#[derive(Debug)]
struct MockAnchor {
    transform: Transform,
    attached: bool,
}

#[derive(Default)]
struct TrackingState {
    next_anchor: u64,
    anchors: HashMap<AnchorId, MockAnchor>,
    detached_children: Vec<AnchorId>,
    mesh: Vec<MeshAnchor>,
    raycast_hit: Option<Vec3>,
    options: Option<TrackingOptions>,
    run_count: u32,
    reset_count: u32,
}

/// In-process [`TrackingSession`].
///
/// Anchors, mesh and raycast results are scripted by the caller; plane
/// changes and attachments are published through the session sink the way
/// a device tracking stack would.
pub struct MockTracking {
    sink: EventSink,
    behavior: AttachBehavior,
    state: Arc<Mutex<TrackingState>>,
}

impl MockTracking {
    /// Create a session publishing into `sink`
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            behavior: AttachBehavior::default(),
            state: Arc::new(Mutex::new(TrackingState::default())),
        }
    }

    /// Set how new anchors attach
    pub fn with_attach_behavior(mut self, behavior: AttachBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Attach an anchor now and announce it
    pub fn mark_attached(&self, anchor: AnchorId) {
        mark(&self.state, &self.sink, anchor);
    }

    /// True while the anchor exists in the session
    pub fn is_live(&self, anchor: AnchorId) -> bool {
        self.state.lock().anchors.contains_key(&anchor)
    }

    /// Number of anchors in the session
    pub fn live_anchor_count(&self) -> usize {
        self.state.lock().anchors.len()
    }

    /// Anchors whose child content was detached, in call order
    pub fn detached_children(&self) -> Vec<AnchorId> {
        self.state.lock().detached_children.clone()
    }

    /// Current node transform of an anchor
    pub fn node_transform(&self, anchor: AnchorId) -> Option<Transform> {
        self.state.lock().anchors.get(&anchor).map(|a| a.transform)
    }

    /// Replace the mesh snapshot
    pub fn set_mesh_anchors(&self, mesh: Vec<MeshAnchor>) {
        self.state.lock().mesh = mesh;
    }

    /// Point every raycast hits (`None` = always miss)
    pub fn set_raycast_hit(&self, hit: Option<Vec3>) {
        self.state.lock().raycast_hit = hit;
    }

    /// Options of the last `run`
    pub fn options(&self) -> Option<TrackingOptions> {
        self.state.lock().options
    }

    /// Number of `run` calls
    pub fn run_count(&self) -> u32 {
        self.state.lock().run_count
    }

    /// Number of `reset` calls
    pub fn reset_count(&self) -> u32 {
        self.state.lock().reset_count
    }

    /// Announce a new plane
    pub fn add_plane(
        &self,
        plane: PlaneId,
        extent: PlaneExtent,
        center: Vec3,
        alignment: PlaneAlignment,
    ) -> bool {
        self.sink.plane(PlaneEvent::Added {
            plane,
            extent,
            center,
            alignment,
        })
    }

    /// Announce a refined plane
    pub fn update_plane(&self, plane: PlaneId, extent: PlaneExtent, center: Vec3) -> bool {
        self.sink.plane(PlaneEvent::Updated {
            plane,
            extent,
            center,
        })
    }

    /// Announce a dropped plane
    pub fn remove_plane(&self, plane: PlaneId) -> bool {
        self.sink.plane(PlaneEvent::Removed { plane })
    }

    /// Announce a processed frame
    pub fn frame(&self, timestamp_us: u64) -> bool {
        self.sink.frame_updated(timestamp_us)
    }
}

fn mark(state: &Mutex<TrackingState>, sink: &EventSink, anchor: AnchorId) {
    let known = match state.lock().anchors.get_mut(&anchor) {
        Some(a) => {
            a.attached = true;
            true
        }
        None => false,
    };
    if known {
        sink.anchor_attached(anchor);
    }
}

impl TrackingSession for MockTracking {
    fn run(&self, options: &TrackingOptions) {
        let mut state = self.state.lock();
        state.options = Some(*options);
        state.run_count += 1;
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.anchors.clear();
        state.mesh.clear();
        state.reset_count += 1;
    }

    fn add_anchor(&self, transform: Transform) -> AnchorId {
        let anchor = {
            let mut state = self.state.lock();
            state.next_anchor += 1;
            let anchor = AnchorId(state.next_anchor);
            state.anchors.insert(
                anchor,
                MockAnchor {
                    transform,
                    attached: self.behavior == AttachBehavior::Immediate,
                },
            );
            anchor
        };

        if let AttachBehavior::Delayed(delay) = self.behavior {
            let state = Arc::clone(&self.state);
            let sink = self.sink.clone();
            let spawned = thread::Builder::new()
                .name("mock-attach".into())
                .spawn(move || {
                    thread::sleep(delay);
                    mark(&state, &sink, anchor);
                });
            if let Err(e) = spawned {
                log::error!("[Mock] Failed to spawn attach thread: {}", e);
            }
        }
        anchor
    }

    fn remove_anchor(&self, anchor: AnchorId) {
        self.state.lock().anchors.remove(&anchor);
    }

    fn is_anchor_attached(&self, anchor: AnchorId) -> bool {
        self.state
            .lock()
            .anchors
            .get(&anchor)
            .is_some_and(|a| a.attached)
    }

    fn detach_children(&self, anchor: AnchorId) {
        self.state.lock().detached_children.push(anchor);
    }

    fn set_node_transform(&self, anchor: AnchorId, transform: Transform) {
        if let Some(a) = self.state.lock().anchors.get_mut(&anchor) {
            a.transform = transform;
        }
    }

    fn mesh_anchors(&self) -> Vec<MeshAnchor> {
        self.state.lock().mesh.clone()
    }

    fn raycast(&self, _point: ScreenPoint) -> Option<Vec3> {
        self.state.lock().raycast_hit
    }
}
