//! Rendering-layer seam for plane overlays.

use crate::core::{PlaneId, VisualHandle};

use super::record::PlaneVisual;

/// Attaches plane overlays to plane nodes.
///
/// Called only from the delivery thread.
pub trait PlaneVisualizer: Send {
    /// Create a visual under the plane's node and return its handle.
    fn attach(&mut self, plane: PlaneId, visual: &PlaneVisual) -> VisualHandle;

    /// Resize/reposition an attached visual in place.
    fn update(&mut self, handle: VisualHandle, visual: &PlaneVisual);

    /// Detach and drop a visual.
    fn detach(&mut self, handle: VisualHandle);
}

/// Visualizer that renders nothing (headless sessions)
#[derive(Debug, Default)]
pub struct NullVisualizer {
    next_handle: u64,
}

impl PlaneVisualizer for NullVisualizer {
    fn attach(&mut self, _plane: PlaneId, _visual: &PlaneVisual) -> VisualHandle {
        self.next_handle += 1;
        VisualHandle(self.next_handle)
    }

    fn update(&mut self, _handle: VisualHandle, _visual: &PlaneVisual) {}

    fn detach(&mut self, _handle: VisualHandle) {}
}
