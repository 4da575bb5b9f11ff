//! Plane visualizer that records what it was asked to draw.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{PlaneId, VisualHandle};
use crate::planes::{PlaneVisual, PlaneVisualizer};

#[derive(Default)]
struct VisualLog {
    next_handle: u64,
    live: HashMap<VisualHandle, (PlaneId, PlaneVisual)>,
    attaches: usize,
    updates: usize,
    detaches: usize,
}

/// [`PlaneVisualizer`] keeping the live visuals in memory.
///
/// Clones share the same log, so a test can keep one clone after boxing
/// another into a session.
#[derive(Clone, Default)]
pub struct RecordingVisualizer {
    log: Arc<Mutex<VisualLog>>,
}

impl RecordingVisualizer {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Visuals currently attached
    pub fn live_count(&self) -> usize {
        self.log.lock().live.len()
    }

    /// Total `attach` calls
    pub fn attach_count(&self) -> usize {
        self.log.lock().attaches
    }

    /// Total `update` calls
    pub fn update_count(&self) -> usize {
        self.log.lock().updates
    }

    /// Total `detach` calls
    pub fn detach_count(&self) -> usize {
        self.log.lock().detaches
    }

    /// Latest geometry of a live visual
    pub fn visual(&self, handle: VisualHandle) -> Option<PlaneVisual> {
        self.log.lock().live.get(&handle).map(|(_, v)| v.clone())
    }

    /// Live visual attached under `plane`
    pub fn visual_for(&self, plane: PlaneId) -> Option<PlaneVisual> {
        self.log
            .lock()
            .live
            .values()
            .find(|(p, _)| *p == plane)
            .map(|(_, v)| v.clone())
    }
}

impl PlaneVisualizer for RecordingVisualizer {
    fn attach(&mut self, plane: PlaneId, visual: &PlaneVisual) -> VisualHandle {
        let mut log = self.log.lock();
        log.next_handle += 1;
        let handle = VisualHandle(log.next_handle);
        log.live.insert(handle, (plane, visual.clone()));
        log.attaches += 1;
        handle
    }

    fn update(&mut self, handle: VisualHandle, visual: &PlaneVisual) {
        let mut log = self.log.lock();
        if let Some(entry) = log.live.get_mut(&handle) {
            entry.1 = visual.clone();
        }
        log.updates += 1;
    }

    fn detach(&mut self, handle: VisualHandle) {
        let mut log = self.log.lock();
        log.live.remove(&handle);
        log.detaches += 1;
    }
}
