//! Keeps one overlay per detected plane in step with plane events.

use std::collections::HashMap;

use crate::config::PlaneSection;
use crate::core::{PlaneId, Vec3, VisualHandle};

use super::record::{
    PlaneAlignment, PlaneEvent, PlaneExtent, PlaneMaterial, PlaneRecord, PlaneVisual,
};
use super::visualizer::PlaneVisualizer;

/// Plane record table plus overlay management.
///
/// Invariants:
/// - one record per live plane anchor
/// - while visualization is enabled every record has exactly one visual,
///   while disabled none has
pub struct PlaneSync {
    records: HashMap<PlaneId, PlaneRecord>,
    visualizer: Box<dyn PlaneVisualizer>,
    enabled: bool,
    material: PlaneMaterial,
}

impl PlaneSync {
    /// Create from configuration
    pub fn new(config: &PlaneSection, visualizer: Box<dyn PlaneVisualizer>) -> Self {
        Self {
            records: HashMap::new(),
            visualizer,
            enabled: config.visualization_enabled,
            material: PlaneMaterial::from_texture_path(config.custom_texture_path.as_deref()),
        }
    }

    /// Apply one plane event
    pub fn handle_event(&mut self, event: PlaneEvent) {
        match event {
            PlaneEvent::Added {
                plane,
                extent,
                center,
                alignment,
            } => self.on_added(plane, extent, center, alignment),
            PlaneEvent::Updated {
                plane,
                extent,
                center,
            } => self.on_updated(plane, extent, center),
            PlaneEvent::Removed { plane } => self.on_removed(plane),
        }
    }

    fn on_added(
        &mut self,
        plane: PlaneId,
        extent: PlaneExtent,
        center: Vec3,
        alignment: PlaneAlignment,
    ) {
        if let Some(record) = self.records.get_mut(&plane) {
            log::debug!("[Planes] Duplicate add for {}, treating as update", plane);
            record.alignment = alignment;
            self.on_updated(plane, extent, center);
            return;
        }

        let mut record = PlaneRecord::new(plane, extent, center, alignment);
        if self.enabled {
            record.visual = Some(self.attach_visual(plane, extent, center));
        }
        log::debug!(
            "[Planes] Added {} ({:?}, {:.2}x{:.2}m)",
            plane,
            alignment,
            extent.width,
            extent.depth
        );
        self.records.insert(plane, record);
    }

    fn on_updated(&mut self, plane: PlaneId, extent: PlaneExtent, center: Vec3) {
        let Some(record) = self.records.get_mut(&plane) else {
            log::debug!("[Planes] Update for unknown {}, ignored", plane);
            return;
        };
        record.extent = extent;
        record.center = center;
        if let Some((handle, visual)) = record.visual.as_mut() {
            visual.apply(extent, center);
            self.visualizer.update(*handle, visual);
        }
    }

    fn on_removed(&mut self, plane: PlaneId) {
        let Some(record) = self.records.remove(&plane) else {
            log::debug!("[Planes] Remove for unknown {}, ignored", plane);
            return;
        };
        if let Some((handle, _)) = record.visual {
            self.visualizer.detach(handle);
        }
        log::debug!("[Planes] Removed {}", plane);
    }

    fn attach_visual(
        &mut self,
        plane: PlaneId,
        extent: PlaneExtent,
        center: Vec3,
    ) -> (VisualHandle, PlaneVisual) {
        let visual = PlaneVisual::new(extent, center, self.material.clone());
        let handle = self.visualizer.attach(plane, &visual);
        (handle, visual)
    }

    /// Show or hide all plane overlays. Records are kept either way.
    pub fn set_visualization_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;

        let planes: Vec<PlaneId> = self.records.keys().copied().collect();
        for plane in planes {
            let Some(record) = self.records.get(&plane) else {
                continue;
            };
            let (extent, center) = (record.extent, record.center);
            let existing = record.visual.as_ref().map(|(handle, _)| *handle);

            let visual = match (enabled, existing) {
                (true, None) => Some(self.attach_visual(plane, extent, center)),
                (false, Some(handle)) => {
                    self.visualizer.detach(handle);
                    None
                }
                (true, Some(_)) | (false, None) => continue,
            };
            if let Some(record) = self.records.get_mut(&plane) {
                record.visual = visual;
            }
        }
        log::info!(
            "[Planes] Visualization {} ({} planes)",
            if enabled { "enabled" } else { "disabled" },
            self.records.len()
        );
    }

    /// Drop every record and overlay (session reset)
    pub fn clear(&mut self) {
        for (_, record) in self.records.drain() {
            if let Some((handle, _)) = record.visual {
                self.visualizer.detach(handle);
            }
        }
    }

    /// Whether overlays are shown
    pub fn is_visualization_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of tracked planes
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of attached overlays
    pub fn visual_count(&self) -> usize {
        self.records.values().filter(|r| r.has_visual()).count()
    }

    /// Record for a plane
    pub fn get(&self, plane: PlaneId) -> Option<&PlaneRecord> {
        self.records.get(&plane)
    }
}
