//! Plane events and the per-plane record kept by [`PlaneSync`](super::PlaneSync).

use std::f32::consts::FRAC_PI_2;

use crate::core::{PlaneId, Transform, Vec3, VisualHandle};

/// Orientation class of a detected plane
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaneAlignment {
    /// Floors, tables
    #[default]
    Horizontal,
    /// Walls, doors
    Vertical,
}

/// Estimated plane size in its local X/Z axes (meters)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PlaneExtent {
    /// Size along local X
    pub width: f32,
    /// Size along local Z
    pub depth: f32,
}

impl PlaneExtent {
    /// Create an extent
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }
}

/// Plane lifecycle notification from the tracking subsystem.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaneEvent {
    /// A new plane anchor was detected
    Added {
        plane: PlaneId,
        extent: PlaneExtent,
        /// Center offset in the plane anchor's frame
        center: Vec3,
        alignment: PlaneAlignment,
    },
    /// The plane estimate was refined
    Updated {
        plane: PlaneId,
        extent: PlaneExtent,
        center: Vec3,
    },
    /// The plane anchor was dropped (merged or lost)
    Removed { plane: PlaneId },
}

impl PlaneEvent {
    /// Plane this event refers to
    pub fn plane(&self) -> PlaneId {
        match self {
            PlaneEvent::Added { plane, .. }
            | PlaneEvent::Updated { plane, .. }
            | PlaneEvent::Removed { plane } => *plane,
        }
    }
}

/// Surface look of plane overlays
#[derive(Clone, Debug, PartialEq, Default)]
pub enum PlaneMaterial {
    /// Flat translucent fill
    #[default]
    Translucent,
    /// Image texture loaded by the rendering layer
    Texture(String),
}

impl PlaneMaterial {
    /// Material for an optional configured texture path
    pub fn from_texture_path(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.is_empty() => PlaneMaterial::Texture(p.to_string()),
            _ => PlaneMaterial::Translucent,
        }
    }
}

/// Geometry handed to the rendering layer for one plane.
///
/// A flat rectangle `width` x `depth`, placed at `position` in the plane
/// node's frame and rotated by `tilt` about X so it lies in the plane.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneVisual {
    pub width: f32,
    pub depth: f32,
    pub position: Vec3,
    /// Rotation about X (radians)
    pub tilt: f32,
    pub material: PlaneMaterial,
}

impl PlaneVisual {
    /// Rotation that lays a vertical rectangle flat in the plane
    pub const FLAT_TILT: f32 = -FRAC_PI_2;

    /// Visual sized and positioned for a plane estimate
    pub fn new(extent: PlaneExtent, center: Vec3, material: PlaneMaterial) -> Self {
        Self {
            width: extent.width,
            depth: extent.depth,
            position: center,
            tilt: Self::FLAT_TILT,
            material,
        }
    }

    /// Resize and reposition in place
    pub fn apply(&mut self, extent: PlaneExtent, center: Vec3) {
        self.width = extent.width;
        self.depth = extent.depth;
        self.position = center;
    }

    /// Local transform of the visual within the plane node
    pub fn local_transform(&self) -> Transform {
        Transform::from_translation(self.position) * Transform::from_rotation_x(self.tilt)
    }
}

/// Live state for one plane anchor
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneRecord {
    pub plane: PlaneId,
    pub extent: PlaneExtent,
    pub center: Vec3,
    pub alignment: PlaneAlignment,
    /// Attached overlay, present only while visualization is enabled
    pub visual: Option<(VisualHandle, PlaneVisual)>,
}

impl PlaneRecord {
    /// Record without a visual
    pub fn new(plane: PlaneId, extent: PlaneExtent, center: Vec3, alignment: PlaneAlignment) -> Self {
        Self {
            plane,
            extent,
            center,
            alignment,
            visual: None,
        }
    }

    /// True if an overlay is attached
    pub fn has_visual(&self) -> bool {
        self.visual.is_some()
    }
}
