//! Plane overlay synchronization.
//!
//! [`PlaneSync`] consumes [`PlaneEvent`]s from the tracking subsystem and
//! keeps one [`PlaneVisual`] per plane attached through a
//! [`PlaneVisualizer`].

mod record;
mod sync;
mod visualizer;

pub use record::{
    PlaneAlignment, PlaneEvent, PlaneExtent, PlaneMaterial, PlaneRecord, PlaneVisual,
};
pub use sync::PlaneSync;
pub use visualizer::{NullVisualizer, PlaneVisualizer};
