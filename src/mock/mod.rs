//! In-process collaborators for hardware-free sessions.
//!
//! | Collaborator | Simulation |
//! |--------------|------------|
//! | [`MockTracking`] | Scripted anchors, mesh and raycasts; attach timing via [`AttachBehavior`] |
//! | [`MockHostingService`] | Shared in-memory [`MockCloud`], latency, hold/release, failure injection |
//! | [`RecordingVisualizer`] | Keeps plane overlays in memory |
//!
//! Used by the `sthana-sim` binary and the integration tests.

mod hosting;
mod tracking;
mod visualizer;

pub use hosting::{MockCloud, MockHostingService, MockRemoteControl};
pub use tracking::{AttachBehavior, MockTracking};
pub use visualizer::RecordingVisualizer;
