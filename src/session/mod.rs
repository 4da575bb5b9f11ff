//! Session runtime and collaborator seams.
//!
//! ```text
//!  TrackingSession ──┐                        ┌──► AnchorTable
//!  HostingService  ──┼──► event queue ──► delivery ──► PlaneSync
//!  SessionHandle   ──┤    (ordered)        thread ──► CloudAnchorCoordinator
//!  mesh-search     ──┘                        └──► mesh-search worker
//! ```
//!
//! Everything that changes component state arrives on one bounded queue
//! and is applied by the delivery thread in arrival order.

mod commands;
mod events;
mod handle;
mod runtime;
mod tracking;
mod worker;

pub use commands::{FaceCallback, PlaneStats, Reply, SessionCommand};
pub use events::{EventSink, SessionEvent, TrackingEvent, event_channel};
pub use handle::SessionHandle;
pub use runtime::{Collaborators, SessionRuntime};
pub use tracking::{TrackingOptions, TrackingSession};
pub use worker::{SearchCompletion, SearchJob, SearchWorker};
