//! Cloud anchor sharing.
//!
//! - [`CloudAnchorCoordinator`]: host/resolve state machine
//! - [`AnchorHostingService`]: remote service seam, completions arrive as
//!   [`RemoteEvent`]s
//! - [`RoomCodec`] / [`RoomDirectory`]: short room codes for remote ids

mod coordinator;
mod room;
mod service;
mod state;

pub use coordinator::{CloudAnchorCoordinator, CloudStatus, SHARED_ANCHOR_NAME};
pub use room::{RoomCodec, RoomDirectory};
pub use service::{AnchorHostingService, RemoteEvent, ResolvedAnchor};
pub use state::{CloudAction, CloudAnchorState, CloudState};
