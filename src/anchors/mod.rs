//! Named anchor bookkeeping.
//!
//! [`AnchorTable`] guarantees each name maps to exactly one live tracking
//! anchor and holds the single shared slot used by the cloud coordinator.

mod record;
mod table;

pub use record::{AnchorRecord, CloudBinding, RemoteState};
pub use table::{AddStarted, AnchorTable, AttachOutcome};
