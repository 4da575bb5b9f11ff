//! # Sthana: Shared Spatial Anchors for AR Sessions
//!
//! Keeps a mobile AR session's spatial state consistent while callbacks
//! arrive from the tracking stack and a remote anchor-hosting service.
//!
//! ## Features
//!
//! - **Cloud anchors**: host an anchor, share it as a short room code,
//!   resolve it on another device
//! - **Named anchors**: one live tracking anchor per name, with a bounded
//!   wait for attachment
//! - **Plane overlays**: one visual per detected plane, resized in place as
//!   the estimate improves
//! - **Mesh classification lookup**: which classified surface (wall, floor,
//!   table...) lies at a point or under a screen tap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sthana::cloud::RoomDirectory;
//! use sthana::config::SthanaConfig;
//! use sthana::core::{Transform, Vec3};
//! use sthana::mock::{MockCloud, MockHostingService, MockTracking, RecordingVisualizer};
//! use sthana::session::{Collaborators, SessionRuntime, event_channel};
//!
//! let config = SthanaConfig::default();
//! let (sink, events) = event_channel(config.session.event_queue_capacity);
//!
//! let session = SessionRuntime::spawn(
//!     config.clone(),
//!     sink.clone(),
//!     events,
//!     Collaborators {
//!         tracking: Arc::new(MockTracking::new(sink.clone())),
//!         remote: Box::new(MockHostingService::spawn(sink, MockCloud::new())),
//!         codec: Arc::new(RoomDirectory::from_config(&config.cloud)),
//!         visualizer: Box::new(RecordingVisualizer::new()),
//!     },
//! );
//!
//! let pose = Transform::from_translation(Vec3::new(0.0, 0.0, -1.0));
//! session.add_named_anchor("mug", pose).unwrap();
//! session.host_anchor(pose).unwrap();
//! session.shutdown().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: geometry and identifier types
//! - [`config`]: TOML configuration
//! - [`anchors`]: [`AnchorTable`](anchors::AnchorTable), name to tracking anchor
//! - [`cloud`]: host/resolve state machine, remote service seam, room codes
//! - [`planes`]: plane overlay synchronization
//! - [`mesh`]: classified mesh geometry and the nearest-face search
//! - [`session`]: collaborator traits, event queue, delivery thread, handle
//! - [`mock`]: in-process collaborators
//!
//! ## Coordinate Frame
//!
//! Session space as reported by the tracking stack: Y up, right-handed,
//! meters. Transforms are column-major 4x4.

pub mod anchors;
pub mod cloud;
pub mod config;
pub mod core;
pub mod error;
pub mod mesh;
pub mod mock;
pub mod planes;
pub mod session;

pub use config::SthanaConfig;
pub use error::{Result, SthanaError};
pub use session::{SessionHandle, SessionRuntime};
