//! Core types shared by every component:
//! - [`Vec3`] and [`Transform`]: session-space geometry
//! - Identifier newtypes for anchors, planes, visuals and remote requests

mod ids;
mod transform;
mod vector;

pub use ids::{AnchorId, CloudAnchorId, PlaneId, RequestId, RoomCode, ScreenPoint, VisualHandle};
pub use transform::Transform;
pub use vector::Vec3;
