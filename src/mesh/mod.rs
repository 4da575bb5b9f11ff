//! Mesh classification lookup.
//!
//! - [`MeshGeometry`] / [`MeshAnchor`]: reconstructed surface chunks with
//!   per-face classes
//! - [`nearest_classified_face`]: greedy search over a mesh-anchor snapshot

mod classification;
mod geometry;
mod search;

pub use classification::MeshClassification;
pub use geometry::{MeshAnchor, MeshGeometry};
pub use search::{FaceMatch, MeshSearchConfig, nearest_classified_face};
