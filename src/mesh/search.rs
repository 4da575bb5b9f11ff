//! Nearest classified face lookup over a mesh-anchor snapshot.
//!
//! Greedy nearest-acceptable match:
//!
//! 1. Drop mesh anchors whose reference position is farther than
//!    `cutoff_distance` from the target (coarse prune).
//! 2. Order the rest by ascending reference distance (stable, so equal
//!    distances keep snapshot order).
//! 3. Walk faces of each anchor in index order; the first face whose world
//!    centroid lies within `acceptance_radius` wins.
//!
//! This is not a global nearest neighbour. The acceptance radius is small
//! compared to typical face density, so the first hit is close enough and
//! the walk usually stops inside the nearest anchor.

use crate::config::MeshSection;
use crate::core::{AnchorId, Vec3};

use super::classification::MeshClassification;
use super::geometry::MeshAnchor;

/// Search parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshSearchConfig {
    /// Anchors farther than this from the target are skipped (meters)
    pub cutoff_distance: f32,
    /// Face centroids within this distance are accepted (meters, inclusive)
    pub acceptance_radius: f32,
}

impl Default for MeshSearchConfig {
    fn default() -> Self {
        Self {
            cutoff_distance: 4.0,
            acceptance_radius: 0.05,
        }
    }
}

impl From<&MeshSection> for MeshSearchConfig {
    fn from(section: &MeshSection) -> Self {
        Self {
            cutoff_distance: section.cutoff_distance,
            acceptance_radius: section.acceptance_radius,
        }
    }
}

/// Result of a lookup.
///
/// `centroid` is `None` (and `classification` is `None`) when no face was
/// close enough.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FaceMatch {
    /// World-space center of the accepted face
    pub centroid: Option<Vec3>,
    /// Class of the accepted face
    pub classification: MeshClassification,
    /// Anchor holding the face
    pub anchor: Option<AnchorId>,
    /// Face index within that anchor
    pub face: Option<usize>,
}

impl FaceMatch {
    /// No face within the acceptance radius
    pub const NOT_FOUND: FaceMatch = FaceMatch {
        centroid: None,
        classification: MeshClassification::None,
        anchor: None,
        face: None,
    };

    /// True if a face was accepted
    pub fn is_found(&self) -> bool {
        self.centroid.is_some()
    }
}

/// Find the first classified face near `target`.
pub fn nearest_classified_face(
    target: Vec3,
    anchors: &[MeshAnchor],
    config: &MeshSearchConfig,
) -> FaceMatch {
    let cutoff_sq = config.cutoff_distance * config.cutoff_distance;
    let acceptance_sq = config.acceptance_radius * config.acceptance_radius;

    let mut candidates: Vec<(f32, &MeshAnchor)> = anchors
        .iter()
        .map(|anchor| (anchor.position().distance_squared(&target), anchor))
        .filter(|(dist_sq, _)| *dist_sq <= cutoff_sq)
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    log::trace!(
        "[Mesh] {} of {} anchors within {:.2}m of ({:.3}, {:.3}, {:.3})",
        candidates.len(),
        anchors.len(),
        config.cutoff_distance,
        target.x,
        target.y,
        target.z
    );

    for (_, anchor) in candidates {
        for face in 0..anchor.geometry.face_count() {
            let Some(center) = anchor.world_center_of(face) else {
                continue;
            };
            if center.distance_squared(&target) <= acceptance_sq {
                let classification = anchor.geometry.classification_of(face);
                log::debug!(
                    "[Mesh] Face {} of {} accepted: {} at {:.3}m",
                    face,
                    anchor.id,
                    classification,
                    center.distance(&target)
                );
                return FaceMatch {
                    centroid: Some(center),
                    classification,
                    anchor: Some(anchor.id),
                    face: Some(face),
                };
            }
        }
    }

    FaceMatch::NOT_FOUND
}
