//! Mesh anchors and their triangulated, classified geometry.

use std::sync::Arc;

use crate::core::{AnchorId, Transform, Vec3};

use super::classification::MeshClassification;

/// Triangulated surface in the anchor's local frame.
///
/// `classifications` is indexed by face; a missing entry reads as `None`.
#[derive(Clone, Debug, Default)]
pub struct MeshGeometry {
    /// Vertex positions (anchor-local, meters)
    pub vertices: Vec<Vec3>,
    /// Triangles as vertex index triples
    pub faces: Vec<[u32; 3]>,
    /// Per-face class
    pub classifications: Vec<MeshClassification>,
}

impl MeshGeometry {
    /// Create geometry from raw buffers
    pub fn new(
        vertices: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
        classifications: Vec<MeshClassification>,
    ) -> Self {
        Self {
            vertices,
            faces,
            classifications,
        }
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Geometric center of a face in the anchor-local frame.
    ///
    /// Returns `None` for an out-of-range face or vertex index.
    pub fn center_of(&self, face: usize) -> Option<Vec3> {
        let [a, b, c] = *self.faces.get(face)?;
        let a = *self.vertices.get(a as usize)?;
        let b = *self.vertices.get(b as usize)?;
        let c = *self.vertices.get(c as usize)?;
        Some(Vec3::centroid(a, b, c))
    }

    /// Class of a face
    pub fn classification_of(&self, face: usize) -> MeshClassification {
        self.classifications
            .get(face)
            .copied()
            .unwrap_or(MeshClassification::None)
    }
}

/// A tracking anchor carrying a reconstructed mesh chunk.
///
/// Geometry is shared so frame snapshots are cheap to clone and hand to
/// the search worker.
#[derive(Clone, Debug)]
pub struct MeshAnchor {
    /// Tracking anchor handle
    pub id: AnchorId,
    /// Anchor pose in session space
    pub transform: Transform,
    /// Surface data
    pub geometry: Arc<MeshGeometry>,
}

impl MeshAnchor {
    /// Create a mesh anchor
    pub fn new(id: AnchorId, transform: Transform, geometry: MeshGeometry) -> Self {
        Self {
            id,
            transform,
            geometry: Arc::new(geometry),
        }
    }

    /// Reference position used for coarse pruning
    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    /// Face center in session coordinates
    pub fn world_center_of(&self, face: usize) -> Option<Vec3> {
        self.geometry
            .center_of(face)
            .map(|local| self.transform.transform_point(local))
    }
}
