//! Semantic classification of reconstructed mesh faces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of surface classes the tracking subsystem assigns per face.
///
/// Discriminants match the raw per-face byte in the classification buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MeshClassification {
    /// Unclassified, or no face found
    #[default]
    None = 0,
    /// Vertical room boundary
    Wall = 1,
    /// Walkable ground
    Floor = 2,
    /// Overhead boundary
    Ceiling = 3,
    /// Table or desk top
    Table = 4,
    /// Chair, sofa, bench
    Seat = 5,
    /// Window pane
    Window = 6,
    /// Door
    Door = 7,
}

impl MeshClassification {
    /// All classes in discriminant order
    pub const ALL: [MeshClassification; 8] = [
        MeshClassification::None,
        MeshClassification::Wall,
        MeshClassification::Floor,
        MeshClassification::Ceiling,
        MeshClassification::Table,
        MeshClassification::Seat,
        MeshClassification::Window,
        MeshClassification::Door,
    ];

    /// Decode the raw classification byte. Unknown values map to `None`.
    pub fn from_raw(raw: u8) -> Self {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(MeshClassification::None)
    }

    /// Label shown to the user
    pub fn description(&self) -> &'static str {
        match self {
            MeshClassification::None => "None",
            MeshClassification::Wall => "Wall",
            MeshClassification::Floor => "Floor",
            MeshClassification::Ceiling => "Ceiling",
            MeshClassification::Table => "Table",
            MeshClassification::Seat => "Seat",
            MeshClassification::Window => "Window",
            MeshClassification::Door => "Door",
        }
    }

    /// True for any class other than `None`
    pub fn is_classified(&self) -> bool {
        !matches!(self, MeshClassification::None)
    }
}

impl fmt::Display for MeshClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(MeshClassification::from_raw(2), MeshClassification::Floor);
        assert_eq!(MeshClassification::from_raw(7), MeshClassification::Door);
        assert_eq!(MeshClassification::from_raw(42), MeshClassification::None);
        for class in MeshClassification::ALL {
            assert_eq!(MeshClassification::from_raw(class as u8), class);
        }
    }

    #[test]
    fn test_description() {
        assert_eq!(MeshClassification::Seat.to_string(), "Seat");
        assert!(!MeshClassification::None.is_classified());
        assert!(MeshClassification::Wall.is_classified());
    }
}
