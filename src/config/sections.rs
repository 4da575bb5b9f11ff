//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults;

/// Delivery queue and worker sizing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSection {
    /// Capacity of the ordered event queue
    #[serde(default = "defaults::event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Capacity of the mesh search worker queue
    #[serde(default = "defaults::worker_queue_capacity")]
    pub worker_queue_capacity: usize,

    /// Extra time a blocked caller waits beyond the attach budget before
    /// giving up on the runtime (milliseconds)
    #[serde(default = "defaults::reply_slack_ms")]
    pub reply_slack_ms: u64,

    /// How long a caller waits for any other command reply (milliseconds)
    #[serde(default = "defaults::command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl SessionSection {
    /// Command reply timeout as a duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Slack added to the attach budget for blocked adds
    pub fn reply_slack(&self) -> Duration {
        Duration::from_millis(self.reply_slack_ms)
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            event_queue_capacity: defaults::event_queue_capacity(),
            worker_queue_capacity: defaults::worker_queue_capacity(),
            reply_slack_ms: defaults::reply_slack_ms(),
            command_timeout_ms: defaults::command_timeout_ms(),
        }
    }
}

/// Named anchor attachment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnchorSection {
    /// Poll interval while waiting for attachment (milliseconds)
    #[serde(default = "defaults::attach_poll_interval_ms")]
    pub attach_poll_interval_ms: u64,

    /// Number of polls before giving up
    #[serde(default = "defaults::attach_max_retries")]
    pub attach_max_retries: u32,
}

impl AnchorSection {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.attach_poll_interval_ms)
    }

    /// Total attach budget (interval x retries)
    pub fn attach_budget(&self) -> Duration {
        Duration::from_millis(self.attach_poll_interval_ms * u64::from(self.attach_max_retries))
    }
}

impl Default for AnchorSection {
    fn default() -> Self {
        Self {
            attach_poll_interval_ms: defaults::attach_poll_interval_ms(),
            attach_max_retries: defaults::attach_max_retries(),
        }
    }
}

/// Which plane alignments the tracking subsystem should detect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneDetection {
    /// Plane detection off
    None,
    /// Floors, tables
    #[default]
    Horizontal,
    /// Walls, doors
    Vertical,
    /// Horizontal and vertical
    Both,
}

/// Plane visualization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaneSection {
    /// Show plane overlays at startup
    #[serde(default = "defaults::visualization_enabled")]
    pub visualization_enabled: bool,

    /// Plane detection requested from the tracking subsystem
    #[serde(default)]
    pub detection: PlaneDetection,

    /// Optional texture for plane overlays (default: translucent fill)
    #[serde(default)]
    pub custom_texture_path: Option<String>,
}

impl Default for PlaneSection {
    fn default() -> Self {
        Self {
            visualization_enabled: defaults::visualization_enabled(),
            detection: PlaneDetection::default(),
            custom_texture_path: None,
        }
    }
}

/// Mesh classification lookup
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshSection {
    /// Mesh anchors farther than this from the target are skipped (meters)
    #[serde(default = "defaults::cutoff_distance")]
    pub cutoff_distance: f32,

    /// First face centroid within this radius wins (meters)
    #[serde(default = "defaults::acceptance_radius")]
    pub acceptance_radius: f32,

    /// Request classified scene reconstruction from the tracking subsystem
    #[serde(default = "defaults::scene_reconstruction")]
    pub scene_reconstruction: bool,
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            cutoff_distance: defaults::cutoff_distance(),
            acceptance_radius: defaults::acceptance_radius(),
            scene_reconstruction: defaults::scene_reconstruction(),
        }
    }
}

/// Cloud anchor sharing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloudSection {
    /// Length of generated room codes
    #[serde(default = "defaults::room_code_length")]
    pub room_code_length: usize,
}

impl Default for CloudSection {
    fn default() -> Self {
        Self {
            room_code_length: defaults::room_code_length(),
        }
    }
}
