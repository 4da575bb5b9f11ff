//! Configuration loading for Sthana.
//!
//! Loads all configuration from a single TOML file with sensible defaults.
//!
//! ## Example TOML
//!
//! ```toml
//! [session]
//! event_queue_capacity = 256
//!
//! [anchors]
//! attach_poll_interval_ms = 10   # 10ms x 20 = 200ms budget
//! attach_max_retries = 20
//!
//! [planes]
//! visualization_enabled = true
//! detection = "both"
//!
//! [mesh]
//! cutoff_distance = 4.0
//! acceptance_radius = 0.05
//!
//! [cloud]
//! room_code_length = 6
//! ```

mod defaults;
mod sections;

pub use sections::{
    AnchorSection, CloudSection, MeshSection, PlaneDetection, PlaneSection, SessionSection,
};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SthanaError};

/// Default config file looked up by [`SthanaConfig::load_default`]
pub const DEFAULT_CONFIG_PATH: &str = "sthana.toml";

/// Full configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SthanaConfig {
    /// Delivery queue and worker sizing
    #[serde(default)]
    pub session: SessionSection,

    /// Named anchor attachment
    #[serde(default)]
    pub anchors: AnchorSection,

    /// Plane visualization
    #[serde(default)]
    pub planes: PlaneSection,

    /// Mesh classification lookup
    #[serde(default)]
    pub mesh: MeshSection,

    /// Cloud anchor sharing
    #[serde(default)]
    pub cloud: CloudSection,
}

impl SthanaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SthanaError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Load from `sthana.toml` in the working directory, or defaults if absent
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SthanaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.session.event_queue_capacity == 0
            || self.session.worker_queue_capacity == 0
            || self.session.command_timeout_ms == 0
        {
            return Err(SthanaError::Config(
                "queue capacities and command timeout must be non-zero".to_string(),
            ));
        }
        if self.anchors.attach_poll_interval_ms == 0 || self.anchors.attach_max_retries == 0 {
            return Err(SthanaError::Config(
                "attach poll interval and retries must be non-zero".to_string(),
            ));
        }
        if !(self.mesh.cutoff_distance > 0.0) || !(self.mesh.acceptance_radius > 0.0) {
            return Err(SthanaError::Config(format!(
                "mesh distances must be positive (cutoff {}, acceptance {})",
                self.mesh.cutoff_distance, self.mesh.acceptance_radius
            )));
        }
        if !(4..=16).contains(&self.cloud.room_code_length) {
            return Err(SthanaError::Config(format!(
                "room_code_length must be within 4..=16, got {}",
                self.cloud.room_code_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = SthanaConfig::default();
        assert_eq!(config.anchors.attach_budget(), Duration::from_millis(200));
        assert_eq!(config.mesh.cutoff_distance, 4.0);
        assert_eq!(config.mesh.acceptance_radius, 0.05);
        assert_eq!(config.planes.detection, PlaneDetection::Horizontal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SthanaConfig::from_toml(
            r#"
            [planes]
            detection = "both"
            visualization_enabled = false

            [mesh]
            acceptance_radius = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(config.planes.detection, PlaneDetection::Both);
        assert!(!config.planes.visualization_enabled);
        assert_eq!(config.mesh.acceptance_radius, 0.1);
        assert_eq!(config.mesh.cutoff_distance, 4.0);
        assert_eq!(config.anchors.attach_max_retries, 20);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = SthanaConfig::from_toml("[mesh]\nacceptance_radius = 0.0\n").unwrap_err();
        assert!(matches!(err, SthanaError::Config(_)));

        let err = SthanaConfig::from_toml("[cloud]\nroom_code_length = 2\n").unwrap_err();
        assert!(matches!(err, SthanaError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[anchors]\nattach_poll_interval_ms = 5").unwrap();

        let config = SthanaConfig::load(file.path()).unwrap();
        assert_eq!(config.anchors.attach_budget(), Duration::from_millis(100));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SthanaConfig::load(Path::new("/nonexistent/sthana.toml")).unwrap_err();
        assert!(matches!(err, SthanaError::Config(_)));
    }
}
