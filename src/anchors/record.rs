//! Anchor records.

use crate::cloud::CloudAnchorState;
use crate::core::{AnchorId, CloudAnchorId, Transform};

/// Remote side of a cloud-bound anchor
#[derive(Clone, Debug, PartialEq, Default)]
pub enum RemoteState {
    #[default]
    None,
    InProgress,
    Hosted,
    Resolved,
    Error(CloudAnchorState),
}

impl RemoteState {
    /// Short label for status output
    pub fn name(&self) -> &'static str {
        match self {
            RemoteState::None => "none",
            RemoteState::InProgress => "in-progress",
            RemoteState::Hosted => "hosted",
            RemoteState::Resolved => "resolved",
            RemoteState::Error(_) => "error",
        }
    }
}

/// Link between a local anchor and its remote counterpart
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CloudBinding {
    /// Remote identifier, once known
    pub cloud_id: Option<CloudAnchorId>,
    pub state: RemoteState,
}

/// One live anchor owned by the [`AnchorTable`](super::AnchorTable).
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorRecord {
    pub name: String,
    pub transform: Transform,
    /// Local tracking handle
    pub anchor: AnchorId,
    /// Present only for the shared (hosted or resolved) anchor
    pub cloud: Option<CloudBinding>,
}

impl AnchorRecord {
    /// Local-only record
    pub fn new(name: impl Into<String>, transform: Transform, anchor: AnchorId) -> Self {
        Self {
            name: name.into(),
            transform,
            anchor,
            cloud: None,
        }
    }

    /// Record bound to the remote service
    pub fn with_cloud(mut self, binding: CloudBinding) -> Self {
        self.cloud = Some(binding);
        self
    }

    /// Remote state, `None` for local-only records
    pub fn remote_state(&self) -> RemoteState {
        self.cloud
            .as_ref()
            .map(|c| c.state.clone())
            .unwrap_or_default()
    }
}
