//! Room codes: short shareable stand-ins for remote anchor ids.

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::Rng;

use crate::config::CloudSection;
use crate::core::{CloudAnchorId, RoomCode};

/// Maps remote anchor ids to room codes and back.
pub trait RoomCodec: Send + Sync {
    /// Code for a hosted anchor. Encoding the same id twice yields the same
    /// code.
    fn encode(&self, cloud_id: &CloudAnchorId) -> RoomCode;

    /// Remote id for a code, `None` if the code is malformed or unknown.
    fn decode(&self, code: &RoomCode) -> Option<CloudAnchorId>;
}

/// Characters used in generated codes
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Default)]
struct Directory {
    by_code: HashMap<String, CloudAnchorId>,
    by_id: HashMap<CloudAnchorId, String>,
}

/// In-memory room code directory with fixed-length alphanumeric codes.
///
/// Share one instance (behind an `Arc`) between sessions that should see
/// each other's rooms.
pub struct RoomDirectory {
    length: usize,
    inner: Mutex<Directory>,
}

impl RoomDirectory {
    /// Create a directory generating codes of `length` characters
    pub fn new(length: usize) -> Self {
        Self {
            length,
            inner: Mutex::new(Directory::default()),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &CloudSection) -> Self {
        Self::new(config.room_code_length)
    }

    /// Code length
    pub fn code_length(&self) -> usize {
        self.length
    }

    /// Number of registered rooms
    pub fn len(&self) -> usize {
        self.inner.lock().by_code.len()
    }

    /// True if no room is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn random_code(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Normalize user input; `None` if it cannot be a code
    fn normalize(&self, code: &str) -> Option<String> {
        let code = code.trim().to_ascii_uppercase();
        let valid = code.len() == self.length && code.bytes().all(|b| ALPHABET.contains(&b));
        valid.then_some(code)
    }
}

impl RoomCodec for RoomDirectory {
    fn encode(&self, cloud_id: &CloudAnchorId) -> RoomCode {
        let mut dir = self.inner.lock();
        if let Some(code) = dir.by_id.get(cloud_id) {
            return RoomCode::new(code.clone());
        }

        let mut code = self.random_code();
        while dir.by_code.contains_key(&code) {
            code = self.random_code();
        }
        dir.by_code.insert(code.clone(), cloud_id.clone());
        dir.by_id.insert(cloud_id.clone(), code.clone());
        log::debug!("[Cloud] Room {} -> {}", code, cloud_id);
        RoomCode::new(code)
    }

    fn decode(&self, code: &RoomCode) -> Option<CloudAnchorId> {
        let code = self.normalize(code.as_str())?;
        self.inner.lock().by_code.get(&code).cloned()
    }
}
