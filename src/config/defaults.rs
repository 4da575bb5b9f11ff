//! Default value functions for serde.

// Session runtime
pub fn event_queue_capacity() -> usize {
    256
}
pub fn worker_queue_capacity() -> usize {
    16
}
pub fn reply_slack_ms() -> u64 {
    100
}
pub fn command_timeout_ms() -> u64 {
    1000
}

// Anchor attachment: 10ms x 20 = 200ms total budget
pub fn attach_poll_interval_ms() -> u64 {
    10
}
pub fn attach_max_retries() -> u32 {
    20
}

// Planes
pub fn visualization_enabled() -> bool {
    true
}

// Mesh classification lookup
pub fn cutoff_distance() -> f32 {
    4.0
}
pub fn acceptance_radius() -> f32 {
    0.05
}
pub fn scene_reconstruction() -> bool {
    true
}

// Cloud anchors
pub fn room_code_length() -> usize {
    6
}
