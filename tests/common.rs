//! Test utilities for Sthana integration tests.
//!
//! Builds sessions wired to the in-process mocks and keeps test-side handles
//! to every collaborator.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use sthana::cloud::{CloudState, CloudStatus, RoomCodec, RoomDirectory};
use sthana::core::{AnchorId, Transform, Vec3};
use sthana::mesh::{FaceMatch, MeshAnchor, MeshClassification, MeshGeometry};
use sthana::mock::{
    AttachBehavior, MockCloud, MockHostingService, MockRemoteControl, MockTracking,
    RecordingVisualizer,
};
use sthana::session::{Collaborators, SessionRuntime, event_channel};
use sthana::{SessionHandle, SthanaConfig};

/// A running session plus handles to its mocks.
pub struct TestSession {
    pub session: SessionHandle,
    pub tracking: Arc<MockTracking>,
    pub remote: MockRemoteControl,
    pub visualizer: RecordingVisualizer,
}

/// Start a session with default config.
pub fn start(attach: AttachBehavior) -> TestSession {
    start_shared(
        SthanaConfig::default(),
        attach,
        &MockCloud::new(),
        &Arc::new(RoomDirectory::new(6)),
    )
}

/// Start a session on a shared cloud and room directory.
pub fn start_shared(
    config: SthanaConfig,
    attach: AttachBehavior,
    cloud: &MockCloud,
    codec: &Arc<RoomDirectory>,
) -> TestSession {
    let (sink, events) = event_channel(config.session.event_queue_capacity);
    let tracking = Arc::new(MockTracking::new(sink.clone()).with_attach_behavior(attach));
    let service = MockHostingService::spawn(sink.clone(), cloud.clone());
    let remote = service.control();
    let visualizer = RecordingVisualizer::new();
    let codec: Arc<dyn RoomCodec> = codec.clone();

    let session = SessionRuntime::spawn(
        config,
        sink,
        events,
        Collaborators {
            tracking: tracking.clone(),
            remote: Box::new(service),
            codec,
            visualizer: Box::new(visualizer.clone()),
        },
    );

    TestSession {
        session,
        tracking,
        remote,
        visualizer,
    }
}

/// Pure translation transform.
pub fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_translation(Vec3::new(x, y, z))
}

/// Poll the coordinator until `done` holds or 2s pass.
pub fn wait_for(session: &SessionHandle, done: impl Fn(&CloudStatus) -> bool) -> CloudStatus {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let status = session.cloud_status().unwrap();
        if done(&status) || Instant::now() >= deadline {
            return status;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Poll until the coordinator reaches `state`.
pub fn wait_for_state(session: &SessionHandle, state: CloudState) -> CloudStatus {
    wait_for(session, |s| s.state == state)
}

/// Run a lookup and wait for its callback.
pub fn lookup(session: &SessionHandle, point: Vec3) -> FaceMatch {
    let (tx, rx) = bounded(1);
    session
        .nearest_classified_face(point, move |found| {
            tx.send(found).ok();
        })
        .unwrap();
    rx.recv_timeout(Duration::from_secs(2)).unwrap()
}

/// Small triangle whose centroid is exactly `center` in the anchor frame.
pub fn triangle_at(center: Vec3) -> [Vec3; 3] {
    let d = 0.01;
    [
        center + Vec3::new(-d, 0.0, -d),
        center + Vec3::new(2.0 * d, 0.0, -d),
        center + Vec3::new(-d, 0.0, 2.0 * d),
    ]
}

/// Mesh anchor at `origin` with one face per (local center, class).
pub fn mesh_anchor(id: u64, origin: Vec3, faces: &[(Vec3, MeshClassification)]) -> MeshAnchor {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut classes = Vec::new();
    for (center, class) in faces {
        let base = vertices.len() as u32;
        vertices.extend_from_slice(&triangle_at(*center));
        indices.push([base, base + 1, base + 2]);
        classes.push(*class);
    }
    MeshAnchor::new(
        AnchorId(id),
        Transform::from_translation(origin),
        MeshGeometry::new(vertices, indices, classes),
    )
}

/// Grid of `n x n` anchors, each with `faces` faces, none near the origin.
pub fn mesh_grid(n: usize, faces: usize) -> Vec<MeshAnchor> {
    let mut anchors = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let origin = Vec3::new(i as f32 * 0.5 + 0.3, 0.0, j as f32 * 0.5 + 0.3);
            let faces: Vec<(Vec3, MeshClassification)> = (0..faces)
                .map(|k| {
                    let offset = Vec3::new(0.0, 0.1 + k as f32 * 0.01, 0.0);
                    (offset, MeshClassification::from_raw((k % 8) as u8))
                })
                .collect();
            anchors.push(mesh_anchor((i * n + j) as u64, origin, &faces));
        }
    }
    anchors
}
