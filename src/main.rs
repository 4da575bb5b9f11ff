//! sthana-sim - Two simulated devices sharing an anchor
//!
//! Device A hosts an anchor and publishes its room code; device B resolves
//! the code. Along the way the demo places named anchors, feeds plane
//! events and runs a mesh classification lookup, logging each step.
//!
//! Usage: `sthana-sim [config.toml]` (defaults to `sthana.toml` when present)

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;

use sthana::cloud::{CloudState, CloudStatus, RoomCodec, RoomDirectory};
use sthana::core::{AnchorId, PlaneId, ScreenPoint, Transform, Vec3};
use sthana::mesh::{MeshAnchor, MeshClassification, MeshGeometry};
use sthana::mock::{
    AttachBehavior, MockCloud, MockHostingService, MockTracking, RecordingVisualizer,
};
use sthana::planes::{PlaneAlignment, PlaneExtent};
use sthana::session::{Collaborators, SessionRuntime, event_channel};
use sthana::{Result, SessionHandle, SthanaConfig, SthanaError};

struct Device {
    session: SessionHandle,
    tracking: Arc<MockTracking>,
}

fn start_device(
    config: &SthanaConfig,
    cloud: &MockCloud,
    codec: &Arc<RoomDirectory>,
    latency: Duration,
) -> Device {
    let (sink, events) = event_channel(config.session.event_queue_capacity);
    let tracking = Arc::new(
        MockTracking::new(sink.clone())
            .with_attach_behavior(AttachBehavior::Delayed(Duration::from_millis(30))),
    );
    let remote = MockHostingService::spawn(sink.clone(), cloud.clone());
    remote.control().set_latency(latency);

    let codec: Arc<dyn RoomCodec> = codec.clone();
    let session = SessionRuntime::spawn(
        config.clone(),
        sink,
        events,
        Collaborators {
            tracking: tracking.clone(),
            remote: Box::new(remote),
            codec,
            visualizer: Box::new(RecordingVisualizer::new()),
        },
    );
    Device { session, tracking }
}

/// Poll the coordinator until it leaves `busy`
fn wait_while(session: &SessionHandle, busy: CloudState, timeout: Duration) -> Result<CloudStatus> {
    let start = Instant::now();
    loop {
        let status = session.cloud_status()?;
        if status.state != busy || start.elapsed() >= timeout {
            return Ok(status);
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// A floor patch and a table top in front of the camera
fn demo_mesh() -> Vec<MeshAnchor> {
    let floor = MeshGeometry::new(
        vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(-0.5, 0.0, 0.5),
        ],
        vec![[0, 1, 2]],
        vec![MeshClassification::Floor],
    );
    let table = MeshGeometry::new(
        vec![
            Vec3::new(-0.03, 0.0, -0.03),
            Vec3::new(0.06, 0.0, -0.03),
            Vec3::new(-0.03, 0.0, 0.06),
        ],
        vec![[0, 1, 2]],
        vec![MeshClassification::Table],
    );
    vec![
        MeshAnchor::new(
            AnchorId(1000),
            Transform::from_translation(Vec3::new(0.0, -1.4, -1.0)),
            floor,
        ),
        MeshAnchor::new(
            AnchorId(1001),
            Transform::from_translation(Vec3::new(0.2, -0.7, -0.8)),
            table,
        ),
    ]
}

fn run(config: SthanaConfig) -> Result<()> {
    let cloud = MockCloud::new();
    let codec = Arc::new(RoomDirectory::from_config(&config.cloud));
    let latency = Duration::from_millis(150);

    let host = start_device(&config, &cloud, &codec, latency);
    let guest = start_device(&config, &cloud, &codec, latency);

    // Planes on the hosting device
    host.tracking.add_plane(
        PlaneId(1),
        PlaneExtent::new(1.2, 0.8),
        Vec3::ZERO,
        PlaneAlignment::Horizontal,
    );
    host.tracking.add_plane(
        PlaneId(2),
        PlaneExtent::new(0.6, 0.6),
        Vec3::new(0.1, 0.0, 0.0),
        PlaneAlignment::Horizontal,
    );
    host.tracking
        .update_plane(PlaneId(1), PlaneExtent::new(2.0, 1.1), Vec3::new(0.05, 0.0, 0.1));
    host.tracking.remove_plane(PlaneId(2));
    log::info!("[Demo] Planes tracked: {}", host.session.plane_count()?);

    // Named anchors
    let mug = Transform::from_translation(Vec3::new(0.2, -0.7, -0.8));
    let anchor = host.session.add_named_anchor("mug", mug)?;
    log::info!("[Demo] 'mug' attached as {}", anchor);
    let moved = Transform::from_translation(Vec3::new(0.3, -0.7, -0.8));
    let anchor = host.session.add_named_anchor("mug", moved)?;
    log::info!(
        "[Demo] 'mug' re-added as {}, anchors: {:?}",
        anchor,
        host.session.named_anchors()?
    );

    // Host -> room code
    host.session.begin_room_creation()?;
    host.session.room_ready()?;
    let pose = Transform::from_translation(Vec3::new(0.0, -0.5, -1.5));
    let request = host.session.host_anchor(pose)?;
    log::info!("[Demo] Hosting as {}", request);
    match host.session.host_anchor(pose) {
        Err(SthanaError::OperationInProgress(state)) => {
            log::info!("[Demo] Second host rejected while {}", state)
        }
        other => log::warn!("[Demo] Unexpected second host result: {:?}", other),
    }

    let status = wait_while(&host.session, CloudState::Hosting, Duration::from_secs(2))?;
    let Some(code) = status.room_code.clone() else {
        log::error!(
            "[Demo] Hosting failed: {}",
            status.failure_reason().unwrap_or("no result")
        );
        return Ok(());
    };
    log::info!("[Demo] Room code {} ({:?})", code, status.cloud_id);

    // Resolve on the second device
    guest.session.begin_room_code_entry()?;
    guest.session.resolve_anchor(&code)?;
    let status = wait_while(&guest.session, CloudState::Resolving, Duration::from_secs(2))?;
    log::info!(
        "[Demo] Guest state {}, shared anchor {:?}",
        status.state,
        status.shared_anchor
    );

    // Mesh lookup at a point and under a tap
    host.tracking.set_mesh_anchors(demo_mesh());
    host.tracking.set_raycast_hit(Some(Vec3::new(0.21, -0.7, -0.79)));
    let (tx, rx) = bounded(2);
    let tx_tap = tx.clone();
    host.session
        .nearest_classified_face(Vec3::new(0.2, -0.7, -0.8), move |found| {
            tx.send(("point", found)).ok();
        })?;
    host.session
        .classify_screen_point(ScreenPoint::new(180.0, 420.0), move |found| {
            tx_tap.send(("tap", found)).ok();
        })?;
    for _ in 0..2 {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok((source, found)) => log::info!(
                "[Demo] Lookup ({}): {} at {:?}",
                source,
                found.classification,
                found.centroid
            ),
            Err(_) => log::warn!("[Demo] Lookup did not complete"),
        }
    }

    host.session.reset()?;
    log::info!("[Demo] Host reset to {}", host.session.cloud_status()?.state);

    host.session.shutdown()?;
    guest.session.shutdown()?;
    log::info!("[Demo] Done ({} anchors in the cloud)", cloud.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => {
            log::info!("Using config: {}", path);
            SthanaConfig::load(Path::new(&path))?
        }
        None => SthanaConfig::load_default()?,
    };

    run(config)
}
