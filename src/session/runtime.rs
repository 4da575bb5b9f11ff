//! Session runtime: the delivery thread.
//!
//! One thread owns every component ([`AnchorTable`], [`PlaneSync`],
//! [`CloudAnchorCoordinator`]) and consumes the ordered event queue:
//! tracking notifications, remote completions, caller commands and search
//! completions. Nothing else touches component state, so there are no locks
//! around it.
//!
//! While named-anchor adds are waiting for attachment the loop wakes at
//! least once per poll interval, and at the earliest add deadline, to
//! check them.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::anchors::{AnchorTable, AttachOutcome};
use crate::cloud::{AnchorHostingService, CloudAnchorCoordinator, RoomCodec};
use crate::config::SthanaConfig;
use crate::core::{AnchorId, Vec3};
use crate::error::SthanaError;
use crate::mesh::{FaceMatch, MeshSearchConfig};
use crate::planes::{PlaneSync, PlaneVisualizer};

use super::commands::{FaceCallback, PlaneStats, Reply, SessionCommand};
use super::events::{EventSink, SessionEvent, TrackingEvent};
use super::handle::SessionHandle;
use super::tracking::{TrackingOptions, TrackingSession};
use super::worker::{SearchJob, SearchWorker};

/// External collaborators wired into a session
pub struct Collaborators {
    pub tracking: Arc<dyn TrackingSession>,
    pub remote: Box<dyn AnchorHostingService>,
    pub codec: Arc<dyn RoomCodec>,
    pub visualizer: Box<dyn PlaneVisualizer>,
}

/// Session runtime entry point
pub struct SessionRuntime;

impl SessionRuntime {
    /// Start tracking, spawn the search worker and the delivery thread.
    ///
    /// `sink` and `events` are the two ends of the queue created with
    /// [`event_channel`](super::event_channel); collaborators that publish
    /// asynchronously should already hold clones of `sink`.
    pub fn spawn(
        config: SthanaConfig,
        sink: EventSink,
        events: Receiver<SessionEvent>,
        collaborators: Collaborators,
    ) -> SessionHandle {
        let options = TrackingOptions::from(&config);
        collaborators.tracking.run(&options);

        let worker = SearchWorker::spawn(config.session.worker_queue_capacity, sink.clone());
        let delivery = Delivery::new(&config, options, collaborators, worker);

        log::info!(
            "[Session] Starting (planes: {:?}, scene reconstruction: {})",
            options.plane_detection,
            options.scene_reconstruction
        );

        let handle = thread::Builder::new()
            .name("delivery".into())
            .spawn(move || delivery.run(events))
            .expect("Failed to spawn delivery thread");

        SessionHandle::new(sink, handle, &config)
    }
}

struct Delivery {
    tracking: Arc<dyn TrackingSession>,
    options: TrackingOptions,
    table: AnchorTable,
    planes: PlaneSync,
    cloud: CloudAnchorCoordinator,
    worker: Option<SearchWorker>,
    search: MeshSearchConfig,
    poll_interval: Duration,
    last_poll: Instant,
    pending_adds: HashMap<AnchorId, Reply<AnchorId>>,
    pending_searches: HashMap<u64, FaceCallback>,
    next_job: u64,
}

impl Delivery {
    fn new(
        config: &SthanaConfig,
        options: TrackingOptions,
        collaborators: Collaborators,
        worker: SearchWorker,
    ) -> Self {
        Self {
            tracking: collaborators.tracking,
            options,
            table: AnchorTable::new(&config.anchors),
            planes: PlaneSync::new(&config.planes, collaborators.visualizer),
            cloud: CloudAnchorCoordinator::new(collaborators.remote, collaborators.codec),
            worker: Some(worker),
            search: MeshSearchConfig::from(&config.mesh),
            poll_interval: config.anchors.poll_interval(),
            last_poll: Instant::now(),
            pending_adds: HashMap::new(),
            pending_searches: HashMap::new(),
            next_job: 0,
        }
    }

    fn run(mut self, events: Receiver<SessionEvent>) {
        log::info!("[Session] Delivery thread started");

        loop {
            let event = if let Some(deadline) = self.table.next_deadline() {
                let until_deadline = deadline.saturating_duration_since(Instant::now());
                match events.recv_timeout(self.poll_interval.min(until_deadline)) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match events.recv() {
                    Ok(event) => Some(event),
                    Err(_) => break,
                }
            };

            if let Some(event) = event {
                if !self.handle(event) {
                    break;
                }
            }

            if let Some(deadline) = self.table.next_deadline() {
                let now = Instant::now();
                if now >= deadline || now.duration_since(self.last_poll) >= self.poll_interval {
                    self.last_poll = now;
                    let outcomes = self.table.poll(self.tracking.as_ref(), now);
                    self.settle(outcomes);
                }
            }
        }

        // Commands still queued get SessionClosed via their dropped replies
        let dropped = events.try_iter().count();
        if dropped > 0 {
            log::debug!("[Session] Dropped {} queued events at shutdown", dropped);
        }
        drop(events);

        self.pending_adds.clear();
        self.pending_searches.clear();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("[Session] Mesh search thread panicked");
            }
        }
        log::info!("[Session] Delivery thread stopped");
    }

    /// Returns false on shutdown
    fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Tracking(TrackingEvent::Plane(plane_event)) => {
                self.planes.handle_event(plane_event);
            }
            SessionEvent::Tracking(TrackingEvent::AnchorAttached(anchor)) => {
                let tracking = self.tracking.clone();
                let outcome = self
                    .table
                    .on_attached(anchor, tracking.as_ref(), Instant::now());
                if let Some(outcome) = outcome {
                    self.settle(vec![outcome]);
                }
            }
            SessionEvent::Tracking(TrackingEvent::FrameUpdated { timestamp_us }) => {
                log::trace!("[Session] Frame {}us", timestamp_us);
            }
            SessionEvent::Remote(remote) => {
                self.cloud
                    .on_remote(remote, &mut self.table, self.tracking.as_ref());
            }
            SessionEvent::Command(command) => self.execute(command),
            SessionEvent::SearchFinished(done) => match self.pending_searches.remove(&done.job) {
                Some(callback) => callback(done.result),
                None => log::debug!("[Mesh] No callback for search job {}", done.job),
            },
            SessionEvent::Shutdown => {
                log::info!("[Session] Shutdown requested");
                return false;
            }
        }
        true
    }

    fn execute(&mut self, command: SessionCommand) {
        log::debug!("[Session] Command {}", command.name());
        let tracking = self.tracking.clone();
        let tracking = tracking.as_ref();

        match command {
            SessionCommand::HostAnchor { transform, reply } => {
                let result = self.cloud.host_anchor(transform, &mut self.table, tracking);
                reply.send(result).ok();
            }
            SessionCommand::ResolveAnchor { code, reply } => {
                let result = self.cloud.resolve_anchor(&code, &mut self.table, tracking);
                reply.send(result).ok();
            }
            SessionCommand::ResetCloud { reply } => {
                self.cloud.reset(&mut self.table, tracking);
                reply.send(Ok(())).ok();
            }
            SessionCommand::BeginRoomCreation { reply } => {
                reply.send(self.cloud.begin_room_creation()).ok();
            }
            SessionCommand::RoomReady { reply } => {
                reply.send(self.cloud.room_ready()).ok();
            }
            SessionCommand::BeginRoomCodeEntry { reply } => {
                reply.send(self.cloud.begin_room_code_entry()).ok();
            }
            SessionCommand::AddNamedAnchor {
                name,
                transform,
                deadline,
                reply,
            } => {
                if Instant::now() >= deadline {
                    log::warn!("[Anchors] Add of '{}' arrived after its deadline", name);
                    let waited_ms = self.table.attach_budget().as_millis() as u64;
                    reply
                        .send(Err(SthanaError::AttachTimeout { name, waited_ms }))
                        .ok();
                    return;
                }
                let started = self.table.begin_add(&name, transform, tracking, deadline);
                self.pending_adds.insert(started.anchor, reply);
                self.settle(started.outcomes);
            }
            SessionCommand::RemoveNamedAnchor { name, reply } => {
                if let Some(outcome) = self.table.remove(&name, tracking) {
                    self.settle(vec![outcome]);
                }
                reply.send(Ok(())).ok();
            }
            SessionCommand::SetNamedAnchorTransform {
                name,
                transform,
                reply,
            } => {
                let result = self.table.set_transform(&name, transform, tracking);
                reply.send(result).ok();
            }
            SessionCommand::NamedAnchor { name, reply } => {
                reply.send(Ok(self.table.get(&name).cloned())).ok();
            }
            SessionCommand::NamedAnchors { reply } => {
                reply.send(Ok(self.table.names())).ok();
            }
            SessionCommand::SetPlaneVisualization { enabled, reply } => {
                self.planes.set_visualization_enabled(enabled);
                reply.send(Ok(())).ok();
            }
            SessionCommand::NearestClassifiedFace { point, callback } => {
                self.start_search(point, callback);
            }
            SessionCommand::ClassifyScreenPoint { point, callback } => {
                match tracking.raycast(point) {
                    Some(hit) => self.start_search(hit, callback),
                    None => {
                        log::debug!("[Mesh] Raycast at ({:.0}, {:.0}) missed", point.x, point.y);
                        callback(FaceMatch::NOT_FOUND);
                    }
                }
            }
            SessionCommand::CloudStatus { reply } => {
                reply.send(Ok(self.cloud.status(&self.table))).ok();
            }
            SessionCommand::PlaneStats { reply } => {
                let stats = PlaneStats {
                    records: self.planes.record_count(),
                    visuals: self.planes.visual_count(),
                    visualization_enabled: self.planes.is_visualization_enabled(),
                };
                reply.send(Ok(stats)).ok();
            }
            SessionCommand::ResetSession { reply } => {
                self.reset_session();
                reply.send(Ok(())).ok();
            }
        }
    }

    /// Answer blocked `add` callers
    fn settle(&mut self, outcomes: Vec<AttachOutcome>) {
        let budget = self.table.attach_budget();
        for outcome in outcomes {
            if let Some(reply) = self.pending_adds.remove(&outcome.anchor()) {
                reply.send(outcome.into_result(budget)).ok();
            }
        }
    }

    fn start_search(&mut self, target: Vec3, callback: FaceCallback) {
        self.next_job += 1;
        let job = SearchJob {
            job: self.next_job,
            target,
            anchors: self.tracking.mesh_anchors(),
            config: self.search,
        };

        let rejected = match self.worker.as_ref() {
            Some(worker) => worker.submit(job).err(),
            None => Some(job),
        };
        match rejected {
            None => {
                self.pending_searches.insert(self.next_job, callback);
            }
            Some(job) => {
                log::warn!("[Mesh] Search worker busy, running job {} inline", job.job);
                callback(job.run());
            }
        }
    }

    /// Drop everything and restart tracking
    fn reset_session(&mut self) {
        log::info!("[Session] Resetting session");
        let tracking = self.tracking.clone();
        self.cloud.reset(&mut self.table, tracking.as_ref());
        let outcomes = self.table.clear(tracking.as_ref());
        self.settle(outcomes);
        self.planes.clear();
        tracking.reset();
        tracking.run(&self.options);
    }
}
