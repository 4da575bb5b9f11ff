//! Simulated remote anchor-hosting service.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::cloud::{AnchorHostingService, CloudAnchorState, RemoteEvent, ResolvedAnchor};
use crate::core::{AnchorId, CloudAnchorId, RequestId, Transform};
use crate::session::EventSink;

/// Remote anchor store shared by every simulated device
#[derive(Clone, Default)]
pub struct MockCloud {
    inner: Arc<Mutex<CloudStore>>,
}

#[derive(Default)]
struct CloudStore {
    next_id: u64,
    anchors: HashMap<CloudAnchorId, Transform>,
}

impl MockCloud {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hosted anchors
    pub fn len(&self) -> usize {
        self.inner.lock().anchors.len()
    }

    /// True if nothing is hosted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, transform: Transform) -> CloudAnchorId {
        let mut store = self.inner.lock();
        store.next_id += 1;
        let id = CloudAnchorId::new(format!("ua-{:08x}", store.next_id));
        store.anchors.insert(id.clone(), transform);
        id
    }

    fn lookup(&self, id: &CloudAnchorId) -> Option<Transform> {
        self.inner.lock().anchors.get(id).copied()
    }
}

#[derive(Debug)]
enum RemoteJob {
    Host {
        request: RequestId,
        transform: Transform,
    },
    Resolve {
        request: RequestId,
        cloud_id: CloudAnchorId,
    },
}

#[derive(Default)]
struct Script {
    latency: Duration,
    hold: bool,
    held: Vec<RemoteJob>,
    fail_next: Option<CloudAnchorState>,
    reject_next: Option<CloudAnchorState>,
    accepted: Vec<RequestId>,
    cancelled: Vec<RequestId>,
}

/// Test-side control for a [`MockHostingService`] that has been moved into
/// a session.
#[derive(Clone)]
pub struct MockRemoteControl {
    script: Arc<Mutex<Script>>,
    cloud: MockCloud,
    sink: EventSink,
}

impl MockRemoteControl {
    /// Completion delay for new requests
    pub fn set_latency(&self, latency: Duration) {
        self.script.lock().latency = latency;
    }

    /// Hold completions until [`release`](Self::release)
    pub fn hold(&self) {
        self.script.lock().hold = true;
    }

    /// Complete every held request now (on the calling thread) and stop
    /// holding.
    pub fn release(&self) {
        let held = {
            let mut script = self.script.lock();
            script.hold = false;
            std::mem::take(&mut script.held)
        };
        for job in held {
            complete(job, &self.script, &self.cloud, &self.sink);
        }
    }

    /// Next completion fails with `state`
    pub fn fail_next(&self, state: CloudAnchorState) {
        self.script.lock().fail_next = Some(state);
    }

    /// Next call is refused up front with `state`
    pub fn reject_next(&self, state: CloudAnchorState) {
        self.script.lock().reject_next = Some(state);
    }

    /// Requests accepted so far
    pub fn accepted(&self) -> Vec<RequestId> {
        self.script.lock().accepted.clone()
    }

    /// Requests cancelled so far
    pub fn cancelled(&self) -> Vec<RequestId> {
        self.script.lock().cancelled.clone()
    }

    /// Publish an arbitrary completion, e.g. a late or duplicate one
    pub fn inject(&self, event: RemoteEvent) -> bool {
        self.sink.remote(event)
    }
}

/// In-process [`AnchorHostingService`] backed by a [`MockCloud`].
///
/// Completions are produced on a `mock-remote` thread after the configured
/// latency and published through the session sink.
pub struct MockHostingService {
    control: MockRemoteControl,
    jobs: Option<Sender<RemoteJob>>,
    handle: Option<JoinHandle<()>>,
}

impl MockHostingService {
    /// Start the simulated service
    pub fn spawn(sink: EventSink, cloud: MockCloud) -> Self {
        let control = MockRemoteControl {
            script: Arc::new(Mutex::new(Script::default())),
            cloud,
            sink,
        };
        let (jobs, rx) = unbounded();
        let worker = control.clone();
        let handle = thread::Builder::new()
            .name("mock-remote".into())
            .spawn(move || run_remote_loop(rx, worker))
            .expect("Failed to spawn mock remote thread");
        Self {
            control,
            jobs: Some(jobs),
            handle: Some(handle),
        }
    }

    /// Control handle usable after the service is moved into a session
    pub fn control(&self) -> MockRemoteControl {
        self.control.clone()
    }

    fn accept(&self, job: RemoteJob, request: RequestId) -> Result<(), CloudAnchorState> {
        {
            let mut script = self.control.script.lock();
            if let Some(state) = script.reject_next.take() {
                return Err(state);
            }
            script.accepted.push(request);
        }
        match &self.jobs {
            Some(jobs) if jobs.send(job).is_ok() => Ok(()),
            _ => Err(CloudAnchorState::ErrorServiceUnavailable),
        }
    }
}

impl AnchorHostingService for MockHostingService {
    fn host(
        &mut self,
        request: RequestId,
        _anchor: AnchorId,
        transform: Transform,
    ) -> Result<(), CloudAnchorState> {
        self.accept(RemoteJob::Host { request, transform }, request)
    }

    fn resolve(
        &mut self,
        request: RequestId,
        cloud_id: &CloudAnchorId,
    ) -> Result<(), CloudAnchorState> {
        let job = RemoteJob::Resolve {
            request,
            cloud_id: cloud_id.clone(),
        };
        self.accept(job, request)
    }

    fn cancel(&mut self, request: RequestId) {
        self.control.script.lock().cancelled.push(request);
    }
}

impl Drop for MockHostingService {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("[Mock] Remote thread panicked");
            }
        }
    }
}

fn run_remote_loop(rx: Receiver<RemoteJob>, control: MockRemoteControl) {
    while let Ok(job) = rx.recv() {
        let latency = {
            let mut script = control.script.lock();
            if script.hold {
                script.held.push(job);
                continue;
            }
            script.latency
        };
        if !latency.is_zero() {
            thread::sleep(latency);
        }
        complete(job, &control.script, &control.cloud, &control.sink);
    }
}

fn complete(job: RemoteJob, script: &Mutex<Script>, cloud: &MockCloud, sink: &EventSink) {
    let failure = script.lock().fail_next.take();
    let event = match job {
        RemoteJob::Host { request, transform } => RemoteEvent::Hosted {
            request,
            outcome: match failure {
                Some(state) => Err(state),
                None => Ok(cloud.store(transform)),
            },
        },
        RemoteJob::Resolve { request, cloud_id } => {
            let outcome = match (failure, cloud.lookup(&cloud_id)) {
                (Some(state), _) => Err(state),
                (None, Some(transform)) => Ok(ResolvedAnchor {
                    cloud_id,
                    transform,
                }),
                (None, None) => Err(CloudAnchorState::ErrorCloudIdNotFound),
            };
            RemoteEvent::Resolved { request, outcome }
        }
    };
    log::debug!("[Mock] Completing {}", event.request());
    sink.remote(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionEvent, event_channel};

    fn next_remote(rx: &Receiver<SessionEvent>) -> RemoteEvent {
        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            SessionEvent::Remote(event) => event,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_host_then_resolve() {
        let (sink, rx) = event_channel(8);
        let mut service = MockHostingService::spawn(sink, MockCloud::new());

        service
            .host(RequestId(1), AnchorId(1), Transform::IDENTITY)
            .unwrap();
        let id = match next_remote(&rx) {
            RemoteEvent::Hosted {
                request,
                outcome: Ok(id),
            } => {
                assert_eq!(request, RequestId(1));
                id
            }
            other => panic!("unexpected {:?}", other),
        };

        service.resolve(RequestId(2), &id).unwrap();
        match next_remote(&rx) {
            RemoteEvent::Resolved {
                outcome: Ok(resolved),
                ..
            } => assert_eq!(resolved.cloud_id, id),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_id() {
        let (sink, rx) = event_channel(8);
        let mut service = MockHostingService::spawn(sink, MockCloud::new());
        service
            .resolve(RequestId(1), &CloudAnchorId::new("missing"))
            .unwrap();
        assert_eq!(
            next_remote(&rx),
            RemoteEvent::Resolved {
                request: RequestId(1),
                outcome: Err(CloudAnchorState::ErrorCloudIdNotFound),
            }
        );
    }

    #[test]
    fn test_failure_injection() {
        let (sink, rx) = event_channel(8);
        let mut service = MockHostingService::spawn(sink, MockCloud::new());
        let control = service.control();

        control.reject_next(CloudAnchorState::ErrorNotAuthorized);
        assert_eq!(
            service.host(RequestId(1), AnchorId(1), Transform::IDENTITY),
            Err(CloudAnchorState::ErrorNotAuthorized)
        );

        control.fail_next(CloudAnchorState::ErrorResourceExhausted);
        service
            .host(RequestId(2), AnchorId(1), Transform::IDENTITY)
            .unwrap();
        assert_eq!(
            next_remote(&rx),
            RemoteEvent::Hosted {
                request: RequestId(2),
                outcome: Err(CloudAnchorState::ErrorResourceExhausted),
            }
        );
        assert_eq!(control.accepted(), vec![RequestId(2)]);
    }

    #[test]
    fn test_hold_and_release() {
        let (sink, rx) = event_channel(8);
        let mut service = MockHostingService::spawn(sink, MockCloud::new());
        let control = service.control();
        control.hold();

        service
            .host(RequestId(1), AnchorId(1), Transform::IDENTITY)
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        control.release();
        assert_eq!(next_remote(&rx).request(), RequestId(1));
    }
}
