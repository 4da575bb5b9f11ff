//! Events on the session's ordered delivery queue.

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::cloud::RemoteEvent;
use crate::core::AnchorId;
use crate::planes::PlaneEvent;

use super::commands::SessionCommand;
use super::worker::SearchCompletion;

/// Notification from the tracking subsystem
#[derive(Clone, Debug, PartialEq)]
pub enum TrackingEvent {
    Plane(PlaneEvent),
    /// A tracking anchor got its scene node
    AnchorAttached(AnchorId),
    /// New frame processed (mesh may have changed)
    FrameUpdated { timestamp_us: u64 },
}

/// Everything the delivery thread consumes, in arrival order
#[derive(Debug)]
pub enum SessionEvent {
    Tracking(TrackingEvent),
    Remote(RemoteEvent),
    Command(SessionCommand),
    SearchFinished(SearchCompletion),
    Shutdown,
}

/// Publishing end of the delivery queue.
///
/// Cloned into every collaborator that reports asynchronously. Sends block
/// while the queue is full.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: Sender<SessionEvent>,
}

/// Create the delivery queue
pub fn event_channel(capacity: usize) -> (EventSink, Receiver<SessionEvent>) {
    let (tx, rx) = bounded(capacity);
    (EventSink { tx }, rx)
}

impl EventSink {
    /// Sink whose receiver is already gone; every publish is dropped.
    pub fn detached() -> Self {
        let (sink, _) = event_channel(1);
        sink
    }

    /// Publish an event. Returns false if the session is gone.
    pub fn publish(&self, event: SessionEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("[Session] Queue closed, dropping {:?}", e.into_inner());
                false
            }
        }
    }

    /// Publish a plane event
    pub fn plane(&self, event: PlaneEvent) -> bool {
        self.publish(SessionEvent::Tracking(TrackingEvent::Plane(event)))
    }

    /// Publish an anchor attachment
    pub fn anchor_attached(&self, anchor: AnchorId) -> bool {
        self.publish(SessionEvent::Tracking(TrackingEvent::AnchorAttached(anchor)))
    }

    /// Publish a frame tick
    pub fn frame_updated(&self, timestamp_us: u64) -> bool {
        self.publish(SessionEvent::Tracking(TrackingEvent::FrameUpdated {
            timestamp_us,
        }))
    }

    /// Publish a remote completion
    pub fn remote(&self, event: RemoteEvent) -> bool {
        self.publish(SessionEvent::Remote(event))
    }

    /// Send a command
    pub(crate) fn command(&self, command: SessionCommand) -> bool {
        self.publish(SessionEvent::Command(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlaneId;

    #[test]
    fn test_events_arrive_in_order() {
        let (sink, rx) = event_channel(8);
        assert!(sink.anchor_attached(AnchorId(1)));
        assert!(sink.plane(PlaneEvent::Removed { plane: PlaneId(2) }));
        assert!(sink.frame_updated(33));

        assert!(matches!(
            rx.recv().unwrap(),
            SessionEvent::Tracking(TrackingEvent::AnchorAttached(AnchorId(1)))
        ));
        assert!(matches!(
            rx.recv().unwrap(),
            SessionEvent::Tracking(TrackingEvent::Plane(PlaneEvent::Removed { .. }))
        ));
        assert!(matches!(
            rx.recv().unwrap(),
            SessionEvent::Tracking(TrackingEvent::FrameUpdated { timestamp_us: 33 })
        ));
    }

    #[test]
    fn test_detached_sink_drops() {
        let sink = EventSink::detached();
        assert!(!sink.anchor_attached(AnchorId(1)));
    }
}
