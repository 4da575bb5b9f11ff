//! Mesh search worker thread.
//!
//! Runs [`nearest_classified_face`] off the delivery thread. Results are
//! posted back onto the delivery queue as [`SessionEvent::SearchFinished`],
//! where the caller's callback runs. The thread exits once every job sender
//! is dropped.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::Vec3;
use crate::mesh::{FaceMatch, MeshAnchor, MeshSearchConfig, nearest_classified_face};

use super::events::{EventSink, SessionEvent};

/// One lookup request
#[derive(Debug)]
pub struct SearchJob {
    /// Delivery-thread key for the pending callback
    pub job: u64,
    pub target: Vec3,
    /// Mesh snapshot taken when the request was accepted
    pub anchors: Vec<MeshAnchor>,
    pub config: MeshSearchConfig,
}

impl SearchJob {
    /// Run the lookup
    pub fn run(&self) -> FaceMatch {
        nearest_classified_face(self.target, &self.anchors, &self.config)
    }
}

/// Finished lookup
#[derive(Clone, Debug, PartialEq)]
pub struct SearchCompletion {
    pub job: u64,
    pub result: FaceMatch,
}

/// Mesh search thread handle.
pub struct SearchWorker {
    jobs: Sender<SearchJob>,
    handle: JoinHandle<()>,
}

impl SearchWorker {
    /// Spawn the worker
    pub fn spawn(capacity: usize, sink: EventSink) -> Self {
        let (jobs, rx) = bounded(capacity);
        let handle = thread::Builder::new()
            .name("mesh-search".into())
            .spawn(move || run_search_loop(rx, sink))
            .expect("Failed to spawn mesh search thread");
        Self { jobs, handle }
    }

    /// Queue a job without blocking.
    ///
    /// Returns the job back if the worker is saturated or gone.
    pub fn submit(&self, job: SearchJob) -> Result<(), SearchJob> {
        self.jobs.try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => job,
            TrySendError::Disconnected(job) => job,
        })
    }

    /// Close the job queue and wait for the thread to finish.
    pub fn join(self) -> thread::Result<()> {
        drop(self.jobs);
        self.handle.join()
    }
}

fn run_search_loop(rx: Receiver<SearchJob>, sink: EventSink) {
    log::debug!("[Mesh] Search worker started");
    while let Ok(job) = rx.recv() {
        let result = job.run();
        let completion = SearchCompletion {
            job: job.job,
            result,
        };
        if !sink.publish(SessionEvent::SearchFinished(completion)) {
            break;
        }
    }
    log::debug!("[Mesh] Search worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::event_channel;
    use std::time::Duration;

    #[test]
    fn test_worker_posts_completion() {
        let (sink, rx) = event_channel(4);
        let worker = SearchWorker::spawn(2, sink);
        worker
            .submit(SearchJob {
                job: 7,
                target: Vec3::ZERO,
                anchors: Vec::new(),
                config: MeshSearchConfig::default(),
            })
            .unwrap();

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            SessionEvent::SearchFinished(done) => {
                assert_eq!(done.job, 7);
                assert_eq!(done.result, FaceMatch::NOT_FOUND);
            }
            other => panic!("unexpected event {:?}", other),
        }
        worker.join().unwrap();
    }
}
