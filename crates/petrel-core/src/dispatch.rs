//! Asynchronous delivery hand-off.
//!
//! The pipeline ends by submitting one unit of work to an external queue;
//! executing the delivery (rendering notifications, writing timelines,
//! relaying onward) is the embedder's job. Submission is fire-and-forget:
//! it must not block on delivery, and a failure to *enqueue* is a
//! reportable error distinct from any later delivery failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use petrel_proto::{Handle, Message, PrincipalId};
use thiserror::Error;

/// One unit of asynchronous delivery work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryJob {
    /// Deliver a received message to a batch of local principals.
    LocalBatch {
        /// The parsed, verified message.
        message: Message,
        /// Local principals that must receive it, sorted for determinism.
        recipients: Vec<PrincipalId>,
        /// Verified sender of the envelope it arrived in.
        sender: Handle,
    },

    /// Deliver a relayable message to the single local principal holding
    /// authority over its parent.
    RelayToAuthor {
        /// The parsed, verified message.
        message: Message,
        /// The parent object's local author.
        author: PrincipalId,
        /// Verified sender of the envelope it arrived in.
        sender: Handle,
    },
}

/// Errors from work submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The queue refused the job (full, shut down, backend unreachable).
    #[error("work queue rejected job: {0}")]
    Rejected(String),
}

/// Fire-and-forget submission of delivery work.
pub trait WorkQueue: Send + Sync {
    /// Enqueue a job for asynchronous execution.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Rejected`] if the job could not be
    /// enqueued. Whether the delivery later succeeds is not observable
    /// through this trait.
    fn submit(&self, job: DeliveryJob) -> Result<(), DispatchError>;
}

/// In-memory [`WorkQueue`] that records submitted jobs.
///
/// For tests and single-process embedders that drain the queue
/// themselves. Clones share the underlying job list.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    jobs: Arc<Mutex<Vec<DeliveryJob>>>,
}

impl MemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeliveryJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all jobs submitted so far, in submission order.
    #[must_use]
    pub fn jobs(&self) -> Vec<DeliveryJob> {
        self.lock().clone()
    }

    /// Remove and return all queued jobs.
    pub fn drain(&self) -> Vec<DeliveryJob> {
        self.lock().drain(..).collect()
    }
}

impl WorkQueue for MemoryQueue {
    fn submit(&self, job: DeliveryJob) -> Result<(), DispatchError> {
        self.lock().push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use petrel_proto::{Guid, Post, Visibility};

    use super::*;

    fn job() -> DeliveryJob {
        DeliveryJob::LocalBatch {
            message: Message::Post(Post {
                author: Handle::new("alice@pod.example"),
                guid: Guid::new("g1"),
                visibility: Visibility::Public,
                body: "hi".to_string(),
            }),
            recipients: vec![PrincipalId(1)],
            sender: Handle::new("alice@pod.example"),
        }
    }

    #[test]
    fn submitted_jobs_are_recorded_in_order() {
        let queue = MemoryQueue::new();
        queue.submit(job()).unwrap();
        queue.submit(job()).unwrap();

        assert_eq!(queue.jobs().len(), 2);
    }

    #[test]
    fn drain_empties_the_queue() {
        let queue = MemoryQueue::new();
        queue.submit(job()).unwrap();

        assert_eq!(queue.drain().len(), 1);
        assert!(queue.jobs().is_empty());
    }
}
