use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::service::BadgeService;
use crate::complexes::ComplexId;
use crate::store::Store;

/// Hook invoked whenever data feeding a complex's badges changes.
pub trait RecomputeScheduler: Send + Sync {
    fn schedule(&self, complex_id: ComplexId);
}

/// Runs the full pipeline before returning to the caller.
pub struct InlineRecompute<S> {
    service: Arc<BadgeService<S>>,
}

impl<S> InlineRecompute<S> {
    pub fn new(service: Arc<BadgeService<S>>) -> Self {
        Self { service }
    }
}

impl<S> RecomputeScheduler for InlineRecompute<S>
where
    S: Store,
{
    fn schedule(&self, complex_id: ComplexId) {
        // Failures are already logged by the service; the trigger itself never fails.
        if let Ok(outcome) = self.service.recompute(&complex_id) {
            debug!(%complex_id, persisted = outcome.persisted, "inline badge recompute finished");
        }
    }
}

/// Hands complex ids to a background worker over a bounded channel.
///
/// When the channel is full the request is dropped with a warning; the next trigger or an
/// explicit recompute brings the badges up to date.
#[derive(Clone)]
pub struct BadgeRecomputeQueue {
    sender: mpsc::Sender<ComplexId>,
}

impl BadgeRecomputeQueue {
    /// Start the worker on the current Tokio runtime.
    ///
    /// The worker exits once every queue handle has been dropped and the backlog drained.
    pub fn spawn<S>(service: Arc<BadgeService<S>>, depth: usize) -> (Self, JoinHandle<()>)
    where
        S: Store,
    {
        let (sender, mut receiver) = mpsc::channel::<ComplexId>(depth.max(1));
        let worker = tokio::spawn(async move {
            while let Some(complex_id) = receiver.recv().await {
                // Repository calls are synchronous and may block on a real database.
                let service = Arc::clone(&service);
                let job = tokio::task::spawn_blocking(move || {
                    let result = service.recompute(&complex_id);
                    (complex_id, result)
                });
                match job.await {
                    Ok((_, Ok(_))) => {}
                    Ok((complex_id, Err(err))) => {
                        warn!(%complex_id, error = %err, "queued badge recompute failed");
                    }
                    Err(err) => error!(error = %err, "badge recompute task panicked"),
                }
            }
            debug!("badge recompute worker stopped");
        });
        (Self { sender }, worker)
    }
}

impl RecomputeScheduler for BadgeRecomputeQueue {
    fn schedule(&self, complex_id: ComplexId) {
        match self.sender.try_send(complex_id) {
            Ok(()) => {}
            Err(TrySendError::Full(complex_id)) => {
                warn!(%complex_id, "badge recompute queue full; dropping request");
            }
            Err(TrySendError::Closed(complex_id)) => {
                error!(%complex_id, "badge recompute worker is not running");
            }
        }
    }
}
