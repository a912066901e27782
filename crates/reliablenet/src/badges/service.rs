use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::catalog::BadgeId;
use super::evaluation::BadgeEvaluator;
use super::metrics::{aggregate, ComplexMetrics, MetricsView};
use crate::complexes::ComplexId;
use crate::store::{RepositoryError, Store};

/// Read-compute-write rounds attempted before giving up on a moving revision.
pub const MAX_RECOMPUTE_ATTEMPTS: usize = 3;

/// Result of the read and compute phases for one complex.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeComputation {
    pub complex_id: ComplexId,
    /// Complex revision observed while reading.
    pub revision: u64,
    pub metrics: ComplexMetrics,
    pub badges: Vec<BadgeId>,
}

/// What a recompute request reports back.
///
/// `persisted` is false when the write failed; `badges` is still the computed list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecomputeOutcome {
    pub complex_id: ComplexId,
    pub badges: Vec<BadgeId>,
    pub metrics: MetricsView,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

/// Runs the aggregator, evaluator, and badge write-back for a complex.
pub struct BadgeService<S> {
    store: Arc<S>,
    evaluator: BadgeEvaluator,
}

impl<S> BadgeService<S>
where
    S: Store,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_evaluator(store, BadgeEvaluator::default())
    }

    pub fn with_evaluator(store: Arc<S>, evaluator: BadgeEvaluator) -> Self {
        Self { store, evaluator }
    }

    pub fn evaluator(&self) -> &BadgeEvaluator {
        &self.evaluator
    }

    /// Read phase plus evaluation, without touching the stored badges.
    pub fn compute(&self, complex_id: &ComplexId) -> Result<BadgeComputation, BadgeServiceError> {
        let complex = self
            .store
            .fetch_complex(complex_id)
            .map_err(|err| read_failure(complex_id, err))?
            .ok_or_else(|| BadgeServiceError::ComplexNotFound(complex_id.clone()))?;

        let reviews = self
            .store
            .verified_reviews_for_complex(complex_id)
            .map_err(|err| read_failure(complex_id, err))?;
        let links = self
            .store
            .links_for_complex(complex_id)
            .map_err(|err| read_failure(complex_id, err))?;

        let metrics = aggregate(&reviews, &links);
        let badges = self.evaluator.evaluate(&metrics, &complex.amenities);

        Ok(BadgeComputation {
            complex_id: complex.id,
            revision: complex.revision,
            metrics,
            badges,
        })
    }

    /// Compute and overwrite the complex's badges.
    ///
    /// The write is conditional on the revision seen while reading; if another write got
    /// there first the whole round is repeated, up to [`MAX_RECOMPUTE_ATTEMPTS`].
    pub fn recompute(&self, complex_id: &ComplexId) -> Result<RecomputeOutcome, BadgeServiceError> {
        let mut attempt = 1;
        loop {
            let computation = self.compute(complex_id)?;
            let write = self.store.replace_badges(
                complex_id,
                computation.badges.clone(),
                computation.revision,
            );

            match write {
                Ok(revision) => {
                    info!(
                        complex_id = %complex_id,
                        badge_count = computation.badges.len(),
                        revision,
                        "badges recomputed"
                    );
                    return Ok(outcome(computation, true, Some(revision)));
                }
                Err(RepositoryError::StaleRevision { expected, actual })
                    if attempt < MAX_RECOMPUTE_ATTEMPTS =>
                {
                    debug!(
                        complex_id = %complex_id,
                        expected,
                        actual,
                        attempt,
                        "complex changed during badge recompute; retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        complex_id = %complex_id,
                        error = %err,
                        "failed to persist recomputed badges"
                    );
                    return Ok(outcome(computation, false, None));
                }
            }
        }
    }
}

fn outcome(
    computation: BadgeComputation,
    persisted: bool,
    revision: Option<u64>,
) -> RecomputeOutcome {
    RecomputeOutcome {
        complex_id: computation.complex_id,
        badges: computation.badges,
        metrics: computation.metrics.view(),
        persisted,
        revision,
    }
}

fn read_failure(complex_id: &ComplexId, err: RepositoryError) -> BadgeServiceError {
    error!(complex_id = %complex_id, error = %err, "failed to load badge inputs");
    BadgeServiceError::Repository(err)
}

/// Error raised by the badge service.
#[derive(Debug, thiserror::Error)]
pub enum BadgeServiceError {
    #[error("apartment complex {0} not found")]
    ComplexNotFound(ComplexId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
