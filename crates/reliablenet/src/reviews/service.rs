use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Review, ReviewId, ReviewQuery, ReviewSubmission, UserId};
use super::peak_hours::PeakHourSummary;
use crate::badges::RecomputeScheduler;
use crate::complexes::ComplexId;
use crate::store::{RepositoryError, Store};
use crate::validation::ValidationError;

static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_review_id() -> ReviewId {
    let id = REVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReviewId(format!("rev-{id:06}"))
}

/// Review intake and moderation.
///
/// New reviews start unverified and never touch badges. Verification is the only review
/// transition that schedules a badge recompute.
pub struct ReviewService<S, Q: ?Sized> {
    store: Arc<S>,
    scheduler: Arc<Q>,
}

impl<S, Q> ReviewService<S, Q>
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, scheduler: Arc<Q>) -> Self {
        Self { store, scheduler }
    }

    pub fn submit(
        &self,
        complex_id: &ComplexId,
        author: &UserId,
        submission: ReviewSubmission,
    ) -> Result<Review, ReviewServiceError> {
        submission.validate()?;
        self.require_complex(complex_id)?;

        let review = Review {
            id: next_review_id(),
            complex_id: complex_id.clone(),
            author: author.clone(),
            rating: submission.rating,
            internet_rating: submission.internet_rating,
            comment: submission.comment,
            pros: submission.pros,
            cons: submission.cons,
            peak_hour: submission.peak_hour,
            verified: false,
            flagged: false,
            flagged_at: None,
            flagged_by: None,
            helpful_count: 0,
            created_at: Utc::now(),
        };

        let stored = self.store.insert_review(review)?;
        info!(review_id = %stored.id, %complex_id, author = %author, "review submitted");
        Ok(stored)
    }

    pub fn list(
        &self,
        complex_id: &ComplexId,
        query: &ReviewQuery,
    ) -> Result<Vec<Review>, ReviewServiceError> {
        self.require_complex(complex_id)?;
        let mut reviews = self.store.reviews_for_complex(complex_id)?;
        query.apply(&mut reviews);
        Ok(reviews)
    }

    /// Mark a review verified and schedule a badge recompute for its complex.
    pub fn verify(
        &self,
        review_id: &ReviewId,
        moderator: &UserId,
    ) -> Result<Review, ReviewServiceError> {
        let mut review = self.require_review(review_id)?;
        if review.verified {
            return Ok(review);
        }

        review.verified = true;
        self.store.update_review(review.clone())?;
        self.refresh_badges(&review.complex_id);

        info!(%review_id, complex_id = %review.complex_id, %moderator, "review verified");
        Ok(review)
    }

    pub fn flag(&self, review_id: &ReviewId, user: &UserId) -> Result<Review, ReviewServiceError> {
        let mut review = self.require_review(review_id)?;
        review.flagged = true;
        review.flagged_at = Some(Utc::now());
        review.flagged_by = Some(user.clone());
        self.store.update_review(review.clone())?;
        info!(%review_id, flagged_by = %user, "review flagged for moderation");
        Ok(review)
    }

    pub fn mark_helpful(&self, review_id: &ReviewId) -> Result<Review, ReviewServiceError> {
        let mut review = self.require_review(review_id)?;
        review.helpful_count = review.helpful_count.saturating_add(1);
        self.store.update_review(review.clone())?;
        Ok(review)
    }

    pub fn peak_hour_summary(
        &self,
        complex_id: &ComplexId,
    ) -> Result<Option<PeakHourSummary>, ReviewServiceError> {
        self.require_complex(complex_id)?;
        let reviews = self.store.reviews_for_complex(complex_id)?;
        Ok(PeakHourSummary::from_reviews(&reviews))
    }

    /// Bump the complex revision and queue a recompute. A failed bump is logged and the
    /// recompute is still queued.
    fn refresh_badges(&self, complex_id: &ComplexId) {
        if let Err(err) = self.store.touch_complex(complex_id) {
            warn!(%complex_id, error = %err, "failed to bump complex revision");
        }
        self.scheduler.schedule(complex_id.clone());
    }

    fn require_complex(&self, complex_id: &ComplexId) -> Result<(), ReviewServiceError> {
        match self.store.fetch_complex(complex_id)? {
            Some(_) => Ok(()),
            None => Err(ReviewServiceError::ComplexNotFound(complex_id.clone())),
        }
    }

    fn require_review(&self, review_id: &ReviewId) -> Result<Review, ReviewServiceError> {
        self.store
            .fetch_review(review_id)?
            .ok_or_else(|| ReviewServiceError::ReviewNotFound(review_id.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("apartment complex {0} not found")]
    ComplexNotFound(ComplexId),
    #[error("review {0} not found")]
    ReviewNotFound(ReviewId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
