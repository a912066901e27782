//! Connectivity badges for apartment complexes.
//!
//! Verified reviews and provider links are reduced to a handful of averages
//! ([`metrics`]), checked against the static rule table ([`catalog`]) by the
//! [`BadgeEvaluator`], and the qualifying ids are written back onto the complex by
//! [`BadgeService::recompute`]. Data changes reach the service through a
//! [`RecomputeScheduler`].

pub mod catalog;
pub mod evaluation;
pub mod metrics;
pub mod queue;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{definition, BadgeCriteria, BadgeDefinition, BadgeId, BADGE_CATALOG};
pub use evaluation::{BadgeAssessment, BadgeEvaluator};
pub use metrics::{aggregate, best_isp, BestIsp, ComplexMetrics, MetricsView};
pub use queue::{BadgeRecomputeQueue, InlineRecompute, RecomputeScheduler};
pub use router::badge_router;
pub use service::{
    BadgeComputation, BadgeService, BadgeServiceError, RecomputeOutcome, MAX_RECOMPUTE_ATTEMPTS,
};
