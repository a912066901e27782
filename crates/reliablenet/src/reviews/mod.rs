//! Resident reviews, moderation, and the peak-hour display summary.

pub mod domain;
pub mod peak_hours;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    PeakHourReport, Review, ReviewId, ReviewQuery, ReviewSort, ReviewSubmission, UserId,
};
pub use peak_hours::{PeakHourSummary, PerformanceTier};
pub use repository::ReviewRepository;
pub use router::review_router;
pub use service::{ReviewService, ReviewServiceError};
