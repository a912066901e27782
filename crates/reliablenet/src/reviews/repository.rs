use super::domain::{Review, ReviewId};
use crate::complexes::ComplexId;
use crate::store::RepositoryError;

/// Review storage. The badge engine only reads through `verified_reviews_for_complex`.
pub trait ReviewRepository: Send + Sync {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn update_review(&self, review: Review) -> Result<(), RepositoryError>;
    fn reviews_for_complex(&self, id: &ComplexId) -> Result<Vec<Review>, RepositoryError>;
    fn verified_reviews_for_complex(&self, id: &ComplexId)
        -> Result<Vec<Review>, RepositoryError>;
}
