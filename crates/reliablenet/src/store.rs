//! Storage seams shared by the complex, review, and badge services.
//!
//! The relational database is an external collaborator; services only see these traits.
//! Every method is expected to be atomic for the single row (or row set) it touches.

use crate::complexes::repository::{ComplexRepository, IspLinkRepository};
use crate::reviews::repository::ReviewRepository;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("revision moved from {expected} to {actual}")]
    StaleRevision { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Everything the services need from one backing store.
pub trait Store: ComplexRepository + IspLinkRepository + ReviewRepository + 'static {}

impl<T> Store for T where T: ComplexRepository + IspLinkRepository + ReviewRepository + 'static {}
