use super::domain::{ApartmentComplex, ComplexId, ComplexIspLink};
use crate::badges::BadgeId;
use crate::store::RepositoryError;

/// Complex storage, including the cached badge column.
pub trait ComplexRepository: Send + Sync {
    fn insert_complex(&self, complex: ApartmentComplex)
        -> Result<ApartmentComplex, RepositoryError>;
    fn fetch_complex(&self, id: &ComplexId) -> Result<Option<ApartmentComplex>, RepositoryError>;
    fn list_complexes(&self) -> Result<Vec<ApartmentComplex>, RepositoryError>;

    /// Bump the revision after a change to data the badges derive from.
    fn touch_complex(&self, id: &ComplexId) -> Result<u64, RepositoryError>;

    /// Overwrite `badges` if the stored revision still equals `expected_revision`.
    ///
    /// Returns the new revision, or [`RepositoryError::StaleRevision`] when another write
    /// landed since the caller read the complex.
    fn replace_badges(
        &self,
        id: &ComplexId,
        badges: Vec<BadgeId>,
        expected_revision: u64,
    ) -> Result<u64, RepositoryError>;
}

/// Provider links joined with their metrics.
pub trait IspLinkRepository: Send + Sync {
    fn links_for_complex(&self, id: &ComplexId) -> Result<Vec<ComplexIspLink>, RepositoryError>;
    fn insert_link(&self, link: ComplexIspLink) -> Result<ComplexIspLink, RepositoryError>;
    fn update_link(&self, link: ComplexIspLink) -> Result<(), RepositoryError>;
}
