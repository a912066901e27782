//! Apartment complexes and the ISP links serving them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    ApartmentComplex, ComplexDetail, ComplexId, ComplexIspLink, ComplexPage, ComplexQuery,
    IspLinkId, IspMetric, NewComplex, NewIspLink, SpeedTestSample,
};
pub use repository::{ComplexRepository, IspLinkRepository};
pub use router::complex_router;
pub use service::{ComplexService, ComplexServiceError};
