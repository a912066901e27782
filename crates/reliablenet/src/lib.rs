//! Connectivity reviews and badges for apartment complexes.
//!
//! Each domain module ([`complexes`], [`reviews`], [`badges`]) owns its types, a service
//! generic over the [`store::Store`] seam, and an axum router. The API binary wires them to
//! concrete storage.

pub mod auth;
pub mod badges;
pub mod complexes;
pub mod config;
pub mod error;
pub(crate) mod http;
pub mod reviews;
pub mod store;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod test_support;
pub mod validation;
