use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    ApartmentComplex, ComplexDetail, ComplexId, ComplexIspLink, ComplexPage, ComplexQuery,
    IspLinkId, NewComplex, NewIspLink, SpeedTestSample,
};
use crate::badges::RecomputeScheduler;
use crate::store::{RepositoryError, Store};
use crate::validation::{check_non_negative, check_present, check_range, ValidationError};

static COMPLEX_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LINK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_complex_id() -> ComplexId {
    let id = COMPLEX_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ComplexId(format!("cx-{id:06}"))
}

fn next_link_id() -> IspLinkId {
    let id = LINK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    IspLinkId(format!("isp-{id:06}"))
}

impl NewComplex {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_present("name", &self.name)?;
        check_present("address", &self.address)?;
        check_present("city", &self.city)?;
        check_present("state", &self.state)?;
        check_present("zip", &self.zip)?;
        if let Some(latitude) = self.latitude {
            check_range("latitude", latitude, -90.0, 90.0)?;
        }
        if let Some(longitude) = self.longitude {
            check_range("longitude", longitude, -180.0, 180.0)?;
        }
        Ok(())
    }
}

impl NewIspLink {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_present("isp", &self.isp)?;
        check_range("coverage", self.coverage, 0.0, 1.0)?;
        check_non_negative("metric.avg_download", self.metric.avg_download)?;
        check_non_negative("metric.avg_upload", self.metric.avg_upload)?;
        check_non_negative("metric.avg_ping", self.metric.avg_ping)?;
        if let Some(reliability) = self.metric.reliability {
            check_range("metric.reliability", reliability, 0.0, 1.0)?;
        }
        Ok(())
    }
}

impl SpeedTestSample {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_present("isp", &self.isp)?;
        check_non_negative("download_speed", self.download_speed)?;
        check_non_negative("upload_speed", self.upload_speed)?;
        check_non_negative("ping", self.ping)
    }
}

/// Registration, lookup, and provider bookkeeping for complexes.
pub struct ComplexService<S, Q: ?Sized> {
    store: Arc<S>,
    scheduler: Arc<Q>,
}

impl<S, Q> ComplexService<S, Q>
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, scheduler: Arc<Q>) -> Self {
        Self { store, scheduler }
    }

    pub fn create(&self, payload: NewComplex) -> Result<ApartmentComplex, ComplexServiceError> {
        payload.validate()?;

        let now = Utc::now();
        let complex = ApartmentComplex {
            id: next_complex_id(),
            name: payload.name.trim().to_string(),
            address: payload.address.trim().to_string(),
            city: payload.city.trim().to_string(),
            state: payload.state.trim().to_string(),
            zip: payload.zip.trim().to_string(),
            latitude: payload.latitude,
            longitude: payload.longitude,
            website: payload.website,
            amenities: payload.amenities,
            badges: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_complex(complex)?;
        info!(complex_id = %stored.id, name = %stored.name, "apartment complex registered");
        Ok(stored)
    }

    pub fn get(&self, complex_id: &ComplexId) -> Result<ComplexDetail, ComplexServiceError> {
        let complex = self.require_complex(complex_id)?;
        let isps = self.store.links_for_complex(complex_id)?;
        Ok(ComplexDetail { complex, isps })
    }

    /// Filtered, name-ordered page of complexes.
    pub fn list(&self, query: &ComplexQuery) -> Result<ComplexPage, ComplexServiceError> {
        let mut matching = Vec::new();
        for complex in self.store.list_complexes()? {
            let link_count = if query.has_isp {
                self.store.links_for_complex(&complex.id)?.len()
            } else {
                0
            };
            if query.matches(&complex, link_count) {
                matching.push(complex);
            }
        }
        matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let page = query.page();
        let limit = query.limit();
        let total = matching.len();
        let total_pages = total.div_ceil(limit);
        let complexes = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(ComplexPage {
            complexes,
            page,
            limit,
            total,
            total_pages,
        })
    }

    /// Attach a provider. A new default link clears the flag on the previous default.
    pub fn attach_isp(
        &self,
        complex_id: &ComplexId,
        payload: NewIspLink,
    ) -> Result<ComplexIspLink, ComplexServiceError> {
        payload.validate()?;
        self.require_complex(complex_id)?;

        let existing = self.store.links_for_complex(complex_id)?;
        let isp = payload.isp.trim().to_string();
        if existing.iter().any(|link| link.isp == isp) {
            return Err(ComplexServiceError::DuplicateIsp(isp));
        }

        if payload.is_default {
            for mut link in existing.into_iter().filter(|link| link.is_default) {
                link.is_default = false;
                self.store.update_link(link)?;
            }
        }

        let link = self.store.insert_link(ComplexIspLink {
            id: next_link_id(),
            complex_id: complex_id.clone(),
            isp,
            coverage: payload.coverage,
            speed_tests: 0,
            is_default: payload.is_default,
            metric: payload.metric,
        })?;

        self.refresh_badges(complex_id);
        info!(%complex_id, isp = %link.isp, "isp attached to complex");
        Ok(link)
    }

    /// Fold a speed test into the named provider's running averages.
    pub fn record_speed_test(
        &self,
        complex_id: &ComplexId,
        sample: SpeedTestSample,
    ) -> Result<ComplexIspLink, ComplexServiceError> {
        sample.validate()?;
        self.require_complex(complex_id)?;

        let mut link = self
            .store
            .links_for_complex(complex_id)?
            .into_iter()
            .find(|link| link.isp == sample.isp.trim())
            .ok_or_else(|| ComplexServiceError::IspNotLinked(sample.isp.clone()))?;

        link.metric.record_sample(&sample);
        link.speed_tests += 1;
        self.store.update_link(link.clone())?;

        self.refresh_badges(complex_id);
        Ok(link)
    }

    fn refresh_badges(&self, complex_id: &ComplexId) {
        if let Err(err) = self.store.touch_complex(complex_id) {
            warn!(%complex_id, error = %err, "failed to bump complex revision");
        }
        self.scheduler.schedule(complex_id.clone());
    }

    fn require_complex(
        &self,
        complex_id: &ComplexId,
    ) -> Result<ApartmentComplex, ComplexServiceError> {
        self.store
            .fetch_complex(complex_id)?
            .ok_or_else(|| ComplexServiceError::ComplexNotFound(complex_id.clone()))
    }
}

/// Error raised by the complex service.
#[derive(Debug, thiserror::Error)]
pub enum ComplexServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("apartment complex {0} not found")]
    ComplexNotFound(ComplexId),
    #[error("isp '{0}' is already linked to this complex")]
    DuplicateIsp(String),
    #[error("isp '{0}' is not linked to this complex")]
    IspNotLinked(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
