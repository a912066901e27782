//! In-memory doubles and fixtures shared by the unit test modules.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use crate::auth::ApiAuth;
use crate::badges::{BadgeId, RecomputeScheduler};
use crate::complexes::{
    ApartmentComplex, ComplexId, ComplexIspLink, ComplexRepository, IspLinkId, IspLinkRepository,
    IspMetric,
};
use crate::config::AuthConfig;
use crate::reviews::{PeakHourReport, Review, ReviewId, ReviewRepository, UserId};
use crate::store::RepositoryError;

pub(crate) const RESIDENT_TOKEN: &str = "resident-token";
pub(crate) const MODERATOR_TOKEN: &str = "moderator-token";

pub(crate) fn complex(id: &str, amenities: &[&str]) -> ApartmentComplex {
    let created_at = Utc
        .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    ApartmentComplex {
        id: ComplexId(id.to_string()),
        name: format!("{id} Apartments"),
        address: "100 Main St".to_string(),
        city: "Austin".to_string(),
        state: "TX".to_string(),
        zip: "78701".to_string(),
        latitude: None,
        longitude: None,
        website: None,
        amenities: amenities.iter().map(|amenity| amenity.to_string()).collect(),
        badges: Vec::new(),
        revision: 0,
        created_at,
        updated_at: created_at,
    }
}

pub(crate) fn metric(download: f64, upload: f64, ping: f64, reliability: f64) -> IspMetric {
    IspMetric {
        avg_download: download,
        avg_upload: upload,
        avg_ping: ping,
        reliability: Some(reliability),
        test_count: 0,
    }
}

pub(crate) fn link(complex_id: &ComplexId, isp: &str, metric: IspMetric) -> ComplexIspLink {
    ComplexIspLink {
        id: IspLinkId(format!("{}-{isp}", complex_id.0)),
        complex_id: complex_id.clone(),
        isp: isp.to_string(),
        coverage: 1.0,
        speed_tests: 0,
        is_default: false,
        metric,
    }
}

pub(crate) fn peak_hour(rating: u8, download: f64, ping: f64, packet_loss: f64) -> PeakHourReport {
    PeakHourReport {
        rating,
        start_hour: 19,
        end_hour: 22,
        download_speed: download,
        upload_speed: 20.0,
        ping,
        packet_loss,
        comment: None,
    }
}

pub(crate) fn review(
    id: &str,
    complex_id: &ComplexId,
    rating: u8,
    peak_hour: Option<PeakHourReport>,
    verified: bool,
) -> Review {
    let base = Utc
        .with_ymd_and_hms(2025, 4, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let offset = id.bytes().map(i64::from).sum::<i64>();
    Review {
        id: ReviewId(id.to_string()),
        complex_id: complex_id.clone(),
        author: UserId("riley".to_string()),
        rating,
        internet_rating: rating,
        comment: None,
        pros: Vec::new(),
        cons: Vec::new(),
        peak_hour,
        verified,
        flagged: false,
        flagged_at: None,
        flagged_by: None,
        helpful_count: 0,
        created_at: base + Duration::minutes(offset),
    }
}

/// Store holding one verified five-star review and a 150/25/15 provider at a
/// complex advertising "Fiber Ready".
pub(crate) fn scenario_store() -> (MemoryStore, ComplexId) {
    let store = MemoryStore::default();
    let complex = complex("cx-scenario", &["Fiber Ready"]);
    let id = complex.id.clone();
    store.seed_complex(complex);
    store.seed_review(review(
        "rev-scenario",
        &id,
        5,
        Some(peak_hour(5, 120.0, 10.0, 0.1)),
        true,
    ));
    store.seed_link(link(&id, "MetroFiber", metric(150.0, 25.0, 15.0, 0.98)));
    (store, id)
}

pub(crate) fn api_auth() -> ApiAuth {
    let mut api_tokens = BTreeMap::new();
    api_tokens.insert(RESIDENT_TOKEN.to_string(), UserId("riley".to_string()));
    api_tokens.insert(MODERATOR_TOKEN.to_string(), UserId("morgan".to_string()));
    let mut moderators = BTreeSet::new();
    moderators.insert(UserId("morgan".to_string()));
    ApiAuth::new(AuthConfig {
        api_tokens,
        moderators,
    })
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default, Clone)]
pub(crate) struct MemoryStore {
    complexes: Arc<Mutex<HashMap<ComplexId, ApartmentComplex>>>,
    links: Arc<Mutex<Vec<ComplexIspLink>>>,
    reviews: Arc<Mutex<Vec<Review>>>,
}

impl MemoryStore {
    pub(crate) fn seed_complex(&self, complex: ApartmentComplex) {
        self.complexes
            .lock()
            .expect("complex mutex poisoned")
            .insert(complex.id.clone(), complex);
    }

    pub(crate) fn seed_link(&self, link: ComplexIspLink) {
        self.links.lock().expect("link mutex poisoned").push(link);
    }

    pub(crate) fn seed_review(&self, review: Review) {
        self.reviews.lock().expect("review mutex poisoned").push(review);
    }

    pub(crate) fn stored_badges(&self, id: &ComplexId) -> Vec<BadgeId> {
        self.complexes
            .lock()
            .expect("complex mutex poisoned")
            .get(id)
            .map(|complex| complex.badges.clone())
            .unwrap_or_default()
    }

    pub(crate) fn revision(&self, id: &ComplexId) -> u64 {
        self.complexes
            .lock()
            .expect("complex mutex poisoned")
            .get(id)
            .map(|complex| complex.revision)
            .unwrap_or_default()
    }
}

impl ComplexRepository for MemoryStore {
    fn insert_complex(
        &self,
        complex: ApartmentComplex,
    ) -> Result<ApartmentComplex, RepositoryError> {
        let mut guard = self.complexes.lock().expect("complex mutex poisoned");
        if guard.contains_key(&complex.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(complex.id.clone(), complex.clone());
        Ok(complex)
    }

    fn fetch_complex(&self, id: &ComplexId) -> Result<Option<ApartmentComplex>, RepositoryError> {
        let guard = self.complexes.lock().expect("complex mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_complexes(&self) -> Result<Vec<ApartmentComplex>, RepositoryError> {
        let guard = self.complexes.lock().expect("complex mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn touch_complex(&self, id: &ComplexId) -> Result<u64, RepositoryError> {
        let mut guard = self.complexes.lock().expect("complex mutex poisoned");
        let complex = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        complex.revision += 1;
        complex.updated_at = Utc::now();
        Ok(complex.revision)
    }

    fn replace_badges(
        &self,
        id: &ComplexId,
        badges: Vec<BadgeId>,
        expected_revision: u64,
    ) -> Result<u64, RepositoryError> {
        let mut guard = self.complexes.lock().expect("complex mutex poisoned");
        let complex = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if complex.revision != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                actual: complex.revision,
            });
        }
        complex.badges = badges;
        complex.revision += 1;
        complex.updated_at = Utc::now();
        Ok(complex.revision)
    }
}

impl IspLinkRepository for MemoryStore {
    fn links_for_complex(&self, id: &ComplexId) -> Result<Vec<ComplexIspLink>, RepositoryError> {
        let guard = self.links.lock().expect("link mutex poisoned");
        Ok(guard
            .iter()
            .filter(|link| &link.complex_id == id)
            .cloned()
            .collect())
    }

    fn insert_link(&self, link: ComplexIspLink) -> Result<ComplexIspLink, RepositoryError> {
        let mut guard = self.links.lock().expect("link mutex poisoned");
        if guard.iter().any(|existing| existing.id == link.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(link.clone());
        Ok(link)
    }

    fn update_link(&self, link: ComplexIspLink) -> Result<(), RepositoryError> {
        let mut guard = self.links.lock().expect("link mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == link.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = link;
        Ok(())
    }
}

impl ReviewRepository for MemoryStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        if guard.iter().any(|existing| existing.id == review.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(review.clone());
        Ok(review)
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        let guard = self.reviews.lock().expect("review mutex poisoned");
        Ok(guard.iter().find(|review| &review.id == id).cloned())
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == review.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = review;
        Ok(())
    }

    fn reviews_for_complex(&self, id: &ComplexId) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.reviews.lock().expect("review mutex poisoned");
        Ok(guard
            .iter()
            .filter(|review| &review.complex_id == id)
            .cloned()
            .collect())
    }

    fn verified_reviews_for_complex(
        &self,
        id: &ComplexId,
    ) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .reviews_for_complex(id)?
            .into_iter()
            .filter(|review| review.verified)
            .collect())
    }
}

/// Wraps a [`MemoryStore`], failing badge writes and revision bumps with queued errors
/// before delegating.
#[derive(Default)]
pub(crate) struct ScriptedStore {
    pub(crate) inner: MemoryStore,
    write_failures: Mutex<VecDeque<RepositoryError>>,
    touch_failures: Mutex<VecDeque<RepositoryError>>,
    write_attempts: AtomicUsize,
}

impl ScriptedStore {
    pub(crate) fn new(inner: MemoryStore, failures: Vec<RepositoryError>) -> Self {
        Self {
            inner,
            write_failures: Mutex::new(failures.into()),
            touch_failures: Mutex::new(VecDeque::new()),
            write_attempts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing_touches(self, failures: Vec<RepositoryError>) -> Self {
        Self {
            touch_failures: Mutex::new(failures.into()),
            ..self
        }
    }

    pub(crate) fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

impl ComplexRepository for ScriptedStore {
    fn insert_complex(
        &self,
        complex: ApartmentComplex,
    ) -> Result<ApartmentComplex, RepositoryError> {
        self.inner.insert_complex(complex)
    }

    fn fetch_complex(&self, id: &ComplexId) -> Result<Option<ApartmentComplex>, RepositoryError> {
        self.inner.fetch_complex(id)
    }

    fn list_complexes(&self) -> Result<Vec<ApartmentComplex>, RepositoryError> {
        self.inner.list_complexes()
    }

    fn touch_complex(&self, id: &ComplexId) -> Result<u64, RepositoryError> {
        let failure = self
            .touch_failures
            .lock()
            .expect("failure mutex poisoned")
            .pop_front();
        match failure {
            Some(err) => Err(err),
            None => self.inner.touch_complex(id),
        }
    }

    fn replace_badges(
        &self,
        id: &ComplexId,
        badges: Vec<BadgeId>,
        expected_revision: u64,
    ) -> Result<u64, RepositoryError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .write_failures
            .lock()
            .expect("failure mutex poisoned")
            .pop_front();
        match failure {
            Some(err) => Err(err),
            None => self.inner.replace_badges(id, badges, expected_revision),
        }
    }
}

impl IspLinkRepository for ScriptedStore {
    fn links_for_complex(&self, id: &ComplexId) -> Result<Vec<ComplexIspLink>, RepositoryError> {
        self.inner.links_for_complex(id)
    }

    fn insert_link(&self, link: ComplexIspLink) -> Result<ComplexIspLink, RepositoryError> {
        self.inner.insert_link(link)
    }

    fn update_link(&self, link: ComplexIspLink) -> Result<(), RepositoryError> {
        self.inner.update_link(link)
    }
}

impl ReviewRepository for ScriptedStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        self.inner.insert_review(review)
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.inner.fetch_review(id)
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        self.inner.update_review(review)
    }

    fn reviews_for_complex(&self, id: &ComplexId) -> Result<Vec<Review>, RepositoryError> {
        self.inner.reviews_for_complex(id)
    }

    fn verified_reviews_for_complex(
        &self,
        id: &ComplexId,
    ) -> Result<Vec<Review>, RepositoryError> {
        self.inner.verified_reviews_for_complex(id)
    }
}

/// Every call fails as if the database were offline.
pub(crate) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl ComplexRepository for UnavailableStore {
    fn insert_complex(
        &self,
        _complex: ApartmentComplex,
    ) -> Result<ApartmentComplex, RepositoryError> {
        offline()
    }

    fn fetch_complex(&self, _id: &ComplexId) -> Result<Option<ApartmentComplex>, RepositoryError> {
        offline()
    }

    fn list_complexes(&self) -> Result<Vec<ApartmentComplex>, RepositoryError> {
        offline()
    }

    fn touch_complex(&self, _id: &ComplexId) -> Result<u64, RepositoryError> {
        offline()
    }

    fn replace_badges(
        &self,
        _id: &ComplexId,
        _badges: Vec<BadgeId>,
        _expected_revision: u64,
    ) -> Result<u64, RepositoryError> {
        offline()
    }
}

impl IspLinkRepository for UnavailableStore {
    fn links_for_complex(&self, _id: &ComplexId) -> Result<Vec<ComplexIspLink>, RepositoryError> {
        offline()
    }

    fn insert_link(&self, _link: ComplexIspLink) -> Result<ComplexIspLink, RepositoryError> {
        offline()
    }

    fn update_link(&self, _link: ComplexIspLink) -> Result<(), RepositoryError> {
        offline()
    }
}

impl ReviewRepository for UnavailableStore {
    fn insert_review(&self, _review: Review) -> Result<Review, RepositoryError> {
        offline()
    }

    fn fetch_review(&self, _id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        offline()
    }

    fn update_review(&self, _review: Review) -> Result<(), RepositoryError> {
        offline()
    }

    fn reviews_for_complex(&self, _id: &ComplexId) -> Result<Vec<Review>, RepositoryError> {
        offline()
    }

    fn verified_reviews_for_complex(
        &self,
        _id: &ComplexId,
    ) -> Result<Vec<Review>, RepositoryError> {
        offline()
    }
}

/// Scheduler that only records which complexes were scheduled.
#[derive(Default)]
pub(crate) struct RecordingScheduler {
    scheduled: Mutex<Vec<ComplexId>>,
}

impl RecordingScheduler {
    pub(crate) fn scheduled(&self) -> Vec<ComplexId> {
        self.scheduled
            .lock()
            .expect("scheduler mutex poisoned")
            .clone()
    }
}

impl RecomputeScheduler for RecordingScheduler {
    fn schedule(&self, complex_id: ComplexId) {
        self.scheduled
            .lock()
            .expect("scheduler mutex poisoned")
            .push(complex_id);
    }
}
