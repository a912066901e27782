use metrics_exporter_prometheus::PrometheusHandle;
use reliablenet::badges::{
    BadgeId, BadgeRecomputeQueue, BadgeService, InlineRecompute, RecomputeScheduler,
};
use reliablenet::complexes::{
    ApartmentComplex, ComplexId, ComplexIspLink, ComplexRepository, ComplexService,
    IspLinkId, IspLinkRepository,
};
use reliablenet::config::{BadgeConfig, RecomputeMode};
use reliablenet::reviews::{Review, ReviewId, ReviewRepository, ReviewService};
use reliablenet::store::{RepositoryError, Store};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

/// Process-local store standing in for the relational database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryStore {
    complexes: Arc<Mutex<BTreeMap<ComplexId, ApartmentComplex>>>,
    links: Arc<Mutex<HashMap<IspLinkId, ComplexIspLink>>>,
    reviews: Arc<Mutex<HashMap<ReviewId, Review>>>,
}

impl ComplexRepository for InMemoryStore {
    fn insert_complex(
        &self,
        complex: ApartmentComplex,
    ) -> Result<ApartmentComplex, RepositoryError> {
        let mut guard = lock(&self.complexes)?;
        if guard.contains_key(&complex.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(complex.id.clone(), complex.clone());
        Ok(complex)
    }

    fn fetch_complex(&self, id: &ComplexId) -> Result<Option<ApartmentComplex>, RepositoryError> {
        let guard = lock(&self.complexes)?;
        Ok(guard.get(id).cloned())
    }

    fn list_complexes(&self) -> Result<Vec<ApartmentComplex>, RepositoryError> {
        let guard = lock(&self.complexes)?;
        Ok(guard.values().cloned().collect())
    }

    fn touch_complex(&self, id: &ComplexId) -> Result<u64, RepositoryError> {
        let mut guard = lock(&self.complexes)?;
        let complex = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        complex.revision += 1;
        complex.updated_at = chrono::Utc::now();
        Ok(complex.revision)
    }

    fn replace_badges(
        &self,
        id: &ComplexId,
        badges: Vec<BadgeId>,
        expected_revision: u64,
    ) -> Result<u64, RepositoryError> {
        let mut guard = lock(&self.complexes)?;
        let complex = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if complex.revision != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                actual: complex.revision,
            });
        }
        complex.badges = badges;
        complex.revision += 1;
        complex.updated_at = chrono::Utc::now();
        Ok(complex.revision)
    }
}

impl IspLinkRepository for InMemoryStore {
    fn links_for_complex(&self, id: &ComplexId) -> Result<Vec<ComplexIspLink>, RepositoryError> {
        let guard = lock(&self.links)?;
        let mut links: Vec<_> = guard
            .values()
            .filter(|link| &link.complex_id == id)
            .cloned()
            .collect();
        links.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(links)
    }

    fn insert_link(&self, link: ComplexIspLink) -> Result<ComplexIspLink, RepositoryError> {
        let mut guard = lock(&self.links)?;
        if guard.contains_key(&link.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(link.id.clone(), link.clone());
        Ok(link)
    }

    fn update_link(&self, link: ComplexIspLink) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.links)?;
        if guard.contains_key(&link.id) {
            guard.insert(link.id.clone(), link);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

impl ReviewRepository for InMemoryStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut guard = lock(&self.reviews)?;
        if guard.contains_key(&review.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        let guard = lock(&self.reviews)?;
        Ok(guard.get(id).cloned())
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.reviews)?;
        if guard.contains_key(&review.id) {
            guard.insert(review.id.clone(), review);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn reviews_for_complex(&self, id: &ComplexId) -> Result<Vec<Review>, RepositoryError> {
        let guard = lock(&self.reviews)?;
        Ok(guard
            .values()
            .filter(|review| &review.complex_id == id)
            .cloned()
            .collect())
    }

    fn verified_reviews_for_complex(
        &self,
        id: &ComplexId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let guard = lock(&self.reviews)?;
        Ok(guard
            .values()
            .filter(|review| &review.complex_id == id && review.verified)
            .cloned()
            .collect())
    }
}

/// Services sharing one store and one recompute scheduler.
pub(crate) struct Services<S> {
    pub(crate) badges: Arc<BadgeService<S>>,
    pub(crate) complexes: Arc<ComplexService<S, dyn RecomputeScheduler>>,
    pub(crate) reviews: Arc<ReviewService<S, dyn RecomputeScheduler>>,
}

/// Wire the services to `store`. Queued mode spawns the recompute worker on the current
/// runtime and hands back its handle.
pub(crate) fn build_services<S: Store>(
    store: Arc<S>,
    config: &BadgeConfig,
) -> (Services<S>, Option<JoinHandle<()>>) {
    let badges = Arc::new(BadgeService::new(store.clone()));
    let (scheduler, worker) = match config.recompute_mode {
        RecomputeMode::Inline => {
            let inline: Arc<dyn RecomputeScheduler> =
                Arc::new(InlineRecompute::new(badges.clone()));
            (inline, None)
        }
        RecomputeMode::Queued => {
            let (queue, worker) = BadgeRecomputeQueue::spawn(badges.clone(), config.queue_depth);
            let queue: Arc<dyn RecomputeScheduler> = Arc::new(queue);
            (queue, Some(worker))
        }
    };

    let services = Services {
        complexes: Arc::new(ComplexService::new(store.clone(), scheduler.clone())),
        reviews: Arc::new(ReviewService::new(store, scheduler)),
        badges,
    };
    (services, worker)
}
