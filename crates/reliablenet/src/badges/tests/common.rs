use std::sync::Arc;

use axum::Extension;
use axum::Router;

use crate::badges::{badge_router, BadgeService, BestIsp, ComplexMetrics};
use crate::complexes::IspLinkId;
use crate::store::Store;

pub(super) use crate::test_support::*;

/// Metrics for a complex whose best provider and peak-hour reports are all strong.
pub(super) fn strong_metrics() -> ComplexMetrics {
    let best = metric(150.0, 25.0, 15.0, 0.98);
    ComplexMetrics {
        verified_review_count: 1,
        peak_hour_review_count: 1,
        average_rating: Some(5.0),
        average_peak_hour_rating: Some(5.0),
        average_peak_hour_download: Some(120.0),
        average_peak_hour_ping: Some(10.0),
        average_peak_hour_packet_loss: Some(0.1),
        best_isp: Some(BestIsp {
            link_id: IspLinkId("link-best".to_string()),
            isp: "MetroFiber".to_string(),
            metric: best,
            composite_score: best.composite_score(),
        }),
    }
}

pub(super) fn empty_metrics() -> ComplexMetrics {
    ComplexMetrics {
        verified_review_count: 0,
        peak_hour_review_count: 0,
        average_rating: None,
        average_peak_hour_rating: None,
        average_peak_hour_download: None,
        average_peak_hour_ping: None,
        average_peak_hour_packet_loss: None,
        best_isp: None,
    }
}

pub(super) fn badge_app<S: Store>(store: Arc<S>) -> Router {
    badge_router(Arc::new(BadgeService::new(store))).layer(Extension(api_auth()))
}
