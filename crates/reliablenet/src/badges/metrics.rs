use serde::Serialize;

use crate::complexes::{ComplexIspLink, IspLinkId, IspMetric};
use crate::reviews::Review;

/// Provider link that scored highest on [`IspMetric::composite_score`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestIsp {
    pub link_id: IspLinkId,
    pub isp: String,
    pub metric: IspMetric,
    pub composite_score: f64,
}

/// Aggregates the badge rules are evaluated against.
///
/// Averages are `None` when no qualifying review exists, so "no data" never
/// satisfies a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexMetrics {
    pub verified_review_count: usize,
    pub peak_hour_review_count: usize,
    pub average_rating: Option<f64>,
    pub average_peak_hour_rating: Option<f64>,
    pub average_peak_hour_download: Option<f64>,
    pub average_peak_hour_ping: Option<f64>,
    pub average_peak_hour_packet_loss: Option<f64>,
    pub best_isp: Option<BestIsp>,
}

impl ComplexMetrics {
    pub fn view(&self) -> MetricsView {
        MetricsView {
            verified_review_count: self.verified_review_count,
            peak_hour_review_count: self.peak_hour_review_count,
            average_rating: self.average_rating.unwrap_or(0.0),
            average_peak_hour_rating: self.average_peak_hour_rating.unwrap_or(0.0),
            average_peak_hour_download: self.average_peak_hour_download.unwrap_or(0.0),
            average_peak_hour_ping: self.average_peak_hour_ping.unwrap_or(0.0),
            average_peak_hour_packet_loss: self.average_peak_hour_packet_loss.unwrap_or(0.0),
            best_isp: self.best_isp.clone(),
        }
    }
}

/// Response shape: absent averages read as `0`, with the counts saying why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub verified_review_count: usize,
    pub peak_hour_review_count: usize,
    pub average_rating: f64,
    pub average_peak_hour_rating: f64,
    pub average_peak_hour_download: f64,
    pub average_peak_hour_ping: f64,
    pub average_peak_hour_packet_loss: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_isp: Option<BestIsp>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

/// Single link maximizing the composite score; the first link wins ties.
pub fn best_isp(links: &[ComplexIspLink]) -> Option<BestIsp> {
    let mut best: Option<&ComplexIspLink> = None;
    for link in links {
        let beats_current = best.map_or(true, |current| {
            link.metric.composite_score() > current.metric.composite_score()
        });
        if beats_current {
            best = Some(link);
        }
    }

    best.map(|link| BestIsp {
        link_id: link.id.clone(),
        isp: link.isp.clone(),
        metric: link.metric,
        composite_score: link.metric.composite_score(),
    })
}

/// Reduce a complex's reviews and provider links to [`ComplexMetrics`].
///
/// Unverified reviews are ignored even if the caller passes them in.
pub fn aggregate(reviews: &[Review], links: &[ComplexIspLink]) -> ComplexMetrics {
    let verified: Vec<&Review> = reviews.iter().filter(|review| review.verified).collect();
    let peak_hour: Vec<_> = verified
        .iter()
        .filter_map(|review| review.peak_hour.as_ref())
        .collect();

    ComplexMetrics {
        verified_review_count: verified.len(),
        peak_hour_review_count: peak_hour.len(),
        average_rating: mean(verified.iter().map(|review| f64::from(review.rating))),
        average_peak_hour_rating: mean(peak_hour.iter().map(|peak| f64::from(peak.rating))),
        average_peak_hour_download: mean(peak_hour.iter().map(|peak| peak.download_speed)),
        average_peak_hour_ping: mean(peak_hour.iter().map(|peak| peak.ping)),
        average_peak_hour_packet_loss: mean(peak_hour.iter().map(|peak| peak.packet_loss)),
        best_isp: best_isp(links),
    }
}
