use serde::Serialize;

use super::catalog::{BadgeCriteria, BadgeDefinition, BadgeId, BADGE_CATALOG};
use super::metrics::ComplexMetrics;

/// Per-badge verdict with the criteria that were not met, for audits and demos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeAssessment {
    pub badge: BadgeId,
    pub qualified: bool,
    pub unmet: Vec<String>,
}

/// Stateless evaluator applying a rule table to aggregated metrics.
#[derive(Debug, Clone, Copy)]
pub struct BadgeEvaluator {
    rules: &'static [BadgeDefinition],
}

impl Default for BadgeEvaluator {
    fn default() -> Self {
        Self::new(&BADGE_CATALOG)
    }
}

impl BadgeEvaluator {
    pub fn new(rules: &'static [BadgeDefinition]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [BadgeDefinition] {
        self.rules
    }

    /// Badges whose every criterion holds, in rule-table order.
    pub fn evaluate(&self, metrics: &ComplexMetrics, amenities: &[String]) -> Vec<BadgeId> {
        self.assess(metrics, amenities)
            .into_iter()
            .filter(|assessment| assessment.qualified)
            .map(|assessment| assessment.badge)
            .collect()
    }

    pub fn assess(&self, metrics: &ComplexMetrics, amenities: &[String]) -> Vec<BadgeAssessment> {
        self.rules
            .iter()
            .map(|definition| {
                let unmet = unmet_criteria(&definition.criteria, metrics, amenities);
                BadgeAssessment {
                    badge: definition.id,
                    qualified: unmet.is_empty(),
                    unmet,
                }
            })
            .collect()
    }
}

struct Checks {
    unmet: Vec<String>,
}

impl Checks {
    fn at_least(&mut self, label: &str, value: Option<f64>, threshold: Option<f64>) {
        let Some(threshold) = threshold else {
            return;
        };
        match value {
            Some(value) if value >= threshold => {}
            Some(value) => self
                .unmet
                .push(format!("{label} {value:.2} below minimum {threshold}")),
            None => self.unmet.push(format!("{label} unavailable (minimum {threshold})")),
        }
    }

    fn at_most(&mut self, label: &str, value: Option<f64>, threshold: Option<f64>) {
        let Some(threshold) = threshold else {
            return;
        };
        match value {
            Some(value) if value <= threshold => {}
            Some(value) => self
                .unmet
                .push(format!("{label} {value:.2} above maximum {threshold}")),
            None => self.unmet.push(format!("{label} unavailable (maximum {threshold})")),
        }
    }
}

fn unmet_criteria(
    criteria: &BadgeCriteria,
    metrics: &ComplexMetrics,
    amenities: &[String],
) -> Vec<String> {
    let mut checks = Checks { unmet: Vec::new() };

    // Speed limits look only at the single best provider.
    let best = metrics.best_isp.as_ref().map(|best| best.metric);
    checks.at_least(
        "best ISP download",
        best.map(|metric| metric.avg_download),
        criteria.min_download_speed,
    );
    checks.at_least(
        "best ISP upload",
        best.map(|metric| metric.avg_upload),
        criteria.min_upload_speed,
    );
    checks.at_most(
        "best ISP ping",
        best.map(|metric| metric.avg_ping),
        criteria.max_ping,
    );
    checks.at_least(
        "best ISP reliability",
        best.map(|metric| metric.reliability.unwrap_or(0.0)),
        criteria.min_reliability,
    );

    checks.at_least("average rating", metrics.average_rating, criteria.min_rating);

    checks.at_least(
        "peak-hour rating",
        metrics.average_peak_hour_rating,
        criteria.min_peak_hour_rating,
    );
    checks.at_most(
        "peak-hour packet loss",
        metrics.average_peak_hour_packet_loss,
        criteria.max_peak_hour_packet_loss,
    );
    checks.at_least(
        "peak-hour download",
        metrics.average_peak_hour_download,
        criteria.min_peak_hour_download,
    );
    checks.at_most(
        "peak-hour ping",
        metrics.average_peak_hour_ping,
        criteria.max_peak_hour_ping,
    );

    for required in criteria.required_amenities {
        if !amenities.iter().any(|amenity| amenity == required) {
            checks.unmet.push(format!("missing amenity '{required}'"));
        }
    }

    checks.unmet
}
