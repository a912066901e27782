use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{PeakHourReport, Review};

/// Qualitative label shown next to the average peak-hour rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    VeryGood,
    Good,
    Fair,
}

impl PerformanceTier {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.5 {
            Self::Excellent
        } else if rating >= 4.0 {
            Self::VeryGood
        } else if rating >= 3.0 {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

/// Peak-hour averages across every review that reported them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakHourSummary {
    pub sample_count: usize,
    pub average_rating: f64,
    pub average_download: f64,
    pub average_upload: f64,
    pub average_ping: f64,
    pub average_packet_loss: f64,
    pub typical_start_hour: Option<u8>,
    pub typical_end_hour: Option<u8>,
    pub tier: PerformanceTier,
}

impl PeakHourSummary {
    /// `None` when no review carries peak-hour data.
    pub fn from_reviews(reviews: &[Review]) -> Option<Self> {
        let reports: Vec<&PeakHourReport> = reviews
            .iter()
            .filter_map(|review| review.peak_hour.as_ref())
            .collect();

        if reports.is_empty() {
            return None;
        }

        let count = reports.len() as f64;
        let average = |value: fn(&PeakHourReport) -> f64| {
            reports.iter().map(|&report| value(report)).sum::<f64>() / count
        };
        let average_rating = average(|report| f64::from(report.rating));

        Some(Self {
            sample_count: reports.len(),
            average_rating,
            average_download: average(|report| report.download_speed),
            average_upload: average(|report| report.upload_speed),
            average_ping: average(|report| report.ping),
            average_packet_loss: average(|report| report.packet_loss),
            typical_start_hour: mode(reports.iter().map(|report| report.start_hour)),
            typical_end_hour: mode(reports.iter().map(|report| report.end_hour)),
            tier: PerformanceTier::from_rating(average_rating),
        })
    }
}

/// Most frequent hour; ties go to the earliest hour.
fn mode(hours: impl Iterator<Item = u8>) -> Option<u8> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for hour in hours {
        *counts.entry(hour).or_default() += 1;
    }

    let mut best: Option<(u8, usize)> = None;
    for (hour, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((hour, count));
        }
    }
    best.map(|(hour, _)| hour)
}
