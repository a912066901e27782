use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;

/// Identifier wrapper for apartment complexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComplexId(pub String);

/// Identifier wrapper for complex-to-ISP links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IspLinkId(pub String);

impl fmt::Display for ComplexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregation root for badge computation.
///
/// `badges` is cached output of the evaluator and is only ever replaced wholesale.
/// `revision` moves on every write that can change that output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApartmentComplex {
    pub id: ComplexId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub website: Option<String>,
    pub amenities: Vec<String>,
    pub badges: Vec<BadgeId>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApartmentComplex {
    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities.iter().any(|candidate| candidate == amenity)
    }

    fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.name, &self.address, &self.city, &self.state]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Payload accepted when registering a complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComplex {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Aggregate speed statistics for one provider at one location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IspMetric {
    pub avg_download: f64,
    pub avg_upload: f64,
    pub avg_ping: f64,
    /// Fraction of successful checks, `0.0..=1.0`.
    #[serde(default)]
    pub reliability: Option<f64>,
    #[serde(default)]
    pub test_count: u32,
}

impl IspMetric {
    /// Linear ranking score: download plus upload minus ping.
    pub fn composite_score(&self) -> f64 {
        self.avg_download + self.avg_upload - self.avg_ping
    }

    /// Fold one speed test into the running means. The count saturates at `u32::MAX`, so
    /// a saturated metric keeps weighting new samples as one in `u32::MAX + 1`.
    pub fn record_sample(&mut self, sample: &SpeedTestSample) {
        let previous = f64::from(self.test_count);
        let next = previous + 1.0;
        self.avg_download = (self.avg_download * previous + sample.download_speed) / next;
        self.avg_upload = (self.avg_upload * previous + sample.upload_speed) / next;
        self.avg_ping = (self.avg_ping * previous + sample.ping) / next;
        self.test_count = self.test_count.saturating_add(1);
    }
}

/// Association between a complex and a provider serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexIspLink {
    pub id: IspLinkId,
    pub complex_id: ComplexId,
    pub isp: String,
    /// Share of units covered, `0.0..=1.0`.
    pub coverage: f64,
    pub speed_tests: u32,
    pub is_default: bool,
    pub metric: IspMetric,
}

/// Payload accepted when attaching a provider to a complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIspLink {
    pub isp: String,
    pub coverage: f64,
    #[serde(default)]
    pub is_default: bool,
    pub metric: IspMetric,
}

/// One speed test measured at a complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestSample {
    pub isp: String,
    pub download_speed: f64,
    pub upload_speed: f64,
    pub ping: f64,
}

/// Complex with the provider links shown on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexDetail {
    #[serde(flatten)]
    pub complex: ApartmentComplex,
    pub isps: Vec<ComplexIspLink>,
}

/// Listing filters. `amenities` is a comma-separated any-of match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexQuery {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub amenities: Option<String>,
    #[serde(default)]
    pub has_isp: bool,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

impl ComplexQuery {
    pub fn page(&self) -> usize {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }

    fn amenity_list(&self) -> Vec<&str> {
        self.amenities
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `link_count` is the number of ISP links attached to the complex.
    pub fn matches(&self, complex: &ApartmentComplex, link_count: usize) -> bool {
        if let Some(city) = &self.city {
            if &complex.city != city {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if &complex.state != state {
                return false;
            }
        }

        let amenities = self.amenity_list();
        if !amenities.is_empty() && !amenities.iter().any(|amenity| complex.has_amenity(amenity)) {
            return false;
        }

        if self.has_isp && link_count == 0 {
            return false;
        }

        match self.query.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => complex.matches_text(needle),
            _ => true,
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexPage {
    pub complexes: Vec<ApartmentComplex>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}
