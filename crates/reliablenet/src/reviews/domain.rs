use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::complexes::ComplexId;
use crate::validation::{check_non_negative, check_range, check_rating, ValidationError};

/// Identifier wrapper for reviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

/// Identifier of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Self-reported connection quality during the reviewer's busiest window.
///
/// Either the whole report is present or none of it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakHourReport {
    pub rating: u8,
    pub start_hour: u8,
    pub end_hour: u8,
    pub download_speed: f64,
    pub upload_speed: f64,
    pub ping: f64,
    /// Percentage, `0.0..=100.0`.
    pub packet_loss: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Resident review of a complex's connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub complex_id: ComplexId,
    pub author: UserId,
    pub rating: u8,
    pub internet_rating: u8,
    pub comment: Option<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub peak_hour: Option<PeakHourReport>,
    /// Set by moderation; only verified reviews feed badge computation.
    pub verified: bool,
    pub flagged: bool,
    pub flagged_at: Option<DateTime<Utc>>,
    pub flagged_by: Option<UserId>,
    pub helpful_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Payload accepted when a resident submits a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub rating: u8,
    pub internet_rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub peak_hour: Option<PeakHourReport>,
}

impl PeakHourReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_rating("peak_hour.rating", self.rating)?;
        check_range("peak_hour.start_hour", f64::from(self.start_hour), 0.0, 23.0)?;
        check_range("peak_hour.end_hour", f64::from(self.end_hour), 0.0, 23.0)?;
        check_non_negative("peak_hour.download_speed", self.download_speed)?;
        check_non_negative("peak_hour.upload_speed", self.upload_speed)?;
        check_non_negative("peak_hour.ping", self.ping)?;
        check_range("peak_hour.packet_loss", self.packet_loss, 0.0, 100.0)
    }
}

impl ReviewSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_rating("rating", self.rating)?;
        check_rating("internet_rating", self.internet_rating)?;
        if let Some(peak_hour) = &self.peak_hour {
            peak_hour.validate()?;
        }
        Ok(())
    }
}

/// Ordering options for review listings; all descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    Recent,
    Helpful,
    Rating,
    PeakRating,
}

/// Listing filters for a complex's reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewQuery {
    #[serde(default)]
    pub sort_by: ReviewSort,
    #[serde(default)]
    pub min_rating: Option<u8>,
    #[serde(default)]
    pub min_peak_hour_rating: Option<u8>,
    #[serde(default)]
    pub has_peak_hour_data: bool,
    #[serde(default)]
    pub peak_hour_start: Option<u8>,
    #[serde(default)]
    pub peak_hour_end: Option<u8>,
    #[serde(default)]
    pub min_download_speed: Option<f64>,
    #[serde(default)]
    pub max_ping: Option<f64>,
    #[serde(default)]
    pub max_packet_loss: Option<f64>,
}

impl ReviewQuery {
    fn requires_peak_hour(&self) -> bool {
        self.has_peak_hour_data
            || self.min_peak_hour_rating.is_some()
            || self.peak_hour_start.is_some()
            || self.peak_hour_end.is_some()
            || self.min_download_speed.is_some()
            || self.max_ping.is_some()
            || self.max_packet_loss.is_some()
    }

    pub fn matches(&self, review: &Review) -> bool {
        if self.min_rating.is_some_and(|min| review.rating < min) {
            return false;
        }

        let Some(peak) = &review.peak_hour else {
            return !self.requires_peak_hour();
        };

        !(self.min_peak_hour_rating.is_some_and(|min| peak.rating < min)
            || self.peak_hour_start.is_some_and(|hour| peak.start_hour != hour)
            || self.peak_hour_end.is_some_and(|hour| peak.end_hour != hour)
            || self
                .min_download_speed
                .is_some_and(|min| peak.download_speed < min)
            || self.max_ping.is_some_and(|max| peak.ping > max)
            || self.max_packet_loss.is_some_and(|max| peak.packet_loss > max))
    }

    /// Filter and order `reviews` in place.
    pub fn apply(&self, reviews: &mut Vec<Review>) {
        reviews.retain(|review| self.matches(review));
        match self.sort_by {
            ReviewSort::Recent => reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ReviewSort::Helpful => reviews.sort_by(|a, b| b.helpful_count.cmp(&a.helpful_count)),
            ReviewSort::Rating => reviews.sort_by(|a, b| b.rating.cmp(&a.rating)),
            ReviewSort::PeakRating => reviews.sort_by(|a, b| {
                let rating = |review: &Review| review.peak_hour.as_ref().map(|peak| peak.rating);
                rating(b).cmp(&rating(a))
            }),
        }
    }
}
