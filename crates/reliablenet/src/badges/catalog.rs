use serde::{Deserialize, Serialize};

/// Identifier of a badge a complex can earn. Serialized as the snake_case id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    WfhFriendly,
    StreamerApproved,
    GamerReady,
    BudgetFriendly,
    FamilyChoice,
}

impl BadgeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeId::WfhFriendly => "wfh_friendly",
            BadgeId::StreamerApproved => "streamer_approved",
            BadgeId::GamerReady => "gamer_ready",
            BadgeId::BudgetFriendly => "budget_friendly",
            BadgeId::FamilyChoice => "family_choice",
        }
    }
}

/// Threshold predicates; `None` (or an empty amenity list) always passes.
///
/// Speed limits apply to the complex's best ISP, rating limits to the verified review
/// averages, peak-hour limits to the peak-hour averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeCriteria {
    pub min_download_speed: Option<f64>,
    pub min_upload_speed: Option<f64>,
    pub max_ping: Option<f64>,
    pub min_reliability: Option<f64>,
    pub min_rating: Option<f64>,
    pub required_amenities: &'static [&'static str],
    pub min_peak_hour_rating: Option<f64>,
    pub max_peak_hour_packet_loss: Option<f64>,
    pub min_peak_hour_download: Option<f64>,
    pub max_peak_hour_ping: Option<f64>,
}

impl BadgeCriteria {
    pub const UNBOUNDED: BadgeCriteria = BadgeCriteria {
        min_download_speed: None,
        min_upload_speed: None,
        max_ping: None,
        min_reliability: None,
        min_rating: None,
        required_amenities: &[],
        min_peak_hour_rating: None,
        max_peak_hour_packet_loss: None,
        min_peak_hour_download: None,
        max_peak_hour_ping: None,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    /// Icon key used by clients when rendering the badge.
    pub icon: &'static str,
    pub criteria: BadgeCriteria,
}

/// Shipped rule table. Declaration order is the order badges are reported in.
pub static BADGE_CATALOG: [BadgeDefinition; 5] = [
    BadgeDefinition {
        id: BadgeId::WfhFriendly,
        name: "WFH Friendly",
        description: "Excellent for remote work with reliable high-speed internet",
        icon: "wifi",
        criteria: BadgeCriteria {
            min_download_speed: Some(100.0),
            min_upload_speed: Some(20.0),
            max_ping: Some(30.0),
            min_reliability: Some(0.95),
            min_rating: Some(4.0),
            min_peak_hour_rating: Some(4.0),
            max_peak_hour_packet_loss: Some(1.0),
            min_peak_hour_download: Some(80.0),
            max_peak_hour_ping: Some(40.0),
            ..BadgeCriteria::UNBOUNDED
        },
    },
    BadgeDefinition {
        id: BadgeId::StreamerApproved,
        name: "Streamer Approved",
        description: "Perfect for content creators and streamers",
        icon: "monitor",
        criteria: BadgeCriteria {
            min_download_speed: Some(150.0),
            min_upload_speed: Some(25.0),
            max_ping: Some(20.0),
            min_reliability: Some(0.98),
            min_peak_hour_rating: Some(4.5),
            max_peak_hour_packet_loss: Some(0.5),
            min_peak_hour_download: Some(100.0),
            max_peak_hour_ping: Some(30.0),
            ..BadgeCriteria::UNBOUNDED
        },
    },
    BadgeDefinition {
        id: BadgeId::GamerReady,
        name: "Gamer Ready",
        description: "Low latency and reliable connection for gaming",
        icon: "gamepad",
        criteria: BadgeCriteria {
            min_download_speed: Some(100.0),
            min_upload_speed: Some(15.0),
            max_ping: Some(15.0),
            min_reliability: Some(0.97),
            min_peak_hour_rating: Some(4.0),
            max_peak_hour_packet_loss: Some(0.2),
            max_peak_hour_ping: Some(20.0),
            ..BadgeCriteria::UNBOUNDED
        },
    },
    BadgeDefinition {
        id: BadgeId::BudgetFriendly,
        name: "Budget Friendly",
        description: "Good value for money with reliable basic service",
        icon: "dollar",
        criteria: BadgeCriteria {
            min_download_speed: Some(50.0),
            min_upload_speed: Some(10.0),
            max_ping: Some(50.0),
            min_reliability: Some(0.9),
            min_peak_hour_rating: Some(3.5),
            max_peak_hour_packet_loss: Some(2.0),
            min_peak_hour_download: Some(30.0),
            max_peak_hour_ping: Some(60.0),
            ..BadgeCriteria::UNBOUNDED
        },
    },
    BadgeDefinition {
        id: BadgeId::FamilyChoice,
        name: "Family Choice",
        description: "Reliable service for multiple users and devices",
        icon: "users",
        criteria: BadgeCriteria {
            min_download_speed: Some(200.0),
            min_upload_speed: Some(20.0),
            max_ping: Some(40.0),
            min_reliability: Some(0.93),
            min_peak_hour_rating: Some(4.0),
            max_peak_hour_packet_loss: Some(1.5),
            min_peak_hour_download: Some(150.0),
            max_peak_hour_ping: Some(50.0),
            ..BadgeCriteria::UNBOUNDED
        },
    },
];

pub fn definition(id: BadgeId) -> &'static BadgeDefinition {
    let index = match id {
        BadgeId::WfhFriendly => 0,
        BadgeId::StreamerApproved => 1,
        BadgeId::GamerReady => 2,
        BadgeId::BudgetFriendly => 3,
        BadgeId::FamilyChoice => 4,
    };
    &BADGE_CATALOG[index]
}
