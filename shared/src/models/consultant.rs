//! Consultant directory models
//!
//! Consultants and their service tiers are created and updated by an
//! external consultant-management process; this subsystem only reads them.

use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate stats shown on consultant cards
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConsultantStats {
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub avg_rating: f64,
    /// Free text, e.g. "within 2 hours"
    #[serde(default)]
    pub response_time: String,
}

/// A bookable service tier
///
/// Duration and price are copied into the booking at creation time and are
/// never re-read afterwards, so editing a service cannot rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub duration_min: u32,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
}

/// Weekly availability template
///
/// Candidate start times are configured per consultant, not per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyTemplate {
    /// ISO weekday numbers, 1 = Monday .. 7 = Sunday
    pub weekdays: Vec<u32>,
    pub start_times: Vec<NaiveTime>,
}

impl WeeklyTemplate {
    pub fn offers_on(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday.number_from_monday())
    }
}

impl Default for WeeklyTemplate {
    /// Monday to Friday, standard candidate times (工作日白天 + 晚间两档)
    fn default() -> Self {
        let start_times = [
            (9, 0),
            (10, 0),
            (14, 0),
            (15, 0),
            (16, 0),
            (19, 0),
            (20, 0),
        ]
        .iter()
        .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        .collect();

        Self {
            weekdays: vec![1, 2, 3, 4, 5],
            start_times,
        }
    }
}

/// Consultant entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub stats: ConsultantStats,
    pub services: Vec<Service>,
    #[serde(default)]
    pub meeting_platform: Option<String>,
    #[serde(default)]
    pub weekly_template: WeeklyTemplate,
    /// Consultant-level kill switch; false means "not offering consultations
    /// at all", which is different from "fully booked"
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

impl Consultant {
    /// Look up one of this consultant's service tiers
    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == service_id)
    }

    /// Cheapest offered tier, None when no services are configured
    pub fn min_price(&self) -> Option<Decimal> {
        self.services.iter().map(|s| s.price).min()
    }

    /// Projection for the consultant list view
    pub fn summary(&self) -> ConsultantSummary {
        ConsultantSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            title: self.title.clone(),
            avatar: self.avatar.clone(),
            specialties: self.specialties.clone(),
            stats: self.stats.clone(),
            min_price: self.min_price(),
            is_available: self.is_available,
        }
    }
}

/// Consultant summary for list view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultantSummary {
    pub id: String,
    pub name: String,
    pub title: String,
    pub avatar: Option<String>,
    pub specialties: Vec<String>,
    pub stats: ConsultantStats,
    pub min_price: Option<Decimal>,
    pub is_available: bool,
}
