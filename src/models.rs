use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Coarse time-of-day a customer picks when booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
}

impl TimeSlot {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "morning" => Some(TimeSlot::Morning),
            "afternoon" => Some(TimeSlot::Afternoon),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
        }
    }

    /// Wall-clock time stored for the slot.
    pub fn anchor(self) -> NaiveTime {
        let hour = match self {
            TimeSlot::Morning => 8,
            TimeSlot::Afternoon => 13,
        };
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default()
    }

    pub fn from_anchor(time: NaiveTime) -> Option<Self> {
        [TimeSlot::Morning, TimeSlot::Afternoon]
            .into_iter()
            .find(|slot| slot.anchor() == time)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BookingStatus {
    #[sea_orm(string_value = "Scheduled")]
    Scheduled,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Rescheduled")]
    Rescheduled,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("booking is {0:?} and can no longer change status")]
    Terminal(BookingStatus),

    #[error("a booking cannot move back to Scheduled")]
    BackToScheduled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Scheduled,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Rescheduled,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw.trim())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "Scheduled",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Rescheduled => "Rescheduled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// `Scheduled` is only ever set on creation; terminal states are final.
    pub fn transition(self, next: BookingStatus) -> Result<BookingStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if next == BookingStatus::Scheduled {
            return Err(TransitionError::BackToScheduled);
        }
        Ok(next)
    }
}

pub fn cents_to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Major currency units; `None` means priced after an assessment.
    pub price: Option<f64>,
    pub price_cents: Option<i64>,
    pub features: Vec<String>,
    pub includes_media: bool,
    pub is_custom: bool,
    pub display_order: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: String,
    pub street_address: String,
    pub area: String,
    pub city: String,
    pub region: String,
    pub postal_code: Option<String>,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub service_id: Uuid,
    pub service_name: Option<String>,
    pub address_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub time_slot: Option<TimeSlot>,
    pub status: BookingStatus,
    pub price_at_booking: f64,
    pub price_at_booking_cents: i64,
    pub stripe_checkout_session_id: String,
    pub assessment: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomAssessment {
    pub id: Uuid,
    pub user_id: String,
    pub service_id: Uuid,
    pub address_id: Uuid,
    pub preferred_date: NaiveDate,
    pub preferred_time: TimeSlot,
    pub assessment_data: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_slots_map_to_fixed_anchors() {
        assert_eq!(
            TimeSlot::Morning.anchor(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            TimeSlot::Afternoon.anchor(),
            NaiveTime::from_hms_opt(13, 0, 0).unwrap()
        );
        assert_eq!(TimeSlot::parse("morning"), Some(TimeSlot::Morning));
        assert_eq!(TimeSlot::parse("afternoon"), Some(TimeSlot::Afternoon));
        for raw in ["MORNING", " Morning ", "morning ", "evening", ""] {
            assert_eq!(TimeSlot::parse(raw), None, "{raw:?}");
        }
        assert_eq!(
            TimeSlot::from_anchor(NaiveTime::from_hms_opt(13, 0, 0).unwrap()),
            Some(TimeSlot::Afternoon)
        );
    }

    #[test]
    fn terminal_statuses_are_final() {
        use BookingStatus::*;
        assert_eq!(Scheduled.transition(Cancelled), Ok(Cancelled));
        assert_eq!(Scheduled.transition(Rescheduled), Ok(Rescheduled));
        assert_eq!(Rescheduled.transition(Rescheduled), Ok(Rescheduled));
        assert_eq!(Rescheduled.transition(Completed), Ok(Completed));
        assert_eq!(
            Cancelled.transition(Rescheduled),
            Err(TransitionError::Terminal(Cancelled))
        );
        assert_eq!(
            Completed.transition(Cancelled),
            Err(TransitionError::Terminal(Completed))
        );
        assert_eq!(
            Rescheduled.transition(Scheduled),
            Err(TransitionError::BackToScheduled)
        );
    }

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!(BookingStatus::parse("Cancelled"), Some(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::parse("cancelled"), None);
    }
}
