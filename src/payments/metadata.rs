use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{models::TimeSlot, response::FieldError};

pub const USER_ID: &str = "userId";
pub const SERVICE_ID: &str = "serviceId";
pub const ADDRESS_ID: &str = "addressId";
pub const DATE: &str = "date";
pub const TIME: &str = "time";
pub const PRICE: &str = "price";
pub const ASSESSMENT: &str = "assessment";

pub const REQUIRED_KEYS: [&str; 6] = [USER_ID, SERVICE_ID, ADDRESS_ID, DATE, TIME, PRICE];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Booking draft as carried through the payment provider.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingMetadata {
    pub user_id: String,
    pub service_id: Uuid,
    pub address_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    /// Minor currency units.
    pub price_cents: i64,
    pub assessment: Option<Value>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("checkout metadata is missing required fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("checkout metadata has invalid fields")]
    Invalid(Vec<FieldError>),
}

impl MetadataError {
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            MetadataError::Missing(keys) => keys
                .iter()
                .map(|key| FieldError::new(*key, "missing from checkout metadata"))
                .collect(),
            MetadataError::Invalid(fields) => fields.clone(),
        }
    }
}

impl BookingMetadata {
    /// Flatten into provider metadata. Every value is a string; the optional
    /// assessment is the only JSON-encoded entry.
    pub fn encode(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (USER_ID, self.user_id.clone()),
            (SERVICE_ID, self.service_id.to_string()),
            (ADDRESS_ID, self.address_id.to_string()),
            (DATE, self.date.format(DATE_FORMAT).to_string()),
            (TIME, self.time_slot.as_str().to_string()),
            (PRICE, self.price_cents.to_string()),
        ];
        if let Some(assessment) = &self.assessment {
            pairs.push((ASSESSMENT, assessment.to_string()));
        }
        pairs
    }

    /// Validate a metadata bag received back from the provider. Missing keys
    /// are reported together before any value is parsed.
    pub fn decode(metadata: &HashMap<String, String>) -> Result<Self, MetadataError> {
        let value = |key: &str| {
            metadata
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&'static str> = REQUIRED_KEYS
            .into_iter()
            .filter(|key| value(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(MetadataError::Missing(missing));
        }

        let mut invalid = Vec::new();
        let user_id = value(USER_ID).unwrap_or_default().to_string();
        let service_id = parse_uuid(SERVICE_ID, value(SERVICE_ID), &mut invalid);
        let address_id = parse_uuid(ADDRESS_ID, value(ADDRESS_ID), &mut invalid);

        let date = value(DATE).and_then(|raw| parse_date(raw).ok());
        if date.is_none() {
            invalid.push(FieldError::new(DATE, "expected a date formatted YYYY-MM-DD"));
        }

        let time_slot = value(TIME).and_then(TimeSlot::parse);
        if time_slot.is_none() {
            invalid.push(FieldError::new(TIME, "expected `morning` or `afternoon`"));
        }

        let price_cents = value(PRICE)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|cents| *cents > 0);
        if price_cents.is_none() {
            invalid.push(FieldError::new(
                PRICE,
                "expected a positive amount in minor units",
            ));
        }

        let assessment = match value(ASSESSMENT) {
            None => None,
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(parsed @ Value::Object(_)) => Some(parsed),
                _ => {
                    invalid.push(FieldError::new(ASSESSMENT, "expected a JSON object"));
                    None
                }
            },
        };

        match (service_id, address_id, date, time_slot, price_cents) {
            (Some(service_id), Some(address_id), Some(date), Some(time_slot), Some(price_cents))
                if invalid.is_empty() =>
            {
                Ok(Self {
                    user_id,
                    service_id,
                    address_id,
                    date,
                    time_slot,
                    price_cents,
                    assessment,
                })
            }
            _ => Err(MetadataError::Invalid(invalid)),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
}

fn parse_uuid(key: &'static str, raw: Option<&str>, invalid: &mut Vec<FieldError>) -> Option<Uuid> {
    let parsed = raw.and_then(|raw| Uuid::parse_str(raw).ok());
    if parsed.is_none() {
        invalid.push(FieldError::new(key, "expected a UUID"));
    }
    parsed
}
