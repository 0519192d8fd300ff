use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Booking draft submitted before payment. Fields are optional at the wire
/// level so that every missing one can be reported together.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub service_id: Option<Uuid>,
    pub address_id: Option<Uuid>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    /// `morning` or `afternoon`.
    pub time: Option<String>,
    /// Minor currency units.
    pub price: Option<i64>,
    pub assessment: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionCreated {
    pub session_id: String,
    pub url: Option<String>,
}
