use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Provider event envelope. Only the fields reconciliation reads are typed;
/// `data.object` stays raw until the event type is known.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Absent and `null` both decode to an empty bag.
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub metadata: HashMap<String, String>,
}

fn nullable_metadata<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completed_checkout_envelope() {
        let raw = serde_json::json!({
            "id": "evt_1",
            "object": "event",
            "type": "checkout.session.completed",
            "created": 1750000000,
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "object": "checkout.session",
                    "payment_status": "paid",
                    "metadata": { "userId": "u_1" }
                }
            }
        });
        let event: WebhookEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, CHECKOUT_SESSION_COMPLETED);

        let session: CheckoutSessionObject = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.metadata["userId"], "u_1");
    }

    #[test]
    fn null_metadata_is_empty() {
        let session: CheckoutSessionObject =
            serde_json::from_value(serde_json::json!({ "id": "cs_1", "metadata": null })).unwrap();
        assert!(session.metadata.is_empty());
    }
}
