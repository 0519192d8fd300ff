use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement body the provider expects on success.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}
