use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::webhook::WebhookAck,
    error::AppResult,
    payments::signature::SIGNATURE_HEADER,
    response::ErrorResponse,
    services::webhook_service::{self, WebhookOutcome},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

/// Provider callback. Answers `{"received": true}` once the event is
/// processed or deliberately ignored; any error status asks for a retry.
#[utoipa::path(
    post,
    path = "/api/webhooks/stripe",
    request_body(content = String, description = "Raw signed event payload", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex> signature header")
    ),
    responses(
        (status = 200, description = "Event processed or ignored", body = WebhookAck),
        (status = 400, description = "Bad signature, malformed event or missing metadata", body = ErrorResponse),
        (status = 500, description = "Storage failure, retry later", body = ErrorResponse)
    ),
    tag = "Webhooks"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let now = chrono::Utc::now().timestamp();

    match webhook_service::handle_webhook(&state, signature, &body, now).await? {
        WebhookOutcome::BookingCreated { booking_id, session_id } => {
            tracing::info!(%booking_id, %session_id, "webhook reconciled");
        }
        WebhookOutcome::AlreadyRecorded { session_id } => {
            tracing::info!(%session_id, "duplicate delivery acknowledged");
        }
        WebhookOutcome::Ignored { event_type } => {
            tracing::debug!(%event_type, "webhook acknowledged without action");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
