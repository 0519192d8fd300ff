use crate::{
    error::{AppError, AppResult},
    payments::{
        event::{CHECKOUT_SESSION_COMPLETED, CheckoutSessionObject, WebhookEvent},
        metadata::BookingMetadata,
        signature::WebhookVerifier,
    },
    services::booking_service::{self, RecordOutcome},
    state::AppState,
};

/// What a verified delivery led to. Every variant is acknowledged with
/// success; failures that should be retried surface as `AppError`.
#[derive(Debug)]
pub enum WebhookOutcome {
    BookingCreated { booking_id: uuid::Uuid, session_id: String },
    AlreadyRecorded { session_id: String },
    Ignored { event_type: String },
}

/// Verify, parse and reconcile one provider delivery. The signature is
/// checked against the raw bytes before anything is parsed or stored.
pub async fn handle_webhook(
    state: &AppState,
    signature: Option<&str>,
    body: &[u8],
    now_unix: i64,
) -> AppResult<WebhookOutcome> {
    let verifier = WebhookVerifier::new(
        &state.config.stripe_webhook_secret,
        state.config.webhook_tolerance_secs,
    )?;
    verifier.verify(body, signature, now_unix)?;

    let event: WebhookEvent = serde_json::from_slice(body)
        .map_err(|err| AppError::BadRequest(format!("Malformed event payload: {err}")))?;

    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "webhook event verified");

    if event.event_type != CHECKOUT_SESSION_COMPLETED {
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "ignoring unhandled event type");
        return Ok(WebhookOutcome::Ignored {
            event_type: event.event_type,
        });
    }

    let session: CheckoutSessionObject = serde_json::from_value(event.data.object)
        .map_err(|err| AppError::BadRequest(format!("Malformed checkout session: {err}")))?;

    let draft = BookingMetadata::decode(&session.metadata).inspect_err(|err| {
        tracing::error!(
            event_id = %event.id,
            session_id = %session.id,
            error = %err,
            "completed checkout carries unusable booking metadata"
        );
    })?;

    if let Some(total) = session.amount_total {
        if total != draft.price_cents {
            tracing::warn!(
                session_id = %session.id,
                amount_total = total,
                price = draft.price_cents,
                "charged amount differs from booking metadata"
            );
        }
    }

    let outcome = booking_service::record_paid_booking(
        state,
        &session.id,
        session.customer_email.as_deref(),
        draft,
    )
    .await?;

    Ok(match outcome {
        RecordOutcome::Created(booking) => WebhookOutcome::BookingCreated {
            booking_id: booking.id,
            session_id: session.id,
        },
        RecordOutcome::AlreadyRecorded => WebhookOutcome::AlreadyRecorded {
            session_id: session.id,
        },
    })
}
