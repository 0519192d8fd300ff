//! Hosted-checkout payment provider integration.
//!
//! The booking draft travels through the provider as a flat string metadata
//! bag (`metadata`) and comes back inside a signed webhook event
//! (`signature`, `event`).

use async_trait::async_trait;
use thiserror::Error;

pub mod event;
pub mod metadata;
pub mod mock;
pub mod signature;
pub mod stripe;

use metadata::BookingMetadata;

/// Smallest amount the provider will charge, in minor units.
pub const MIN_CHARGE_CENTS: i64 = 50;

/// Provider limit on a single metadata value.
pub const MAX_METADATA_VALUE_LEN: usize = 500;

pub const PRODUCT_NAME: &str = "Lawn Care Service Booking";

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub description: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BookingMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Network failure or timeout before the provider answered.
    Unreachable,
    CardDeclined,
    RateLimited,
    /// The provider rejected our credentials.
    Authentication,
    InvalidRequest,
    /// Provider-side failure (5xx or `api_error`).
    Unavailable,
}

#[derive(Debug, Error)]
#[error("payment provider error ({kind:?}): {detail}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl ProviderErrorKind {
    /// Message safe to show a customer.
    pub fn user_message(self) -> &'static str {
        match self {
            ProviderErrorKind::Unreachable | ProviderErrorKind::Unavailable => {
                "Payment service is temporarily unavailable. Please try again later."
            }
            ProviderErrorKind::CardDeclined => {
                "Your payment method was declined. Please use a different card."
            }
            ProviderErrorKind::RateLimited => {
                "Too many payment attempts. Please wait a moment and try again."
            }
            ProviderErrorKind::Authentication => {
                "Payments are currently unavailable. Please contact support."
            }
            ProviderErrorKind::InvalidRequest => {
                "The payment request could not be processed. Please review your booking details."
            }
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ProviderError>;
}
