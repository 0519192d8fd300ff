use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{
    CheckoutSession, CheckoutSessionRequest, PaymentGateway, ProviderError, ProviderErrorKind,
};
use crate::config::{AppConfig, ConfigError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimal Stripe REST client covering hosted checkout sessions.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let secret_key = config
            .stripe_secret_key
            .clone()
            .ok_or_else(|| ConfigError::Missing(vec!["STRIPE_SECRET_KEY"]))?;
        Self::new(secret_key, config.stripe_api_base.clone())
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|err| {
                let kind = if err.is_timeout() || err.is_connect() {
                    ProviderErrorKind::Unreachable
                } else {
                    ProviderErrorKind::Unavailable
                };
                ProviderError::new(kind, err.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ProviderError::new(ProviderErrorKind::Unavailable, err.to_string()))?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<ErrorEnvelope>(&body).ok();
            let kind = classify(status, parsed.as_ref().and_then(|e| e.error.kind.as_deref()));
            let detail = parsed
                .map(|e| {
                    format!(
                        "{} ({})",
                        e.error.message.unwrap_or_default(),
                        e.error.code.unwrap_or_else(|| "no code".into())
                    )
                })
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(ProviderError::new(kind, detail));
        }

        let session: SessionResponse = serde_json::from_str(&body).map_err(|err| {
            ProviderError::new(
                ProviderErrorKind::Unavailable,
                format!("unexpected checkout session payload: {err}"),
            )
        })?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}

/// Form body for `POST /v1/checkout/sessions`, using the bracketed key
/// convention for nested parameters.
pub fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("payment_method_types[0]".into(), "card".into()),
        ("line_items[0][quantity]".into(), "1".into()),
        (
            "line_items[0][price_data][currency]".into(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".into(),
            request.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".into(),
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".into(),
            request.description.clone(),
        ),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
    ];
    if let Some(email) = &request.customer_email {
        form.push(("customer_email".into(), email.clone()));
    }
    form.extend(
        request
            .metadata
            .encode()
            .into_iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value)),
    );
    form
}

pub fn classify(status: StatusCode, error_type: Option<&str>) -> ProviderErrorKind {
    match (status.as_u16(), error_type) {
        (402, _) | (_, Some("card_error")) => ProviderErrorKind::CardDeclined,
        (401 | 403, _) | (_, Some("authentication_error")) => ProviderErrorKind::Authentication,
        (429, _) | (_, Some("rate_limit_error")) => ProviderErrorKind::RateLimited,
        (code, _) if code >= 500 => ProviderErrorKind::Unavailable,
        (_, Some("api_error")) => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::InvalidRequest,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::{models::TimeSlot, payments::metadata::BookingMetadata};

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            amount_cents: 2500,
            currency: "usd".into(),
            product_name: "Lawn Care Service Booking".into(),
            description: "Service scheduled for 2025-06-01 at morning".into(),
            customer_email: Some("jo@example.com".into()),
            success_url: "https://lawn.example/booking/success?session_id={CHECKOUT_SESSION_ID}"
                .into(),
            cancel_url: "https://lawn.example/booking".into(),
            metadata: BookingMetadata {
                user_id: "u_1".into(),
                service_id: Uuid::nil(),
                address_id: Uuid::nil(),
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                time_slot: TimeSlot::Morning,
                price_cents: 2500,
                assessment: None,
            },
        }
    }

    #[test]
    fn form_carries_amount_and_metadata() {
        let form = checkout_form(&request());
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("2500"));
        assert_eq!(get("metadata[userId]"), Some("u_1"));
        assert_eq!(get("metadata[time]"), Some("morning"));
        assert_eq!(get("metadata[price]"), Some("2500"));
        assert_eq!(get("customer_email"), Some("jo@example.com"));
        assert_eq!(get("metadata[assessment]"), None);
    }

    #[test]
    fn classifies_provider_failures() {
        assert_eq!(
            classify(StatusCode::PAYMENT_REQUIRED, Some("card_error")),
            ProviderErrorKind::CardDeclined
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, None),
            ProviderErrorKind::Authentication
        );
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, Some("rate_limit_error")),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, None),
            ProviderErrorKind::Unavailable
        );
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, Some("invalid_request_error")),
            ProviderErrorKind::InvalidRequest
        );
    }
}
