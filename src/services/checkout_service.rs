use crate::{
    dto::checkout::{CheckoutRequest, CheckoutSessionCreated},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::TimeSlot,
    payments::{
        CheckoutSessionRequest, MAX_METADATA_VALUE_LEN, MIN_CHARGE_CENTS, PRODUCT_NAME,
        metadata::{self, BookingMetadata},
    },
    response::FieldError,
    services::{address_service, catalog_service},
    state::AppState,
};

/// Start a hosted checkout for a booking draft. Nothing is persisted here;
/// the booking is written when the provider reports the session completed.
pub async fn create_checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<CheckoutSessionCreated> {
    let draft = validate_draft(&user.user_id, payload)?;

    address_service::find_owned(state, &user.user_id, draft.address_id).await?;
    let service = catalog_service::find_service(state, draft.service_id).await?;
    if let Some(list_price) = service.price_cents {
        if list_price != draft.price_cents {
            return Err(AppError::validation(
                "price",
                format!("does not match the price of {} ({list_price})", service.name),
            ));
        }
    }

    let app_url = &state.config.app_url;
    let request = CheckoutSessionRequest {
        amount_cents: draft.price_cents,
        currency: state.config.checkout_currency.clone(),
        product_name: PRODUCT_NAME.to_string(),
        description: format!(
            "Service scheduled for {} at {}",
            draft.date.format(metadata::DATE_FORMAT),
            draft.time_slot
        ),
        customer_email: user.email.clone(),
        success_url: format!("{app_url}/booking/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{app_url}/booking"),
        metadata: draft,
    };

    let session = state.payments.create_checkout_session(&request).await?;
    tracing::info!(
        session_id = %session.id,
        user_id = %user.user_id,
        amount = request.amount_cents,
        "checkout session created"
    );

    Ok(CheckoutSessionCreated {
        session_id: session.id,
        url: session.url,
    })
}

/// Field checks that run before any storage or provider call.
pub fn validate_draft(user_id: &str, payload: CheckoutRequest) -> AppResult<BookingMetadata> {
    let mut errors = Vec::new();

    if payload.service_id.is_none() {
        errors.push(FieldError::new("serviceId", "is required"));
    }
    if payload.address_id.is_none() {
        errors.push(FieldError::new("addressId", "is required"));
    }

    let date = match payload.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => {
            errors.push(FieldError::new("date", "is required"));
            None
        }
        Some(raw) => {
            let parsed = metadata::parse_date(raw).ok();
            if parsed.is_none() {
                errors.push(FieldError::new("date", "expected a date formatted YYYY-MM-DD"));
            }
            parsed
        }
    };

    let time_slot = match payload.time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => {
            errors.push(FieldError::new("time", "is required"));
            None
        }
        Some(raw) => {
            let parsed = TimeSlot::parse(raw);
            if parsed.is_none() {
                errors.push(FieldError::new("time", "expected `morning` or `afternoon`"));
            }
            parsed
        }
    };

    let price_cents = match payload.price {
        None => {
            errors.push(FieldError::new("price", "is required"));
            None
        }
        Some(cents) if cents < MIN_CHARGE_CENTS => {
            errors.push(FieldError::new(
                "price",
                format!("must be at least {MIN_CHARGE_CENTS} minor units"),
            ));
            None
        }
        Some(cents) => Some(cents),
    };

    let assessment = match payload.assessment {
        None | Some(serde_json::Value::Null) => None,
        Some(value @ serde_json::Value::Object(_)) => {
            if value.to_string().len() > MAX_METADATA_VALUE_LEN {
                errors.push(FieldError::new(
                    "assessment",
                    format!("must serialize to at most {MAX_METADATA_VALUE_LEN} characters"),
                ));
                None
            } else {
                Some(value)
            }
        }
        Some(_) => {
            errors.push(FieldError::new("assessment", "must be a JSON object"));
            None
        }
    };

    match (payload.service_id, payload.address_id, date, time_slot, price_cents) {
        (Some(service_id), Some(address_id), Some(date), Some(time_slot), Some(price_cents))
            if errors.is_empty() =>
        {
            Ok(BookingMetadata {
                user_id: user_id.to_string(),
                service_id,
                address_id,
                date,
                time_slot,
                price_cents,
                assessment,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn payload() -> CheckoutRequest {
        CheckoutRequest {
            service_id: Some(Uuid::new_v4()),
            address_id: Some(Uuid::new_v4()),
            date: Some("2025-06-01".into()),
            time: Some("morning".into()),
            price: Some(2500),
            assessment: None,
        }
    }

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(fields) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_draft_becomes_metadata() {
        let draft = validate_draft("u_1", payload()).unwrap();
        assert_eq!(draft.user_id, "u_1");
        assert_eq!(draft.time_slot, TimeSlot::Morning);
        assert_eq!(draft.price_cents, 2500);
    }

    #[test]
    fn reports_every_missing_field() {
        let err = validate_draft("u_1", CheckoutRequest::default()).unwrap_err();
        assert_eq!(
            fields(err),
            vec!["serviceId", "addressId", "date", "time", "price"]
        );
    }

    #[test]
    fn rejects_amount_below_provider_minimum() {
        let mut p = payload();
        p.price = Some(MIN_CHARGE_CENTS - 1);
        assert_eq!(fields(validate_draft("u_1", p).unwrap_err()), vec!["price"]);

        let mut p = payload();
        p.price = Some(MIN_CHARGE_CENTS);
        assert!(validate_draft("u_1", p).is_ok());
    }

    #[test]
    fn rejects_unknown_time_slot() {
        let mut p = payload();
        p.time = Some("evening".into());
        assert_eq!(fields(validate_draft("u_1", p).unwrap_err()), vec!["time"]);
    }

    #[test]
    fn assessment_must_be_a_small_object() {
        let mut p = payload();
        p.assessment = Some(serde_json::json!(["not", "an", "object"]));
        assert_eq!(fields(validate_draft("u_1", p).unwrap_err()), vec!["assessment"]);

        let mut p = payload();
        p.assessment = Some(serde_json::json!({ "notes": "x".repeat(600) }));
        assert_eq!(fields(validate_draft("u_1", p).unwrap_err()), vec!["assessment"]);

        let mut p = payload();
        p.assessment = Some(serde_json::json!({ "lawnSize": "large" }));
        assert!(validate_draft("u_1", p).unwrap().assessment.is_some());
    }
}
