mod common;

use axum::http::StatusCode;
use lawn_booking_api::{
    dto::{
        addresses::{CreateAddressRequest, UpdateAddressRequest},
        bookings::{BookingListQuery, UpdateBookingRequest},
        checkout::CheckoutRequest,
    },
    entity::bookings::{Column as BookingCol, Entity as Bookings},
    error::AppError,
    middleware::auth::AuthUser,
    models::{BookingStatus, TimeSlot},
    services::{address_service, booking_service, catalog_service, checkout_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

macro_rules! require_db {
    () => {
        match common::database_url() {
            Some(url) => url,
            None => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run booking flow tests."
                );
                return Ok(());
            }
        }
    };
}

async fn basic_service(state: &AppState) -> anyhow::Result<Uuid> {
    let ids = catalog_service::seed_default_catalog(&state.pool).await?;
    Ok(ids[0])
}

async fn add_address(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let resp = address_service::create_address(
        state,
        user,
        CreateAddressRequest {
            street_address: Some("12 Main Street".into()),
            area: Some("Kitty".into()),
            city: Some("Georgetown".into()),
            region: Some("Demerara-Mahaica".into()),
            ..Default::default()
        },
    )
    .await?;
    let address = resp.data.expect("address");
    assert_eq!(address.country, "Guyana");
    Ok(address.id)
}

async fn bookings_for_session(state: &AppState, session_id: &str) -> anyhow::Result<u64> {
    Ok(Bookings::find()
        .filter(BookingCol::StripeCheckoutSessionId.eq(session_id))
        .count(&state.orm)
        .await?)
}

/// Checkout, returning the session id, the completed event body and the address.
async fn completed_checkout(
    state: &AppState,
    mock: &lawn_booking_api::payments::mock::MockGateway,
    user: &AuthUser,
) -> anyhow::Result<(String, Vec<u8>, Uuid)> {
    let service_id = basic_service(state).await?;
    let address_id = add_address(state, user).await?;

    let created = checkout_service::create_checkout(
        state,
        user,
        CheckoutRequest {
            service_id: Some(service_id),
            address_id: Some(address_id),
            date: Some("2025-06-01".into()),
            time: Some("morning".into()),
            price: Some(2500),
            assessment: None,
        },
    )
    .await?;
    assert!(created.session_id.starts_with("cs_test_"));
    assert_eq!(bookings_for_session(state, &created.session_id).await?, 0);

    let sent = mock
        .requests()
        .into_iter()
        .last()
        .expect("provider request");
    let body = common::completed_event(&created.session_id, common::metadata_bag(&sent.metadata));

    Ok((created.session_id, body, address_id))
}

/// Checkout, then the provider's completed event, delivered twice.
async fn paid_booking(
    state: &AppState,
    mock: &lawn_booking_api::payments::mock::MockGateway,
    user: &AuthUser,
) -> anyhow::Result<(String, Uuid)> {
    let (session_id, body, address_id) = completed_checkout(state, mock, user).await?;

    let app = common::app(state.clone());
    for _ in 0..2 {
        let signature = common::sign(&body);
        let (status, resp) =
            common::send(&app, common::post_webhook(body.clone(), Some(signature))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["received"], true);
    }

    Ok((session_id, address_id))
}

#[tokio::test]
async fn completed_checkout_creates_exactly_one_booking() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, mock) = common::db_state(&url).await?;
    let user = common::new_user();

    let (session_id, _) = paid_booking(&state, &mock, &user).await?;
    assert_eq!(bookings_for_session(&state, &session_id).await?, 1);

    let list = booking_service::list_bookings(
        &state,
        &user,
        BookingListQuery {
            session_id: Some(session_id.clone()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("bookings");
    assert_eq!(list.items.len(), 1);

    let booking = &list.items[0];
    assert_eq!(booking.status, BookingStatus::Scheduled);
    assert_eq!(booking.booking_date.to_string(), "2025-06-01");
    assert_eq!(booking.booking_time, TimeSlot::Morning.anchor());
    assert_eq!(booking.time_slot, Some(TimeSlot::Morning));
    assert_eq!(booking.price_at_booking, 25.0);
    assert_eq!(booking.service_name.as_deref(), Some("Basic Lawn Care"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_duplicate_deliveries_create_one_booking() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, mock) = common::db_state(&url).await?;
    let user = common::new_user();

    let (session_id, body, _) = completed_checkout(&state, &mock, &user).await?;
    let app = common::app(state.clone());
    let first = common::post_webhook(body.clone(), Some(common::sign(&body)));
    let second = common::post_webhook(body.clone(), Some(common::sign(&body)));

    let (a, b) = tokio::join!(common::send(&app, first), common::send(&app, second));
    for (status, resp) in [a, b] {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, serde_json::json!({ "received": true }));
    }
    assert_eq!(bookings_for_session(&state, &session_id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn polling_before_the_webhook_returns_an_empty_list() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, _) = common::db_state(&url).await?;
    let user = common::new_user();

    let list = booking_service::list_bookings(
        &state,
        &user,
        BookingListQuery {
            session_id: Some("cs_test_not_yet_delivered".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("bookings");
    assert!(list.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn incomplete_metadata_creates_no_booking() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, _) = common::db_state(&url).await?;
    let app = common::app(state.clone());

    let session_id = format!("cs_test_{}", Uuid::new_v4().simple());
    let mut metadata = std::collections::HashMap::new();
    metadata.insert("userId".to_string(), "user_partial".to_string());
    metadata.insert("date".to_string(), "2025-06-01".to_string());
    let body = common::completed_event(&session_id, metadata);
    let signature = common::sign(&body);

    let (status, _) = common::send(&app, common::post_webhook(body, Some(signature))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bookings_for_session(&state, &session_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_touch_addresses_or_bookings() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, mock) = common::db_state(&url).await?;
    let owner = common::new_user();
    let intruder = common::new_user();

    let (session_id, address_id) = paid_booking(&state, &mock, &owner).await?;

    let err = address_service::update_address(
        &state,
        &intruder,
        address_id,
        UpdateAddressRequest {
            city: Some("Linden".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = address_service::delete_address(&state, &intruder, address_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let booking = Bookings::find()
        .filter(BookingCol::StripeCheckoutSessionId.eq(session_id.as_str()))
        .one(&state.orm)
        .await?
        .expect("booking");

    let err = booking_service::cancel_booking(&state, &intruder, booking.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let list = booking_service::list_bookings(&state, &intruder, BookingListQuery::default())
        .await?
        .data
        .expect("bookings");
    assert!(list.items.is_empty());

    // The owner's address is intact and still referenced.
    let address = address_service::get_address(&state, &owner, address_id)
        .await?
        .data
        .expect("address");
    assert_eq!(address.city, "Georgetown");
    let err = address_service::delete_address(&state, &owner, address_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn reschedule_then_cancel_then_nothing() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, mock) = common::db_state(&url).await?;
    let user = common::new_user();

    let (session_id, _) = paid_booking(&state, &mock, &user).await?;
    let booking = Bookings::find()
        .filter(BookingCol::StripeCheckoutSessionId.eq(session_id.as_str()))
        .one(&state.orm)
        .await?
        .expect("booking");

    let rescheduled = booking_service::update_booking(
        &state,
        &user,
        booking.id,
        UpdateBookingRequest {
            status: "Rescheduled".into(),
            date: Some("2025-06-08".into()),
            time: Some("afternoon".into()),
        },
    )
    .await?
    .data
    .expect("booking");
    assert_eq!(rescheduled.status, BookingStatus::Rescheduled);
    assert_eq!(rescheduled.booking_date.to_string(), "2025-06-08");
    assert_eq!(rescheduled.booking_time, TimeSlot::Afternoon.anchor());

    let cancelled = booking_service::cancel_booking(&state, &user, booking.id)
        .await?
        .data
        .expect("booking");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let err = booking_service::update_booking(
        &state,
        &user,
        booking.id,
        UpdateBookingRequest {
            status: "Completed".into(),
            date: None,
            time: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    Ok(())
}

#[tokio::test]
async fn checkout_price_must_match_the_catalog() -> anyhow::Result<()> {
    let url = require_db!();
    let (state, mock) = common::db_state(&url).await?;
    let user = common::new_user();
    let service_id = basic_service(&state).await?;
    let address_id = add_address(&state, &user).await?;
    let before = mock.call_count();

    let err = checkout_service::create_checkout(
        &state,
        &user,
        CheckoutRequest {
            service_id: Some(service_id),
            address_id: Some(address_id),
            date: Some("2025-06-01".into()),
            time: Some("afternoon".into()),
            price: Some(100),
            assessment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(mock.call_count(), before);
    Ok(())
}
