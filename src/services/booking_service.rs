use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, sea_query::Expr,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::bookings::{BookingList, BookingListQuery, UpdateBookingRequest},
    entity::{
        bookings::{
            ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings,
            Model as BookingModel,
        },
        services::{Entity as Services, Model as ServiceModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::{Booking, BookingStatus, TimeSlot, cents_to_major},
    payments::metadata::{self, BookingMetadata, MetadataError},
    response::{ApiResponse, FieldError, Meta},
    services::profile_service,
    state::AppState,
};

/// Result of materialising a paid checkout session.
#[derive(Debug)]
pub enum RecordOutcome {
    Created(Booking),
    /// A booking for this session already exists; nothing was written.
    AlreadyRecorded,
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(BookingCol::UserId.eq(user.user_id.as_str()));
    if let Some(session_id) = query.session_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(BookingCol::StripeCheckoutSessionId.eq(session_id));
    }

    let finder = Bookings::find()
        .filter(condition)
        .order_by_desc(BookingCol::BookingDate)
        .order_by_desc(BookingCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .find_also_related(Services)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(booking, service)| booking_from_entity(booking, service))
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    let (booking, service) = Bookings::find()
        .filter(owned_by(&user.user_id, id))
        .find_also_related(Services)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Ok",
        booking_from_entity(booking, service),
        Some(Meta::empty()),
    ))
}

pub async fn update_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let next = BookingStatus::parse(&payload.status).ok_or_else(|| {
        AppError::validation(
            "status",
            "must be one of Scheduled, Completed, Cancelled, Rescheduled",
        )
    })?;

    let reschedule = if next == BookingStatus::Rescheduled {
        Some(parse_reschedule(payload.date.as_deref(), payload.time.as_deref())?)
    } else {
        None
    };

    let current = Bookings::find()
        .filter(owned_by(&user.user_id, id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let next = current.status.transition(next)?;

    let mut update = Bookings::update_many()
        .col_expr(BookingCol::Status, Expr::value(next.as_str()))
        .col_expr(BookingCol::UpdatedAt, Expr::value(Utc::now()));
    if let Some((date, slot)) = reschedule {
        update = update
            .col_expr(BookingCol::BookingDate, Expr::value(date))
            .col_expr(BookingCol::BookingTime, Expr::value(slot.anchor()));
    }

    // The status guard makes a concurrent change lose instead of overwrite.
    let updated = update
        .filter(owned_by(&user.user_id, id))
        .filter(BookingCol::Status.eq(current.status.as_str()))
        .exec_with_returning(&state.orm)
        .await?;
    let booking = updated.into_iter().next().ok_or_else(|| {
        AppError::Conflict("Booking was modified concurrently, please retry".into())
    })?;

    tracing::info!(
        booking_id = %booking.id,
        from = current.status.as_str(),
        to = next.as_str(),
        "booking status changed"
    );
    audit::record(
        &state.pool,
        Some(&user.user_id),
        "booking_status_change",
        "bookings",
        serde_json::json!({
            "booking_id": booking.id,
            "from": current.status.as_str(),
            "to": next.as_str(),
        }),
    )
    .await;

    let service = Services::find_by_id(booking.service_id).one(&state.orm).await?;
    Ok(ApiResponse::success(
        "Booking updated",
        booking_from_entity(booking, service),
        Some(Meta::empty()),
    ))
}

pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    update_booking(
        state,
        user,
        id,
        UpdateBookingRequest {
            status: BookingStatus::Cancelled.as_str().to_string(),
            date: None,
            time: None,
        },
    )
    .await
}

/// Insert the booking for a paid checkout session. The session id is the
/// idempotency key: a second delivery hits the unique constraint and is
/// reported as `AlreadyRecorded`.
pub async fn record_paid_booking(
    state: &AppState,
    session_id: &str,
    customer_email: Option<&str>,
    draft: BookingMetadata,
) -> AppResult<RecordOutcome> {
    profile_service::ensure_profile(&state.pool, &draft.user_id, customer_email).await?;

    let active = BookingActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(draft.user_id.clone()),
        service_id: Set(draft.service_id),
        address_id: Set(draft.address_id),
        booking_date: Set(draft.date),
        booking_time: Set(draft.time_slot.anchor()),
        status: Set(BookingStatus::Scheduled),
        price_at_booking_cents: Set(draft.price_cents),
        stripe_checkout_session_id: Set(session_id.to_string()),
        assessment: Set(draft.assessment.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    };

    let booking = match active.insert(&state.orm).await {
        Ok(booking) => booking,
        Err(err) if is_unique_violation(&err) => {
            tracing::info!(session_id, "booking already recorded for session");
            return Ok(RecordOutcome::AlreadyRecorded);
        }
        Err(err) => match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                return Err(MetadataError::Invalid(dangling_reference_fields(&message)).into());
            }
            _ => return Err(err.into()),
        },
    };

    tracing::info!(
        booking_id = %booking.id,
        session_id,
        user_id = %booking.user_id,
        "booking created from checkout session"
    );
    audit::record(
        &state.pool,
        Some(&booking.user_id),
        "booking_created",
        "bookings",
        serde_json::json!({ "booking_id": booking.id, "session_id": session_id }),
    )
    .await;

    let service = Services::find_by_id(booking.service_id).one(&state.orm).await?;
    Ok(RecordOutcome::Created(booking_from_entity(booking, service)))
}

fn parse_reschedule(
    date: Option<&str>,
    time: Option<&str>,
) -> AppResult<(chrono::NaiveDate, TimeSlot)> {
    let mut errors = Vec::new();
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => {
            errors.push(FieldError::new("date", "is required when rescheduling"));
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
    let slot = match time.map(str::trim).filter(|t| !t.is_empty()) {
        None => {
            errors.push(FieldError::new("time", "is required when rescheduling"));
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

    match (date, slot) {
        (Some(date), Some(slot)) => Ok((date, slot)),
        _ => Err(AppError::Validation(errors)),
    }
}

fn owned_by(user_id: &str, id: Uuid) -> Condition {
    Condition::all()
        .add(BookingCol::Id.eq(id))
        .add(BookingCol::UserId.eq(user_id))
}

const SERVICE_FK: &str = "bookings_service_id_fkey";
const ADDRESS_FK: &str = "bookings_address_id_fkey";

/// Maps a foreign-key violation on insert to the metadata field that dangles.
fn dangling_reference_fields(message: &str) -> Vec<FieldError> {
    let service = FieldError::new(metadata::SERVICE_ID, "must reference an existing service");
    let address = FieldError::new(metadata::ADDRESS_ID, "must reference an existing address");
    if message.contains(SERVICE_FK) {
        vec![service]
    } else if message.contains(ADDRESS_FK) {
        vec![address]
    } else {
        vec![service, address]
    }
}

fn booking_from_entity(model: BookingModel, service: Option<ServiceModel>) -> Booking {
    Booking {
        id: model.id,
        user_id: model.user_id,
        service_id: model.service_id,
        service_name: service.map(|s| s.name),
        address_id: model.address_id,
        booking_date: model.booking_date,
        booking_time: model.booking_time,
        time_slot: TimeSlot::from_anchor(model.booking_time),
        status: model.status,
        price_at_booking: cents_to_major(model.price_at_booking_cents),
        price_at_booking_cents: model.price_at_booking_cents,
        stripe_checkout_session_id: model.stripe_checkout_session_id,
        assessment: model.assessment,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    }
}
