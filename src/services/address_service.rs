use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
    entity::addresses::{
        ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses,
        Model as AddressModel,
    },
    error::{AppError, AppResult, is_foreign_key_violation},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, FieldError, Meta},
    routes::params::Pagination,
    services::profile_service,
    state::AppState,
};

pub const DEFAULT_COUNTRY: &str = "Guyana";

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AddressList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id.as_str()))
        .order_by_desc(AddressCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        AddressList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let address = find_owned(state, &user.user_id, id).await?;
    Ok(ApiResponse::success(
        "Ok",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let mut errors = Vec::new();
    let street_address = required("streetAddress", payload.street_address, &mut errors);
    let area = required("area", payload.area, &mut errors);
    let city = required("city", payload.city, &mut errors);
    let region = required("region", payload.region, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    profile_service::ensure_profile(&state.pool, &user.user_id, user.email.as_deref()).await?;

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id.clone()),
        street_address: Set(street_address),
        area: Set(area),
        city: Set(city),
        region: Set(region),
        postal_code: Set(optional(payload.postal_code)),
        country: Set(optional(payload.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "address_create",
        "addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address created",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let mut errors = Vec::new();
    let mut update = Addresses::update_many();
    let mut changed = false;

    for (field, column, value) in [
        ("streetAddress", AddressCol::StreetAddress, payload.street_address),
        ("area", AddressCol::Area, payload.area),
        ("city", AddressCol::City, payload.city),
        ("region", AddressCol::Region, payload.region),
        ("country", AddressCol::Country, payload.country),
    ] {
        let Some(value) = value else { continue };
        let value = value.trim().to_string();
        if value.is_empty() {
            errors.push(FieldError::new(field, "must not be empty"));
            continue;
        }
        update = update.col_expr(column, Expr::value(value));
        changed = true;
    }
    if let Some(postal_code) = payload.postal_code {
        update = update.col_expr(AddressCol::PostalCode, Expr::value(optional(Some(postal_code))));
        changed = true;
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if !changed {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let updated = update
        .col_expr(AddressCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(owned_by(&user.user_id, id))
        .exec_with_returning(&state.orm)
        .await?;
    let address = updated.into_iter().next().ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "address_update",
        "addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address updated",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Addresses::delete_many()
        .filter(owned_by(&user.user_id, id))
        .exec(&state.orm)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                AppError::Conflict("Address is used by existing bookings".into())
            } else {
                AppError::from(err)
            }
        })?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "address_delete",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

/// Address `id` if it belongs to `user_id`; any other case is `NotFound`.
pub(crate) async fn find_owned(state: &AppState, user_id: &str, id: Uuid) -> AppResult<AddressModel> {
    Addresses::find()
        .filter(owned_by(user_id, id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn owned_by(user_id: &str, id: Uuid) -> Condition {
    Condition::all()
        .add(AddressCol::Id.eq(id))
        .add(AddressCol::UserId.eq(user_id))
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> String {
    match optional(value) {
        Some(value) => value,
        None => {
            errors.push(FieldError::new(field, "is required"));
            String::new()
        }
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn address_from_entity(model: AddressModel) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        street_address: model.street_address,
        area: model.area,
        city: model.city,
        region: model.region,
        postal_code: model.postal_code,
        country: model.country,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_are_trimmed_and_reported() {
        let mut errors = Vec::new();
        assert_eq!(
            required("city", Some("  Georgetown ".into()), &mut errors),
            "Georgetown"
        );
        required("area", Some("   ".into()), &mut errors);
        required("region", None, &mut errors);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["area", "region"]);
    }
}
