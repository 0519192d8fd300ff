use sea_orm::{ActiveModelTrait, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::assessments::CreateAssessmentRequest,
    entity::custom_assessments::{ActiveModel as AssessmentActive, Model as AssessmentModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CustomAssessment, TimeSlot},
    payments::metadata,
    response::{ApiResponse, FieldError, Meta},
    services::{address_service, catalog_service, profile_service},
    state::AppState,
};

pub const PENDING: &str = "Pending";

/// Request an on-site assessment for a service priced after inspection.
pub async fn create_assessment(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAssessmentRequest,
) -> AppResult<ApiResponse<CustomAssessment>> {
    let mut errors = Vec::new();
    if payload.service_id.is_none() {
        errors.push(FieldError::new("serviceId", "is required"));
    }
    if payload.address_id.is_none() {
        errors.push(FieldError::new("addressId", "is required"));
    }
    let preferred_date = payload
        .preferred_date
        .as_deref()
        .and_then(|raw| metadata::parse_date(raw).ok());
    if preferred_date.is_none() {
        errors.push(FieldError::new(
            "preferredDate",
            "expected a date formatted YYYY-MM-DD",
        ));
    }
    let preferred_time = payload.preferred_time.as_deref().and_then(TimeSlot::parse);
    if preferred_time.is_none() {
        errors.push(FieldError::new(
            "preferredTime",
            "expected `morning` or `afternoon`",
        ));
    }
    let assessment_data = match payload.assessment_data {
        Some(value @ serde_json::Value::Object(_)) => Some(value),
        _ => {
            errors.push(FieldError::new("assessmentData", "must be a JSON object"));
            None
        }
    };

    let (
        Some(service_id),
        Some(address_id),
        Some(preferred_date),
        Some(preferred_time),
        Some(assessment_data),
    ) = (
        payload.service_id,
        payload.address_id,
        preferred_date,
        preferred_time,
        assessment_data,
    )
    else {
        return Err(AppError::Validation(errors));
    };

    address_service::find_owned(state, &user.user_id, address_id).await?;
    catalog_service::find_service(state, service_id).await?;
    profile_service::ensure_profile(&state.pool, &user.user_id, user.email.as_deref()).await?;

    let assessment = AssessmentActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id.clone()),
        service_id: Set(service_id),
        address_id: Set(address_id),
        preferred_date: Set(preferred_date),
        preferred_time: Set(preferred_time.as_str().to_string()),
        assessment_data: Set(assessment_data),
        status: Set(PENDING.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(assessment_id = %assessment.id, user_id = %user.user_id, "assessment requested");
    audit::record(
        &state.pool,
        Some(&user.user_id),
        "assessment_create",
        "custom_assessments",
        serde_json::json!({ "assessment_id": assessment.id, "service_id": service_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Assessment request submitted",
        assessment_from_entity(assessment),
        Some(Meta::empty()),
    ))
}

fn assessment_from_entity(model: AssessmentModel) -> CustomAssessment {
    CustomAssessment {
        id: model.id,
        user_id: model.user_id,
        service_id: model.service_id,
        address_id: model.address_id,
        preferred_date: model.preferred_date,
        preferred_time: TimeSlot::parse(&model.preferred_time).unwrap_or(TimeSlot::Morning),
        assessment_data: model.assessment_data,
        status: model.status,
        created_at: model.created_at.into(),
    }
}
