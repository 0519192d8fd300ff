use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::assessments::CreateAssessmentRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::CustomAssessment,
    response::{ApiResponse, ErrorResponse},
    services::assessment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_assessment))
}

#[utoipa::path(
    post,
    path = "/api/assessments",
    request_body = CreateAssessmentRequest,
    responses(
        (status = 201, description = "Assessment request submitted", body = ApiResponse<CustomAssessment>),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Service or address not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assessments"
)]
pub async fn create_assessment(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateAssessmentRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomAssessment>>)> {
    let Json(payload) = payload?;
    let resp = assessment_service::create_assessment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
