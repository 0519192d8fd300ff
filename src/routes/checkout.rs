use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutSessionCreated},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ErrorResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_checkout))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout session created; no booking exists yet", body = CheckoutSessionCreated),
        (status = 400, description = "Missing or invalid booking fields", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Service or address not found", body = ErrorResponse),
        (status = 503, description = "Payment provider unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<CheckoutSessionCreated>> {
    let Json(payload) = payload?;
    let created = checkout_service::create_checkout(&state, &user, payload).await?;
    Ok(Json(created))
}
