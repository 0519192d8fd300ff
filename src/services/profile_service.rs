use sea_orm::EntityTrait;

use crate::{
    db::DbPool,
    entity::profiles::{Entity as Profiles, Model as ProfileModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Make sure the caller has a `profiles` row. Identities live with the hosted
/// provider, so the row is created lazily on first write; an existing row only
/// picks up an email it did not have yet.
pub async fn ensure_profile(pool: &DbPool, user_id: &str, email: Option<&str>) -> AppResult<()> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO profiles (user_id, email)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
            SET email = COALESCE(profiles.email, EXCLUDED.email)
        "#,
    )
    .bind(user_id)
    .bind(email)
    .execute(pool)
    .await?;

    tracing::trace!(user_id, rows = inserted.rows_affected(), "profile ensured");
    Ok(())
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    ensure_profile(&state.pool, &user.user_id, user.email.as_deref()).await?;

    let profile = Profiles::find_by_id(user.user_id.clone())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Profile",
        profile_from_entity(profile),
        Some(Meta::empty()),
    ))
}

fn profile_from_entity(model: ProfileModel) -> Profile {
    Profile {
        user_id: model.user_id,
        email: model.email,
        created_at: model.created_at.into(),
    }
}
