use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use super::dto::{CalorieTargetResponse, UpdateCalorieTargetRequest};
use super::repo::{self, SyncError};
use crate::auth::extractors::AuthUser;
use crate::auth::verifier::FirebaseIdentity;
use crate::state::AppState;

pub fn me_routes() -> Router<AppState> {
    Router::new().route(
        "/me/calorie-target",
        get(get_calorie_target).put(update_calorie_target),
    )
}

pub(crate) fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub(crate) fn sync_error(e: SyncError) -> (StatusCode, String) {
    match e {
        SyncError::MissingFirebaseUid => (StatusCode::BAD_REQUEST, e.to_string()),
        SyncError::Database(e) => internal(e),
    }
}

/// Maps the verified identity to its internal user id, creating the row on
/// first sight (upsert-by-lookup).
pub(crate) async fn resolve_user(
    state: &AppState,
    identity: &FirebaseIdentity,
) -> Result<i64, (StatusCode, String)> {
    repo::sync_firebase_user(&state.db, &identity.uid, identity.email.as_deref(), None)
        .await
        .map_err(sync_error)
}

#[instrument(skip(state))]
pub async fn get_calorie_target(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<CalorieTargetResponse>, (StatusCode, String)> {
    let user_id = resolve_user(&state, &identity).await?;
    let target = repo::daily_calorie_target(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "get calorie target failed");
            internal(e)
        })?;
    Ok(Json(CalorieTargetResponse { target }))
}

#[instrument(skip(state, body))]
pub async fn update_calorie_target(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(body): Json<UpdateCalorieTargetRequest>,
) -> Result<Json<CalorieTargetResponse>, (StatusCode, String)> {
    let user_id = resolve_user(&state, &identity).await?;
    let target = repo::update_daily_calorie_target(&state.db, user_id, body.target.0)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "update calorie target failed");
            internal(e)
        })?;
    Ok(Json(CalorieTargetResponse { target }))
}
