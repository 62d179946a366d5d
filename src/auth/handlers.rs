use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{SyncRequest, SyncResponse};
use super::extractors::AuthUser;
use crate::state::AppState;
use crate::users;

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/sync", post(sync))
}

/// Upserts the verified identity into the users table and returns the
/// internal id the data operations key on.
#[instrument(skip(state, body))]
pub async fn sync(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncResponse>, (StatusCode, String)> {
    let username = body.and_then(|Json(b)| b.username);
    let user_id = users::repo::sync_firebase_user(
        &state.db,
        &identity.uid,
        identity.email.as_deref(),
        username.as_deref(),
    )
    .await
    .map_err(users::handlers::sync_error)?;

    info!(user_id, uid = %identity.uid, "identity synced");
    Ok(Json(SyncResponse { user_id }))
}
