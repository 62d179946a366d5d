use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use time::Date;
use tracing::{error, instrument};

use super::dto::{CaloriesTotal, CreateLogRequest, DateQuery, RangeQuery};
use super::repo::{self, FoodLog, NutritionSummary};
use crate::auth::extractors::AuthUser;
use crate::state::AppState;
use crate::users::handlers::{internal, resolve_user};

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs).post(add_log))
        .route("/logs/:id", delete(delete_log))
        .route("/logs/calories", get(calories_in_range))
        .route("/logs/summary", get(daily_summary))
}

fn bad_date(param: &str) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        format!("{param} must be a YYYY-MM-DD date"),
    )
}

fn parse_date(param: &str, value: &str) -> Result<Date, (StatusCode, String)> {
    super::dto::parse_date(value).map_err(|_| bad_date(param))
}

#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<FoodLog>>, (StatusCode, String)> {
    let date = parse_date("date", &q.date)?;
    let user_id = resolve_user(&state, &identity).await?;
    let logs = repo::list_by_date(&state.db, user_id, date)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, %date, "list logs failed");
            internal(e)
        })?;
    Ok(Json(logs))
}

#[instrument(skip(state, body))]
pub async fn add_log(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreateLogRequest>,
) -> Result<(StatusCode, Json<FoodLog>), (StatusCode, String)> {
    let date = parse_date("date", &body.date)?;
    let user_id = resolve_user(&state, &identity).await?;
    let log = repo::insert(
        &state.db,
        user_id,
        date,
        &body.food_name,
        body.calories,
        body.food_id,
    )
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "add log failed");
        internal(e)
    })?;
    Ok((StatusCode::CREATED, Json(log)))
}

#[instrument(skip(state))]
pub async fn delete_log(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let _ = resolve_user(&state, &identity).await?;
    repo::delete(&state.db, id).await.map_err(|e| {
        error!(error = %e, id, "delete log failed");
        internal(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn calories_in_range(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(q): Query<RangeQuery>,
) -> Result<Json<CaloriesTotal>, (StatusCode, String)> {
    let start = parse_date("start_date", &q.start_date)?;
    let end = parse_date("end_date", &q.end_date)?;
    let user_id = resolve_user(&state, &identity).await?;
    let total = repo::total_calories_in_range(&state.db, user_id, start, end)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "calorie range failed");
            internal(e)
        })?;
    Ok(Json(CaloriesTotal { total }))
}

#[instrument(skip(state))]
pub async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<NutritionSummary>, (StatusCode, String)> {
    let date = parse_date("date", &q.date)?;
    let user_id = resolve_user(&state, &identity).await?;
    // Infallible on the repo side: store failures come back as the zero summary.
    let summary = repo::daily_nutrition_summary(&state.db, user_id, date).await;
    Ok(Json(summary))
}
