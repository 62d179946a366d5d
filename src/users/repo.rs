use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

/// Identity sync keeps its validation failure distinct from store failures:
/// the former maps to a 400, the latter propagates like every other operation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("firebase_uid is required")]
    MissingFirebaseUid,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Upsert-by-lookup: return the existing user's id for this firebase uid, or
/// create the row. The insert relies on the unique constraint on
/// `users.firebase_uid`; losing the first-sync race means the conflict clause
/// returns nothing and the winner's row is re-fetched.
pub async fn sync_firebase_user(
    db: &PgPool,
    firebase_uid: &str,
    email: Option<&str>,
    username: Option<&str>,
) -> Result<i64, SyncError> {
    if firebase_uid.trim().is_empty() {
        return Err(SyncError::MissingFirebaseUid);
    }

    if let Some(id) = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM users WHERE firebase_uid = $1
        "#,
    )
    .bind(firebase_uid)
    .fetch_optional(db)
    .await?
    {
        return Ok(id);
    }

    let username = username
        .map(str::to_owned)
        .or_else(|| email.and_then(derive_username));

    if let Some(id) = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (firebase_uid, email, username)
        VALUES ($1, $2, $3)
        ON CONFLICT (firebase_uid) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(firebase_uid)
    .bind(email)
    .bind(&username)
    .fetch_optional(db)
    .await?
    {
        debug!(id, firebase_uid, "created user");
        return Ok(id);
    }

    // A concurrent sync inserted the row between our lookup and insert.
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM users WHERE firebase_uid = $1
        "#,
    )
    .bind(firebase_uid)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// Local part of the email, matching the upstream convention: no `@` means
/// the whole string is the username.
pub(crate) fn derive_username(email: &str) -> Option<String> {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .map(str::to_owned)
}

/// `None` covers both an unset target and an unknown user id.
pub async fn daily_calorie_target(db: &PgPool, user_id: i64) -> anyhow::Result<Option<f64>> {
    let target: Option<Option<f64>> = sqlx::query_scalar(
        r#"
        SELECT daily_calorie_target FROM users WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(target.flatten())
}

pub async fn update_daily_calorie_target(
    db: &PgPool,
    user_id: i64,
    target: Option<f64>,
) -> anyhow::Result<Option<f64>> {
    let stored: Option<f64> = sqlx::query_scalar(
        r#"
        UPDATE users SET daily_calorie_target = $2
        WHERE id = $1
        RETURNING daily_calorie_target
        "#,
    )
    .bind(user_id)
    .bind(target)
    .fetch_one(db)
    .await?;
    Ok(stored)
}
