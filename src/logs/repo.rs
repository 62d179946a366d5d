use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use tracing::{debug, error};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// One consumption event. `logged_at` is assigned by the store on insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodLog {
    pub id: i64,
    pub user_id: i64,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub food_name_custom: String,
    pub calories: Option<f64>,
    pub food_id: Option<i64>,
    pub logged_at: OffsetDateTime,
}

/// Per-day nutrient totals, derived on every request; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutritionSummary {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, FromRow)]
struct NutrientRow {
    proteins: Option<f64>,
    carbohydrate: Option<f64>,
    fat: Option<f64>,
}

pub async fn list_by_date(db: &PgPool, user_id: i64, date: Date) -> anyhow::Result<Vec<FoodLog>> {
    let rows = sqlx::query_as::<_, FoodLog>(
        r#"
        SELECT id, user_id, date, food_name_custom, calories, food_id, logged_at
        FROM food_logs
        WHERE user_id = $1 AND date = $2
        ORDER BY logged_at ASC
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert(
    db: &PgPool,
    user_id: i64,
    date: Date,
    food_name: &str,
    calories: f64,
    food_id: Option<i64>,
) -> anyhow::Result<FoodLog> {
    let row = sqlx::query_as::<_, FoodLog>(
        r#"
        INSERT INTO food_logs (user_id, date, food_name_custom, calories, food_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, date, food_name_custom, calories, food_id, logged_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(food_name)
    .bind(calories)
    .bind(food_id)
    .fetch_one(db)
    .await?;
    debug!(id = row.id, user_id, "food log created");
    Ok(row)
}

/// Idempotent: deleting an id that no longer exists is not an error.
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM food_logs WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}

/// Inclusive range; the summation happens here, not in the store, and a NULL
/// calories column counts as zero.
pub async fn total_calories_in_range(
    db: &PgPool,
    user_id: i64,
    start: Date,
    end: Date,
) -> anyhow::Result<f64> {
    let calories: Vec<Option<f64>> = sqlx::query_scalar(
        r#"
        SELECT calories
        FROM food_logs
        WHERE user_id = $1 AND date >= $2 AND date <= $3
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(sum_calories(calories))
}

/// Unlike every other operation this one never fails: any store error is
/// logged and replaced by the zero summary.
pub async fn daily_nutrition_summary(db: &PgPool, user_id: i64, date: Date) -> NutritionSummary {
    match try_daily_nutrition_summary(db, user_id, date).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, user_id, %date, "nutrition summary failed; returning zeroed summary");
            NutritionSummary::default()
        }
    }
}

async fn try_daily_nutrition_summary(
    db: &PgPool,
    user_id: i64,
    date: Date,
) -> anyhow::Result<NutritionSummary> {
    // Inner join: logs without a catalog entry contribute nothing.
    let rows = sqlx::query_as::<_, NutrientRow>(
        r#"
        SELECT f.proteins, f.carbohydrate, f.fat
        FROM food_logs l
        JOIN foods f ON f.id = l.food_id
        WHERE l.user_id = $1 AND l.date = $2
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(sum_nutrients(&rows))
}

fn sum_calories<I>(rows: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    rows.into_iter().map(|c| c.unwrap_or(0.0)).sum()
}

fn sum_nutrients(rows: &[NutrientRow]) -> NutritionSummary {
    rows.iter().fold(NutritionSummary::default(), |acc, row| {
        NutritionSummary {
            protein: acc.protein + row.proteins.unwrap_or(0.0),
            carbs: acc.carbs + row.carbohydrate.unwrap_or(0.0),
            fat: acc.fat + row.fat.unwrap_or(0.0),
        }
    })
}

#[cfg(test)]
mod summation_tests {
    use super::*;

    #[test]
    fn null_calories_count_as_zero() {
        assert_eq!(sum_calories([Some(100.0), None, Some(50.5)]), 150.5);
        assert_eq!(sum_calories([None, None]), 0.0);
        assert_eq!(sum_calories(Vec::new()), 0.0);
    }

    #[test]
    fn calorie_totals_are_additive_over_adjacent_ranges() {
        // Splitting [a, c] into [a, b] and [b+1, c] partitions the rows.
        let first_half = vec![Some(120.0), Some(80.0), None];
        let second_half = vec![Some(300.0), Some(0.5)];
        let whole: Vec<_> = first_half
            .iter()
            .chain(second_half.iter())
            .copied()
            .collect();

        assert_eq!(
            sum_calories(whole),
            sum_calories(first_half) + sum_calories(second_half)
        );
    }

    #[test]
    fn nutrient_sum_is_zero_for_no_rows() {
        assert_eq!(sum_nutrients(&[]), NutritionSummary::default());
    }

    #[test]
    fn nutrient_sum_skips_missing_fields() {
        let rows = vec![
            NutrientRow {
                proteins: Some(10.0),
                carbohydrate: Some(20.0),
                fat: None,
            },
            NutrientRow {
                proteins: Some(2.5),
                carbohydrate: None,
                fat: Some(7.0),
            },
        ];
        assert_eq!(
            sum_nutrients(&rows),
            NutritionSummary {
                protein: 12.5,
                carbs: 20.0,
                fat: 7.0,
            }
        );
    }
}
