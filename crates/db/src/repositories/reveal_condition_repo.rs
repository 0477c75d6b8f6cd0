//! Repository for the `reveal_conditions` table.

use gallery_core::reveal::{RevealCondition, CONDITION_TIME};
use gallery_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::reveal_condition::RevealConditionRow;

const COLUMNS: &str =
    "id, artwork_id, condition_type, condition_value, is_met, created_at, updated_at";

/// Provides storage and met-tracking for reveal conditions.
pub struct RevealConditionRepo;

impl RevealConditionRepo {
    /// Insert one condition for an artwork. Runs inside the creation transaction.
    pub async fn create(
        conn: &mut PgConnection,
        artwork_id: DbId,
        condition: &RevealCondition,
    ) -> Result<RevealConditionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reveal_conditions (artwork_id, condition_type, condition_value)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RevealConditionRow>(&query)
            .bind(artwork_id)
            .bind(condition.condition_type())
            .bind(condition.condition_value())
            .fetch_one(conn)
            .await
    }

    /// List an artwork's conditions in creation order.
    pub async fn list_for_artwork<'e, E>(
        executor: E,
        artwork_id: DbId,
    ) -> Result<Vec<RevealConditionRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM reveal_conditions WHERE artwork_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, RevealConditionRow>(&query)
            .bind(artwork_id)
            .fetch_all(executor)
            .await
    }

    /// Record conditions as met. Already-met rows are skipped.
    pub async fn mark_met(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE reveal_conditions SET is_met = true WHERE id = ANY($1) AND is_met = false",
        )
        .bind(ids)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Unmet time conditions on hidden artworks, ordered by artwork.
    ///
    /// The `reveal_at` payload is returned as stored; callers parse it so a
    /// malformed row cannot fail the query for every other artwork.
    pub async fn list_pending_time(pool: &PgPool) -> Result<Vec<RevealConditionRow>, sqlx::Error> {
        sqlx::query_as::<_, RevealConditionRow>(
            "SELECT rc.id, rc.artwork_id, rc.condition_type, rc.condition_value, rc.is_met,
                    rc.created_at, rc.updated_at
             FROM reveal_conditions rc
             JOIN artworks a ON a.id = rc.artwork_id
             WHERE a.is_revealed = false
               AND rc.is_met = false
               AND rc.condition_type = $1
             ORDER BY rc.artwork_id, rc.id",
        )
        .bind(CONDITION_TIME)
        .fetch_all(pool)
        .await
    }

    /// Replace every condition of an artwork. Runs inside the caller's
    /// transaction, which must hold the artwork's row lock.
    pub async fn replace_for_artwork(
        conn: &mut PgConnection,
        artwork_id: DbId,
        conditions: &[RevealCondition],
    ) -> Result<Vec<RevealConditionRow>, sqlx::Error> {
        sqlx::query("DELETE FROM reveal_conditions WHERE artwork_id = $1")
            .bind(artwork_id)
            .execute(&mut *conn)
            .await?;
        let mut rows = Vec::with_capacity(conditions.len());
        for condition in conditions {
            rows.push(Self::create(&mut *conn, artwork_id, condition).await?);
        }
        Ok(rows)
    }
}
