use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::PgStore;
use crate::database::models::{NewRoadmapItem, RoadmapChanges, RoadmapItem, RoadmapStatus};
use crate::database::repository::{DbResult, RoadmapRepository};

const ROADMAP_COLUMNS: &str = r#"
    id, title, description, status, category, votes, priority,
    target_date, completed_at, created_by, created_at, updated_at
"#;

#[async_trait]
impl RoadmapRepository for PgStore {
    async fn list(&self, status: Option<RoadmapStatus>) -> DbResult<Vec<RoadmapItem>> {
        let query = format!(
            r#"
            SELECT {} FROM roadmap_items
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY priority ASC, created_at DESC
            "#,
            ROADMAP_COLUMNS
        );
        Ok(sqlx::query_as::<_, RoadmapItem>(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn status_counts(&self) -> DbResult<Vec<(RoadmapStatus, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM roadmap_items GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| RoadmapStatus::parse(&status).map(|s| (s, count)))
            .collect())
    }

    async fn create(&self, input: NewRoadmapItem) -> DbResult<RoadmapItem> {
        let completed_at = (input.status == RoadmapStatus::Completed).then(Utc::now);
        let query = format!(
            r#"
            INSERT INTO roadmap_items
                (id, title, description, status, category, priority, target_date, completed_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ROADMAP_COLUMNS
        );
        Ok(sqlx::query_as::<_, RoadmapItem>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(&input.category)
            .bind(input.priority)
            .bind(input.target_date)
            .bind(completed_at)
            .bind(&input.created_by)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, changes: &RoadmapChanges) -> DbResult<Option<RoadmapItem>> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM roadmap_items WHERE id = $1 FOR UPDATE", ROADMAP_COLUMNS);
        let Some(mut item) = sqlx::query_as::<_, RoadmapItem>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut item, Utc::now());

        // votes is only written by increment_votes
        let query = format!(
            r#"
            UPDATE roadmap_items
            SET title = $2, description = $3, status = $4, category = $5,
                priority = $6, target_date = $7, completed_at = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            ROADMAP_COLUMNS
        );
        let updated = sqlx::query_as::<_, RoadmapItem>(&query)
            .bind(id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.status.as_str())
            .bind(&item.category)
            .bind(item.priority)
            .bind(item.target_date)
            .bind(item.completed_at)
            .bind(item.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM roadmap_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM roadmap_items")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn increment_votes(&self, id: Uuid) -> DbResult<Option<RoadmapItem>> {
        let query = format!(
            "UPDATE roadmap_items SET votes = votes + 1 WHERE id = $1 RETURNING {}",
            ROADMAP_COLUMNS
        );
        Ok(sqlx::query_as::<_, RoadmapItem>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
