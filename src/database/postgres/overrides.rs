use async_trait::async_trait;
use uuid::Uuid;

use super::{is_unique_violation, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{AvailabilityOverride, NewOverride, OverrideUpdate};
use crate::database::repository::{DbResult, OverrideRepository};

const OVERRIDE_COLUMNS: &str =
    "id, tenant_id, date, type, start_time, end_time, reason, created_at, updated_at";

#[async_trait]
impl OverrideRepository for PgStore {
    async fn list(&self, tenant_id: Uuid) -> DbResult<Vec<AvailabilityOverride>> {
        let query = format!(
            "SELECT {} FROM availability_overrides WHERE tenant_id = $1 ORDER BY date ASC",
            OVERRIDE_COLUMNS
        );
        Ok(sqlx::query_as::<_, AvailabilityOverride>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<AvailabilityOverride>> {
        let query = format!(
            "SELECT {} FROM availability_overrides WHERE id = $1 AND tenant_id = $2",
            OVERRIDE_COLUMNS
        );
        Ok(sqlx::query_as::<_, AvailabilityOverride>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, input: NewOverride) -> DbResult<AvailabilityOverride> {
        let query = format!(
            r#"
            INSERT INTO availability_overrides (id, tenant_id, date, type, start_time, end_time, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            OVERRIDE_COLUMNS
        );
        sqlx::query_as::<_, AvailabilityOverride>(&query)
            .bind(Uuid::new_v4())
            .bind(input.tenant_id)
            .bind(input.date)
            .bind(input.kind.as_str())
            .bind(&input.start_time)
            .bind(&input.end_time)
            .bind(&input.reason)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Conflict("An override already exists for this date".to_string())
                } else {
                    e.into()
                }
            })
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: OverrideUpdate,
    ) -> DbResult<Option<AvailabilityOverride>> {
        let query = format!(
            r#"
            UPDATE availability_overrides
            SET type = $3, start_time = $4, end_time = $5, reason = $6, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {}
            "#,
            OVERRIDE_COLUMNS
        );
        Ok(sqlx::query_as::<_, AvailabilityOverride>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(update.kind.as_str())
            .bind(&update.start_time)
            .bind(&update.end_time)
            .bind(&update.reason)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM availability_overrides WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
