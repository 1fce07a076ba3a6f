use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::{is_unique_violation, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewPlan, Plan, PlanChanges};
use crate::database::repository::{DbResult, PlanRepository, DEFAULT_PLAN_REQUIRED};

const PLAN_COLUMNS: &str = r#"
    id, name, slug, description, features, price_monthly, price_yearly,
    stripe_product_id, stripe_price_id, stripe_price_id_yearly,
    max_contacts, max_bookings, max_services, sort_order, active, is_default,
    created_at, updated_at
"#;

#[async_trait]
impl PlanRepository for PgStore {
    async fn list_active(&self) -> DbResult<Vec<Plan>> {
        let query = format!(
            "SELECT {} FROM plans WHERE active = TRUE ORDER BY sort_order ASC, created_at ASC",
            PLAN_COLUMNS
        );
        Ok(sqlx::query_as::<_, Plan>(&query).fetch_all(&self.pool).await?)
    }

    async fn list_all(&self) -> DbResult<Vec<Plan>> {
        let query = format!(
            "SELECT {} FROM plans ORDER BY sort_order ASC, created_at ASC",
            PLAN_COLUMNS
        );
        Ok(sqlx::query_as::<_, Plan>(&query).fetch_all(&self.pool).await?)
    }

    async fn find(&self, id: Uuid) -> DbResult<Option<Plan>> {
        let query = format!("SELECT {} FROM plans WHERE id = $1", PLAN_COLUMNS);
        Ok(sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Plan>> {
        let query = format!("SELECT {} FROM plans WHERE slug = $1", PLAN_COLUMNS);
        Ok(sqlx::query_as::<_, Plan>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, input: NewPlan) -> DbResult<Plan> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE plans SET is_default = FALSE, updated_at = NOW() WHERE is_default = TRUE")
                .execute(&mut *tx)
                .await?;
        }

        let query = format!(
            r#"
            INSERT INTO plans (
                id, name, slug, description, features, price_monthly, price_yearly,
                stripe_product_id, stripe_price_id, stripe_price_id_yearly,
                max_contacts, max_bookings, max_services, sort_order, is_default
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM plans),
                $14
            )
            RETURNING {}
            "#,
            PLAN_COLUMNS
        );
        let plan = sqlx::query_as::<_, Plan>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(Json(&input.features))
            .bind(input.price_monthly)
            .bind(input.price_yearly)
            .bind(&input.stripe_product_id)
            .bind(&input.stripe_price_id)
            .bind(&input.stripe_price_id_yearly)
            .bind(input.max_contacts)
            .bind(input.max_bookings)
            .bind(input.max_services)
            .bind(input.is_default)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Conflict("A plan with this name already exists".to_string())
                } else {
                    e.into()
                }
            })?;

        tx.commit().await?;
        Ok(plan)
    }

    async fn reorder(&self, ordered_ids: &[Uuid]) -> DbResult<Vec<Plan>> {
        let mut tx = self.pool.begin().await?;

        for (position, id) in ordered_ids.iter().enumerate() {
            let result = sqlx::query("UPDATE plans SET sort_order = $1, updated_at = NOW() WHERE id = $2")
                .bind(position as i32)
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the earlier updates
                return Err(DatabaseError::NotFound(format!("plan {}", id)));
            }
        }

        tx.commit().await?;
        self.list_all().await
    }

    async fn update(&self, id: Uuid, changes: &PlanChanges) -> DbResult<Option<Plan>> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM plans WHERE id = $1 FOR UPDATE", PLAN_COLUMNS);
        let Some(mut plan) = sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if plan.is_default && changes.is_default == Some(false) {
            return Err(DatabaseError::Conflict(DEFAULT_PLAN_REQUIRED.to_string()));
        }

        if changes.is_default == Some(true) {
            sqlx::query("UPDATE plans SET is_default = FALSE, updated_at = NOW() WHERE is_default = TRUE AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        changes.apply(&mut plan);

        let query = format!(
            r#"
            UPDATE plans
            SET name = $2, description = $3, features = $4,
                max_contacts = $5, max_bookings = $6, max_services = $7,
                active = $8, is_default = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PLAN_COLUMNS
        );
        let updated = sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .bind(&plan.name)
            .bind(&plan.description)
            .bind(Json(&plan.features.0))
            .bind(plan.max_contacts)
            .bind(plan.max_bookings)
            .bind(plan.max_services)
            .bind(plan.active)
            .bind(plan.is_default)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn tenant_count(&self, id: Uuid) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants WHERE plan_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
