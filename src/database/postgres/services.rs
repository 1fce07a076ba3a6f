use async_trait::async_trait;
use uuid::Uuid;

use super::{is_foreign_key_violation, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewService, Service, ServiceChanges};
use crate::database::repository::{DbResult, ServiceRepository};

const SERVICE_COLUMNS: &str =
    "id, tenant_id, name, description, duration, price, active, created_at, updated_at";

#[async_trait]
impl ServiceRepository for PgStore {
    async fn list_active(&self, tenant_id: Uuid) -> DbResult<Vec<Service>> {
        let query = format!(
            "SELECT {} FROM services WHERE tenant_id = $1 AND active = TRUE ORDER BY name ASC",
            SERVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Service>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_active(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<Service>> {
        let query = format!(
            "SELECT {} FROM services WHERE id = $1 AND tenant_id = $2 AND active = TRUE",
            SERVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, tenant_id: Uuid) -> DbResult<Vec<Service>> {
        let query = format!(
            "SELECT {} FROM services WHERE tenant_id = $1 ORDER BY name ASC, created_at ASC",
            SERVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Service>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<Service>> {
        let query = format!(
            "SELECT {} FROM services WHERE id = $1 AND tenant_id = $2",
            SERVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, input: NewService) -> DbResult<Service> {
        let query = format!(
            r#"
            INSERT INTO services (id, tenant_id, name, description, duration, price, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Service>(&query)
            .bind(Uuid::new_v4())
            .bind(input.tenant_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.duration)
            .bind(input.price)
            .bind(input.active)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: &ServiceChanges,
    ) -> DbResult<Option<Service>> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "SELECT {} FROM services WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
            SERVICE_COLUMNS
        );
        let Some(mut service) = sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut service);

        let query = format!(
            r#"
            UPDATE services
            SET name = $3, description = $4, duration = $5, price = $6, active = $7,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        );
        let updated = sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(&service.name)
            .bind(&service.description)
            .bind(service.duration)
            .bind(service.price)
            .bind(service.active)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DatabaseError::Conflict(
                        "Service has bookings. Deactivate it instead.".to_string(),
                    )
                } else {
                    e.into()
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}
