use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::database::models::Tenant;
use crate::database::repository::{DbResult, TenantRepository, UsageCounts};

const TENANT_COLUMNS: &str = r#"
    id, org_id, slug, name, business_name, business_description, email,
    stripe_customer_id, stripe_account_id, plan_id, integrations,
    created_at, updated_at
"#;

#[async_trait]
impl TenantRepository for PgStore {
    async fn find_by_org_id(&self, org_id: &str) -> DbResult<Option<Tenant>> {
        let query = format!("SELECT {} FROM tenants WHERE org_id = $1", TENANT_COLUMNS);
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(org_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Tenant>> {
        let query = format!("SELECT {} FROM tenants WHERE slug = $1", TENANT_COLUMNS);
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn clear_connected_account(&self, tenant_id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE tenants
            SET stripe_account_id = NULL,
                integrations = integrations - 'stripe',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn usage_counts(&self, tenant_id: Uuid, period_start: DateTime<Utc>) -> DbResult<UsageCounts> {
        let contacts = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool);
        let services = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool);
        let bookings = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE tenant_id = $1 AND created_at >= $2",
        )
        .bind(tenant_id)
        .bind(period_start)
        .fetch_one(&self.pool);

        let (contacts, services, bookings_this_period) = futures::try_join!(contacts, services, bookings)?;

        Ok(UsageCounts {
            contacts,
            services,
            bookings_this_period,
        })
    }
}
