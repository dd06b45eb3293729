use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::pagination::{Paginated, PaginationParams};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VendorListItem {
    pub id: Uuid,
    pub tax_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms_days: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: &PgPool,
    params: &PaginationParams,
) -> Result<Paginated<VendorListItem>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, VendorListItem>(
        r#"
        SELECT id, tax_id, name, email, phone, website, payment_terms_days, created_at
        FROM vendors
        ORDER BY name, tax_id
        LIMIT $1
        OFFSET $2
        "#,
    )
    .bind(params.per_page())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::from_items(items, params, total))
}
