use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::pagination::{Paginated, PaginationParams};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssetListItem {
    pub id: Uuid,
    pub asset_tag: String,
    pub name: String,
    pub facility_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    /// Decimal rendered as text to keep its exact value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_cost: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: &PgPool,
    params: &PaginationParams,
) -> Result<Paginated<AssetListItem>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, AssetListItem>(
        r#"
        SELECT a.id, a.asset_tag, a.name, f.code AS facility_code, v.tax_id AS vendor_tax_id,
               a.purchase_date, a.purchase_cost::TEXT AS purchase_cost, a.created_at
        FROM assets a
        JOIN facilities f ON f.id = a.facility_id
        LEFT JOIN vendors v ON v.id = a.vendor_id
        ORDER BY a.asset_tag
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
