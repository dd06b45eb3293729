use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::pagination::{Paginated, PaginationParams};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FacilityListItem {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: &PgPool,
    params: &PaginationParams,
) -> Result<Paginated<FacilityListItem>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM facilities")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, FacilityListItem>(
        r#"
        SELECT id, code, name, address, city, country, created_at
        FROM facilities
        ORDER BY code
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
