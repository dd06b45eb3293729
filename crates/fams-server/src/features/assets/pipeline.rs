//! Asset import pipeline
//!
//! Assets reference a facility (required) and a vendor (optional) by their
//! business keys. Both are resolved against committed records in `convert`,
//! so a row pointing at an unknown facility fails as a processing error
//! rather than a validation error.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::error_helpers::write_error;
use crate::features::shared::validation::{
    parse_date, present, validate_code, validate_text, FormatRules, RowValidator,
};
use crate::import::{Column, ColumnSchema, FieldError, RowPipeline};

pub const SCHEMA: ColumnSchema = ColumnSchema {
    entity: "assets",
    columns: &[
        Column::required("asset_tag"),
        Column::required("name"),
        Column::required("facility_code"),
        Column::optional("vendor_tax_id"),
        Column::optional("purchase_date"),
        Column::optional("purchase_cost"),
    ],
};

/// One asset row of an upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRow {
    pub asset_tag: Option<String>,
    pub name: Option<String>,
    pub facility_code: Option<String>,
    pub vendor_tax_id: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_cost: Option<String>,
}

/// An asset with its references resolved to record ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub asset_tag: String,
    pub name: String,
    pub facility_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    /// Decimal text, cast to NUMERIC on insert
    pub purchase_cost: Option<String>,
}

pub struct AssetPipeline {
    pool: PgPool,
    rules: FormatRules,
}

impl AssetPipeline {
    pub fn new(pool: PgPool) -> Result<Self, regex::Error> {
        Ok(Self {
            pool,
            rules: FormatRules::new()?,
        })
    }

    async fn facility_id(&self, code: &str) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM facilities WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up facility")?
            .ok_or_else(|| anyhow!("Facility '{}' does not exist", code))
    }

    async fn vendor_id(&self, tax_id: &str) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM vendors WHERE tax_id = $1")
            .bind(tax_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up vendor")?
            .ok_or_else(|| anyhow!("Vendor '{}' does not exist", tax_id))
    }
}

#[async_trait]
impl RowPipeline for AssetPipeline {
    type Row = AssetRow;
    type Entity = NewAsset;

    fn entity(&self) -> &str {
        SCHEMA.entity
    }

    fn validate(&self, row: &AssetRow, row_number: usize) -> Vec<FieldError> {
        let mut validator = RowValidator::new(row_number);
        validator.require_columns(&SCHEMA, row);

        if let Some(tag) = present(&row.asset_tag) {
            validator.check("asset_tag", tag, validate_code(tag, 64));
        }
        if let Some(name) = present(&row.name) {
            validator.check("name", name, validate_text(name, 255));
        }
        if let Some(code) = present(&row.facility_code) {
            validator.check("facility_code", code, validate_code(code, 32));
        }
        if let Some(tax_id) = present(&row.vendor_tax_id) {
            validator.check("vendor_tax_id", tax_id, validate_code(tax_id, 32));
        }
        if let Some(date) = present(&row.purchase_date) {
            validator.check("purchase_date", date, parse_date(date).map(|_| ()));
        }
        if let Some(cost) = present(&row.purchase_cost) {
            validator.check("purchase_cost", cost, self.rules.validate_amount(cost));
        }

        validator.finish()
    }

    async fn is_duplicate(&self, row: &AssetRow) -> Result<bool> {
        let tag = present(&row.asset_tag).context("asset_tag is required")?;

        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM assets WHERE asset_tag = $1)")
            .bind(tag)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check for an existing asset")
    }

    async fn convert(&self, row: &AssetRow) -> Result<NewAsset> {
        let facility_code = present(&row.facility_code).context("facility_code is required")?;
        let facility_id = self.facility_id(facility_code).await?;

        let vendor_id = match present(&row.vendor_tax_id) {
            Some(tax_id) => Some(self.vendor_id(tax_id).await?),
            None => None,
        };

        let purchase_date = present(&row.purchase_date)
            .map(parse_date)
            .transpose()
            .context("Invalid purchase_date")?;

        Ok(NewAsset {
            asset_tag: present(&row.asset_tag).context("asset_tag is required")?.to_string(),
            name: present(&row.name).context("name is required")?.to_string(),
            facility_id,
            vendor_id,
            purchase_date,
            purchase_cost: present(&row.purchase_cost).map(str::to_string),
        })
    }

    #[tracing::instrument(skip(self, asset), fields(asset_tag = %asset.asset_tag))]
    async fn persist(&self, asset: NewAsset) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, asset_tag, name, facility_id, vendor_id, purchase_date, purchase_cost)
            VALUES ($1, $2, $3, $4, $5, $6, CAST($7 AS NUMERIC(14, 2)))
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&asset.asset_tag)
        .bind(&asset.name)
        .bind(asset.facility_id)
        .bind(asset.vendor_id)
        .bind(asset.purchase_date)
        .bind(&asset.purchase_cost)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Asset", &asset.asset_tag))?;

        Ok(())
    }
}
