//! Facility import pipeline

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::error_helpers::write_error;
use crate::features::shared::validation::{
    present, validate_code, validate_country_code, validate_text, RowValidator,
};
use crate::import::{Column, ColumnSchema, FieldError, RowPipeline};

pub const SCHEMA: ColumnSchema = ColumnSchema {
    entity: "facilities",
    columns: &[
        Column::required("code"),
        Column::required("name"),
        Column::optional("address"),
        Column::optional("city"),
        Column::optional("country"),
    ],
};

pub const CODE_MAX_LENGTH: usize = 32;

/// One facility row of an upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityRow {
    pub code: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFacility {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

pub struct FacilityPipeline {
    pool: PgPool,
}

impl FacilityPipeline {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RowPipeline for FacilityPipeline {
    type Row = FacilityRow;
    type Entity = NewFacility;

    fn entity(&self) -> &str {
        SCHEMA.entity
    }

    fn validate(&self, row: &FacilityRow, row_number: usize) -> Vec<FieldError> {
        let mut validator = RowValidator::new(row_number);
        validator.require_columns(&SCHEMA, row);

        if let Some(code) = present(&row.code) {
            validator.check("code", code, validate_code(code, CODE_MAX_LENGTH));
        }
        if let Some(name) = present(&row.name) {
            validator.check("name", name, validate_text(name, 255));
        }
        if let Some(address) = present(&row.address) {
            validator.check("address", address, validate_text(address, 500));
        }
        if let Some(city) = present(&row.city) {
            validator.check("city", city, validate_text(city, 100));
        }
        if let Some(country) = present(&row.country) {
            validator.check("country", country, validate_country_code(country));
        }

        validator.finish()
    }

    async fn is_duplicate(&self, row: &FacilityRow) -> Result<bool> {
        let code = present(&row.code).context("code is required")?;

        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM facilities WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check for an existing facility")
    }

    async fn convert(&self, row: &FacilityRow) -> Result<NewFacility> {
        Ok(NewFacility {
            code: present(&row.code).context("code is required")?.to_string(),
            name: present(&row.name).context("name is required")?.to_string(),
            address: present(&row.address).map(str::to_string),
            city: present(&row.city).map(str::to_string),
            country: present(&row.country).map(str::to_uppercase),
        })
    }

    #[tracing::instrument(skip(self, facility), fields(code = %facility.code))]
    async fn persist(&self, facility: NewFacility) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO facilities (id, code, name, address, city, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&facility.code)
        .bind(&facility.name)
        .bind(&facility.address)
        .bind(&facility.city)
        .bind(&facility.country)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Facility", &facility.code))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn pipeline() -> FacilityPipeline {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/fams_test")
            .unwrap();
        FacilityPipeline::new(pool)
    }

    fn row(code: &str, name: &str) -> FacilityRow {
        FacilityRow {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_valid_row() {
        let mut row = row("HQ-01", "Head office");
        row.country = Some("fr".to_string());
        assert!(pipeline().validate(&row, 2).is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_fields() {
        let errors = pipeline().validate(&FacilityRow::default(), 3);
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field_name.as_deref()).collect();
        assert_eq!(fields, vec!["code", "name"]);
    }

    #[tokio::test]
    async fn test_invalid_formats() {
        let mut row = row("HQ 01", "Head office");
        row.country = Some("France".to_string());
        let errors = pipeline().validate(&row, 2);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field_name.as_deref(), Some("code"));
        assert_eq!(errors[1].message, "country must be a two-letter country code");
        assert_eq!(errors[1].rejected_value.as_deref(), Some("France"));
    }

    #[tokio::test]
    async fn test_convert_normalizes_values() {
        let mut row = row(" HQ-01 ", "Head office");
        row.country = Some("fr".to_string());
        row.city = Some("  ".to_string());

        let facility = pipeline().convert(&row).await.unwrap();
        assert_eq!(facility.code, "HQ-01");
        assert_eq!(facility.country.as_deref(), Some("FR"));
        assert_eq!(facility.city, None);
    }

    #[test]
    fn test_schema_columns() {
        let required: Vec<_> = SCHEMA.required_columns().map(|c| c.name).collect();
        assert_eq!(required, vec!["code", "name"]);
    }
}
