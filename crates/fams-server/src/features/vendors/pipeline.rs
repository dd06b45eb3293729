//! Vendor import pipeline

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::error_helpers::write_error;
use crate::features::shared::validation::{
    parse_bounded_int, present, validate_code, validate_text, validate_url, FormatRules,
    RowValidator,
};
use crate::import::{Column, ColumnSchema, FieldError, RowPipeline};

pub const SCHEMA: ColumnSchema = ColumnSchema {
    entity: "vendors",
    columns: &[
        Column::required("tax_id"),
        Column::required("name"),
        Column::optional("email"),
        Column::optional("phone"),
        Column::optional("website"),
        Column::optional("payment_terms_days"),
    ],
};

pub const MAX_PAYMENT_TERMS_DAYS: i64 = 365;

/// One vendor row of an upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorRow {
    pub tax_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub payment_terms_days: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVendor {
    pub tax_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub payment_terms_days: Option<i32>,
}

pub struct VendorPipeline {
    pool: PgPool,
    rules: FormatRules,
}

impl VendorPipeline {
    pub fn new(pool: PgPool) -> Result<Self, regex::Error> {
        Ok(Self {
            pool,
            rules: FormatRules::new()?,
        })
    }
}

#[async_trait]
impl RowPipeline for VendorPipeline {
    type Row = VendorRow;
    type Entity = NewVendor;

    fn entity(&self) -> &str {
        SCHEMA.entity
    }

    fn validate(&self, row: &VendorRow, row_number: usize) -> Vec<FieldError> {
        let mut validator = RowValidator::new(row_number);
        validator.require_columns(&SCHEMA, row);

        if let Some(tax_id) = present(&row.tax_id) {
            validator.check("tax_id", tax_id, validate_code(tax_id, 32));
        }
        if let Some(name) = present(&row.name) {
            validator.check("name", name, validate_text(name, 255));
        }
        if let Some(email) = present(&row.email) {
            validator.check("email", email, self.rules.validate_email(email));
        }
        if let Some(phone) = present(&row.phone) {
            validator.check("phone", phone, validate_text(phone, 32));
        }
        if let Some(website) = present(&row.website) {
            validator.check("website", website, validate_url(website));
        }
        if let Some(days) = present(&row.payment_terms_days) {
            validator.check(
                "payment_terms_days",
                days,
                parse_bounded_int(days, 0, MAX_PAYMENT_TERMS_DAYS).map(|_| ()),
            );
        }

        validator.finish()
    }

    async fn is_duplicate(&self, row: &VendorRow) -> Result<bool> {
        let tax_id = present(&row.tax_id).context("tax_id is required")?;

        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM vendors WHERE tax_id = $1)")
            .bind(tax_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check for an existing vendor")
    }

    async fn convert(&self, row: &VendorRow) -> Result<NewVendor> {
        let payment_terms_days = present(&row.payment_terms_days)
            .map(|days| parse_bounded_int(days, 0, MAX_PAYMENT_TERMS_DAYS))
            .transpose()
            .context("Invalid payment_terms_days")?
            .map(i32::try_from)
            .transpose()
            .context("Invalid payment_terms_days")?;

        Ok(NewVendor {
            tax_id: present(&row.tax_id).context("tax_id is required")?.to_string(),
            name: present(&row.name).context("name is required")?.to_string(),
            email: present(&row.email).map(str::to_lowercase),
            phone: present(&row.phone).map(str::to_string),
            website: present(&row.website).map(str::to_string),
            payment_terms_days,
        })
    }

    #[tracing::instrument(skip(self, vendor), fields(tax_id = %vendor.tax_id))]
    async fn persist(&self, vendor: NewVendor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vendors (id, tax_id, name, email, phone, website, payment_terms_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&vendor.tax_id)
        .bind(&vendor.name)
        .bind(&vendor.email)
        .bind(&vendor.phone)
        .bind(&vendor.website)
        .bind(vendor.payment_terms_days)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Vendor", &vendor.tax_id))?;

        Ok(())
    }
}
