//! Common test utilities for FAMS server integration tests
//!
//! - [`CatalogPipeline`]: an in-memory pipeline for driving the import engine
//!   without a database
//! - [`TestPostgres`]: a PostgreSQL container with migrations applied, for the
//!   entity pipelines (requires Docker)
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestPostgres;
//!
//! #[tokio::test]
//! async fn test_with_postgres() {
//!     let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
//!     sqlx::query("SELECT 1").execute(pg.pool()).await.expect("Query failed");
//! }
//! ```

#![allow(dead_code)]

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

use fams_server::config::ImportConfig;
use fams_server::features::shared::validation::{present, validate_code, RowValidator};
use fams_server::import::{
    progress_channel, run_import, Column, ColumnSchema, FieldError, ProgressEvent,
    ProgressPublisher, ProgressSnapshot, RowPipeline,
};

// ============================================================================
// In-memory pipeline
// ============================================================================

pub const CATALOG_SCHEMA: ColumnSchema = ColumnSchema {
    entity: "catalog_items",
    columns: &[
        Column::required("code"),
        Column::required("name"),
        Column::optional("category"),
    ],
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRow {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ItemRow {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            category: None,
        }
    }

    pub fn in_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

/// Item rows with codes `ITEM-001`, `ITEM-002`, ...
pub fn valid_rows(count: usize) -> Vec<ItemRow> {
    (1..=count)
        .map(|i| ItemRow::new(&format!("ITEM-{:03}", i), &format!("Item {}", i)))
        .collect()
}

/// Pipeline over in-memory state
///
/// Duplicates are judged against the codes that existed before the batch,
/// so two copies of a new code within one upload both persist.
pub struct CatalogPipeline {
    existing: HashSet<String>,
    categories: HashSet<String>,
    unreachable_code: Option<String>,
    persisted: Mutex<Vec<String>>,
}

impl CatalogPipeline {
    pub fn new() -> Self {
        Self {
            existing: HashSet::new(),
            categories: ["tools", "vehicles"].iter().map(|c| c.to_string()).collect(),
            unreachable_code: None,
            persisted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_existing(mut self, codes: &[&str]) -> Self {
        self.existing.extend(codes.iter().map(|c| c.to_string()));
        self
    }

    /// The duplicate check fails outright for this code, as if the store went away
    pub fn with_unreachable_store_at(mut self, code: &str) -> Self {
        self.unreachable_code = Some(code.to_string());
        self
    }

    pub fn persisted(&self) -> Vec<String> {
        self.persisted.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RowPipeline for CatalogPipeline {
    type Row = ItemRow;
    type Entity = (String, String);

    fn entity(&self) -> &str {
        CATALOG_SCHEMA.entity
    }

    fn validate(&self, row: &ItemRow, row_number: usize) -> Vec<FieldError> {
        let mut validator = RowValidator::new(row_number);
        validator.require_columns(&CATALOG_SCHEMA, row);
        if let Some(code) = present(&row.code) {
            validator.check("code", code, validate_code(code, 16));
        }
        validator.finish()
    }

    async fn is_duplicate(&self, row: &ItemRow) -> Result<bool> {
        let code = present(&row.code).context("code is required")?;
        if self.unreachable_code.as_deref() == Some(code) {
            bail!("connection reset by peer");
        }
        Ok(self.existing.contains(code))
    }

    async fn convert(&self, row: &ItemRow) -> Result<(String, String)> {
        if let Some(category) = present(&row.category) {
            if !self.categories.contains(category) {
                return Err(anyhow!("Category '{}' does not exist", category));
            }
        }
        Ok((
            present(&row.code).context("code is required")?.to_string(),
            present(&row.name).context("name is required")?.to_string(),
        ))
    }

    async fn persist(&self, (code, _name): (String, String)) -> Result<()> {
        self.persisted
            .lock()
            .map_err(|_| anyhow!("store poisoned"))?
            .push(code);
        Ok(())
    }
}

pub fn import_config(progress_interval: usize) -> ImportConfig {
    ImportConfig {
        progress_interval,
        stream_lifetime_secs: 60,
        max_upload_bytes: 1024 * 1024,
    }
}

/// Run a batch to completion and return every event the consumer saw
pub async fn run_and_collect<P: RowPipeline>(
    pipeline: &P,
    rows: Vec<P::Row>,
    progress_interval: usize,
) -> (ProgressSnapshot, Vec<ProgressEvent>) {
    let (sink, mut receiver) = progress_channel(Duration::from_secs(60));
    let terminal = run_import(pipeline, rows, ProgressPublisher::new(sink, progress_interval)).await;

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    (terminal, events)
}

pub fn snapshots(events: &[ProgressEvent]) -> Vec<&ProgressSnapshot> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Snapshot(snapshot) => Some(snapshot),
            ProgressEvent::Error(_) => None,
        })
        .collect()
}

// ============================================================================
// PostgreSQL container
// ============================================================================

/// PostgreSQL test container with a connected pool
pub struct TestPostgres {
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    /// Start a container and apply the migrations
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        // The migrations are located relative to the crate root
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

/// Initialize test logging; safe to call from every test
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,fams_server=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}
