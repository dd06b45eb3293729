//! Per-entity row pipeline
//!
//! Implement this trait for any entity that can be bulk imported (facilities,
//! vendors, assets, etc.). The engine calls the operations strictly in order
//! for each row and never reorders or batches them.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use super::types::FieldError;

/// Validation, duplicate detection, conversion and persistence for one entity type
#[async_trait]
pub trait RowPipeline: Send + Sync + 'static {
    /// One parsed spreadsheet row. Serialized to build the row snapshot.
    type Row: Serialize + Send + Sync + 'static;

    /// The record written by `persist`
    type Entity: Send + 'static;

    /// Entity name used in logs and download file names
    ///
    /// E.g., "facilities", "vendors"
    fn entity(&self) -> &str;

    /// Check the row's structure and field formats
    ///
    /// # Arguments
    /// * `row` - The parsed row
    /// * `row_number` - Spreadsheet line of the row (the first data row is 2)
    ///
    /// # Returns
    /// Every field problem found; empty when the row is structurally valid
    fn validate(&self, row: &Self::Row, row_number: usize) -> Vec<FieldError>;

    /// Whether the row matches a record that is already committed
    ///
    /// Only committed state is consulted, never other rows of the same batch.
    /// An error here is an engine-level fault and aborts the job.
    async fn is_duplicate(&self, row: &Self::Row) -> Result<bool>;

    /// Build the entity, resolving references to other committed records
    ///
    /// Must fail rather than return a partially resolved entity.
    async fn convert(&self, row: &Self::Row) -> Result<Self::Entity>;

    /// Commit one entity. Each row is committed independently.
    async fn persist(&self, entity: Self::Entity) -> Result<()>;
}
