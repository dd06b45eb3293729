//! Shared utilities and types for feature modules
//!
//! # Contents
//!
//! - **pagination**: Common pagination types and helpers
//! - **validation**: Row validation utilities for import pipelines
//! - **error_helpers**: Database error handling utilities

pub mod error_helpers;
pub mod pagination;
pub mod validation;

// Re-export commonly used types
pub use pagination::{Paginated, PaginationMetadata, PaginationParams};
pub use validation::{present, FieldValidationError, FormatRules, RowValidator};
