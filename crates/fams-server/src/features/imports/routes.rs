use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::response::ErrorResponse;
use crate::api::sse::progress_stream;
use crate::config::ImportConfig;
use crate::import::{
    read_rows, render_error_report, render_template, spawn_import, ColumnSchema, FieldError,
    ReportError, RowPipeline, SheetError,
};
use crate::middleware::IMPORT_JOB_HEADER;

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// State of one entity's import routes
pub struct ImportState<P> {
    pub pipeline: Arc<P>,
    pub schema: &'static ColumnSchema,
    pub config: ImportConfig,
}

impl<P> ImportState<P> {
    pub fn new(pipeline: P, schema: &'static ColumnSchema, config: ImportConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            schema,
            config,
        }
    }
}

impl<P> Clone for ImportState<P> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            schema: self.schema,
            config: self.config.clone(),
        }
    }
}

/// Body of an error report request: a terminal progress snapshot
///
/// Only `errors` is read; the other snapshot fields are accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorReportRequest {
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

pub fn import_routes<P>(state: ImportState<P>) -> Router
where
    P: RowPipeline,
    P::Row: DeserializeOwned,
{
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/import", post(upload_rows::<P>))
        .route("/import/error-report", post(error_report::<P>))
        .route("/import/template", get(template::<P>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[tracing::instrument(skip_all, fields(entity = state.schema.entity))]
async fn upload_rows<P>(
    State(state): State<ImportState<P>>,
    mut multipart: Multipart,
) -> Result<Response, ImportApiError>
where
    P: RowPipeline,
    P::Row: DeserializeOwned,
{
    let content = read_file_field(&mut multipart).await?;
    let rows: Vec<P::Row> = read_rows(&content, state.schema)?;

    let handle = spawn_import(Arc::clone(&state.pipeline), rows, &state.config);
    tracing::info!(job_id = %handle.job_id, size = content.len(), "Import accepted");

    let mut response = progress_stream(handle.receiver).into_response();
    if let Ok(value) = HeaderValue::from_str(&handle.job_id.to_string()) {
        response.headers_mut().insert(IMPORT_JOB_HEADER, value);
    }
    Ok(response)
}

#[tracing::instrument(skip_all, fields(entity = state.schema.entity, errors = request.errors.len()))]
async fn error_report<P>(
    State(state): State<ImportState<P>>,
    Json(request): Json<ErrorReportRequest>,
) -> Result<Response, ImportApiError>
where
    P: RowPipeline,
{
    let content = render_error_report(&request.errors, state.schema)?;
    Ok(csv_attachment(
        format!("{}-error-report.csv", state.schema.entity),
        content,
    ))
}

async fn template<P>(State(state): State<ImportState<P>>) -> Result<Response, ImportApiError>
where
    P: RowPipeline,
{
    let content = render_template(state.schema)?;
    Ok(csv_attachment(
        format!("{}-template.csv", state.schema.entity),
        content,
    ))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, ImportApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ImportApiError::from_multipart)?
    {
        if field.name() == Some(FILE_FIELD) {
            let data = field.bytes().await.map_err(ImportApiError::from_multipart)?;
            return Ok(data.to_vec());
        }
    }
    Err(ImportApiError::MissingFile)
}

fn csv_attachment(filename: String, content: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response()
}

#[derive(Debug, thiserror::Error)]
pub enum ImportApiError {
    #[error("No '{}' field found in multipart data", FILE_FIELD)]
    MissingFile,
    #[error("Failed to read upload: {message}")]
    Multipart { status: StatusCode, message: String },
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl ImportApiError {
    fn from_multipart(error: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart {
            status: error.status(),
            message: error.body_text(),
        }
    }
}

impl IntoResponse for ImportApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ImportApiError::MissingFile => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("MISSING_FILE", self.to_string()),
            ),
            ImportApiError::Multipart { status, .. } => {
                (*status, ErrorResponse::new("INVALID_UPLOAD", self.to_string()))
            },
            ImportApiError::Sheet(SheetError::MissingColumns(columns)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("MISSING_COLUMNS", self.to_string())
                    .with_details(json!({ "columns": columns })),
            ),
            ImportApiError::Sheet(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("INVALID_FILE", self.to_string()),
            ),
            ImportApiError::Report(e) => {
                tracing::error!("Failed to render CSV: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("REPORT_ERROR", "Failed to render the CSV file"),
                )
            },
        };

        (status, Json(error)).into_response()
    }
}
