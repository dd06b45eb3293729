//! Entity pipelines against a real PostgreSQL
//!
//! These tests require Docker. Run with:
//!
//! ```bash
//! cargo test --test entity_import_tests -- --ignored --nocapture
//! ```

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use serial_test::serial;
use std::sync::Arc;
use tower::ServiceExt;

use common::{import_config, init_test_tracing, TestPostgres};
use fams_server::api::{create_router, AppState};
use fams_server::config::Config;
use fams_server::features::assets::{AssetPipeline, AssetRow};
use fams_server::features::facilities::{FacilityPipeline, FacilityRow};
use fams_server::features::vendors::{VendorPipeline, VendorRow};
use fams_server::import::{spawn_import, ErrorType, ImportStatus};

fn facility(code: &str, name: &str) -> FacilityRow {
    FacilityRow {
        code: Some(code.to_string()),
        name: Some(name.to_string()),
        country: Some("de".to_string()),
        ..Default::default()
    }
}

fn asset(tag: &str, facility_code: &str) -> AssetRow {
    AssetRow {
        asset_tag: Some(tag.to_string()),
        name: Some(format!("Asset {}", tag)),
        facility_code: Some(facility_code.to_string()),
        purchase_cost: Some("1250.50".to_string()),
        ..Default::default()
    }
}

async fn seed(pg: &TestPostgres) {
    let facilities = Arc::new(FacilityPipeline::new(pg.pool_clone()));
    let handle = spawn_import(
        facilities,
        vec![facility("HQ-01", "Headquarters"), facility("WH-02", "Warehouse")],
        &import_config(10),
    );
    let terminal = handle.task.await.expect("facility import panicked");
    assert_eq!(terminal.status, ImportStatus::Completed);

    let vendors = Arc::new(VendorPipeline::new(pg.pool_clone()).expect("vendor rules"));
    let handle = spawn_import(
        vendors,
        vec![VendorRow {
            tax_id: Some("FR40303265045".to_string()),
            name: Some("Acme Supplies".to_string()),
            ..Default::default()
        }],
        &import_config(10),
    );
    let terminal = handle.task.await.expect("vendor import panicked");
    assert_eq!(terminal.status, ImportStatus::Completed);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_asset_import_mixed_outcomes() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    seed(&pg).await;

    sqlx::query(
        "INSERT INTO assets (id, asset_tag, name, facility_id) \
         SELECT gen_random_uuid(), 'AT-900', 'Existing', id FROM facilities WHERE code = 'HQ-01'",
    )
    .execute(pg.pool())
    .await
    .expect("Failed to insert existing asset");

    let rows = vec![
        asset("AT-001", "HQ-01"),
        AssetRow {
            vendor_tax_id: Some("FR40303265045".to_string()),
            ..asset("AT-002", "WH-02")
        },
        AssetRow {
            facility_code: None,
            ..asset("AT-003", "HQ-01")
        },
        asset("AT-004", "HQ-01"),
        asset("AT-005", "NOWHERE"),
        asset("AT-900", "HQ-01"),
        asset("AT-007", "WH-02"),
        asset("AT-008", "WH-02"),
    ];

    let pipeline = Arc::new(AssetPipeline::new(pg.pool_clone()).expect("asset rules"));
    let terminal = spawn_import(pipeline, rows, &import_config(10))
        .task
        .await
        .expect("asset import panicked");

    assert_eq!(terminal.status, ImportStatus::CompletedWithErrors);
    assert_eq!(
        (
            terminal.success_count,
            terminal.failure_count,
            terminal.duplicate_count,
            terminal.skipped_count
        ),
        (5, 2, 1, 3)
    );

    let errors = terminal.errors.unwrap_or_default();
    let types: Vec<_> = errors.iter().map(|e| e.error_type).collect();
    assert_eq!(
        types,
        vec![ErrorType::Validation, ErrorType::Error, ErrorType::Duplicate]
    );
    assert_eq!(errors[1].row_number, 6);
    assert_eq!(errors[1].message, "Facility 'NOWHERE' does not exist");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
        .fetch_one(pg.pool())
        .await
        .expect("Failed to count assets");
    assert_eq!(count, 6);

    let cost: String = sqlx::query_scalar("SELECT purchase_cost::TEXT FROM assets WHERE asset_tag = 'AT-002'")
        .fetch_one(pg.pool())
        .await
        .expect("Failed to read asset");
    assert_eq!(cost, "1250.50");
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_second_copy_in_one_upload_is_a_duplicate() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");

    // Rows commit one at a time, so the second copy sees the first
    let pipeline = Arc::new(FacilityPipeline::new(pg.pool_clone()));
    let terminal = spawn_import(
        pipeline,
        vec![facility("HQ-01", "Headquarters"), facility("HQ-01", "Headquarters")],
        &import_config(10),
    )
    .task
    .await
    .expect("facility import panicked");

    assert_eq!(terminal.success_count, 1);
    assert_eq!(terminal.duplicate_count, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_upload_endpoint_streams_to_completion() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");

    let app = create_router(AppState {
        db: pg.pool_clone(),
        config: Config::default(),
    })
    .expect("router");

    let boundary = "fams-test-boundary";
    let csv = "code*,name*,address,city,country\nHQ-01,Headquarters,,Berlin,DE\nWH-02,,,,\n";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"facilities.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = boundary,
        csv = csv
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/facilities/import")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-import-job-id"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: complete"));
    assert!(text.contains("Success: 1, Failed: 1, Duplicates: 0, Skipped: 1"));

    let listed = create_router(AppState {
        db: pg.pool_clone(),
        config: Config::default(),
    })
    .expect("router")
    .oneshot(
        Request::builder()
            .uri("/api/v1/facilities?page=1&per_page=10")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);

    let bytes = to_bytes(listed.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["data"][0]["code"], "HQ-01");
    assert_eq!(json["data"][0]["country"], "DE");
}
