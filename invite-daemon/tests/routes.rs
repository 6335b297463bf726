use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use invite_bitable::{BitableError, TableService};
use invite_core::{FieldNames, Record, RecordId, TableRef};
use invite_daemon::{build_router, AppState, SyncHandle};
use invite_sync::{SyncPipeline, SyncTables, WriteThrottle};
use serde_json::{json, Map, Value};
use tokio::sync::broadcast;
use tower::ServiceExt;

/// Search table with three inviters; source/target tables for sync.
#[derive(Default)]
struct FakeTables {
    broken: AtomicBool,
    source_reads: AtomicUsize,
}

impl FakeTables {
    fn search_rows() -> Vec<Record> {
        let f = FieldNames::default();
        vec![
            Record::new("r1")
                .with_field(&f.phone, "13900139000")
                .with_field(&f.name, "Bo")
                .with_field(&f.invite_code, "DEF456")
                .with_field(&f.invite_count, 2),
            Record::new("r2")
                .with_field(&f.phone, "13800138000")
                .with_field(&f.name, "Ann")
                .with_field(&f.invite_code, "ABC123")
                .with_field(&f.invite_count, "5"),
            Record::new("r3")
                .with_field(&f.phone, "13700137000")
                .with_field(&f.invite_code, "GHI789")
                .with_field(&f.invite_count, 9),
        ]
    }
}

#[async_trait]
impl TableService for FakeTables {
    async fn list_records(&self, table: &TableRef) -> Result<Vec<Record>, BitableError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(BitableError::Status {
                endpoint: format!("fake://{table}"),
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        match table.table_id.as_str() {
            "tblSearch" => Ok(Self::search_rows()),
            "tblSource" => {
                self.source_reads.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn update_record(
        &self,
        _table: &TableRef,
        _record_id: &RecordId,
        _fields: Map<String, Value>,
    ) -> Result<(), BitableError> {
        Ok(())
    }
}

struct Harness {
    app: axum::Router,
    tables: Arc<FakeTables>,
    shutdown: broadcast::Sender<()>,
    processor: tokio::task::JoinHandle<Result<(), invite_daemon::DaemonError>>,
}

fn harness(static_dir: Option<std::path::PathBuf>) -> Harness {
    let tables = Arc::new(FakeTables::default());
    let service: Arc<dyn TableService> = tables.clone();
    let pipeline = Arc::new(SyncPipeline::new(
        service.clone(),
        SyncTables {
            source: TableRef::new("appSource", "tblSource"),
            target: TableRef::new("appTarget", "tblTarget"),
        },
        FieldNames::default(),
        Arc::new(WriteThrottle::unlimited()),
    ));
    let (shutdown, _) = broadcast::channel(4);
    let (sync, processor) = SyncHandle::spawn(pipeline, &shutdown);
    let state = Arc::new(AppState {
        service,
        search_table: TableRef::new("appSearch", "tblSearch"),
        fields: FieldNames::default(),
        sync,
        static_dir,
    });
    Harness {
        app: build_router(state),
        tables,
        shutdown,
        processor,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.expect("response");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).expect("valid JSON response");
    (status, json)
}

fn search_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/feishu/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn health_check_ok() {
    let h = harness(None);
    let (status, json) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "ok" }));
}

#[tokio::test]
async fn search_finds_code_by_phone() {
    let h = harness(None);
    let (status, json) = send(&h.app, search_request(r#"{"phone":"13800138000"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "success": true, "code": "ABC123" }));
}

#[tokio::test]
async fn search_accepts_numeric_phone() {
    let h = harness(None);
    let (status, json) = send(&h.app, search_request(r#"{"phone":13800138000}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "success": true, "code": "ABC123" }));
}

#[tokio::test]
async fn search_miss_is_ok_with_message() {
    let h = harness(None);
    let (status, json) = send(&h.app, search_request(r#"{"phone":"10000000000"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], json!(false));
    assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn search_without_phone_is_bad_request() {
    let h = harness(None);
    for body in [
        r#"{}"#,
        r#"{"phone":"   "}"#,
        r#"{"phone":null}"#,
        r#"{"phone":["13800138000"]}"#,
        "not json",
    ] {
        let (status, json) = send(&h.app, search_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["message"], json!("请提供手机号"));
    }
}

#[tokio::test]
async fn search_read_failure_is_internal_error() {
    let h = harness(None);
    h.tables.broken.store(true, Ordering::SeqCst);
    let (status, json) = send(&h.app, search_request(r#"{"phone":"13800138000"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], json!(false));
    assert!(json.get("code").is_none(), "no fabricated data on failure");
}

#[tokio::test]
async fn ranking_is_sorted_and_skips_nameless_rows() {
    let h = harness(None);
    let (status, json) = send(&h.app, get("/feishu/ranking")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "success": true,
            "data": [
                { "name": "Ann", "inviteCode": "ABC123", "inviteCount": 5 },
                { "name": "Bo", "inviteCode": "DEF456", "inviteCount": 2 },
            ],
        })
    );
}

#[tokio::test]
async fn ranking_failure_returns_empty_data() {
    let h = harness(None);
    h.tables.broken.store(true, Ordering::SeqCst);
    let (status, json) = send(&h.app, get("/feishu/ranking")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], json!(false));
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn sync_trigger_returns_immediately_and_runs() {
    let h = harness(None);
    let (status, json) = send(&h.app, get("/feishu/sync-invite-counts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], json!(true));

    for _ in 0..100 {
        if h.tables.source_reads.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.tables.source_reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sync_trigger_after_shutdown_is_internal_error() {
    let h = harness(None);
    h.shutdown.send(()).expect("shutdown");
    h.processor.await.expect("join").expect("processor");

    let (status, json) = send(&h.app, get("/feishu/sync-invite-counts")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], json!(false));
}

#[tokio::test]
async fn static_dir_serves_index_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("index.html"), "<h1>invite</h1>").expect("write index");
    let h = harness(Some(dir.path().to_path_buf()));

    let resp = h.app.clone().oneshot(get("/")).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..], b"<h1>invite</h1>");
}
