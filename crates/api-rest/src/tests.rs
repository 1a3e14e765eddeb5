use crate::{router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use quackhub_core::{
    AnalysisService, ArchiveError, FileResponseArchive, ModelClient, ModelError, QueryStore,
    RecordId, RecordsService, ResponseArchive, ResponseDocument, SqliteQueryStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct CannedModel(Option<&'static str>);

#[async_trait]
impl ModelClient for CannedModel {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        self.0.map(str::to_string).ok_or(ModelError::Status {
            status: 500,
            body: "upstream unavailable".into(),
        })
    }
}

struct ReadOnlyArchive;

impl ResponseArchive for ReadOnlyArchive {
    fn insert(&self, _document: &ResponseDocument) -> Result<(), ArchiveError> {
        Err(ArchiveError::FileWrite(std::io::Error::other(
            "archive is read-only",
        )))
    }

    fn find_by_query(&self, _query_id: &RecordId) -> Result<Option<ResponseDocument>, ArchiveError> {
        Ok(None)
    }

    fn count(&self) -> Result<u64, ArchiveError> {
        Ok(0)
    }
}

struct TestApp {
    _temp: TempDir,
    queries: Arc<SqliteQueryStore>,
    app: Router,
}

impl TestApp {
    fn new(model: CannedModel) -> Self {
        let temp = TempDir::new().unwrap();
        let archive = Arc::new(FileResponseArchive::new(temp.path().join("responses")));
        Self::with_archive(temp, archive, model)
    }

    fn with_archive(temp: TempDir, archive: Arc<dyn ResponseArchive>, model: CannedModel) -> Self {
        let queries = Arc::new(SqliteQueryStore::open_in_memory().unwrap());
        let state = AppState {
            analysis: Arc::new(AnalysisService::new(
                queries.clone(),
                archive.clone(),
                Arc::new(model),
            )),
            records: Arc::new(RecordsService::new(queries.clone(), archive)),
        };

        Self {
            _temp: temp,
            queries,
            app: router(state),
        }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_analyze(&self, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

fn is_clock_time(s: &str) -> bool {
    // HH:MM:SS AM
    let bytes = s.as_bytes();
    s.len() == 11
        && bytes[2] == b':'
        && bytes[5] == b':'
        && (s.ends_with(" AM") || s.ends_with(" PM"))
}

#[tokio::test]
async fn health_is_alive() {
    let app = TestApp::new(CannedModel(Some("unused")));
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn analyze_returns_diagnosis_and_emergency_flag() {
    let app = TestApp::new(CannedModel(Some("Likely muscle strain.")));

    let (status, body) = app
        .post_analyze(json!({"symptoms": "chest pain", "severity": 5}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["diagnosis"], json!("Likely muscle strain."));
    assert_eq!(body["is_emergency"], json!(true));
    assert!(RecordId::parse(body["query_id"].as_str().unwrap()).is_ok());
    assert!(is_clock_time(body["timestamp"].as_str().unwrap()));
}

#[tokio::test]
async fn analyze_accepts_loosely_typed_fields() {
    let app = TestApp::new(CannedModel(Some("Rest.")));

    let (status, body) = app
        .post_analyze(json!({
            "symptoms": "itchy eyes",
            "age": "27",
            "weight": "150.5",
            "height": 70,
            "severity": "not-a-number",
            "sex": ["unexpected"]
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_emergency"], json!(false));

    let id = RecordId::parse(body["query_id"].as_str().unwrap()).unwrap();
    let record = app.queries.get(&id).unwrap().unwrap();
    assert_eq!(record.age, Some(27));
    assert_eq!(record.weight, Some(150.5));
    assert_eq!(record.height, Some(70.0));
    assert_eq!(record.severity, None);
    assert_eq!(record.sex, None);
}

#[tokio::test]
async fn empty_symptoms_are_rejected_without_mutation() {
    let app = TestApp::new(CannedModel(Some("unused")));

    for body in [json!({"symptoms": ""}), json!({"symptoms": "  \n"}), json!({})] {
        let (status, res) = app.post_analyze(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res, json!({"error": "Please enter symptoms"}));
    }

    assert_eq!(app.queries.count().unwrap(), 0);
}

#[tokio::test]
async fn model_failure_is_a_500_and_leaves_an_unflagged_record() {
    let app = TestApp::new(CannedModel(None));

    let (status, body) = app
        .post_analyze(json!({"symptoms": "difficulty breathing"}))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("upstream unavailable"));

    let records = app.queries.recent(10).unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_emergency);

    let (status, _) = app.get(&format!("/response/{}", records[0].id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_failure_keeps_the_flagged_record_visible_in_history() {
    let temp = TempDir::new().unwrap();
    let app = TestApp::with_archive(
        temp,
        Arc::new(ReadOnlyArchive),
        CannedModel(Some("This is urgent.")),
    );

    let (status, body) = app.post_analyze(json!({"symptoms": "headache"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("read-only"));

    let (status, history) = app.get("/history").await;
    assert_eq!(status, StatusCode::OK);
    let entries = history["history"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["is_emergency"], json!(true));

    let id = entries[0]["id"].as_str().unwrap();
    let (status, body) = app.get(&format!("/response/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Response not found"}));
}

#[tokio::test]
async fn history_lists_newest_ten() {
    let app = TestApp::new(CannedModel(Some("Fine.")));

    for n in 0..12 {
        let (status, _) = app
            .post_analyze(json!({"symptoms": format!("symptom {n}"), "age": 40, "severity": 2}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get("/history").await;
    assert_eq!(status, StatusCode::OK);

    let entries = body["history"].as_array().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0]["symptoms"], json!("symptom 11"));
    assert_eq!(entries[0]["age"], json!(40));
    assert_eq!(entries[0]["severity"], json!(2));
    assert_eq!(entries[0]["is_emergency"], json!(false));
    assert_eq!(entries[0]["timestamp"].as_str().unwrap().len(), 19);
}

#[tokio::test]
async fn response_lookup_returns_the_archived_document() {
    let app = TestApp::new(CannedModel(Some("Possible sinusitis.")));

    let (_, body) = app
        .post_analyze(json!({"symptoms": "facial pressure", "age": 52, "sex": "male", "severity": 4}))
        .await;
    let query_id = body["query_id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/response/{}", query_id)).await;
    assert_eq!(status, StatusCode::OK);

    let doc = &body["response"];
    assert_eq!(doc["query_id"], json!(query_id));
    assert_eq!(doc["symptoms"], json!("facial pressure"));
    assert_eq!(doc["ai_response"], json!("Possible sinusitis."));
    assert_eq!(doc["is_emergency"], json!(false));
    assert_eq!(
        doc["user_info"],
        json!({"age": 52, "sex": "male", "severity": 4})
    );
    assert_ne!(doc["document_id"], doc["query_id"]);
}

#[tokio::test]
async fn malformed_response_ids_are_not_found() {
    let app = TestApp::new(CannedModel(Some("unused")));

    for id in ["42", "not-a-uuid", "550E8400E29B41D4A716446655440000"] {
        let (status, body) = app.get(&format!("/response/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Response not found"}));
    }
}

#[tokio::test]
async fn stats_count_both_stores_and_preview_symptoms() {
    let temp = TempDir::new().unwrap();
    let archive = Arc::new(FileResponseArchive::new(temp.path().join("responses")));
    let app = TestApp::with_archive(temp, archive, CannedModel(Some("Noted.")));

    let long = "a".repeat(80);
    app.post_analyze(json!({"symptoms": long, "severity": 9})).await;
    app.post_analyze(json!({"symptoms": "sore knee", "severity": 1})).await;

    let (status, body) = app.get("/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_queries"], json!(2));
    assert_eq!(body["emergency_cases"], json!(1));
    assert_eq!(body["mongo_responses"], json!(2));

    let recent = body["recent_queries"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["symptoms"], json!("sore knee"));
    assert_eq!(recent[1]["symptoms"].as_str().unwrap().len(), 50);
    assert_eq!(recent[1]["severity"], json!(9));
    assert_eq!(recent[1]["timestamp"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn openapi_document_lists_every_route() {
    let app = TestApp::new(CannedModel(Some("unused")));
    let (status, doc) = app.get("/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/health", "/analyze", "/history", "/response/{query_id}", "/stats"] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
}

#[tokio::test]
async fn swagger_ui_is_served() {
    let app = TestApp::new(CannedModel(Some("unused")));

    let (status, _) = app.get("/swagger-ui/").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/swagger-ui").await;
    assert!(status.is_redirection() || status == StatusCode::OK);
}

#[tokio::test]
async fn numeric_text_severity_at_threshold_flags_emergency() {
    let app = TestApp::new(CannedModel(Some("Probably a tension headache.")));

    for severity in ["9", "9.0", "8.5", "1e1"] {
        let (status, body) = app
            .post_analyze(json!({"symptoms": "headache", "severity": severity}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_emergency"], json!(true), "severity {severity:?}");
    }

    let (_, body) = app
        .post_analyze(json!({"symptoms": "headache", "severity": "7.9"}))
        .await;
    assert_eq!(body["is_emergency"], json!(false));

    let id = RecordId::parse(body["query_id"].as_str().unwrap()).unwrap();
    assert_eq!(app.queries.get(&id).unwrap().unwrap().severity, Some(7));
}
