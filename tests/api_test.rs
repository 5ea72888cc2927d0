// tests/api_test.rs
// HTTP API integration tests against a mock completion provider
//
// Run with: cargo test --test api_test -- --nocapture

use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docchat::api::{routes, AppState};
use docchat::extract::CsvMode;
use docchat::memory::{CharCounter, LLMError, LLMProvider, PromptOptions, RecursiveChunker};
use docchat::monitoring::RequestIdMiddleware;
use docchat::session::{ChatEngine, SessionStore, SummarySettings, NO_DOCUMENTS_WARNING};

// ───────────────────────────────────────────────────────────────────────────
// Mock provider
// ───────────────────────────────────────────────────────────────────────────

struct MockLLM {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait::async_trait]
impl LLMProvider for MockLLM {
    async fn generate(&self, _prompt: &str) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(LLMError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            })
        } else {
            Ok("Bob is 4 years old.".to_string())
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn state(fail: bool, max_upload_bytes: usize) -> (web::Data<AppState>, Arc<MockLLM>) {
    let llm = Arc::new(MockLLM {
        calls: AtomicUsize::new(0),
        fail,
    });
    let engine = ChatEngine {
        provider: llm.clone(),
        counter: Arc::new(CharCounter),
        chunker: RecursiveChunker::with_default(),
        prompt_options: PromptOptions::default(),
        csv_mode: CsvMode::Summary,
        summary: SummarySettings {
            enabled: false,
            prefix_chars: 3000,
        },
    };
    let state = web::Data::new(AppState::new(SessionStore::new(8), engine, max_upload_bytes));
    (state, llm)
}

// ───────────────────────────────────────────────────────────────────────────
// Helpers
// ───────────────────────────────────────────────────────────────────────────

const BOUNDARY: &str = "----docchat-test-boundary";

fn multipart(files: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

const PEOPLE_CSV: &[u8] = b"name,age\nAlice,30\nBob,4\nCarol,51\n";

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(RequestIdMiddleware)
                .configure(routes),
        )
        .await
    };
}

macro_rules! create_session {
    ($app:expr) => {{
        let req = test::TestRequest::post().uri("/sessions").to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["session_id"].as_str().unwrap().to_string()
    }};
}

fn upload_request(id: &str, file_type: &str, files: &[(&str, &[u8])]) -> test::TestRequest {
    let (content_type, body) = multipart(files);
    test::TestRequest::post()
        .uri(&format!("/sessions/{id}/files?file_type={file_type}"))
        .insert_header((CONTENT_TYPE, content_type))
        .set_payload(body)
}

fn ask_request(id: &str, question: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/sessions/{id}/ask"))
        .set_json(json!({ "question": question }))
}

// ───────────────────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn test_health_reports_model_and_sessions() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    create_session!(app);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "mock-model");
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["capacity"], 8);
    assert_eq!(body["request_id"].as_str().unwrap().len(), 8);
}

#[actix_web::test]
async fn test_upload_csv_then_ask() {
    let (state, llm) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, upload_request(&id, "csv", &[("people.csv", PEOPLE_CSV)]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["chunk_count"], 1);
    assert_eq!(body["file_type"], "csv");
    assert_eq!(body["notice"]["level"], "success");
    assert_eq!(body["uploaded_files"][0], "people.csv");

    let resp = test::call_service(&app, ask_request(&id, "How old is Bob?").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["answer"], "Bob is 4 years old.");
    assert_eq!(body["used_chunks"], 1);
    assert_eq!(body["conversation"].as_array().unwrap().len(), 2);
    assert_eq!(body["conversation"][0]["role"], "user");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);

    let req = test::TestRequest::get().uri(&format!("/sessions/{id}")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["chunk_count"], 1);
    assert_eq!(body["file_type"], "csv");
    assert_eq!(body["conversation"][1]["content"], "Bob is 4 years old.");
}

#[actix_web::test]
async fn test_ask_before_upload_warns_without_calling_llm() {
    let (state, llm) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, ask_request(&id, "Anything?").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["answer"], NO_DOCUMENTS_WARNING);
    assert_eq!(body["notice"]["level"], "warning");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_reupload_resets_conversation() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    test::call_service(&app, upload_request(&id, "csv", &[("people.csv", PEOPLE_CSV)]).to_request()).await;
    test::call_service(&app, ask_request(&id, "How old is Bob?").to_request()).await;

    let resp = test::call_service(
        &app,
        upload_request(&id, "csv", &[("cities.csv", &b"city,country\nOslo,Norway\n"[..])]).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reset"], true);

    let req = test::TestRequest::get().uri(&format!("/sessions/{id}")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["conversation"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_unknown_session_is_404() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);

    let resp = test::call_service(&app, ask_request("not-a-uuid", "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let missing = uuid::Uuid::new_v4().to_string();
    let req = test::TestRequest::get().uri(&format!("/sessions/{missing}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
}

#[actix_web::test]
async fn test_delete_session() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let req = test::TestRequest::delete().uri(&format!("/sessions/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::delete().uri(&format!("/sessions/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_wrong_extension_is_400() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, upload_request(&id, "csv", &[("notes.txt", &b"hello"[..])]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains(".csv"));
}

#[actix_web::test]
async fn test_unknown_file_type_is_400() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, upload_request(&id, "docx", &[("a.docx", &b"x"[..])]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_empty_upload_is_400() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, upload_request(&id, "csv", &[]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_oversized_upload_is_413() {
    let (state, _) = state(false, 16);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, upload_request(&id, "csv", &[("people.csv", PEOPLE_CSV)]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_llm_failure_is_502_and_keeps_conversation() {
    let (state, llm) = state(true, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    test::call_service(&app, upload_request(&id, "csv", &[("people.csv", PEOPLE_CSV)]).to_request()).await;

    let resp = test::call_service(&app, ask_request(&id, "How old is Bob?").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["notice"]["level"], "error");
    assert!(body["answer"].is_null());
    assert!(body["conversation"].as_array().unwrap().is_empty());
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn test_blank_question_is_400() {
    let (state, llm) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let resp = test::call_service(&app, ask_request(&id, "   ").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_upload_pdf_then_ask() {
    let (state, llm) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let pdf: &[u8] = include_bytes!("fixtures/hello.pdf");
    let resp = test::call_service(&app, upload_request(&id, "pdf", &[("hello.pdf", pdf)]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["file_type"], "pdf");
    assert_eq!(body["chunk_count"], 1);
    assert_eq!(body["notice"]["message"], "Processed PDF into 1 chunks.");
    assert!(body["warnings"].as_array().unwrap().is_empty());

    let resp = test::call_service(&app, ask_request(&id, "What does it say?").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn test_malformed_json_gets_json_error() {
    let (state, llm) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{id}/ask"))
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap().is_empty());
    assert_eq!(body["request_id"].as_str().unwrap().len(), 8);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_missing_question_field_gets_json_error() {
    let (state, _) = state(false, 1024 * 1024);
    let app = app!(state);
    let id = create_session!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{id}/ask"))
        .set_json(json!({ "query": "wrong field" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("question"));
    assert!(body["request_id"].is_string());
}
