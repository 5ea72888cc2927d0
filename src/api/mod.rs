// src/api/mod.rs
// HTTP surface: session lifecycle, uploads, questions, health

pub mod session_routes;

use crate::config::ApiConfig;
use crate::monitoring::{RequestId, RequestIdMiddleware};
use crate::session::{ChatEngine, SessionStore};
use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{
    web, App, Error, HttpMessage, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

/// State shared by every worker.
pub struct AppState {
    pub store: SessionStore,
    pub engine: ChatEngine,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: SessionStore, engine: ChatEngine, max_upload_bytes: usize) -> Self {
        Self {
            store,
            engine,
            max_upload_bytes,
        }
    }
}

/// Id assigned by [`RequestIdMiddleware`], or a fresh one when the route runs
/// without it.
pub(crate) fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| RequestId::generate().to_string())
}

pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
    request_id: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "status": "error",
        "message": message.into(),
        "request_id": request_id
    }))
}

async fn root_handler() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("✅ docchat is running (Actix Web)\n\nCreate a session with POST /sessions or try /health\n"))
}

pub async fn health_check(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "model": state.engine.provider.model_name(),
        "sessions": state.store.len(),
        "capacity": state.store.capacity(),
        "timestamp": Utc::now().to_rfc3339(),
        "request_id": request_id(&req)
    })))
}

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> Error {
    let response = error_response(err.status_code(), err.to_string(), &request_id(req));
    InternalError::from_response(err, response).into()
}

fn query_error(err: QueryPayloadError, req: &HttpRequest) -> Error {
    let response = error_response(err.status_code(), err.to_string(), &request_id(req));
    InternalError::from_response(err, response).into()
}

/// Route table, shared by the server and the integration tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/", web::get().to(root_handler))
        .route("/health", web::get().to(health_check))
        .route("/sessions", web::post().to(session_routes::create_session))
        .route("/sessions/{id}", web::get().to(session_routes::get_session))
        .route(
            "/sessions/{id}",
            web::delete().to(session_routes::delete_session),
        )
        .route(
            "/sessions/{id}/files",
            web::post().to(session_routes::upload_files),
        )
        .route(
            "/sessions/{id}/ask",
            web::post().to(session_routes::ask_question),
        );
}

pub fn start_api_server(config: &ApiConfig, state: web::Data<AppState>) -> std::io::Result<Server> {
    let bind_addr = config.bind_addr();
    info!(bind_addr = %bind_addr, model = %config.model, "Starting HTTP server");

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::AUTHORIZATION,
            ])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(RequestIdMiddleware)
            .configure(routes)
    })
    .bind(&bind_addr)?
    .run();

    Ok(server)
}
