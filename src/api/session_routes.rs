// src/api/session_routes.rs
// Session lifecycle, file upload and question endpoints

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{error_response, request_id, AppState};
use crate::extract::{FileKind, UploadedFile};
use crate::session::{SessionHandle, TurnOutcome};

// ============ Request Types ============

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

// ============ Upload Errors ============

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Missing file_type query parameter (pdf or csv)")]
    MissingFileType,

    #[error("Unsupported file_type: {0}")]
    UnknownFileType(String),

    #[error("Every uploaded part needs a filename")]
    MissingFilename,

    #[error("Only .{expected} files allowed, got {filename}")]
    WrongExtension {
        filename: String,
        expected: &'static str,
    },

    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("No files uploaded")]
    NoFiles,

    #[error("Malformed multipart body: {0}")]
    Multipart(String),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

fn parse_file_type(query: &UploadQuery) -> Result<FileKind, UploadError> {
    let raw = query
        .file_type
        .as_deref()
        .ok_or(UploadError::MissingFileType)?;
    raw.parse()
        .map_err(|_| UploadError::UnknownFileType(raw.to_string()))
}

/// Drain the multipart stream into memory, enforcing the declared extension
/// and the total size cap.
async fn read_files(
    payload: &mut Multipart,
    kind: FileKind,
    max_bytes: usize,
) -> Result<Vec<UploadedFile>, UploadError> {
    let mut files = Vec::new();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| UploadError::Multipart(e.to_string()))?;
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|name| name.to_string())
            .ok_or(UploadError::MissingFilename)?;

        // strip any client-side directory components
        let filename = Path::new(&filename)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&filename)
            .to_string();

        if !kind.matches_filename(&filename) {
            return Err(UploadError::WrongExtension {
                filename,
                expected: kind.extension(),
            });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| UploadError::Multipart(e.to_string()))?;
            total += data.len();
            if total > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&data);
        }

        files.push(UploadedFile::new(filename, bytes));
    }

    if files.is_empty() {
        return Err(UploadError::NoFiles);
    }
    Ok(files)
}

fn lookup(state: &AppState, raw_id: &str) -> Option<SessionHandle> {
    let id = Uuid::parse_str(raw_id).ok()?;
    state.store.get(&id)
}

fn session_not_found(raw_id: &str, request_id: &str) -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session not found: {}", raw_id),
        request_id,
    )
}

// ============ Handlers ============

pub async fn create_session(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request_id = request_id(&req);
    let (id, _) = state.store.create();
    info!(request_id = %request_id, session = %id, "Session created");

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "session_id": id,
        "request_id": request_id
    })))
}

pub async fn get_session(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request_id = request_id(&req);
    let raw_id = path.into_inner();
    let Some(handle) = lookup(&state, &raw_id) else {
        return Ok(session_not_found(&raw_id, &request_id));
    };

    let snapshot = handle.lock().await.snapshot();
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "session_id": snapshot.session_id,
        "file_type": snapshot.file_type,
        "chunk_count": snapshot.chunk_count,
        "summary": snapshot.summary,
        "conversation": snapshot.conversation,
        "created_at": snapshot.created_at.to_rfc3339(),
        "updated_at": snapshot.updated_at.to_rfc3339(),
        "request_id": request_id
    })))
}

pub async fn delete_session(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request_id = request_id(&req);
    let raw_id = path.into_inner();
    let removed = Uuid::parse_str(&raw_id)
        .map(|id| state.store.remove(&id))
        .unwrap_or(false);

    if !removed {
        return Ok(session_not_found(&raw_id, &request_id));
    }
    info!(request_id = %request_id, session = %raw_id, "Session deleted");
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Deleted session {}", raw_id),
        "request_id": request_id
    })))
}

pub async fn upload_files(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<UploadQuery>,
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request_id = request_id(&req);
    let raw_id = path.into_inner();
    let Some(handle) = lookup(&state, &raw_id) else {
        return Ok(session_not_found(&raw_id, &request_id));
    };

    let files = match parse_file_type(&query) {
        Ok(kind) => read_files(&mut payload, kind, state.max_upload_bytes)
            .await
            .map(|files| (kind, files)),
        Err(e) => Err(e),
    };
    let (kind, files) = match files {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(request_id = %request_id, session = %raw_id, error = %e, "Upload rejected");
            return Ok(error_response(e.status(), e.to_string(), &request_id));
        }
    };

    let filenames: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let outcome = {
        let mut session = handle.lock().await;
        session.process_files(kind, files, &state.engine).await
    };

    let (status, label) = if outcome.notice.is_error() {
        (StatusCode::INTERNAL_SERVER_ERROR, "error")
    } else {
        (StatusCode::OK, "success")
    };
    Ok(HttpResponse::build(status).json(json!({
        "status": label,
        "file_type": kind,
        "uploaded_files": filenames,
        "chunk_count": outcome.chunk_count,
        "reset": outcome.reset,
        "summary": outcome.summary,
        "warnings": outcome.warnings,
        "notice": outcome.notice,
        "request_id": request_id
    })))
}

pub async fn ask_question(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<AskRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request_id = request_id(&req);
    let raw_id = path.into_inner();
    let Some(handle) = lookup(&state, &raw_id) else {
        return Ok(session_not_found(&raw_id, &request_id));
    };

    let mut session = handle.lock().await;
    let outcome = session.ask(&body.question, &state.engine).await;

    let (status, label) = match &outcome {
        TurnOutcome::Answered { .. } | TurnOutcome::NoDocuments { .. } => {
            (StatusCode::OK, "success")
        }
        TurnOutcome::Rejected(_) => (StatusCode::BAD_REQUEST, "error"),
        TurnOutcome::Failed(_) => (StatusCode::BAD_GATEWAY, "error"),
    };
    let used_chunks = match &outcome {
        TurnOutcome::Answered { used_chunks, .. } => *used_chunks,
        _ => 0,
    };

    Ok(HttpResponse::build(status).json(json!({
        "status": label,
        "answer": outcome.answer(),
        "notice": outcome.notice(),
        "used_chunks": used_chunks,
        "conversation": session.conversation(),
        "request_id": request_id
    })))
}
