//! REST routes.
//!
//! | Method | Path                   | Operation |
//! |--------|------------------------|-----------|
//! | GET    | `/health`              | liveness  |
//! | POST   | `/upload`              | upload (multipart field `file`) |
//! | GET    | `/files`               | list      |
//! | GET    | `/download/{filename}` | download  |
//! | DELETE | `/files/{filename}`    | delete    |

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tokio_util::io::ReaderStream;

use super::{AppError, AppState};
use crate::commands::{self, DeleteResponse, FileList, HealthStatus, UploadResponse};
use crate::storage::ArtifactBackend;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

// ─── Health ──────────────────────────────────────────────

/// GET /health
async fn health() -> Json<HealthStatus> {
    Json(commands::health())
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

// ─── Files ───────────────────────────────────────────────

/// POST /upload
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("file part has no filename".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await?;

        let response = tokio::task::spawn_blocking(move || {
            commands::upload(
                state.store.as_ref(),
                &filename,
                &content,
                content_type.as_deref(),
            )
        })
        .await??;

        return Ok(Json(response));
    }

    Err(AppError::BadRequest(format!(
        "missing multipart field '{FILE_FIELD}'"
    )))
}

/// GET /files
async fn list_files(State(state): State<AppState>) -> Result<Json<FileList>, AppError> {
    let list = tokio::task::spawn_blocking(move || commands::list(state.store.as_ref())).await??;
    Ok(Json(list))
}

/// GET /download/{filename}
async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let lookup = filename.clone();
    let path = tokio::task::spawn_blocking(move || state.store.locate(&lookup)).await??;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| AppError::Internal(format!("{}: {e}", path.display())))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| AppError::Internal(format!("{}: {e}", path.display())))?
        .len();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&filename)?);

    tracing::info!(filename = %filename, size, "download");
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// DELETE /files/{filename}
async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let response =
        tokio::task::spawn_blocking(move || commands::delete(state.store.as_ref(), &filename))
            .await??;
    Ok(Json(response))
}

/// `attachment; filename="..."` with quotes and backslashes escaped.
fn content_disposition(filename: &str) -> Result<HeaderValue, AppError> {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .map_err(|e| AppError::Internal(format!("bad filename header: {e}")))
}

pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/files", get(list_files))
        .route("/files/{filename}", delete(delete_file))
        .route("/download/{filename}", get(download))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::server::build_app;
    use crate::storage::local::LocalArtifactStore;

    const BOUNDARY: &str = "artifact-store-test-boundary";

    /// Helper: app over a fresh store in a temp dir.
    fn test_app() -> (TempDir, Router) {
        let temp = TempDir::new().unwrap();
        let store = LocalArtifactStore::open(temp.path().join("storage")).unwrap();
        let app = build_app(AppState::new(store), 1024 * 1024);
        (temp, app)
    }

    fn multipart_body(field: &str, filename: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }

    fn upload_request(field: &str, filename: &str, content: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, filename, content)))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(resp).await).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (_temp, app) = test_app();
        let resp = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");
    }

    #[tokio::test]
    async fn upload_returns_receipt() {
        let (_temp, app) = test_app();
        let resp = app
            .oneshot(upload_request("file", "a.txt", "hello"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "File uploaded successfully");
        assert_eq!(json["filename"], "a.txt");
        assert_eq!(json["size"], 5);
        assert!(json["storage_path"].as_str().unwrap().ends_with("/a.txt"));
    }

    #[tokio::test]
    async fn upload_without_file_field_is_400() {
        let (_temp, app) = test_app();
        let resp = app
            .oneshot(upload_request("other", "a.txt", "hello"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_of_reserved_name_is_400() {
        let (_temp, app) = test_app();
        let resp = app
            .oneshot(upload_request("file", "metadata.json", "{}"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_list_download_delete_round_trip() {
        let (_temp, app) = test_app();

        let resp = app
            .clone()
            .oneshot(upload_request("file", "a.txt", "hello"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.clone().oneshot(get("/files")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["filename"], "a.txt");
        assert_eq!(files[0]["metadata"]["size"], 5);
        assert_eq!(files[0]["metadata"]["content_type"], "text/plain");

        let resp = app.clone().oneshot(get("/download/a.txt")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"a.txt\""
        );
        assert_eq!(body_bytes(resp).await, b"hello");

        let resp = app.clone().oneshot(delete("/files/a.txt")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "File deleted successfully");
        assert_eq!(json["filename"], "a.txt");

        let resp = app.clone().oneshot(get("/download/a.txt")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["detail"], "File not found");

        let resp = app.oneshot(get("/files")).await.unwrap();
        assert!(body_json(resp).await["files"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_404() {
        let (_temp, app) = test_app();
        let resp = app.oneshot(delete("/files/ghost.bin")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_survives_corrupt_sidecar() {
        let (temp, app) = test_app();
        let bucket = temp.path().join("storage/2024/03");
        fs::create_dir_all(&bucket).unwrap();
        fs::write(bucket.join("a.txt"), b"hello").unwrap();
        fs::write(bucket.join("metadata.json"), "{broken").unwrap();

        let resp = app.oneshot(get("/files")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_json(resp).await["files"].as_array().unwrap().is_empty());
    }

    #[test]
    fn content_disposition_escapes_quotes() {
        let value = content_disposition("say \"hi\".txt").unwrap();
        assert_eq!(value, "attachment; filename=\"say \\\"hi\\\".txt\"");
    }
}
