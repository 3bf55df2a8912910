//! Filesystem handlers for authenticated share access.

use std::collections::HashMap;
use std::path::{Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{multipart::Field, multipart::MultipartError, Multipart, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinError;
use tokio_util::io::ReaderStream;

use crate::logging::token_prefix;
use crate::share::{
    build_archive, display_name, guess_mime, list_dir, resolve_within, sanitize_filename,
};
use crate::web::dto::{
    ApiResponse, ListQuery, ListingResponse, PreviewMetadataResponse, UploadResponse,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthorizedShare;
use crate::ShareError;

/// Relative path captured by a `*path` wildcard, empty when absent.
fn sub_path(params: &HashMap<String, String>) -> &str {
    params
        .get("path")
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or("")
}

/// Build a Content-Disposition header value.
///
/// Non-ASCII names get an RFC 5987 `filename*` parameter next to a sanitized
/// fallback; control characters never reach the header.
fn content_disposition(disposition: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{}; filename=\"{}\"", disposition, filename);
    }

    let fallback: String = sanitized
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let encoded = urlencoding::encode(&sanitized);

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, fallback, encoded
    )
}

fn blocking_failed(e: JoinError) -> ApiError {
    tracing::error!("Blocking task failed: {}", e);
    ApiError::internal("An internal error occurred")
}

fn multipart_failed(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Upload exceeds the maximum size");
    }
    tracing::debug!("Failed to read multipart data: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

/// Metadata of an existing regular file, NotFound otherwise.
async fn require_file(path: &FsPath) -> Result<std::fs::Metadata, ApiError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(meta),
        Ok(_) => Err(ApiError::not_found("File not found")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found("File not found"))
        }
        Err(e) => Err(ShareError::Io(e).into()),
    }
}

/// GET|POST /api/:token/list[/*path] - List a directory.
///
/// The `q` filter applies to the share root only.
pub async fn list_entries(
    AuthorizedShare(record): AuthorizedShare,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ListingResponse>>, ApiError> {
    let relative = sub_path(&params).to_string();
    let dir = resolve_within(&record.root, &relative)?;
    let filter = if relative.is_empty() { query.q } else { None };

    let items = tokio::task::spawn_blocking(move || list_dir(&dir, filter.as_deref()))
        .await
        .map_err(blocking_failed)??;

    tracing::debug!(
        token = token_prefix(&record.token),
        entries = items.len(),
        "Listed directory"
    );

    Ok(Json(ApiResponse::new(ListingResponse {
        path: relative,
        items,
    })))
}

/// POST /api/:token/upload[/*path] - Upload a file into a directory.
///
/// Request body: multipart/form-data with a "file" field. The stored name is
/// sanitized; an existing file with that name is replaced.
pub async fn upload_file(
    AuthorizedShare(record): AuthorizedShare,
    Path(params): Path<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let target_dir = resolve_within(&record.root, sub_path(&params))?;
    if !tokio::fs::metadata(&target_dir)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        return Err(ApiError::bad_request(
            "Target upload directory does not exist",
        ));
    }

    while let Some(field) = multipart.next_field().await.map_err(multipart_failed)? {
        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or("").to_string();
        if original.is_empty() {
            return Err(ApiError::bad_request("No file provided"));
        }
        let filename =
            sanitize_filename(&original).ok_or_else(|| ApiError::bad_request("Invalid filename"))?;

        let dest = resolve_within(&target_dir, &filename)?;
        if let Ok(meta) = tokio::fs::symlink_metadata(&dest).await {
            if meta.is_symlink() {
                return Err(ApiError::forbidden("path escapes the share root"));
            }
            if meta.is_dir() {
                return Err(ApiError::bad_request(
                    "A folder with that name already exists",
                ));
            }
        }

        let bytes = save_field(field, &dest).await?;
        tracing::info!(
            token = token_prefix(&record.token),
            filename = %filename,
            bytes,
            "File uploaded"
        );

        return Ok(Json(ApiResponse::new(UploadResponse { ok: true, filename })));
    }

    Err(ApiError::bad_request("No file provided"))
}

/// Stream a multipart field to `dest`, removing the partial file on failure.
async fn save_field(mut field: Field<'_>, dest: &FsPath) -> Result<u64, ApiError> {
    let save_failed = |e: std::io::Error| {
        tracing::error!("Failed to save file: {}", e);
        ApiError::internal(format!("Failed to save file: {}", e.kind()))
    };

    let mut file = tokio::fs::File::create(dest).await.map_err(save_failed)?;
    let mut written = 0u64;

    let result = async {
        while let Some(chunk) = field.chunk().await.map_err(multipart_failed)? {
            file.write_all(&chunk).await.map_err(save_failed)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(save_failed)
    }
    .await;

    if let Err(e) = result {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(dest).await {
            tracing::warn!("Failed to remove partial upload: {}", remove_err);
        }
        return Err(e);
    }
    Ok(written)
}

/// Stream a file as the response body.
async fn stream_file(
    path: &FsPath,
    meta: &std::fs::Metadata,
    disposition: &str,
) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(ShareError::Io)?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, guess_mime(path)),
            (header::CONTENT_LENGTH, meta.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(disposition, &display_name(path)),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/:token/download/*path - Download a file.
pub async fn download_file(
    AuthorizedShare(record): AuthorizedShare,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let path = resolve_within(&record.root, sub_path(&params))?;
    let meta = require_file(&path).await?;

    tracing::debug!(
        token = token_prefix(&record.token),
        bytes = meta.len(),
        "Download started"
    );
    stream_file(&path, &meta, "attachment").await
}

/// GET /api/:token/archive[/*path] - Download a folder as a zip archive.
pub async fn archive_folder(
    AuthorizedShare(record): AuthorizedShare,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let target = resolve_within(&record.root, sub_path(&params))?;
    let root: PathBuf = record.root.clone();

    let archive = tokio::task::spawn_blocking(move || build_archive(&root, &target))
        .await
        .map_err(blocking_failed)??;

    tracing::info!(
        token = token_prefix(&record.token),
        entries = archive.files,
        bytes = archive.bytes.len(),
        "Archive built"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition("attachment", &archive.file_name),
            ),
        ],
        archive.bytes,
    )
        .into_response())
}

/// GET /api/:token/preview/*path - Inline preview for images and text.
///
/// Other types get their name and MIME type as JSON.
pub async fn preview_file(
    AuthorizedShare(record): AuthorizedShare,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let path = resolve_within(&record.root, sub_path(&params))?;
    let meta = require_file(&path).await?;

    let mime = guess_mime(&path);
    if mime.starts_with("image/") || mime.starts_with("text/") {
        return stream_file(&path, &meta, "inline").await;
    }

    let name = display_name(&path);
    Ok(Json(ApiResponse::new(PreviewMetadataResponse { name, mime })).into_response())
}
