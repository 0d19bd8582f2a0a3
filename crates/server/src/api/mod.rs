use std::{path::Path as FsPath, sync::Arc};

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::SubtitleFormat,
    error::ApiError,
    protocol::{ProcessResponse, DEFAULT_WHISPER_MODEL, FORMAT_FIELD, MODEL_FIELD, VIDEO_FIELD},
};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::{
    app_state::AppState,
    pipeline::{run_pipeline, ProcessJob},
};

const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "webm"];

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/process", post(process_video))
        .route("/download/:filename", get(download_file))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Decomposes accented letters to their ASCII base, then keeps ASCII
/// letters, digits, `.`, `_` and `-`; whitespace and path separators become
/// `_`. Leading and trailing dots and underscores are stripped, so the result
/// never walks out of its directory.
pub(crate) fn secure_filename(raw: &str) -> String {
    let spaced: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

pub(crate) fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(message)))
}

fn unexpected(error: impl std::fmt::Display) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(format!("Unexpected error: {error}"))),
    )
}

fn multipart_rejection(error: MultipartError) -> (StatusCode, Json<ApiError>) {
    (error.status(), Json(ApiError::new(error.body_text())))
}

struct SavedUpload {
    path: std::path::PathBuf,
    filename: String,
}

async fn process_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessResponse>> {
    let mut upload: Option<SavedUpload> = None;
    let mut format = SubtitleFormat::default();
    let mut model = DEFAULT_WHISPER_MODEL.to_string();

    let read = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(VIDEO_FIELD) if upload.is_none() => {
                    upload = Some(save_upload(&state.dirs.upload_dir, field).await?);
                }
                Some(FORMAT_FIELD) => {
                    let value = field.text().await.map_err(multipart_rejection)?;
                    format = SubtitleFormat::from_form_value(&value);
                }
                Some(MODEL_FIELD) => {
                    let value = field.text().await.map_err(multipart_rejection)?;
                    if !value.trim().is_empty() {
                        model = value.trim().to_string();
                    }
                }
                _ => {}
            }
        }
        Ok::<_, (StatusCode, Json<ApiError>)>(())
    };
    if let Err(rejection) = read.await {
        if let Some(saved) = &upload {
            let _ = tokio::fs::remove_file(&saved.path).await;
        }
        return Err(rejection);
    }

    let Some(saved) = upload else {
        return Err(bad_request("No video file provided"));
    };

    let base_name = FsPath::new(&saved.filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| saved.filename.clone());
    let job = ProcessJob {
        video_path: saved.path,
        base_name,
        format,
        model,
    };
    info!(
        filename = %saved.filename,
        format = job.format.extension(),
        model = %job.model,
        "processing upload"
    );

    let files = run_pipeline(state.toolchain.as_ref(), &state.dirs, &job)
        .await
        .map_err(|error| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::at_step(error.step().number(), error.to_string())),
            )
        })?;

    info!(
        subtitle_file = %files.subtitle_file,
        output_video = %files.output_video,
        "video processed"
    );
    Ok(Json(ProcessResponse::processed(&files)))
}

/// Validates the uploaded filename and streams the field to disk.
async fn save_upload(upload_dir: &FsPath, mut field: Field<'_>) -> ApiResult<SavedUpload> {
    let original = field.file_name().unwrap_or_default().to_string();
    if original.is_empty() {
        return Err(bad_request("No file selected"));
    }
    if !allowed_file(&original) {
        return Err(bad_request("Invalid file type"));
    }
    let filename = secure_filename(&original);
    if !allowed_file(&filename) {
        return Err(bad_request("Invalid file type"));
    }

    let path = upload_dir.join(&filename);
    let mut file = tokio::fs::File::create(&path).await.map_err(unexpected)?;
    let written = async {
        while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
            file.write_all(&chunk).await.map_err(unexpected)?;
        }
        file.flush().await.map_err(unexpected)
    };
    if let Err(rejection) = written.await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(rejection);
    }

    Ok(SavedUpload { path, filename })
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let not_found = || (StatusCode::NOT_FOUND, Json(ApiError::new("File not found")));

    let filename = secure_filename(&filename);
    if filename.is_empty() {
        return Err(not_found());
    }
    let path = state.dirs.output_dir.join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to open output file");
            return Err(unexpected(error));
        }
    };
    let metadata = file.metadata().await.map_err(unexpected)?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let mut headers = HeaderMap::new();
    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.essence_str())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((StatusCode::OK, headers, Body::from_stream(ReaderStream::new(file))))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
