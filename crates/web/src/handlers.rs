use std::path::{Path, PathBuf};

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use smilecheck_core::jobs::domain::job::{Job, JobStatus};
use smilecheck_core::jobs::domain::job_runner::JobTask;
use smilecheck_core::jobs::infrastructure::worker_pool::SubmitError;
use smilecheck_core::shared::constants::VIDEO_EXTENSIONS;

use crate::error::WebError;
use crate::pages;
use crate::state::AppState;

/// Multipart field carrying the upload.
const UPLOAD_FIELD: &str = "video";

pub async fn index() -> Html<String> {
    Html(pages::index_page())
}

/// Stores the uploaded video and queues it for processing.
///
/// Requests without a usable video redirect back to the upload form.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = sanitize_filename(field.file_name().unwrap_or_default());
        let Some(extension) = allowed_extension(&filename) else {
            log::info!("Rejected upload {filename:?}: unsupported file type");
            return Ok(redirect_home());
        };

        let id = Uuid::new_v4().to_string();
        let input_path = state.config.upload_dir.join(format!("{id}.{extension}"));
        let output_path = state
            .config
            .processed_dir
            .join(format!("{id}_processed.mp4"));

        let mut file = tokio::fs::File::create(&input_path).await?;
        let written = async {
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<_, WebError>(())
        }
        .await;
        if let Err(e) = written {
            discard(&input_path).await;
            return Err(e);
        }

        let job = Job::new(&id, filename, input_path.clone());
        let task = JobTask {
            id: id.clone(),
            input_path: input_path.clone(),
            output_path,
        };
        return match state.pool.try_submit(job, task) {
            Ok(()) => Ok(Redirect::to(&format!("/processing/{id}")).into_response()),
            Err(e) => {
                discard(&input_path).await;
                Err(match e {
                    SubmitError::QueueFull => WebError::QueueFull,
                    other => WebError::Internal(other.to_string()),
                })
            }
        };
    }
    Ok(redirect_home())
}

pub async fn processing(State(state): State<AppState>, UrlPath(id): UrlPath<String>) -> Response {
    match state.store.get(&id) {
        Some(job) => Html(pages::processing_page(&job.id, &job.filename)).into_response(),
        None => redirect_home(),
    }
}

pub async fn status(State(state): State<AppState>, UrlPath(id): UrlPath<String>) -> Response {
    match state.store.get(&id) {
        Some(job) => Json(job).into_response(),
        None => Json(serde_json::json!({ "status": "not_found" })).into_response(),
    }
}

pub async fn result(State(state): State<AppState>, UrlPath(id): UrlPath<String>) -> Response {
    match state.store.get(&id) {
        Some(job) if job.status == JobStatus::Completed => {
            Html(pages::result_page(&job.id, &job.filename)).into_response()
        }
        _ => redirect_home(),
    }
}

/// Redirects to the processed file once a job has produced one.
pub async fn video(State(state): State<AppState>, UrlPath(id): UrlPath<String>) -> Response {
    let file_name = state
        .store
        .get(&id)
        .and_then(|job| job.output_path)
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()));
    match file_name {
        Some(name) => Redirect::to(&format!("/processed/{name}")).into_response(),
        None => redirect_home(),
    }
}

fn redirect_home() -> Response {
    Redirect::to("/").into_response()
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        log::warn!("Could not remove {}: {e}", path.display());
    }
}

/// Reduces a client-supplied name to a safe single path component.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// Lowercased extension when it is an accepted video type.
fn allowed_extension(filename: &str) -> Option<String> {
    let ext = PathBuf::from(filename)
        .extension()?
        .to_string_lossy()
        .to_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my clip.mp4"), "my_clip.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\videos\\party.MOV"), "party.MOV");
        assert_eq!(sanitize_filename(".hidden.mkv"), "hidden.mkv");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("clip.MP4"), Some("mp4".to_string()));
        assert_eq!(allowed_extension("clip.mkv"), Some("mkv".to_string()));
        assert_eq!(allowed_extension("notes.txt"), None);
        assert_eq!(allowed_extension("mp4"), None);
        assert_eq!(allowed_extension(""), None);
    }
}
