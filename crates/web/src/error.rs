use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("server busy: too many videos waiting, try again later")]
    QueueFull,

    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            WebError::Multipart(e) => e.status(),
            WebError::Io(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }
        (status, self.to_string()).into_response()
    }
}
