use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors raised while turning a prompt into a video.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The caller's input was rejected before any work started.
    #[error("{0}")]
    Validation(String),

    /// A model call (image, speech) failed or produced nothing usable.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The external encoder exited unsuccessfully or could not be started.
    #[error("Command `{command}` failed ({status}): {stderr}")]
    Mux {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            // Detail stays in the log, never in the response body
            tracing::error!(error = %self, "Error in /generate");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            )
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

/// Errors raised by the artifact file server.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Access denied")]
    AccessDenied,

    #[error("File not found")]
    NotFound,
}

impl IntoResponse for FileError {
    fn into_response(self) -> Response {
        let status = match self {
            FileError::AccessDenied => StatusCode::FORBIDDEN,
            FileError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let response = PipelineError::Validation("Prompt is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn mux_failure_maps_to_server_error() {
        let err = PipelineError::Mux {
            command: "ffmpeg -y".into(),
            status: "exit status: 1".into(),
            stderr: "Invalid data found".into(),
        };
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("Invalid data found"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn file_errors_keep_denied_and_missing_apart() {
        assert_eq!(FileError::AccessDenied.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(FileError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }
}
