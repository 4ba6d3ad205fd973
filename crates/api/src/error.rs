use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ingest::IngestError;
use serde::Serialize;
use thiserror::Error;

/// Body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The NER model failed to load at startup
    #[error("NER model not loaded. Please ensure the model is installed correctly.")]
    ModelUnavailable,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("No file uploaded: expected a multipart field named 'file'")]
    MissingUpload,

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Entity extraction failed: {0:#}")]
    Extraction(anyhow::Error),

    /// Body the extractor could not accept (bad JSON, wrong content type)
    #[error("Invalid request: {message}")]
    InvalidBody { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ModelUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ingest(_) | ApiError::MissingUpload => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Extraction(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidBody { status, .. } => *status,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::ModelUnavailable => "model_unavailable",
            ApiError::Ingest(IngestError::UnsupportedFileType(_)) => "unsupported_file_type",
            ApiError::Ingest(IngestError::Malformed(_)) => "malformed_file",
            ApiError::Ingest(IngestError::MissingColumn(_)) => "missing_column",
            ApiError::MissingUpload => "missing_file",
            ApiError::Multipart(_) => "invalid_multipart",
            ApiError::Extraction(_) => "extraction_failed",
            ApiError::InvalidBody { .. } => "invalid_request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.error_type(), "Request failed");
        } else {
            tracing::warn!(error = %self, kind = self.error_type(), "Request rejected");
        }

        let error_response = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::ModelUnavailable.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(IngestError::UnsupportedFileType("a.txt".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(IngestError::MissingColumn(vec!["id".into()])).error_type(),
            "missing_column"
        );
        assert_eq!(
            ApiError::Extraction(anyhow::anyhow!("timeout")).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_parser_message_is_embedded() {
        let err = ApiError::from(IngestError::Malformed("found record with 2 fields".into()));
        assert_eq!(err.error_type(), "malformed_file");
        assert!(err.to_string().contains("found record with 2 fields"));
    }
}
