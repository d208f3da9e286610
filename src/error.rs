//! Error types for the tiling core and the HTTP service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::palette::Rgb;
use crate::service::ErrorBody;

/// Failures of the tiling pipeline itself
#[derive(Error, Debug)]
pub enum TileError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Palette size mismatch: {discovered} discovered colors, {target} target colors")]
    PaletteSizeMismatch { discovered: usize, target: usize },

    #[error("Unmapped color {0} encountered during remapping")]
    UnmappedColor(Rgb),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}

/// Errors surfaced by the HTTP endpoint
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No image file provided")]
    MissingImage,

    #[error("{0}")]
    BadRequest(String),

    #[error("Malformed multipart request: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingImage | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Tile(TileError::InvalidParameter(_) | TileError::Decode(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Tile(_) | AppError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            tracing::info!("Rejected request: {}", self);
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let err = AppError::Tile(TileError::InvalidParameter("grid resolution must be positive".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid parameter: grid resolution must be positive");
    }

    #[test]
    fn test_internal_errors_are_server_errors() {
        let err = AppError::Tile(TileError::UnmappedColor(Rgb::new(1, 2, 3)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::Tile(TileError::PaletteSizeMismatch { discovered: 2, target: 3 });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response = AppError::Tile(TileError::UnmappedColor(Rgb::new(1, 2, 3))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert_eq!(text, r#"{"error":"Internal server error"}"#);
        assert!(!text.contains("(1, 2, 3)"));
    }

    #[tokio::test]
    async fn test_client_error_body_keeps_message() {
        let response = AppError::MissingImage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], AppError::MissingImage.to_string());
    }
}
