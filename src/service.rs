//! HTTP front end for the tiling pipeline
//!
//! `POST /` takes a multipart form:
//! - `image`: the photo (required, must be a file part)
//! - `tile_colors`: JSON array of `#RGB`/`#RRGGBB` strings (optional)
//! - `pixel_dimensions`: grid side length (optional, default 50)
//!
//! and answers with the tiled PNG or a JSON `{"error": ...}` body.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::config::ServiceConfig;
use crate::error::{AppError, TileError};
use crate::palette::Palette;
use crate::pipeline::{self, TileConfig, DEFAULT_GRID_RESOLUTION};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    config: Arc<ServiceConfig>,
}

/// JSON body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Multipart form accepted by the tiling endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
struct TileForm {
    /// Source photo (JPEG, PNG or BMP)
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    /// JSON array of hex colors, e.g. `["#FF0000", "#000"]`
    tile_colors: Option<String>,
    /// Side length of the square tile grid
    pixel_dimensions: Option<u32>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tile Pixelator API",
        description = "Reduce a photo to a coarse grid of tiles in a fixed palette",
        version = "0.1.0"
    ),
    tags(
        (name = "Tiling", description = "Image tiling endpoint")
    ),
    paths(health, process_image),
    components(schemas(ErrorBody, TileForm))
)]
struct ApiDoc;

/// Build the service router
pub fn router(config: ServiceConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", post(process_image))
        .route("/health", get(health))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health() -> &'static str {
    "ok"
}

/// Get OpenAPI JSON specification
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Tile an uploaded image
///
/// Returns the tiled image as PNG, same dimensions as the upload.
#[utoipa::path(
    post,
    path = "/",
    tag = "Tiling",
    request_body(content = TileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Tiled image", content_type = "image/png"),
        (status = 400, description = "Missing image or invalid parameters", body = ErrorBody),
        (status = 413, description = "Upload too large", body = ErrorBody),
        (status = 500, description = "Processing failed", body = ErrorBody)
    )
)]
async fn process_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;

    let image = form.image.ok_or(AppError::MissingImage)?;
    let palette = parse_palette(form.tile_colors.as_deref(), state.config.max_palette_size)?;
    let grid_resolution = parse_grid_resolution(
        form.pixel_dimensions.as_deref(),
        state.config.max_grid_resolution,
    )?;

    tracing::info!(
        "Tiling request: {} bytes, grid={}, palette={}",
        image.len(),
        grid_resolution,
        palette
    );

    let config = TileConfig::new(palette, grid_resolution);
    let png_data =
        tokio::task::spawn_blocking(move || pipeline::tile_image_bytes(&image, &config)).await??;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        png_data,
    )
        .into_response())
}

/// Raw form fields before validation
#[derive(Default)]
struct TileRequest {
    image: Option<Bytes>,
    tile_colors: Option<String>,
    pixel_dimensions: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<TileRequest, AppError> {
    let mut form = TileRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            // Plain text parts named `image` are not uploads
            Some("image") if field.file_name().is_some() => {
                form.image = Some(field.bytes().await?);
            }
            Some("tile_colors") => form.tile_colors = Some(field.text().await?),
            Some("pixel_dimensions") => form.pixel_dimensions = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Blank or absent means the default palette
fn parse_palette(raw: Option<&str>, max_size: usize) -> Result<Palette, AppError> {
    let palette = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Palette::default(),
        Some(json) => Palette::from_json_hex(json).map_err(|e| match e {
            TileError::InvalidParameter(msg) => AppError::BadRequest(msg),
            other => other.into(),
        })?,
    };

    if palette.len() > max_size {
        return Err(AppError::BadRequest(format!(
            "tile_colors may contain at most {} colors, got {}",
            max_size,
            palette.len()
        )));
    }

    Ok(palette)
}

/// Blank or absent means [`DEFAULT_GRID_RESOLUTION`]
fn parse_grid_resolution(raw: Option<&str>, max: u32) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_GRID_RESOLUTION);
    };

    match raw.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(AppError::BadRequest(format!(
            "pixel_dimensions must be an integer between 1 and {}",
            max
        ))),
    }
}
