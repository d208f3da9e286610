use tile_pixelator::config::ServiceConfig;
use tile_pixelator::service;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    tracing::info!(
        "Limits: palette <= {} colors, grid <= {}, upload <= {} bytes",
        config.max_palette_size,
        config.max_grid_resolution,
        config.max_upload_bytes
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let app = service::router(config);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
