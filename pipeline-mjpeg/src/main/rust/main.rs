use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use pipeline_mjpeg::{
    routes, Config, GStreamerSourceOpener, InMemoryOverlayStore, JpegFrameEncoder,
    OverlayService, OverlayStore, PrometheusReporter, SqliteOverlayStore, StreamingService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    info!("Starting Pipeline-MJPEG v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Validate CLI configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    // Initialize GStreamer (infrastructure concern)
    gstreamer::init()?;
    info!("GStreamer initialized");

    // Initialize metrics
    PrometheusReporter::init_metrics()?;
    info!("Metrics initialized");

    // Convert CLI config to domain configs
    let server_config = config
        .to_server_config()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let stream_config = config
        .to_stream_config()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // Create infrastructure implementations (dependency injection)
    let store: Arc<dyn OverlayStore> = match &config.database_url {
        Some(url) => {
            let store = SqliteOverlayStore::connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            info!("Overlay store: {}", url);
            Arc::new(store)
        }
        None => {
            info!("Overlay store: in-memory");
            Arc::new(InMemoryOverlayStore::new())
        }
    };
    let opener = Arc::new(GStreamerSourceOpener::from_config(&stream_config));
    let encoder = Arc::new(JpegFrameEncoder::new(stream_config.jpeg_quality()));
    let metrics_reporter = Arc::new(PrometheusReporter::new());

    // Create application services
    let fallback = stream_config.fallback().clone();
    let streaming_service = Arc::new(StreamingService::new(
        opener,
        encoder,
        metrics_reporter,
        stream_config,
    ));
    let overlay_service = Arc::new(OverlayService::new(store));

    let streaming_for_signal = streaming_service.clone();
    let routes = routes(streaming_service, overlay_service, &server_config);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown(server_config.bind_addr(), async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received (Ctrl+C)"),
                Err(err) => error!("Failed to listen for shutdown signal: {}", err),
            }
            streaming_for_signal.shutdown();
        });

    info!("-------------------------------------------------------");
    info!("MJPEG Server Ready");
    info!("   Feed:     http://{}/video_feed?url=<source>", addr);
    info!("   Fallback: {} ({})", fallback, fallback.kind());
    info!("   Overlays: http://{}/overlays", addr);
    info!("   Metrics:  http://{}/metrics", addr);
    info!("   Health:   http://{}/health", addr);
    info!("-------------------------------------------------------");

    server.await;

    info!("Server stopped gracefully");
    Ok(())
}
