use std::path::PathBuf;
use std::sync::Arc;

use aide::openapi::OpenApi;
use axum::{
    http::{header::CACHE_CONTROL, HeaderValue},
    Extension,
};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

use crate::routes;
use crate::{
    jwt::JwtVerifier,
    types::Environment,
    upload::{store::ASSETS_ROUTE, AssetPipeline},
};

/// Builds the application router without the tracing layers
///
/// Promoted thumbnails under `asset_root` are served at `/assets`.
pub fn router(
    environment: Environment,
    pipeline: Arc<AssetPipeline>,
    jwt_verifier: Arc<JwtVerifier>,
    asset_root: PathBuf,
) -> axum::Router {
    let mut openapi = OpenApi::default();

    let assets = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .service(ServeDir::new(asset_root));

    routes::handler()
        .finish_api(&mut openapi)
        .nest_service(ASSETS_ROUTE, assets)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(pipeline))
        .layer(Extension(jwt_verifier))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    pipeline: Arc<AssetPipeline>,
    jwt_verifier: Arc<JwtVerifier>,
) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], environment.port()));
    let asset_root = environment.asset_root();

    // No request timeout layer: a 1 GiB upload outlives any sensible limit
    let router = router(environment, pipeline, jwt_verifier, asset_root)
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default());

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Tubely backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
