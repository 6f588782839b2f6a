mod docs;
mod health;
/// Upload handlers
pub mod upload;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use axum::{extract::DefaultBodyLimit, middleware};

use crate::{middleware::auth_middleware, upload::AssetKind};

fn body_limit(kind: AssetKind) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(kind.request_limit()).unwrap_or(usize::MAX))
}

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    let thumbnail_routes = ApiRouter::new()
        .api_route(
            "/api/thumbnail_upload/{video_id}",
            post(upload::upload_thumbnail),
        )
        .layer(body_limit(AssetKind::Thumbnail));

    let video_routes = ApiRouter::new()
        .api_route("/api/video_upload/{video_id}", post(upload::upload_video))
        .layer(body_limit(AssetKind::Video));

    let protected_routes = thumbnail_routes
        .merge(video_routes)
        .layer(middleware::from_fn(auth_middleware));

    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .merge(protected_routes)
}
