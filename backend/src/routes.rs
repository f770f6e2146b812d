// src/routes.rs

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    handlers::{feed, render, tag},
    models::{content::ContentKind, post},
    state::AppState,
    trending::{TagSort, TrendingTag},
};

/// Request bodies carry whole feeds of post snapshots.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        render::render_content,
        render::render_post,
        tag::trending_tags,
        tag::tag_posts,
        tag::parse_hashtag_input,
        feed::search_feed,
    ),
    components(schemas(
        ContentKind,
        TagSort,
        TrendingTag,
        post::PostSnapshot,
        post::RenderRequest,
        post::RenderResponse,
        post::RenderedPost,
        post::HashtagLink,
        post::TrendingRequest,
        post::TrendingResponse,
        post::TagPostsRequest,
        post::SearchRequest,
        post::HashtagParseRequest,
        post::HashtagParseResponse,
    )),
    tags(
        (name = "render", description = "Rich-content normalization"),
        (name = "tags", description = "Hashtag leaderboard and listings"),
        (name = "feed", description = "Feed search")
    )
)]
pub struct ApiDoc;

/// Assembles the main application router.
///
/// * Mounts the render, tag and feed routes plus the OpenAPI document.
/// * Applies global middleware (Trace, CORS, optional rate limiting).
/// * Injects global state (config and the shared normalizer).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Skipping invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let render_routes = Router::new()
        .route("/render", post(render::render_content))
        .route("/posts/render", post(render::render_post));

    let tag_routes = Router::new()
        .route("/tags/trending", post(tag::trending_tags))
        .route("/tags/{tag}/posts", post(tag::tag_posts))
        .route("/hashtags/parse", post(tag::parse_hashtag_input));

    let feed_routes = Router::new().route("/feed/search", post(feed::search_feed));

    let rate_limit = state.config.rate_limit;

    let mut router = Router::new()
        .nest(
            "/api",
            render_routes.merge(tag_routes).merge(feed_routes),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Global Middleware (listed from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        );

    // Keyed on the peer IP; the server must be run with connect info.
    if let Some(limit) = rate_limit {
        match GovernorConfigBuilder::default()
            .per_second(limit.per_second)
            .burst_size(limit.burst)
            .finish()
        {
            Some(governor_conf) => {
                tracing::info!(
                    "Rate limiting: {}/s, burst {}",
                    limit.per_second,
                    limit.burst
                );
                router = router.layer(GovernorLayer::new(Arc::new(governor_conf)));
            }
            None => tracing::warn!("Invalid rate limit settings, rate limiting disabled"),
        }
    }

    router.with_state(state)
}
