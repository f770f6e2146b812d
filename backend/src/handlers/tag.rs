use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::render::{hashtag_links, render_snapshot, run_blocking},
    models::post::{
        HashtagParseRequest, HashtagParseResponse, RenderedPost, TagPostsParams,
        TagPostsRequest, TrendingRequest, TrendingResponse,
    },
    render::Normalizer,
    trending::{TrendingOptions, compute_trending, posts_for_tag},
    utils::text::parse_hashtags,
};

/// Hashtag leaderboard over the supplied posts.
#[utoipa::path(
    post,
    path = "/api/tags/trending",
    request_body = TrendingRequest,
    responses(
        (status = 200, description = "Trending hashtags, best first", body = TrendingResponse),
        (status = 400, description = "Invalid payload")
    ),
    tag = "tags"
)]
pub async fn trending_tags(
    State(config): State<Config>,
    Json(payload): Json<TrendingRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let options = TrendingOptions {
        window_days: config.trending_window_days,
        limit: payload.limit.unwrap_or(config.trending_limit),
    };
    let now = payload.now.unwrap_or_else(Utc::now);
    let tags = compute_trending(&payload.posts, now, options);

    tracing::debug!("{} trending tags from {} posts", tags.len(), payload.posts.len());

    Ok(Json(TrendingResponse {
        window_days: options.window_days,
        tags,
    }))
}

/// Rendered posts carrying one hashtag.
#[utoipa::path(
    post,
    path = "/api/tags/{tag}/posts",
    params(
        ("tag" = String, Path, description = "Hashtag as stored, '#' included (URL-encoded as %23)"),
        TagPostsParams
    ),
    request_body = TagPostsRequest,
    responses(
        (status = 200, description = "Matching posts", body = [RenderedPost]),
        (status = 400, description = "Invalid payload")
    ),
    tag = "tags"
)]
pub async fn tag_posts(
    State(config): State<Config>,
    State(normalizer): State<Arc<Normalizer>>,
    Path(tag): Path<String>,
    Query(params): Query<TagPostsParams>,
    Json(payload): Json<TagPostsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if tag.trim().trim_start_matches('#').is_empty() {
        return Err(AppError::BadRequest("Tag must not be empty".to_string()));
    }

    let sort = params.sort.unwrap_or_default();
    let now = payload.now.unwrap_or_else(Utc::now);
    let window_days = config.trending_window_days;

    let rendered = run_blocking(normalizer, move |n| {
        let mut ctx = n.context();
        posts_for_tag(&payload.posts, &tag, sort, now, window_days)
            .into_iter()
            .map(|post| render_snapshot(&mut ctx, post))
            .collect::<Vec<_>>()
    })
    .await?;

    Ok(Json(rendered))
}

/// Normalize free-form hashtag input into `#`-prefixed tags.
#[utoipa::path(
    post,
    path = "/api/hashtags/parse",
    request_body = HashtagParseRequest,
    responses(
        (status = 200, description = "Parsed hashtags", body = HashtagParseResponse),
        (status = 400, description = "Invalid payload")
    ),
    tag = "tags"
)]
pub async fn parse_hashtag_input(
    Json(payload): Json<HashtagParseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tags = parse_hashtags(&payload.input);
    Ok(Json(HashtagParseResponse {
        hashtags: hashtag_links(&tags),
    }))
}
