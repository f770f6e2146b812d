use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::render::{render_snapshot, run_blocking},
    models::post::{RenderedPost, SearchRequest},
    render::Normalizer,
    trending::search_posts,
};

/// Keyword search over a feed. Matches title, raw content or any hashtag.
#[utoipa::path(
    post,
    path = "/api/feed/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching posts in feed order", body = [RenderedPost]),
        (status = 400, description = "Invalid payload")
    ),
    tag = "feed"
)]
pub async fn search_feed(
    State(normalizer): State<Arc<Normalizer>>,
    Json(payload): Json<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let rendered = run_blocking(normalizer, move |n| {
        let mut ctx = n.context();
        search_posts(&payload.posts, &payload.q)
            .into_iter()
            .map(|post| render_snapshot(&mut ctx, post))
            .collect::<Vec<_>>()
    })
    .await?;

    Ok(Json(rendered))
}
