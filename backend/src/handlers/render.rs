use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        content::RichContent,
        post::{HashtagLink, PostSnapshot, RenderRequest, RenderResponse, RenderedPost},
    },
    render::{Normalizer, RenderContext},
    trending::content_snippet,
    utils::text::hashtag_href,
};

/// Normalize a bare post body into safe HTML.
#[utoipa::path(
    post,
    path = "/api/render",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Normalized HTML", body = RenderResponse),
        (status = 400, description = "Invalid payload"),
        (status = 413, description = "Content too large")
    ),
    tag = "render"
)]
pub async fn render_content(
    State(normalizer): State<Arc<Normalizer>>,
    Json(payload): Json<RenderRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let content = RichContent::from_value(&payload.content);
    let kind = content.kind();
    let html = run_blocking(normalizer, move |n| n.normalize(&content)).await?;

    Ok(Json(RenderResponse { html, kind }))
}

/// Render a full post snapshot: normalized body, snippet and tag links.
#[utoipa::path(
    post,
    path = "/api/posts/render",
    request_body = PostSnapshot,
    responses(
        (status = 200, description = "Rendered post", body = RenderedPost),
        (status = 400, description = "Invalid payload"),
        (status = 413, description = "Content too large")
    ),
    tag = "render"
)]
pub async fn render_post(
    State(normalizer): State<Arc<Normalizer>>,
    Json(post): Json<PostSnapshot>,
) -> Result<impl IntoResponse, AppError> {
    post.validate()?;

    let rendered = run_blocking(normalizer, move |n| render_snapshot(&mut n.context(), &post)).await?;
    Ok(Json(rendered))
}

/// Renders one snapshot through a caller-owned context so a listing reuses
/// a single rendering surface.
pub fn render_snapshot(ctx: &mut RenderContext<'_>, post: &PostSnapshot) -> RenderedPost {
    let content = RichContent::from_value(&post.content);
    RenderedPost {
        id: post.id.clone(),
        title: post.title.clone(),
        display_name: post.display_name.clone(),
        html: ctx.normalize(&content),
        kind: content.kind(),
        snippet: content_snippet(&post.content),
        hashtags: hashtag_links(&post.hashtags),
        likes: post.likes,
        dislikes: post.dislikes,
        comments_count: post.comments_count,
        created_at: post.created_at,
    }
}

pub fn hashtag_links(tags: &[String]) -> Vec<HashtagLink> {
    tags.iter()
        .map(|tag| HashtagLink {
            tag: tag.clone(),
            href: hashtag_href(tag),
        })
        .collect()
}

/// Runs CPU-bound rendering off the async workers.
pub async fn run_blocking<T, F>(normalizer: Arc<Normalizer>, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Normalizer) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&normalizer))
        .await
        .map_err(|e| AppError::InternalServerError(format!("render task failed: {}", e)))
}
