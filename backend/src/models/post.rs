use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::content::ContentKind;
use crate::render::SanitizedHtml;
use crate::trending::{TagSort, TrendingTag};

/// Upper bound on the number of posts a single request may carry.
pub const MAX_POSTS_PER_REQUEST: u64 = 2000;

/// A post as the document store returns it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostSnapshot {
    #[serde(default)]
    pub id: String,

    #[validate(length(max = 300, message = "Title must be at most 300 chars"))]
    pub title: Option<String>,

    pub display_name: Option<String>,

    /// Editor delta, HTML string or plain text.
    #[serde(default)]
    #[schema(value_type = Object)]
    #[validate(custom(function = validate_data_size))]
    pub content: serde_json::Value,

    #[serde(default)]
    pub hashtags: Vec<String>,

    #[serde(default)]
    pub likes: u64,

    #[serde(default)]
    pub dislikes: u64,

    #[serde(default)]
    pub comments_count: u64,

    pub created_at: Option<DateTime<Utc>>,
}

/// DTO for rendering a bare post body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenderRequest {
    #[schema(value_type = Object)]
    #[serde(default)]
    #[validate(custom(function = validate_data_size))]
    pub content: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RenderResponse {
    #[schema(value_type = String)]
    pub html: SanitizedHtml,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HashtagLink {
    pub tag: String,
    pub href: String,
}

/// A post ready for a page: normalized body, snippet and tag links.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPost {
    pub id: String,
    pub title: Option<String>,
    pub display_name: Option<String>,
    #[schema(value_type = String)]
    pub html: SanitizedHtml,
    pub kind: ContentKind,
    pub snippet: String,
    pub hashtags: Vec<HashtagLink>,
    pub likes: u64,
    pub dislikes: u64,
    pub comments_count: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// DTO for the hashtag leaderboard.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TrendingRequest {
    #[validate(
        length(max = MAX_POSTS_PER_REQUEST, message = "Too many posts in one request"),
        nested
    )]
    pub posts: Vec<PostSnapshot>,

    /// Reference time for post ages; defaults to the server clock.
    pub now: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingResponse {
    pub window_days: i64,
    pub tags: Vec<TrendingTag>,
}

/// DTO for listing the posts of one hashtag.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TagPostsRequest {
    #[validate(
        length(max = MAX_POSTS_PER_REQUEST, message = "Too many posts in one request"),
        nested
    )]
    pub posts: Vec<PostSnapshot>,

    pub now: Option<DateTime<Utc>>,
}

/// Query parameters for listing the posts of one hashtag.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagPostsParams {
    /// 'trending' (default) or 'newest'.
    pub sort: Option<TagSort>,
}

/// DTO for keyword search over a feed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(
        length(max = MAX_POSTS_PER_REQUEST, message = "Too many posts in one request"),
        nested
    )]
    pub posts: Vec<PostSnapshot>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Query must be at most 200 chars"))]
    pub q: String,
}

/// DTO for normalizing free-form hashtag input.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct HashtagParseRequest {
    #[validate(length(max = 2000, message = "Input must be at most 2000 chars"))]
    pub input: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HashtagParseResponse {
    pub hashtags: Vec<HashtagLink>,
}

/// Limits a post body to roughly 500KB of serialized JSON.
fn validate_data_size(data: &serde_json::Value) -> Result<(), validator::ValidationError> {
    let size = match data {
        serde_json::Value::String(s) => s.len(),
        other => other.to_string().len(),
    };
    if size > 500_000 {
        return Err(validator::ValidationError::new("payload_too_large"));
    }
    Ok(())
}
