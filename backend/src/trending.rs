// src/trending.rs

//! Hashtag leaderboard, per-tag listings, keyword search and snippets over
//! post snapshots.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::content::RichContent;
use crate::models::post::PostSnapshot;
use crate::render::dom;
use crate::utils::text::{hashtag_href, snippet};

pub const DEFAULT_WINDOW_DAYS: i64 = 14;
pub const DEFAULT_TRENDING_LIMIT: usize = 20;
pub const SNIPPET_CHARS: usize = 220;

/// Age assumed for posts without a creation time.
const UNDATED_AGE_DAYS: f64 = 365.0;

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy)]
pub struct TrendingOptions {
    pub window_days: i64,
    pub limit: usize,
}

impl Default for TrendingOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            limit: DEFAULT_TRENDING_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrendingTag {
    /// First spelling seen for the tag.
    pub tag: String,
    pub count: u64,
    pub score: f64,
    pub href: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TagSort {
    #[default]
    Trending,
    Newest,
}

/// Fractional days between `created_at` and `now`, never negative.
pub fn age_days(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match created_at {
        Some(created) => ((now - created).num_milliseconds() as f64 / MS_PER_DAY).max(0.0),
        None => UNDATED_AGE_DAYS,
    }
}

/// likes + 2 * comments + 3 * freshness, freshness = max(0, window - age).
pub fn post_score(post: &PostSnapshot, now: DateTime<Utc>, window_days: i64) -> f64 {
    let freshness = (window_days as f64 - age_days(post.created_at, now)).max(0.0);
    post.likes as f64 + post.comments_count as f64 * 2.0 + freshness * 3.0
}

/// Hashtag leaderboard over the posts inside the window, best first.
pub fn compute_trending(
    posts: &[PostSnapshot],
    now: DateTime<Utc>,
    options: TrendingOptions,
) -> Vec<TrendingTag> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, TrendingTag> = HashMap::new();

    for post in posts {
        if age_days(post.created_at, now) > options.window_days as f64 {
            continue;
        }
        let score = post_score(post, now, options.window_days);

        // Every occurrence counts, repeats within one post included.
        for tag in post.hashtags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let key = tag_key(tag);
            let entry = buckets.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                TrendingTag {
                    tag: tag.to_string(),
                    count: 0,
                    score: 0.0,
                    href: hashtag_href(tag),
                }
            });
            entry.count += 1;
            entry.score += score;
        }
    }

    // First-seen order breaks score ties.
    let mut tags: Vec<TrendingTag> = order
        .iter()
        .filter_map(|key| buckets.remove(key))
        .collect();
    tags.sort_by(|a, b| b.score.total_cmp(&a.score));
    tags.truncate(options.limit);
    tags
}

/// Posts carrying `tag` (case-insensitive, `#` included in the comparison),
/// sorted by `sort`.
pub fn posts_for_tag<'a>(
    posts: &'a [PostSnapshot],
    tag: &str,
    sort: TagSort,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<&'a PostSnapshot> {
    let wanted = tag_key(tag);
    let mut matching: Vec<&PostSnapshot> = posts
        .iter()
        .filter(|post| post.hashtags.iter().any(|t| tag_key(t) == wanted))
        .collect();

    match sort {
        TagSort::Trending => matching.sort_by(|a, b| {
            post_score(b, now, window_days).total_cmp(&post_score(a, now, window_days))
        }),
        TagSort::Newest => matching.sort_by(|a, b| newest_first(a.created_at, b.created_at)),
    }
    matching
}

/// Case-insensitive substring search over title, raw content and hashtags.
/// A blank query matches nothing.
pub fn search_posts<'a>(posts: &'a [PostSnapshot], query: &str) -> Vec<&'a PostSnapshot> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    posts
        .iter()
        .filter(|post| {
            post.title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
                || raw_content(&post.content).to_lowercase().contains(&needle)
                || post.hashtags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Plain-text preview of a post body.
pub fn content_snippet(content: &Value) -> String {
    let text = match RichContent::from_value(content) {
        RichContent::Empty => return String::new(),
        RichContent::Delta(delta) => delta.plain_text(),
        RichContent::RawHtml(html) => match dom::parse(&html) {
            Ok(root) => dom::text_content(&root),
            Err(e) => {
                tracing::debug!("snippet fell back to raw markup: {}", e);
                html
            }
        },
        RichContent::PlainText(text) | RichContent::Unrecognized(text) => text,
    };
    snippet(&text, SNIPPET_CHARS)
}

fn tag_key(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn raw_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Undated posts sort last.
fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn post(id: &str, tags: &[&str], likes: u64, comments: u64, age_days: Option<i64>) -> PostSnapshot {
        PostSnapshot {
            id: id.to_string(),
            title: Some(format!("Post {id}")),
            display_name: None,
            content: json!(format!("body of {id}")),
            hashtags: tags.iter().map(|t| t.to_string()).collect(),
            likes,
            dislikes: 0,
            comments_count: comments,
            created_at: age_days.map(|d| now() - Duration::days(d)),
        }
    }

    #[test]
    fn score_weights_likes_comments_and_freshness() {
        let p = post("a", &[], 5, 2, Some(4));
        assert_eq!(post_score(&p, now(), 14), 5.0 + 4.0 + 30.0);

        let stale = post("b", &[], 1, 0, Some(40));
        assert_eq!(post_score(&stale, now(), 14), 1.0);
    }

    #[test]
    fn undated_posts_count_as_a_year_old() {
        assert_eq!(age_days(None, now()), 365.0);
        assert_eq!(age_days(Some(now() + Duration::days(2)), now()), 0.0);
    }

    #[test]
    fn trending_groups_tags_case_insensitively() {
        let posts = vec![
            post("a", &["#Rust", "#web"], 0, 0, Some(0)),
            post("b", &["#rust"], 10, 0, Some(1)),
        ];
        let tags = compute_trending(&posts, now(), TrendingOptions::default());

        assert_eq!(tags[0].tag, "#Rust");
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[0].score, 42.0 + 49.0);
        assert_eq!(tags[0].href, "tag.html?tag=%23Rust");
        assert_eq!(tags[1].tag, "#web");
        assert_eq!(tags[1].count, 1);
    }

    #[test]
    fn trending_skips_posts_outside_the_window() {
        let posts = vec![
            post("old", &["#old"], 100, 100, Some(20)),
            post("undated", &["#undated"], 100, 0, None),
            post("new", &["#new"], 0, 0, Some(1)),
        ];
        let tags = compute_trending(&posts, now(), TrendingOptions::default());
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag, "#new");
    }

    #[test]
    fn trending_is_limited() {
        let posts: Vec<PostSnapshot> = (0..30)
            .map(|i| post(&i.to_string(), &[&format!("#t{i}")], i, 0, Some(0)))
            .collect();
        let tags = compute_trending(&posts, now(), TrendingOptions::default());
        assert_eq!(tags.len(), 20);
        assert_eq!(tags[0].tag, "#t29");
    }

    #[test]
    fn every_tag_occurrence_counts_and_prefix_matters() {
        let posts = vec![post("a", &["#x", "#X", "x"], 0, 0, Some(0))];
        let tags = compute_trending(&posts, now(), TrendingOptions::default());

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].tag, "#x");
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[0].score, 84.0);
        assert_eq!(tags[1].tag, "x");
        assert_eq!(tags[1].count, 1);
        assert_eq!(tags[1].score, 42.0);
    }

    #[test]
    fn tag_listing_sorts_by_score_or_recency() {
        let posts = vec![
            post("old-popular", &["#rust"], 50, 0, Some(30)),
            post("fresh", &["#RUST"], 0, 0, Some(0)),
            post("other", &["#go"], 99, 0, Some(0)),
            post("undated", &["#rust"], 0, 0, None),
        ];

        let trending: Vec<&str> = posts_for_tag(&posts, "#rust", TagSort::Trending, now(), 14)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(trending, vec!["old-popular", "fresh", "undated"]);

        let newest: Vec<&str> = posts_for_tag(&posts, "#Rust", TagSort::Newest, now(), 14)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(newest, vec!["fresh", "old-popular", "undated"]);

        assert!(posts_for_tag(&posts, "rust", TagSort::Trending, now(), 14).is_empty());
    }

    #[test]
    fn search_matches_title_content_and_tags() {
        let mut with_delta = post("d", &[], 0, 0, Some(0));
        with_delta.content = json!({ "ops": [{ "insert": "Borrow checker\n" }] });
        let posts = vec![
            post("a", &["#Axum"], 0, 0, Some(0)),
            with_delta,
            post("c", &[], 0, 0, Some(0)),
        ];

        let ids = |q: &str| -> Vec<String> {
            search_posts(&posts, q).iter().map(|p| p.id.clone()).collect()
        };
        assert_eq!(ids("axum"), vec!["a"]);
        assert_eq!(ids("BORROW"), vec!["d"]);
        assert_eq!(ids("post c"), vec!["c"]);
        assert!(ids("  ").is_empty());
        assert!(ids("").is_empty());
        assert!(ids("nothing").is_empty());
    }

    #[test]
    fn snippets_use_plain_text() {
        assert_eq!(
            content_snippet(&json!("<p>Hello <b>world</b></p><script>x()</script>")),
            "Hello world"
        );
        assert_eq!(
            content_snippet(&json!([{ "insert": "Line one\nLine two\n" }])),
            "Line one Line two"
        );
        assert_eq!(content_snippet(&json!(null)), "");

        let long = content_snippet(&json!("word ".repeat(100)));
        assert_eq!(long.chars().count(), SNIPPET_CHARS + 1);
        assert!(long.ends_with('…'));
    }
}
