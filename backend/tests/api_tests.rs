// tests/api_tests.rs

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use richpost::config::{Config, RateLimit};
use richpost::{routes, state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    spawn_app_with(test_config()).await
}

fn test_config() -> Config {
    Config {
        rust_log: "error".to_string(),
        ..Config::default()
    }
}

async fn spawn_app_with(config: Config) -> String {
    let state = AppState::new(config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

async fn post_json(address: &str, path: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", address, path))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

fn sample_posts() -> Value {
    json!([
        {
            "id": "p1",
            "title": "Ownership tips",
            "displayName": "ann",
            "content": { "ops": [{ "insert": "Borrow wisely\n" }] },
            "hashtags": ["#Rust", "#tips"],
            "likes": 4,
            "commentsCount": 1,
            "createdAt": "2026-10-17T12:00:00Z"
        },
        {
            "id": "p2",
            "title": "Axum routers",
            "content": "<p>Nest <b>everything</b></p>",
            "hashtags": ["#rust"],
            "likes": 1,
            "createdAt": "2026-10-10T12:00:00Z"
        },
        {
            "id": "p3",
            "title": "Ancient",
            "content": "plain words",
            "hashtags": ["#history"],
            "likes": 99,
            "createdAt": "2025-01-01T00:00:00Z"
        }
    ])
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn render_strips_scripts_and_reports_kind() {
    let address = spawn_app().await;

    let response = post_json(
        &address,
        "/api/render",
        json!({ "content": "<p>hi</p><script>alert(1)</script>" }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let html = body["html"].as_str().unwrap();
    assert!(html.contains("hi"));
    assert!(!html.contains("script"));
    assert!(!html.contains("alert"));
    assert_eq!(body["kind"], "raw_html");
}

#[tokio::test]
async fn render_delta_and_placeholder() {
    let address = spawn_app().await;

    let delta: Value = post_json(
        &address,
        "/api/render",
        json!({ "content": { "ops": [
            { "insert": "one" },
            { "insert": "\n", "attributes": { "list": "ordered" } },
            { "insert": "two" },
            { "insert": "\n", "attributes": { "list": "ordered" } }
        ]}}),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(delta["kind"], "delta");
    let html = delta["html"].as_str().unwrap();
    assert_eq!(html.matches("<ol").count(), 1);
    assert_eq!(html.matches("<li").count(), 2);

    let empty: Value = post_json(&address, "/api/render", json!({ "content": "   " }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(empty["kind"], "empty");
    assert!(empty["html"].as_str().unwrap().contains("(No content)"));
}

#[tokio::test]
async fn render_rejects_oversized_content() {
    let address = spawn_app().await;

    let response = post_json(
        &address,
        "/api/render",
        json!({ "content": "x".repeat(600_000) }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 413);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn render_post_includes_snippet_and_tag_links() {
    let address = spawn_app().await;
    let post = sample_posts()[1].clone();

    let response = post_json(&address, "/api/posts/render", post).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "p2");
    assert_eq!(body["snippet"], "Nest everything");
    assert_eq!(body["hashtags"][0]["href"], "tag.html?tag=%23rust");
    assert!(body["html"].as_str().unwrap().contains("<b"));
}

#[tokio::test]
async fn trending_ranks_recent_tags() {
    let address = spawn_app().await;

    let response = post_json(
        &address,
        "/api/tags/trending",
        json!({ "posts": sample_posts(), "now": "2026-10-18T12:00:00Z" }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["window_days"], 14);
    let tags = body["tags"].as_array().unwrap();
    // #history is far outside the window.
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["tag"], "#Rust");
    assert_eq!(tags[0]["count"], 2);
    assert_eq!(tags[1]["tag"], "#tips");
}

#[tokio::test]
async fn trending_validates_limit() {
    let address = spawn_app().await;

    let response = post_json(
        &address,
        "/api/tags/trending",
        json!({ "posts": [], "limit": 0 }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn tag_posts_sorts_by_requested_order() {
    let address = spawn_app().await;

    let body: Value = post_json(
        &address,
        "/api/tags/%23RUST/posts?sort=newest",
        json!({ "posts": sample_posts(), "now": "2026-10-18T12:00:00Z" }),
    )
    .await
    .json()
    .await
    .unwrap();

    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn feed_search_matches_content_and_tags() {
    let address = spawn_app().await;

    let by_content: Value = post_json(
        &address,
        "/api/feed/search",
        json!({ "posts": sample_posts(), "q": "borrow" }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(by_content.as_array().unwrap().len(), 1);
    assert_eq!(by_content[0]["id"], "p1");

    let by_tag: Value = post_json(
        &address,
        "/api/feed/search",
        json!({ "posts": sample_posts(), "q": "HISTORY" }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(by_tag[0]["id"], "p3");
}

#[tokio::test]
async fn feed_search_rejects_oversized_listed_post() {
    let address = spawn_app().await;
    let mut posts = sample_posts();
    posts[1]["content"] = json!("x".repeat(600_000));

    let response = post_json(
        &address,
        "/api/feed/search",
        json!({ "posts": posts, "q": "rust" }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 413);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn feed_search_with_blank_query_finds_nothing() {
    let address = spawn_app().await;

    let body: Value = post_json(
        &address,
        "/api/feed/search",
        json!({ "posts": sample_posts(), "q": "   " }),
    )
    .await
    .json()
    .await
    .unwrap();

    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn hashtag_input_is_normalized() {
    let address = spawn_app().await;

    let body: Value = post_json(
        &address,
        "/api/hashtags/parse",
        json!({ "input": "rust, #web  axum" }),
    )
    .await
    .json()
    .await
    .unwrap();

    let tags: Vec<&str> = body["hashtags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["#rust", "#web", "#axum"]);
}

#[tokio::test]
async fn rate_limit_rejects_bursts() {
    let config = Config {
        rate_limit: Some(RateLimit {
            per_second: 60,
            burst: 1,
        }),
        ..test_config()
    };
    let address = spawn_app_with(config).await;
    let body = json!({ "input": "a" });

    let first = post_json(&address, "/api/hashtags/parse", body.clone()).await;
    let second = post_json(&address, "/api/hashtags/parse", body).await;

    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(second.status().as_u16(), 429);
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = routes::create_router(AppState::new(test_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"]["/api/render"].is_object());
    assert!(doc["paths"]["/api/tags/{tag}/posts"].is_object());
}
