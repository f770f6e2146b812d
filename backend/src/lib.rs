// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod render;
pub mod routes;
pub mod state;
pub mod trending;
pub mod utils;

// Re-export specific items for convenience if needed
pub use models::content::RichContent;
pub use render::{Normalizer, RenderContext, SanitizedHtml};
pub use routes::create_router;
