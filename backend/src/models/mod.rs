// src/models/mod.rs

pub mod content;
pub mod delta;
pub mod post;
