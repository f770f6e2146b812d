// src/handlers/mod.rs

pub mod feed;
pub mod render;
pub mod tag;
