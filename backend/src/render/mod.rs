// src/render/mod.rs

//! Rich-content normalizer.
//!
//! Turns a post body (editor delta, raw HTML or plain text) into sanitized,
//! style-inlined, structurally normalized HTML that is safe to inject as
//! inner HTML. `normalize` is total: internal failures degrade to plain
//! sanitization of the original input and are only logged.

pub mod dom;
pub mod normalize;
pub mod style;
pub mod surface;

use std::fmt;

use serde::Serialize;

use crate::error::RenderError;
use crate::models::content::RichContent;
use crate::models::delta::Delta;
use crate::utils::html::Sanitizer;
use crate::utils::text::escape_html;

use self::style::StyleSheet;
use self::surface::Surface;

pub const DEFAULT_PLACEHOLDER: &str = "(No content)";

/// HTML that went through the normalizer. Only this module can build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SanitizedHtml(String);

impl SanitizedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared, immutable half of the normalizer: sanitizer, style sheet and
/// placeholder text. Cheap to share across threads.
pub struct Normalizer {
    sanitizer: Sanitizer,
    styles: StyleSheet,
    placeholder: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl Normalizer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            sanitizer: Sanitizer::new(),
            styles: StyleSheet::default(),
            placeholder: placeholder.into(),
        }
    }

    /// Acquires a render context. The context owns the reusable rendering
    /// surface; keep it around to normalize several bodies in a row.
    pub fn context(&self) -> RenderContext<'_> {
        RenderContext {
            normalizer: self,
            surface: None,
        }
    }

    /// One-shot normalization through a fresh context.
    pub fn normalize(&self, content: &RichContent) -> SanitizedHtml {
        self.context().normalize(content)
    }
}

/// Per-caller render state. `normalize` takes `&mut self`, so a surface can
/// never serve two overlapping renders.
pub struct RenderContext<'n> {
    normalizer: &'n Normalizer,
    /// Created on the first delta render, then reused.
    surface: Option<Surface>,
}

impl RenderContext<'_> {
    pub fn normalize(&mut self, content: &RichContent) -> SanitizedHtml {
        let result = match content {
            RichContent::Empty => return self.placeholder(),
            RichContent::PlainText(text) => {
                return SanitizedHtml(format!(
                    "<div style=\"white-space:pre-wrap;\">{}</div>",
                    escape_html(text)
                ));
            }
            RichContent::Delta(delta) => self.render_delta(delta),
            RichContent::RawHtml(html) => self.render_html(html),
            RichContent::Unrecognized(raw) => {
                tracing::debug!("unrecognized content ({} bytes), sanitizing as-is", raw.len());
                return SanitizedHtml(self.normalizer.sanitizer.clean(raw));
            }
        };

        if let Some(surface) = self.surface.as_mut() {
            surface.release();
        }

        self.settle(result, content)
    }

    /// Accepts a pipeline result, or degrades to sanitizing the raw input.
    fn settle(&self, result: Result<String, RenderError>, content: &RichContent) -> SanitizedHtml {
        match result {
            Ok(html) => SanitizedHtml(html),
            Err(e) => {
                tracing::warn!("Render failed, falling back to plain sanitization: {}", e);
                SanitizedHtml(self.normalizer.sanitizer.clean(&content.to_raw_string()))
            }
        }
    }

    /// Whether the rendering surface has been created yet.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Whether the rendering surface currently holds a render.
    pub fn surface_mounted(&self) -> bool {
        self.surface.as_ref().is_some_and(Surface::is_mounted)
    }

    fn placeholder(&self) -> SanitizedHtml {
        SanitizedHtml(format!(
            "<div style=\"white-space:pre-wrap;color:#6c757d;\">{}</div>",
            escape_html(&self.normalizer.placeholder)
        ))
    }

    fn render_delta(&mut self, delta: &Delta) -> Result<String, RenderError> {
        let normalizer = self.normalizer;
        let surface = self.surface.get_or_insert_with(Surface::new);
        let rendered = surface.render(delta);
        let first_pass = normalizer.sanitizer.clean(rendered);
        inline_and_finish(normalizer, &first_pass)
    }

    fn render_html(&mut self, raw: &str) -> Result<String, RenderError> {
        let first_pass = self.normalizer.sanitizer.clean(raw);
        inline_and_finish(self.normalizer, &first_pass)
    }
}

/// Style inlining, second sanitize pass, structural normalization.
fn inline_and_finish(normalizer: &Normalizer, sanitized: &str) -> Result<String, RenderError> {
    let root = dom::parse(sanitized)?;
    style::inline_computed_styles(&root, &normalizer.styles);
    let styled = dom::inner_html(&root)?;
    let second_pass = normalizer.sanitizer.clean(&styled);
    normalize::post_process(&second_pass)
}
