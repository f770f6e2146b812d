// src/render/surface.rs

//! Off-screen rendering surface: turns a delta into the markup the rich-text
//! editor itself would produce.
//!
//! The surface owns one reusable buffer. It is mounted at the start of a
//! render and released (cleared) before the owning call returns.

use serde_json::{Map, Value};

use crate::models::delta::{Delta, DeltaOp, Insert};
use crate::utils::text::escape_html;

/// Block-level attributes, carried by the newline that ends a line.
#[derive(Debug, Clone, Default, PartialEq)]
struct BlockFormat {
    header: Option<u8>,
    list: Option<String>,
    blockquote: bool,
    code_block: bool,
    align: Option<String>,
    direction: Option<String>,
    indent: Option<u8>,
}

impl BlockFormat {
    fn from_attributes(attributes: Option<&Map<String, Value>>) -> Self {
        let Some(attrs) = attributes else {
            return Self::default();
        };
        Self {
            header: attrs
                .get("header")
                .and_then(Value::as_u64)
                .filter(|h| (1..=6).contains(h))
                .map(|h| h as u8),
            list: string_attr(attrs, "list"),
            blockquote: attrs.get("blockquote").is_some_and(truthy),
            code_block: attrs.get("code-block").is_some_and(truthy),
            align: string_attr(attrs, "align"),
            direction: string_attr(attrs, "direction"),
            indent: attrs
                .get("indent")
                .and_then(Value::as_u64)
                .filter(|i| (1..=8).contains(i))
                .map(|i| i as u8),
        }
    }

    fn classes(&self) -> Vec<String> {
        let mut classes = Vec::new();
        if let Some(align) = &self.align {
            classes.push(format!("ql-align-{}", class_token(align)));
        }
        if let Some(direction) = &self.direction {
            classes.push(format!("ql-direction-{}", class_token(direction)));
        }
        if let Some(indent) = self.indent {
            classes.push(format!("ql-indent-{indent}"));
        }
        classes
    }
}

enum Block {
    Line { html: String, format: BlockFormat },
    Video(String),
}

#[derive(Debug, Default)]
pub struct Surface {
    buffer: String,
    mounted: bool,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Bytes of retained (reusable) buffer capacity.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Clears the surface and hides it again.
    pub fn release(&mut self) {
        self.buffer.clear();
        self.mounted = false;
    }

    /// Renders `delta` onto the surface and returns the produced markup.
    pub fn render(&mut self, delta: &Delta) -> &str {
        self.buffer.clear();
        self.mounted = true;

        let blocks = layout(&delta.ops);
        let mut i = 0;
        while i < blocks.len() {
            match &blocks[i] {
                Block::Video(src) => {
                    self.buffer.push_str(&format!(
                        "<iframe class=\"ql-video\" frameborder=\"0\" allowfullscreen=\"true\" src=\"{}\"></iframe>",
                        escape_html(src)
                    ));
                    i += 1;
                }
                Block::Line { format, .. } if format.list.is_some() => {
                    self.buffer.push_str("<ol>");
                    while let Some(Block::Line { html, format }) = blocks.get(i) {
                        let Some(kind) = &format.list else { break };
                        self.buffer.push_str(&format!(
                            "<li data-list=\"{}\"{}><span class=\"ql-ui\" contenteditable=\"false\"></span>{}</li>",
                            escape_html(kind),
                            class_attr(&format.classes()),
                            line_or_break(html)
                        ));
                        i += 1;
                    }
                    self.buffer.push_str("</ol>");
                }
                Block::Line { format, .. } if format.code_block => {
                    let mut lines = Vec::new();
                    while let Some(Block::Line { html, format }) = blocks.get(i) {
                        if !format.code_block {
                            break;
                        }
                        lines.push(html.as_str());
                        i += 1;
                    }
                    self.buffer.push_str(&format!(
                        "<pre class=\"ql-syntax\" spellcheck=\"false\">{}\n</pre>",
                        lines.join("\n")
                    ));
                }
                Block::Line { html, format } => {
                    let tag = match (format.header, format.blockquote) {
                        (Some(level), _) => format!("h{level}"),
                        (None, true) => "blockquote".to_string(),
                        (None, false) => "p".to_string(),
                    };
                    self.buffer.push_str(&format!(
                        "<{tag}{}>{}</{tag}>",
                        class_attr(&format.classes()),
                        line_or_break(html)
                    ));
                    i += 1;
                }
            }
        }
        &self.buffer
    }
}

/// Splits the operations into lines (and block embeds).
fn layout(ops: &[DeltaOp]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut line = String::new();

    for op in ops {
        match &op.insert {
            Some(Insert::Text(text)) => {
                for (n, segment) in text.split('\n').enumerate() {
                    if n > 0 {
                        blocks.push(Block::Line {
                            html: std::mem::take(&mut line),
                            format: BlockFormat::from_attributes(op.attributes.as_ref()),
                        });
                    }
                    if !segment.is_empty() {
                        line.push_str(&render_inline(segment, op.attributes.as_ref()));
                    }
                }
            }
            Some(Insert::Embed(embed)) => {
                if let Some(src) = embed.get("video").and_then(Value::as_str) {
                    if !line.is_empty() {
                        blocks.push(Block::Line {
                            html: std::mem::take(&mut line),
                            format: BlockFormat::default(),
                        });
                    }
                    blocks.push(Block::Video(src.to_string()));
                } else if let Some(html) = render_embed(embed, op.attributes.as_ref()) {
                    line.push_str(&html);
                } else {
                    tracing::debug!("skipping unsupported embed: {:?}", embed.keys().collect::<Vec<_>>());
                }
            }
            None => {}
        }
    }

    if !line.is_empty() {
        blocks.push(Block::Line {
            html: line,
            format: BlockFormat::default(),
        });
    }
    blocks
}

/// Inline formats, innermost first: attributor span, code, script, italic,
/// bold, strike, underline, link.
fn render_inline(text: &str, attributes: Option<&Map<String, Value>>) -> String {
    let mut html = escape_html(text);
    let Some(attrs) = attributes else {
        return html;
    };

    let mut classes = Vec::new();
    let mut styles = Vec::new();
    if let Some(font) = string_attr(attrs, "font") {
        classes.push(format!("ql-font-{}", class_token(&font)));
    }
    if let Some(size) = string_attr(attrs, "size") {
        if size.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            styles.push(format!("font-size: {size}"));
        } else {
            classes.push(format!("ql-size-{}", class_token(&size)));
        }
    }
    if let Some(color) = string_attr(attrs, "color") {
        styles.push(format!("color: {color}"));
    }
    if let Some(background) = string_attr(attrs, "background") {
        styles.push(format!("background-color: {background}"));
    }
    if !classes.is_empty() || !styles.is_empty() {
        let style = if styles.is_empty() {
            String::new()
        } else {
            format!(" style=\"{}\"", escape_html(&styles.join("; ")))
        };
        html = format!("<span{}{}>{}</span>", class_attr(&classes), style, html);
    }

    if attrs.get("code").is_some_and(truthy) {
        html = format!("<code>{html}</code>");
    }
    match string_attr(attrs, "script").as_deref() {
        Some("sub") => html = format!("<sub>{html}</sub>"),
        Some("super") => html = format!("<sup>{html}</sup>"),
        _ => {}
    }
    for (name, tag) in [("italic", "em"), ("bold", "strong"), ("strike", "s"), ("underline", "u")] {
        if attrs.get(name).is_some_and(truthy) {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }
    if let Some(href) = string_attr(attrs, "link") {
        html = format!(
            "<a href=\"{}\" rel=\"noopener noreferrer\" target=\"_blank\">{}</a>",
            escape_html(&href),
            html
        );
    }
    html
}

fn render_embed(embed: &Map<String, Value>, attributes: Option<&Map<String, Value>>) -> Option<String> {
    if let Some(src) = embed.get("image").and_then(Value::as_str) {
        let mut extra = String::new();
        if let Some(attrs) = attributes {
            for name in ["alt", "width", "height"] {
                if let Some(value) = attrs.get(name).and_then(value_as_string) {
                    extra.push_str(&format!(" {name}=\"{}\"", escape_html(&value)));
                }
            }
        }
        let img = format!("<img src=\"{}\"{}>", escape_html(src), extra);
        return Some(match attributes.and_then(|a| string_attr(a, "link")) {
            Some(href) => format!(
                "<a href=\"{}\" rel=\"noopener noreferrer\" target=\"_blank\">{}</a>",
                escape_html(&href),
                img
            ),
            None => img,
        });
    }
    if let Some(formula) = embed.get("formula").and_then(Value::as_str) {
        return Some(format!(
            "<span class=\"ql-formula\" data-value=\"{0}\">{0}</span>",
            escape_html(formula)
        ));
    }
    None
}

fn line_or_break(html: &str) -> &str {
    if html.is_empty() { "<br>" } else { html }
}

fn class_attr(classes: &[String]) -> String {
    if classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape_html(&classes.join(" ")))
    }
}

/// Restricts a format value to characters that are safe inside a class name.
fn class_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

fn string_attr(attrs: &Map<String, Value>, name: &str) -> Option<String> {
    attrs
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Null => false,
        _ => true,
    }
}
