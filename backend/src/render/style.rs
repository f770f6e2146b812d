// src/render/style.rs

//! Style inlining against a self-contained style model.
//!
//! Effective values are resolved the way a browser cascade would for the
//! handful of properties the display page cares about: inherited parent
//! values, then tag defaults, then the editor theme classes, then the
//! element's own `style` attribute. The result is written back onto the
//! element so it renders the same outside the editor stylesheet.

use markup5ever_rcdom::Handle;

use super::dom;

/// Tags whose text alignment is meaningful.
const BLOCK_ALIGN_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote",
];

const MONOSPACE: &str = "Monaco, \"Courier New\", monospace";
const SERIF: &str = "Georgia, \"Times New Roman\", serif";

/// Resolved values for the properties that get inlined.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub font_size: f32,
    pub font_family: String,
    pub font_weight: u16,
    pub font_style: String,
    pub color: String,
    pub text_align: String,
    pub line_height: String,
    pub letter_spacing: String,
    // Not inherited.
    pub text_decoration: Option<String>,
    pub background_color: Option<String>,
}

impl ComputedStyle {
    /// The style a child starts from before its own rules apply.
    fn inherited(&self) -> Self {
        Self {
            text_decoration: None,
            background_color: None,
            ..self.clone()
        }
    }
}

/// Base style of the rendering surface plus the resolution rules.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    base: ComputedStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            base: ComputedStyle {
                font_size: 13.0,
                font_family: "Helvetica, Arial, sans-serif".to_string(),
                font_weight: 400,
                font_style: "normal".to_string(),
                color: "rgb(33, 37, 41)".to_string(),
                text_align: "start".to_string(),
                line_height: "1.42".to_string(),
                letter_spacing: "normal".to_string(),
                text_decoration: None,
                background_color: None,
            },
        }
    }
}

impl StyleSheet {
    /// Resolves the effective style of `node` given its parent's.
    pub fn compute(&self, node: &Handle, parent: &ComputedStyle) -> ComputedStyle {
        let mut style = parent.inherited();
        if let Some(tag) = dom::tag_name(node) {
            self.apply_tag_defaults(&tag, &mut style, parent);
        }
        self.apply_theme_classes(node, &mut style, parent);
        if let Some(inline) = dom::attr(node, "style") {
            for (property, value) in declarations(&inline) {
                self.apply_declaration(&property, &value, &mut style, parent);
            }
        }
        style
    }

    fn apply_tag_defaults(&self, tag: &str, style: &mut ComputedStyle, parent: &ComputedStyle) {
        let heading_scale = match tag {
            "h1" => Some(2.0),
            "h2" => Some(1.5),
            "h3" => Some(1.17),
            "h4" => Some(1.0),
            "h5" => Some(0.83),
            "h6" => Some(0.67),
            _ => None,
        };
        if let Some(scale) = heading_scale {
            style.font_size = parent.font_size * scale;
            style.font_weight = 700;
            return;
        }
        match tag {
            "strong" | "b" | "th" => style.font_weight = bolder(parent.font_weight),
            "em" | "i" | "cite" | "var" => style.font_style = "italic".to_string(),
            "u" | "ins" => style.text_decoration = Some("underline".to_string()),
            "s" | "strike" | "del" => style.text_decoration = Some("line-through".to_string()),
            "a" => {
                style.color = "rgb(0, 102, 204)".to_string();
                style.text_decoration = Some("underline".to_string());
            }
            "code" | "kbd" | "samp" => {
                style.font_family = MONOSPACE.to_string();
                style.font_size = parent.font_size * 0.85;
                style.background_color = Some("rgb(240, 240, 240)".to_string());
            }
            "pre" => {
                style.font_family = MONOSPACE.to_string();
                style.background_color = Some("rgb(240, 240, 240)".to_string());
            }
            "sub" | "sup" | "small" => style.font_size = parent.font_size / 1.2,
            _ => {}
        }
    }

    fn apply_theme_classes(&self, node: &Handle, style: &mut ComputedStyle, parent: &ComputedStyle) {
        for class in dom::classes(node) {
            if let Some(align) = class.strip_prefix("ql-align-") {
                style.text_align = align.to_string();
            } else if let Some(size) = class.strip_prefix("ql-size-") {
                style.font_size = match size {
                    "small" => parent.font_size * 0.75,
                    "large" => parent.font_size * 1.5,
                    "huge" => parent.font_size * 2.5,
                    _ => style.font_size,
                };
            } else if let Some(font) = class.strip_prefix("ql-font-") {
                match font {
                    "serif" => style.font_family = SERIF.to_string(),
                    "monospace" => style.font_family = MONOSPACE.to_string(),
                    _ => {}
                }
            } else if class == "ql-syntax" && dom::is_tag(node, "pre") {
                style.background_color = Some("rgb(35, 36, 31)".to_string());
                style.color = "rgb(248, 248, 242)".to_string();
            }
        }
    }

    fn apply_declaration(
        &self,
        property: &str,
        value: &str,
        style: &mut ComputedStyle,
        parent: &ComputedStyle,
    ) {
        let value = value.trim_end_matches("!important").trim();
        if value.eq_ignore_ascii_case("inherit") {
            return;
        }
        match property {
            "font-size" => {
                if let Some(px) = font_size_px(value, parent.font_size, self.base.font_size) {
                    style.font_size = px;
                }
            }
            "font-family" => style.font_family = value.to_string(),
            "font-weight" => {
                if let Some(weight) = font_weight(value, parent.font_weight) {
                    style.font_weight = weight;
                }
            }
            "font-style" => style.font_style = value.to_ascii_lowercase(),
            "text-decoration" | "text-decoration-line" => {
                style.text_decoration = decoration_line(value);
            }
            "color" => style.color = normalize_color(value),
            "background-color" | "background" => {
                let color = normalize_color(value);
                style.background_color = (!is_transparent(&color)).then_some(color);
            }
            "text-align" => style.text_align = value.to_ascii_lowercase(),
            "line-height" => {
                if let Some(height) = line_height(value, style.font_size) {
                    style.line_height = height;
                }
            }
            "letter-spacing" => {
                if let Some(spacing) = letter_spacing(value, style.font_size) {
                    style.letter_spacing = spacing;
                }
            }
            _ => {}
        }
    }
}

/// Walks every element below `root` (pre-order) and writes its effective
/// style onto its own `style` attribute. `root` itself is the surface
/// container and is left untouched.
pub fn inline_computed_styles(root: &Handle, sheet: &StyleSheet) {
    let mut stack: Vec<(Handle, ComputedStyle)> = dom::element_children(root)
        .into_iter()
        .rev()
        .map(|child| (child, sheet.base.clone()))
        .collect();

    while let Some((node, parent_style)) = stack.pop() {
        let computed = sheet.compute(&node, &parent_style);
        write_inline(&node, &computed);
        for child in dom::element_children(&node).into_iter().rev() {
            stack.push((child, computed.clone()));
        }
    }
}

fn write_inline(node: &Handle, computed: &ComputedStyle) {
    let mut decls = dom::attr(node, "style")
        .map(|s| declarations(&s))
        .unwrap_or_default();

    set_declaration(&mut decls, "font-size", &format_px(computed.font_size));
    set_declaration(&mut decls, "font-family", &computed.font_family);
    set_declaration(&mut decls, "font-weight", &computed.font_weight.to_string());
    if computed.font_style != "normal" {
        set_declaration(&mut decls, "font-style", &computed.font_style);
    }
    if let Some(decoration) = computed.text_decoration.as_deref() {
        if decoration != "none" {
            set_declaration(&mut decls, "text-decoration", decoration);
        }
    }
    set_declaration(&mut decls, "color", &computed.color);
    if let Some(background) = computed.background_color.as_deref() {
        set_declaration(&mut decls, "background-color", background);
    }
    if BLOCK_ALIGN_TAGS.iter().any(|tag| dom::is_tag(node, tag)) {
        set_declaration(&mut decls, "text-align", &computed.text_align);
    }
    set_declaration(&mut decls, "line-height", &computed.line_height);
    if computed.letter_spacing != "normal" {
        set_declaration(&mut decls, "letter-spacing", &computed.letter_spacing);
    }

    dom::set_attr(node, "style", &serialize_declarations(&decls));
}

/// Splits a `style` attribute into `(property, value)` pairs, properties lowercased.
pub(crate) fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty()).then(|| (property, value.to_string()))
        })
        .collect()
}

/// Replaces the value of `property` in place or appends it.
pub(crate) fn set_declaration(decls: &mut Vec<(String, String)>, property: &str, value: &str) {
    match decls.iter_mut().find(|(p, _)| p == property) {
        Some((_, existing)) => *existing = value.to_string(),
        None => decls.push((property.to_string(), value.to_string())),
    }
}

pub(crate) fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(p, v)| format!("{p}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Value of a single property in a `style` attribute.
pub(crate) fn declaration(style: &str, property: &str) -> Option<String> {
    declarations(style)
        .into_iter()
        .rev()
        .find(|(p, _)| p == property)
        .map(|(_, v)| v)
}

fn format_px(px: f32) -> String {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{rounded}px")
    }
}

/// Parses a CSS length relative to `em` (px per em) and `rem` (px per rem).
fn length_px(value: &str, em: f32, rem: f32) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    let parse = |number: &str| number.trim().parse::<f32>().ok();
    if let Some(n) = value.strip_suffix("px") {
        parse(n)
    } else if let Some(n) = value.strip_suffix("pt") {
        parse(n).map(|n| n * 4.0 / 3.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        parse(n).map(|n| n * rem)
    } else if let Some(n) = value.strip_suffix("em") {
        parse(n).map(|n| n * em)
    } else if let Some(n) = value.strip_suffix('%') {
        parse(n).map(|n| n * em / 100.0)
    } else {
        None
    }
}

fn font_size_px(value: &str, parent_px: f32, root_px: f32) -> Option<f32> {
    let keyword = match value.to_ascii_lowercase().as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "xxx-large" => Some(48.0),
        "smaller" => Some(parent_px / 1.2),
        "larger" => Some(parent_px * 1.2),
        _ => None,
    };
    keyword
        .or_else(|| length_px(value, parent_px, root_px))
        .filter(|px| px.is_finite() && *px > 0.0)
}

fn bolder(parent: u16) -> u16 {
    match parent {
        0..=349 => 400,
        350..=549 => 700,
        _ => 900,
    }
}

fn lighter(parent: u16) -> u16 {
    match parent {
        0..=549 => 100,
        550..=749 => 400,
        _ => 700,
    }
}

fn font_weight(value: &str, parent: u16) -> Option<u16> {
    match value.to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some(bolder(parent)),
        "lighter" => Some(lighter(parent)),
        other => other
            .parse::<u16>()
            .ok()
            .filter(|w| (1..=1000).contains(w)),
    }
}

fn decoration_line(value: &str) -> Option<String> {
    let lines: Vec<&str> = value
        .split_whitespace()
        .filter(|token| matches!(*token, "underline" | "overline" | "line-through"))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn line_height(value: &str, font_px: f32) -> Option<String> {
    if value.eq_ignore_ascii_case("normal") {
        return Some("normal".to_string());
    }
    if value.parse::<f32>().is_ok() {
        return Some(value.to_string());
    }
    length_px(value, font_px, font_px).map(format_px)
}

fn letter_spacing(value: &str, font_px: f32) -> Option<String> {
    if value.eq_ignore_ascii_case("normal") {
        return Some("normal".to_string());
    }
    length_px(value, font_px, font_px).map(format_px)
}

/// Brings hex and `rgb()`/`rgba()` colors into the `rgb(r, g, b)` form a
/// browser reports; anything else (named colors, hsl) passes through.
fn normalize_color(value: &str) -> String {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return value.to_string();
        }
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return value.to_string(),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        return match (channel(0), channel(2), channel(4)) {
            (Some(r), Some(g), Some(b)) if expanded.len() == 8 => match channel(6) {
                Some(255) => format!("rgb({r}, {g}, {b})"),
                Some(a) => format!("rgba({r}, {g}, {b}, {})", trim_alpha(a as f32 / 255.0)),
                None => value.to_string(),
            },
            (Some(r), Some(g), Some(b)) => format!("rgb({r}, {g}, {b})"),
            _ => value.to_string(),
        };
    }

    let lower = value.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    if let Some(inner) = inner {
        let parts: Vec<&str> = inner
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        return match parts.as_slice() {
            [r, g, b] => format!("rgb({r}, {g}, {b})"),
            [r, g, b, "1"] => format!("rgb({r}, {g}, {b})"),
            [r, g, b, a] => format!("rgba({r}, {g}, {b}, {a})"),
            _ => value.to_string(),
        };
    }
    value.to_string()
}

fn trim_alpha(alpha: f32) -> String {
    let rounded = (alpha * 100.0).round() / 100.0;
    format!("{rounded}")
}

fn is_transparent(color: &str) -> bool {
    color.eq_ignore_ascii_case("transparent")
        || color
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|inner| inner.rsplit(',').next())
            .and_then(|alpha| alpha.trim().parse::<f32>().ok())
            .is_some_and(|alpha| alpha == 0.0)
}
