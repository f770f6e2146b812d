use std::borrow::Cow;
use std::collections::HashSet;

use ammonia::Builder;

/// Tags allowed on top of ammonia's default structural/formatting set.
const EXTRA_TAGS: &[&str] = &[
    "iframe", "table", "thead", "tbody", "tfoot", "tr", "td", "th", "video", "audio", "source",
    "figure", "figcaption", "caption", "pre", "code", "span", "ul", "ol", "li",
];

/// Attributes allowed on every tag.
const GENERIC_ATTRIBUTES: &[&str] = &["style", "class", "id", "width", "height"];

const IFRAME_ATTRIBUTES: &[&str] = &[
    "src", "srcdoc", "allow", "allowfullscreen", "frameborder", "loading", "referrerpolicy",
    "sandbox",
];

const MEDIA_ATTRIBUTES: &[&str] = &[
    "src", "controls", "playsinline", "autoplay", "muted", "loop", "preload", "poster",
];

/// Removed together with everything inside them.
const FORBIDDEN_CONTENT_TAGS: &[&str] = &["object", "embed"];

/// CSS properties that survive in `style` attributes.
const STYLE_PROPERTIES: &[&str] = &[
    "font-size", "font-family", "font-weight", "font-style", "text-decoration",
    "text-decoration-line", "color", "background-color", "text-align", "line-height",
    "letter-spacing", "white-space", "direction", "vertical-align", "text-indent",
    "list-style-type", "display", "width", "height", "max-width", "min-width", "max-height",
    "margin", "margin-top", "margin-right", "margin-bottom", "margin-left", "padding",
    "padding-top", "padding-right", "padding-bottom", "padding-left", "border", "border-left",
    "border-collapse", "float", "aspect-ratio",
];

/// Allow-list HTML sanitizer for rich post content.
///
/// Whitelist-based: known-safe tags and attributes survive, everything else
/// is dropped. `<script>`, `<style>`, `<object>` and `<embed>` are removed
/// with their entire content. `srcdoc` documents are sanitized recursively
/// with ammonia's strict defaults so an iframe cannot smuggle a script in.
pub struct Sanitizer {
    cleaner: Builder<'static>,
}

impl Sanitizer {
    pub fn new() -> Self {
        let mut cleaner = Builder::default();
        cleaner
            .strip_comments(true)
            .add_tags(EXTRA_TAGS)
            .add_generic_attributes(GENERIC_ATTRIBUTES)
            .add_generic_attribute_prefixes(&["data-"])
            .add_tag_attributes("iframe", IFRAME_ATTRIBUTES)
            .add_tag_attributes("video", MEDIA_ATTRIBUTES)
            .add_tag_attributes("audio", MEDIA_ATTRIBUTES)
            .add_tag_attributes("source", &["src", "type"])
            .add_tag_attributes("a", &["target", "rel"])
            .add_clean_content_tags(FORBIDDEN_CONTENT_TAGS)
            .filter_style_properties(STYLE_PROPERTIES.iter().copied().collect::<HashSet<_>>())
            // Links keep an explicit rel; the normalizer adds a safe default when absent.
            .link_rel(None)
            .attribute_filter(|_element, attribute, value| match attribute {
                "srcdoc" => Some(Cow::Owned(ammonia::clean(value))),
                _ => Some(Cow::Borrowed(value)),
            });
        Self { cleaner }
    }

    pub fn clean(&self, input: &str) -> String {
        self.cleaner.clean(input).to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_with_content() {
        let out = Sanitizer::new().clean("<p>hi</p><script>alert('x')</script>");
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn strips_object_and_embed_with_content() {
        let out = Sanitizer::new().clean("<object data=\"x\">fallback</object><embed src=\"y\">ok");
        assert!(!out.contains("object"));
        assert!(!out.contains("embed"));
        assert!(!out.contains("fallback"));
        assert!(out.contains("ok"));
    }

    #[test]
    fn keeps_editor_attributes() {
        let out = Sanitizer::new()
            .clean("<p class=\"ql-list\" data-list=\"ordered\" style=\"color: red\">x</p>");
        assert!(out.contains("class=\"ql-list\""));
        assert!(out.contains("data-list=\"ordered\""));
        assert!(out.contains("style=\"color"));
        assert!(out.contains("red"));
    }

    #[test]
    fn drops_event_handlers_and_unknown_style_properties() {
        let out = Sanitizer::new()
            .clean("<span onclick=\"evil()\" style=\"color: red; position: fixed\">x</span>");
        assert!(!out.contains("onclick"));
        assert!(!out.contains("position"));
        assert!(out.contains("color"));
    }

    #[test]
    fn keeps_iframe_and_cleans_srcdoc() {
        let out = Sanitizer::new().clean(
            "<iframe src=\"https://x/y\" width=\"100%\" sandbox=\"\" srcdoc=\"<b>a</b><script>x()</script>\"></iframe>",
        );
        assert!(out.contains("<iframe"));
        assert!(out.contains("src=\"https://x/y\""));
        assert!(out.contains("sandbox"));
        assert!(!out.contains("script"));
    }

    #[test]
    fn keeps_explicit_link_attributes() {
        let out = Sanitizer::new().clean("<a href=\"https://x\" target=\"_self\" rel=\"nofollow\">t</a>");
        assert!(out.contains("target=\"_self\""));
        assert!(out.contains("rel=\"nofollow\""));
    }

    #[test]
    fn rejects_javascript_urls() {
        let out = Sanitizer::new().clean("<a href=\"javascript:alert(1)\">t</a>");
        assert!(!out.contains("javascript"));
    }
}
