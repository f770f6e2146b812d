use std::sync::LazyLock;

use regex::Regex;

static HASHTAG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("static regex"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Escapes the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Splits free-form hashtag input ("rust, #web  axum") into `#`-prefixed tags.
pub fn parse_hashtags(input: &str) -> Vec<String> {
    HASHTAG_SEPARATORS
        .split(input)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('#') {
                s.to_string()
            } else {
                format!("#{s}")
            }
        })
        .collect()
}

/// Link to the tag page for `tag`.
pub fn hashtag_href(tag: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();
    format!("tag.html?tag={encoded}")
}

/// Collapses whitespace and truncates to `max_chars`, appending an ellipsis when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let collapsed = WHITESPACE_RUNS.replace_all(text.trim(), " ");
    if collapsed.chars().count() > max_chars {
        let cut: String = collapsed.chars().take(max_chars).collect();
        format!("{cut}…")
    } else {
        collapsed.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn parses_hashtag_input() {
        assert_eq!(
            parse_hashtags(" rust, #Web  axum,,"),
            vec!["#rust", "#Web", "#axum"]
        );
        assert!(parse_hashtags("  ").is_empty());
    }

    #[test]
    fn hashtag_links_are_encoded() {
        assert_eq!(hashtag_href("#rust lang"), "tag.html?tag=%23rust+lang");
    }

    #[test]
    fn snippet_truncates_on_chars() {
        assert_eq!(snippet("  a \n\n b  ", 10), "a b");
        assert_eq!(snippet("ăâêôơư", 3), "ăâê…");
    }
}
