use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::delta::Delta;

/// A post body, classified once where it is read from the content store.
#[derive(Debug, Clone, PartialEq)]
pub enum RichContent {
    /// Nothing to show: null, empty or whitespace-only.
    Empty,
    Delta(Delta),
    RawHtml(String),
    PlainText(String),
    /// Structured input that is not a usable delta, kept as its string form.
    Unrecognized(String),
}

/// Wire name of a [`RichContent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Empty,
    Delta,
    RawHtml,
    PlainText,
    Unrecognized,
}

impl RichContent {
    /// Classifies an untyped post body.
    pub fn from_value(value: &Value) -> Self {
        match value {
            // Falsy scalars have nothing to show, like null.
            Value::Null | Value::Bool(false) => RichContent::Empty,
            Value::Number(n) if n.as_f64() == Some(0.0) => RichContent::Empty,
            Value::String(text) => RichContent::from_text(text),
            Value::Bool(true) | Value::Number(_) => RichContent::PlainText(value.to_string()),
            Value::Array(_) | Value::Object(_) => {
                if Delta::looks_like_delta(value) {
                    match Delta::from_value(value) {
                        Ok(delta) => return RichContent::Delta(delta),
                        Err(e) => tracing::debug!("delta-shaped content did not parse: {}", e),
                    }
                }
                RichContent::Unrecognized(value.to_string())
            }
        }
    }

    /// Classifies a string body: markup, a JSON-encoded delta, or plain text.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return RichContent::Empty;
        }
        if trimmed.starts_with('<') {
            return RichContent::RawHtml(text.to_string());
        }
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                if Delta::looks_like_delta(&parsed) {
                    return match Delta::from_value(&parsed) {
                        Ok(delta) => RichContent::Delta(delta),
                        Err(e) => {
                            tracing::debug!("json content did not parse as a delta: {}", e);
                            RichContent::Unrecognized(text.to_string())
                        }
                    };
                }
            }
        }
        RichContent::PlainText(text.to_string())
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            RichContent::Empty => ContentKind::Empty,
            RichContent::Delta(_) => ContentKind::Delta,
            RichContent::RawHtml(_) => ContentKind::RawHtml,
            RichContent::PlainText(_) => ContentKind::PlainText,
            RichContent::Unrecognized(_) => ContentKind::Unrecognized,
        }
    }

    /// The input as a string, for the degraded sanitize-only path.
    pub fn to_raw_string(&self) -> String {
        match self {
            RichContent::Empty => String::new(),
            RichContent::Delta(delta) => serde_json::to_string(delta).unwrap_or_default(),
            RichContent::RawHtml(s) | RichContent::PlainText(s) | RichContent::Unrecognized(s) => {
                s.clone()
            }
        }
    }
}
