//! Symbolic references embedded in layer fields.
//!
//! Layer `style`, `transform`, `source`, `text`, `start` and `end` values
//! may contain marker strings that are substituted at resolve time:
//!
//! | Marker                  | Token                      |
//! |-------------------------|----------------------------|
//! | `$duration`             | [`Token::CurrentDuration`] |
//! | `$theme.colors.<name>`  | [`Token::ThemeColor`]      |
//! | `$theme.fonts.<name>`   | [`Token::ThemeFont`]       |
//! | `$placeholder.<id>`     | [`Token::Placeholder`]     |
//!
//! Markers are parsed once, when the definition is deserialized, into a
//! [`TokenValue`] tree. Serializing the tree writes the markers back, so a
//! definition survives a load/save cycle unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const DURATION_MARKER: &str = "$duration";
const THEME_COLOR_PREFIX: &str = "$theme.colors.";
const THEME_FONT_PREFIX: &str = "$theme.fonts.";
const PLACEHOLDER_PREFIX: &str = "$placeholder.";

/// A parsed symbolic reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    /// The composition's active duration in seconds.
    CurrentDuration,
    /// A named color in the active theme.
    ThemeColor(String),
    /// A named font family in the active theme.
    ThemeFont(String),
    /// A caller-filled placeholder value.
    Placeholder(String),
}

impl Token {
    /// Parse a marker string. Returns `None` for anything that is not a
    /// well-formed marker, including prefixes with an empty name.
    ///
    /// Shapes are checked in precedence order: current duration, theme
    /// color, theme font, placeholder.
    pub fn parse(raw: &str) -> Option<Token> {
        if raw == DURATION_MARKER {
            return Some(Token::CurrentDuration);
        }
        let named = |prefix: &str| {
            raw.strip_prefix(prefix)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };
        if let Some(name) = named(THEME_COLOR_PREFIX) {
            return Some(Token::ThemeColor(name));
        }
        if let Some(name) = named(THEME_FONT_PREFIX) {
            return Some(Token::ThemeFont(name));
        }
        named(PLACEHOLDER_PREFIX).map(Token::Placeholder)
    }

    /// The marker string this token was parsed from.
    pub fn marker(&self) -> String {
        match self {
            Token::CurrentDuration => DURATION_MARKER.to_string(),
            Token::ThemeColor(name) => format!("{THEME_COLOR_PREFIX}{name}"),
            Token::ThemeFont(name) => format!("{THEME_FONT_PREFIX}{name}"),
            Token::Placeholder(id) => format!("{PLACEHOLDER_PREFIX}{id}"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marker())
    }
}

/// A field value that may contain tokens at any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum TokenValue {
    /// A symbolic reference.
    Token(Token),
    /// A scalar literal: null, bool, number or plain string.
    Literal(Value),
    /// An ordered sequence.
    Array(Vec<TokenValue>),
    /// A map with deterministic key order.
    Object(BTreeMap<String, TokenValue>),
}

impl TokenValue {
    /// A numeric literal.
    pub fn number(n: f64) -> Self {
        TokenValue::Literal(
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        )
    }

    /// A plain string literal (never parsed as a marker).
    pub fn text(s: impl Into<String>) -> Self {
        TokenValue::Literal(Value::String(s.into()))
    }

    /// The token, if this value is exactly one.
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            TokenValue::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Numeric value of a literal number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TokenValue::Literal(value) => value.as_f64(),
            _ => None,
        }
    }

    /// Every token in this subtree, in traversal order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match self {
            TokenValue::Token(token) => out.push(token),
            TokenValue::Literal(_) => {}
            TokenValue::Array(items) => items.iter().for_each(|v| v.collect_tokens(out)),
            TokenValue::Object(map) => map.values().for_each(|v| v.collect_tokens(out)),
        }
    }
}

impl From<Value> for TokenValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => match Token::parse(&s) {
                Some(token) => TokenValue::Token(token),
                None => TokenValue::Literal(Value::String(s)),
            },
            Value::Array(items) => {
                TokenValue::Array(items.into_iter().map(TokenValue::from).collect())
            }
            Value::Object(map) => TokenValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, TokenValue::from(v)))
                    .collect(),
            ),
            scalar => TokenValue::Literal(scalar),
        }
    }
}

impl From<TokenValue> for Value {
    fn from(value: TokenValue) -> Self {
        match value {
            TokenValue::Token(token) => Value::String(token.marker()),
            TokenValue::Literal(v) => v,
            TokenValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            TokenValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Token> for TokenValue {
    fn from(token: Token) -> Self {
        TokenValue::Token(token)
    }
}

/// Parses markers exactly like a deserialized string would.
impl From<&str> for TokenValue {
    fn from(raw: &str) -> Self {
        TokenValue::from(Value::String(raw.to_string()))
    }
}

impl From<f64> for TokenValue {
    fn from(n: f64) -> Self {
        TokenValue::number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_all_marker_shapes() {
        assert_eq!(Token::parse("$duration"), Some(Token::CurrentDuration));
        assert_eq!(
            Token::parse("$theme.colors.primary"),
            Some(Token::ThemeColor("primary".into()))
        );
        assert_eq!(
            Token::parse("$theme.fonts.heading"),
            Some(Token::ThemeFont("heading".into()))
        );
        assert_eq!(
            Token::parse("$placeholder.headline"),
            Some(Token::Placeholder("headline".into()))
        );
    }

    #[test]
    fn test_non_markers_stay_literal() {
        for raw in ["#FFD700", "$durations", "$theme.colors.", "$theme.sizes.x", "hello"] {
            assert_eq!(Token::parse(raw), None, "{raw} should not parse");
        }
    }

    #[test]
    fn test_value_tree_parses_nested_markers_once() {
        let value: TokenValue = serde_json::from_value(json!({
            "color": "$theme.colors.primary",
            "shadow": ["0 2px", "$theme.colors.shadow"],
            "fontSize": 64
        }))
        .unwrap();

        let tokens = value.tokens();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains(&&Token::ThemeColor("primary".into())));
        assert!(tokens.contains(&&Token::ThemeColor("shadow".into())));
    }

    #[test]
    fn test_serialization_writes_markers_back() {
        let raw = json!({ "fontFamily": "$theme.fonts.body", "end": "$duration", "x": 40 });
        let value: TokenValue = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&value).unwrap(), raw);
    }

    #[test]
    fn test_text_constructor_is_never_a_token() {
        let value = TokenValue::text("$duration");
        assert!(value.as_token().is_none());
    }
}
