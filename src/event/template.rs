//! Message templates.
//!
//! A template is literal text with `{Name}` holes. Holes may carry an
//! alignment and a format: `{Name,-10:l}`. Doubled braces escape.
//! A hole whose property is missing renders as its raw source text.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::record::Properties;
use super::value::{DEFAULT_MAX_DEPTH, PropertyValue, Scalar};

/// Culture-style formatting rules used when rendering messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Quote string values in rendered messages (default: true).
    pub quote_strings: bool,

    /// Decimal separator for floating point values (default: '.').
    pub decimal_separator: char,

    /// strftime pattern for timestamps without an explicit format
    /// (default: RFC 3339).
    pub timestamp_format: Option<String>,

    /// Nesting limit for property values (default: 32).
    pub max_depth: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            quote_strings: true,
            decimal_separator: '.',
            timestamp_format: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A parsed template element.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateToken {
    /// Literal text, escapes already resolved.
    Text(String),
    /// A property hole.
    Hole {
        /// Source text including braces.
        raw: String,
        /// Property name.
        name: String,
        /// Padding width; negative pads on the right.
        alignment: Option<isize>,
        /// Format specifier after `:`.
        format: Option<String>,
    },
}

/// A parsed message template.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplate {
    tokens: Vec<TemplateToken>,
}

impl MessageTemplate {
    /// Parse template text. Malformed holes are kept as literal text.
    pub fn parse(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(pos) = rest.find(['{', '}']) {
            literal.push_str(&rest[..pos]);
            let brace = &rest[pos..pos + 1];
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix(brace) {
                literal.push_str(brace);
                rest = tail;
                continue;
            }
            if brace == "}" {
                literal.push('}');
                rest = after;
                continue;
            }

            let Some(end) = after.find('}') else {
                literal.push_str(&rest[pos..]);
                rest = "";
                break;
            };
            let raw = &rest[pos..pos + end + 2];
            match parse_hole(&after[..end], raw) {
                Some(hole) => {
                    if !literal.is_empty() {
                        tokens.push(TemplateToken::Text(std::mem::take(&mut literal)));
                    }
                    tokens.push(hole);
                }
                None => literal.push_str(raw),
            }
            rest = &after[end + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(TemplateToken::Text(literal));
        }
        Self { tokens }
    }

    /// Parsed tokens in source order.
    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    /// Render against a property bag.
    pub fn render(&self, properties: &Properties, options: &FormatOptions) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                TemplateToken::Text(text) => out.push_str(text),
                TemplateToken::Hole {
                    raw,
                    name,
                    alignment,
                    format,
                } => match properties.get(name) {
                    Some(value) => {
                        let mut rendered = String::new();
                        write_value(&mut rendered, value, format.as_deref(), options, 0);
                        pad(&mut out, &rendered, *alignment);
                    }
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

fn parse_hole(body: &str, raw: &str) -> Option<TemplateToken> {
    let body = body.strip_prefix(['@', '$']).unwrap_or(body);
    let (head, format) = match body.split_once(':') {
        Some((head, format)) => (head, Some(format.to_string())),
        None => (body, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, align)) => (name, Some(align.trim().parse::<isize>().ok()?)),
        None => (head, None),
    };

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    valid.then(|| TemplateToken::Hole {
        raw: raw.to_string(),
        name: name.to_string(),
        alignment,
        format,
    })
}

fn pad(out: &mut String, text: &str, alignment: Option<isize>) {
    let Some(width) = alignment else {
        out.push_str(text);
        return;
    };
    let fill = width.unsigned_abs().saturating_sub(text.chars().count());
    if width < 0 {
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', fill));
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(text);
    }
}

/// Write a property value in message form.
pub(crate) fn write_value(
    out: &mut String,
    value: &PropertyValue,
    format: Option<&str>,
    options: &FormatOptions,
    depth: usize,
) {
    if depth > options.max_depth {
        return;
    }
    if format == Some("j") {
        let json = crate::format::json::JsonValue::new(value, options.max_depth - depth);
        match serde_json::to_string(&json) {
            Ok(text) => out.push_str(&text),
            Err(e) => tracing::debug!(error = %e, "JSON rendering of property failed"),
        }
        return;
    }

    match value {
        PropertyValue::Scalar(scalar) => write_scalar(out, scalar, format, options),
        PropertyValue::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, None, options, depth + 1);
            }
            out.push(']');
        }
        PropertyValue::Mapping(entries) => {
            out.push('[');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('(');
                write_scalar(out, key, None, options);
                out.push_str(": ");
                write_value(out, item, None, options, depth + 1);
                out.push(')');
            }
            out.push(']');
        }
        PropertyValue::Structure { type_tag, fields } => {
            if let Some(tag) = type_tag {
                out.push_str(tag);
                out.push(' ');
            }
            out.push_str("{ ");
            for (i, (name, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                write_value(out, item, None, options, depth + 1);
            }
            if !fields.is_empty() {
                out.push(' ');
            }
            out.push('}');
        }
    }
}

fn write_scalar(out: &mut String, scalar: &Scalar, format: Option<&str>, options: &FormatOptions) {
    match scalar {
        Scalar::Null => out.push_str("null"),
        Scalar::Str(s) if format == Some("l") || !options.quote_strings => out.push_str(s),
        Scalar::Str(s) => {
            out.push('"');
            out.push_str(&s.replace('"', "\\\""));
            out.push('"');
        }
        Scalar::Float(x) => {
            let text = match format.and_then(fixed_precision) {
                Some(precision) => format!("{x:.precision$}"),
                None => x.to_string(),
            };
            if options.decimal_separator == '.' {
                out.push_str(&text);
            } else {
                out.push_str(&text.replace('.', &options.decimal_separator.to_string()));
            }
        }
        Scalar::Timestamp(ts) => {
            let pattern = format
                .filter(|f| *f != "l")
                .or(options.timestamp_format.as_deref());
            let mut rendered = String::new();
            match pattern {
                Some(p) if write!(rendered, "{}", ts.format(p)).is_ok() => out.push_str(&rendered),
                _ => out.push_str(&ts.to_rfc3339()),
            }
        }
        other => {
            let _ = write!(out, "{other}");
        }
    }
}

/// `F2` / `f2` style fixed precision.
fn fixed_precision(format: &str) -> Option<usize> {
    format
        .strip_prefix(['F', 'f'])
        .and_then(|digits| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_text_and_holes() {
        let template = MessageTemplate::parse("User {Name} logged in from {Ip,15:l}");
        assert_eq!(template.tokens().len(), 4);
        match &template.tokens()[3] {
            TemplateToken::Hole {
                name,
                alignment,
                format,
                ..
            } => {
                assert_eq!(name, "Ip");
                assert_eq!(*alignment, Some(15));
                assert_eq!(format.as_deref(), Some("l"));
            }
            other => panic!("expected hole, got {other:?}"),
        }
    }

    #[test]
    fn test_render_quotes_strings_by_default() {
        let template = MessageTemplate::parse("Hello {Name}");
        let out = template.render(&props(&[("Name", "World".into())]), &FormatOptions::default());
        assert_eq!(out, "Hello \"World\"");
    }

    #[test]
    fn test_render_literal_format_and_quoting_off() {
        let template = MessageTemplate::parse("Hello {Name:l}");
        let bag = props(&[("Name", "World".into())]);
        assert_eq!(template.render(&bag, &FormatOptions::default()), "Hello World");

        let options = FormatOptions {
            quote_strings: false,
            ..Default::default()
        };
        assert_eq!(
            MessageTemplate::parse("Hello {Name}").render(&bag, &options),
            "Hello World"
        );
    }

    #[test]
    fn test_render_missing_property_keeps_hole() {
        let template = MessageTemplate::parse("Value is {Missing,5:F2}");
        assert_eq!(
            template.render(&Properties::default(), &FormatOptions::default()),
            "Value is {Missing,5:F2}"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let template = MessageTemplate::parse("{{literal}} and {Count} }");
        let out = template.render(&props(&[("Count", 3.into())]), &FormatOptions::default());
        assert_eq!(out, "{literal} and 3 }");
    }

    #[test]
    fn test_unterminated_hole_is_text() {
        let template = MessageTemplate::parse("broken {hole");
        assert_eq!(
            template.tokens(),
            &[TemplateToken::Text("broken {hole".to_string())]
        );
    }

    #[test]
    fn test_float_precision_and_separator() {
        let bag = props(&[("Price", 3.14159.into())]);
        let options = FormatOptions {
            decimal_separator: ',',
            ..Default::default()
        };
        assert_eq!(
            MessageTemplate::parse("{Price:F2}").render(&bag, &options),
            "3,14"
        );
    }

    #[test]
    fn test_alignment() {
        let bag = props(&[("N", 7.into())]);
        let options = FormatOptions::default();
        assert_eq!(MessageTemplate::parse("[{N,3}]").render(&bag, &options), "[  7]");
        assert_eq!(MessageTemplate::parse("[{N,-3}]").render(&bag, &options), "[7  ]");
    }

    #[test]
    fn test_timestamp_format() {
        let ts: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let bag = props(&[("At", ts.into())]);
        let out = MessageTemplate::parse("{At:%Y-%m-%d}").render(&bag, &FormatOptions::default());
        assert_eq!(out, "2024-03-01");
    }

    #[test]
    fn test_json_format() {
        let bag = props(&[("Tags", PropertyValue::from(vec!["a".into(), 2.into()]))]);
        let out = MessageTemplate::parse("{Tags:j}").render(&bag, &FormatOptions::default());
        assert_eq!(out, "[\"a\",2]");
    }

    #[test]
    fn test_destructuring_hint_is_ignored() {
        let bag = props(&[("User", "bob".into())]);
        let out = MessageTemplate::parse("{@User}").render(&bag, &FormatOptions::default());
        assert_eq!(out, "\"bob\"");
    }

    #[test]
    fn test_depth_limit_truncates() {
        let mut value = PropertyValue::from(1);
        for _ in 0..5 {
            value = PropertyValue::from(vec![value]);
        }
        let options = FormatOptions {
            max_depth: 2,
            ..Default::default()
        };
        let mut out = String::new();
        write_value(&mut out, &value, None, &options, 0);
        assert_eq!(out, "[[[]]]");
    }
}
