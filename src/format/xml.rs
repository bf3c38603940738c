//! Nested-element rendering of property bags.

use serde::{Deserialize, Serialize};

use crate::event::{Properties, PropertyValue, Scalar};

/// Options for the nested-element renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Element wrapping the whole bag (default: "properties").
    pub root_element_name: String,
    /// Element for each top-level property (default: "property").
    pub property_element_name: String,
    /// Element for sequence and dictionary items (default: "item").
    pub item_element_name: String,
    /// Container element for mappings (default: "dictionary").
    pub dictionary_element_name: String,
    /// Container element for sequences (default: "sequence").
    pub sequence_element_name: String,
    /// Container element for structures (default: "structure").
    pub structure_element_name: String,
    /// Use keys as element names instead of a `key` attribute.
    pub use_property_key_as_element_name: bool,
    /// Emit mapping items without their container.
    pub omit_dictionary_container_element: bool,
    /// Emit sequence items without their container.
    pub omit_sequence_container_element: bool,
    /// Emit structure fields without their container.
    pub omit_structure_container_element: bool,
    /// Drop elements whose content is empty (default: true).
    pub omit_element_if_empty: bool,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root_element_name: "properties".to_string(),
            property_element_name: "property".to_string(),
            item_element_name: "item".to_string(),
            dictionary_element_name: "dictionary".to_string(),
            sequence_element_name: "sequence".to_string(),
            structure_element_name: "structure".to_string(),
            use_property_key_as_element_name: false,
            omit_dictionary_container_element: false,
            omit_sequence_container_element: false,
            omit_structure_container_element: false,
            omit_element_if_empty: true,
        }
    }
}

/// Render a property bag as nested elements under the root element.
pub fn render_properties(properties: &Properties, options: &XmlOptions, max_depth: usize) -> String {
    let renderer = Renderer { options, max_depth };
    let root = valid_element_name(&options.root_element_name);

    let mut out = String::new();
    open(&mut out, &root, None);
    for (name, value) in properties.iter() {
        let inner = renderer.value(value, 0);
        renderer.keyed(&mut out, &options.property_element_name, name, &inner);
    }
    close(&mut out, &root);
    out
}

/// Make `name` usable as an element name.
///
/// Blank names become `x`. Names that do not start with a letter, or that
/// start with the reserved `xml` prefix, get an `x` prepended. Whitespace
/// and markup characters become `_`.
pub fn valid_element_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "x".to_string();
    }

    let mut out = String::with_capacity(trimmed.len() + 1);
    let starts_alpha = trimmed.chars().next().is_some_and(char::is_alphabetic);
    let reserved = trimmed
        .get(..3)
        .is_some_and(|p| p.eq_ignore_ascii_case("xml"));
    if !starts_alpha || reserved {
        out.push('x');
    }
    out.extend(trimmed.chars().map(|c| {
        if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
            c
        } else {
            '_'
        }
    }));
    out
}

struct Renderer<'a> {
    options: &'a XmlOptions,
    max_depth: usize,
}

impl Renderer<'_> {
    fn value(&self, value: &PropertyValue, depth: usize) -> String {
        if depth > self.max_depth {
            tracing::debug!(depth, "property nesting limit reached, value truncated");
            return String::new();
        }
        let opts = self.options;

        match value {
            PropertyValue::Scalar(scalar) => escape_text(&scalar.to_string()),
            PropertyValue::Sequence(items) => {
                let mut body = String::new();
                for item in items {
                    let inner = self.value(item, depth + 1);
                    self.element(&mut body, &opts.item_element_name, &inner);
                }
                self.container(
                    body,
                    &opts.sequence_element_name,
                    None,
                    opts.omit_sequence_container_element,
                )
            }
            PropertyValue::Mapping(entries) => {
                let mut body = String::new();
                for (key, item) in entries {
                    let inner = self.value(item, depth + 1);
                    self.keyed(&mut body, &opts.item_element_name, &key_text(key), &inner);
                }
                self.container(
                    body,
                    &opts.dictionary_element_name,
                    None,
                    opts.omit_dictionary_container_element,
                )
            }
            PropertyValue::Structure { type_tag, fields } => {
                let mut body = String::new();
                for (name, item) in fields {
                    let inner = self.value(item, depth + 1);
                    self.keyed(&mut body, &opts.property_element_name, name, &inner);
                }
                let (element, type_attr) = match (opts.use_property_key_as_element_name, type_tag) {
                    (true, Some(tag)) => (tag.as_str(), None),
                    (false, Some(tag)) => (opts.structure_element_name.as_str(), Some(tag.as_str())),
                    (_, None) => (opts.structure_element_name.as_str(), None),
                };
                self.container(
                    body,
                    element,
                    type_attr,
                    opts.omit_structure_container_element,
                )
            }
        }
    }

    fn container(&self, body: String, element: &str, type_attr: Option<&str>, omit: bool) -> String {
        if omit || (body.is_empty() && self.options.omit_element_if_empty) {
            return body;
        }
        let element = valid_element_name(element);
        let mut out = String::with_capacity(body.len() + 2 * element.len() + 5);
        open(&mut out, &element, type_attr.map(|t| ("type", t)));
        out.push_str(&body);
        close(&mut out, &element);
        out
    }

    fn element(&self, out: &mut String, element: &str, inner: &str) {
        if inner.is_empty() && self.options.omit_element_if_empty {
            return;
        }
        let element = valid_element_name(element);
        open(out, &element, None);
        out.push_str(inner);
        close(out, &element);
    }

    /// `<key>inner</key>` or `<element key='key'>inner</element>`.
    fn keyed(&self, out: &mut String, element: &str, key: &str, inner: &str) {
        if inner.is_empty() && self.options.omit_element_if_empty {
            return;
        }
        if self.options.use_property_key_as_element_name {
            self.element(out, key, inner);
        } else {
            let element = valid_element_name(element);
            open(out, &element, Some(("key", key)));
            out.push_str(inner);
            close(out, &element);
        }
    }
}

fn key_text(key: &Scalar) -> String {
    key.to_string()
}

fn open(out: &mut String, element: &str, attr: Option<(&str, &str)>) {
    out.push('<');
    out.push_str(element);
    if let Some((name, value)) = attr {
        out.push(' ');
        out.push_str(name);
        out.push_str("='");
        out.push_str(&escape_attr(value));
        out.push('\'');
    }
    out.push('>');
}

fn close(out: &mut String, element: &str) {
    out.push_str("</");
    out.push_str(element);
    out.push('>');
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
