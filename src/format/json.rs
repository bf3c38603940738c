//! Structured-record rendering of whole events.

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

use crate::event::{FormatOptions, LogEvent, Properties, PropertyValue, Scalar};

/// Serializes a [`PropertyValue`] as JSON, cutting off below a nesting limit.
///
/// Structures become objects with an optional leading `_typeTag` member,
/// mappings become objects keyed by the key's text, sequences become arrays.
#[derive(Debug, Clone, Copy)]
pub struct JsonValue<'a> {
    value: &'a PropertyValue,
    depth: usize,
    max_depth: usize,
}

impl<'a> JsonValue<'a> {
    /// Wrap a top-level value allowing `max_depth` levels of nesting.
    pub fn new(value: &'a PropertyValue, max_depth: usize) -> Self {
        Self {
            value,
            depth: 0,
            max_depth,
        }
    }

    fn child(&self, value: &'a PropertyValue) -> Self {
        Self {
            value,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }
}

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > self.max_depth {
            tracing::debug!(depth = self.depth, "property nesting limit reached, value truncated");
            return serializer.serialize_unit();
        }

        match self.value {
            PropertyValue::Scalar(scalar) => JsonScalar(scalar).serialize(serializer),
            PropertyValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.child(item))?;
                }
                seq.end()
            }
            PropertyValue::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in entries {
                    map.serialize_entry(&key.to_string(), &self.child(item))?;
                }
                map.end()
            }
            PropertyValue::Structure { type_tag, fields } => {
                let mut map = serializer.serialize_map(None)?;
                if let Some(tag) = type_tag {
                    map.serialize_entry("_typeTag", tag)?;
                }
                for (name, item) in fields {
                    map.serialize_entry(name, &self.child(item))?;
                }
                map.end()
            }
        }
    }
}

struct JsonScalar<'a>(&'a Scalar);

impl Serialize for JsonScalar<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::UInt(u) => serializer.serialize_u64(*u),
            Scalar::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Scalar::Float(x) if x.is_nan() => serializer.serialize_str("NaN"),
            Scalar::Float(x) if *x > 0.0 => serializer.serialize_str("Infinity"),
            Scalar::Float(_) => serializer.serialize_str("-Infinity"),
            Scalar::Str(s) => serializer.serialize_str(s),
            Scalar::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
        }
    }
}

struct PropertyMap<'a> {
    properties: &'a Properties,
    max_depth: usize,
}

impl Serialize for PropertyMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for (name, value) in self.properties.iter() {
            map.serialize_entry(name, &JsonValue::new(value, self.max_depth))?;
        }
        map.end()
    }
}

struct EventRecord<'a> {
    event: &'a LogEvent,
    properties: &'a Properties,
    rendered: Option<String>,
    max_depth: usize,
}

impl Serialize for EventRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Timestamp", &self.event.timestamp.to_rfc3339())?;
        map.serialize_entry("Level", self.event.level.as_ref())?;
        map.serialize_entry("MessageTemplate", &self.event.message_template)?;
        if let Some(rendered) = &self.rendered {
            map.serialize_entry("RenderedMessage", rendered)?;
        }
        if let Some(exception) = &self.event.exception {
            map.serialize_entry("Exception", exception)?;
        }
        if !self.properties.is_empty() {
            map.serialize_entry(
                "Properties",
                &PropertyMap {
                    properties: self.properties,
                    max_depth: self.max_depth,
                },
            )?;
        }
        map.end()
    }
}

/// Render an event as one JSON object.
///
/// `properties` is the (possibly filtered) bag to emit in place of the
/// event's own properties.
pub fn render_event(
    event: &LogEvent,
    properties: &Properties,
    options: &FormatOptions,
    render_message: bool,
) -> Result<String, serde_json::Error> {
    let record = EventRecord {
        event,
        properties,
        rendered: render_message.then(|| event.render_message(options)),
        max_depth: options.max_depth,
    };
    serde_json::to_string(&record)
}
