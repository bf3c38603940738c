//! Log event records and property bags.

use chrono::{DateTime, FixedOffset, Local};

use super::level::Level;
use super::template::{FormatOptions, MessageTemplate};
use super::value::PropertyValue;

/// Ordered property bag.
///
/// Iteration follows insertion order. Inserting an existing name replaces
/// the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertyValue)>);

impl Properties {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Case-insensitive lookup; the first match in order wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&PropertyValue> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this bag without the names matched by `exclude`.
    pub fn without(&self, exclude: impl Fn(&str) -> bool) -> Properties {
        Properties(
            self.0
                .iter()
                .filter(|(n, _)| !exclude(n))
                .cloned()
                .collect(),
        )
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        let mut bag = Properties::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

/// A captured log event.
///
/// Events are produced by the logging front end, queued by the sink and
/// consumed by exactly one flush.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// When the event happened, with the producer's offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Severity.
    pub level: Level,
    /// Raw message template text.
    pub message_template: String,
    /// Full text of the attached error, if any.
    pub exception: Option<String>,
    /// Captured properties.
    pub properties: Properties,
}

impl LogEvent {
    /// Create an event stamped with the current local time.
    pub fn new(level: Level, message_template: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            level,
            message_template: message_template.into(),
            exception: None,
            properties: Properties::new(),
        }
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach error text.
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Add a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Render the message template against this event's properties.
    pub fn render_message(&self, options: &FormatOptions) -> String {
        MessageTemplate::parse(&self.message_template).render(&self.properties, options)
    }
}
