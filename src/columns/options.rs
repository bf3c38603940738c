//! Column configuration types.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::format::XmlOptions;

// =============================================================================
// Roles and kinds
// =============================================================================

/// Semantic meaning of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum ColumnRole {
    /// Row identifier generated by a datastore function or sequence.
    Id,
    /// Rendered message.
    Message,
    /// Raw message template.
    MessageTemplate,
    /// Severity, as name or ordinal code.
    Level,
    /// Event timestamp.
    Timestamp,
    /// Exception text.
    Exception,
    /// Nested-element property bag.
    Properties,
    /// Whole event as a structured record.
    #[strum(to_string = "SerializedEvent", serialize = "LogEvent")]
    SerializedEvent,
    /// User-declared column filled from a property.
    Custom,
}

impl ColumnRole {
    /// Column name used when no override is configured.
    pub fn default_name(self) -> &'static str {
        match self {
            ColumnRole::Id => "Id",
            ColumnRole::Message => "Message",
            ColumnRole::MessageTemplate => "MessageTemplate",
            ColumnRole::Level => "Level",
            ColumnRole::Timestamp => "TimeStamp",
            ColumnRole::Exception => "Exception",
            ColumnRole::Properties => "Properties",
            ColumnRole::SerializedEvent => "LogEvent",
            ColumnRole::Custom => "Custom",
        }
    }
}

impl Serialize for ColumnRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for ColumnRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        ColumnRole::from_str(&name)
            .map_err(|_| serde::de::Error::custom(format!("unknown column role '{name}'")))
    }
}

/// Storage kind of a column value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ValueKind {
    /// Character data.
    Text,
    /// 16-bit integer.
    SmallInt,
    /// 64-bit integer.
    Int,
    /// Double precision float.
    Float,
    /// Boolean.
    Bool,
    /// Timestamp without zone.
    Timestamp,
}

/// Maximum length of the Level column when stored as text.
pub const LEVEL_TEXT_MAX_LENGTH: usize = 128;

// =============================================================================
// Per-role options
// =============================================================================

/// Name override for a standard column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedColumn {
    /// Column name (defaults to the role's standard name).
    pub column_name: Option<String>,
}

/// Level column options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelColumn {
    /// Column name (default: "Level").
    pub column_name: Option<String>,
    /// Store the ordinal code instead of the level name.
    pub store_as_enum: bool,
}

/// Timestamp column options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampColumn {
    /// Column name (default: "TimeStamp").
    pub column_name: Option<String>,
    /// Store UTC instead of the event's local wall-clock time.
    pub convert_to_utc: bool,
}

/// Properties column options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesColumn {
    /// Column name (default: "Properties").
    pub column_name: Option<String>,
    /// Leave out properties that have their own additional column.
    pub exclude_additional_properties: bool,
    /// Element naming and omission rules.
    #[serde(flatten)]
    pub xml: XmlOptions,
}

/// Serialized event column options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEventColumn {
    /// Column name (default: "LogEvent").
    pub column_name: Option<String>,
    /// Leave out properties that have their own additional column.
    pub exclude_additional_properties: bool,
    /// Include the rendered message (default: true).
    pub render_message: bool,
}

impl Default for LogEventColumn {
    fn default() -> Self {
        Self {
            column_name: None,
            exclude_additional_properties: false,
            render_message: true,
        }
    }
}

/// A user-declared column filled from the event property of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalColumn {
    /// Column name, matched case-insensitively against property names.
    pub name: String,
    /// Declared storage kind (default: text).
    #[serde(default = "default_kind")]
    pub kind: ValueKind,
    /// Whether a missing property may be stored as null (default: true).
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Maximum text length; unbounded when absent.
    #[serde(default)]
    pub max_length: Option<usize>,
}

fn default_kind() -> ValueKind {
    ValueKind::Text
}

fn default_nullable() -> bool {
    true
}

impl AdditionalColumn {
    /// Nullable text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Text,
            nullable: true,
            max_length: None,
        }
    }

    /// Nullable column of the given kind.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            kind,
            ..Self::text(name)
        }
    }

    /// Mark the column as NOT NULL.
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

// =============================================================================
// Column options
// =============================================================================

/// Which columns to write and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOptions {
    /// Standard columns in insert order.
    pub store: Vec<ColumnRole>,
    /// Id column.
    pub id: NamedColumn,
    /// Message column.
    pub message: NamedColumn,
    /// MessageTemplate column.
    pub message_template: NamedColumn,
    /// Level column.
    pub level: LevelColumn,
    /// TimeStamp column.
    pub timestamp: TimestampColumn,
    /// Exception column.
    pub exception: NamedColumn,
    /// Properties column.
    pub properties: PropertiesColumn,
    /// LogEvent column.
    pub log_event: LogEventColumn,
    /// Extra columns appended after the standard ones.
    pub additional: Vec<AdditionalColumn>,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            store: vec![
                ColumnRole::Id,
                ColumnRole::Message,
                ColumnRole::MessageTemplate,
                ColumnRole::Level,
                ColumnRole::Timestamp,
                ColumnRole::Exception,
                ColumnRole::Properties,
            ],
            id: NamedColumn::default(),
            message: NamedColumn::default(),
            message_template: NamedColumn::default(),
            level: LevelColumn::default(),
            timestamp: TimestampColumn::default(),
            exception: NamedColumn::default(),
            properties: PropertiesColumn::default(),
            log_event: LogEventColumn::default(),
            additional: Vec::new(),
        }
    }
}

impl ColumnOptions {
    /// Only the given additional columns, no standard ones.
    pub fn custom_only(additional: Vec<AdditionalColumn>) -> Self {
        Self {
            store: Vec::new(),
            additional,
            ..Self::default()
        }
    }

    /// Configured name for a standard role.
    pub fn column_name(&self, role: ColumnRole) -> &str {
        let name = match role {
            ColumnRole::Id => self.id.column_name.as_deref(),
            ColumnRole::Message => self.message.column_name.as_deref(),
            ColumnRole::MessageTemplate => self.message_template.column_name.as_deref(),
            ColumnRole::Level => self.level.column_name.as_deref(),
            ColumnRole::Timestamp => self.timestamp.column_name.as_deref(),
            ColumnRole::Exception => self.exception.column_name.as_deref(),
            ColumnRole::Properties => self.properties.column_name.as_deref(),
            ColumnRole::SerializedEvent => self.log_event.column_name.as_deref(),
            ColumnRole::Custom => None,
        };
        name.unwrap_or(role.default_name())
    }
}
