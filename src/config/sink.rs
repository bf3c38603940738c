//! Sink configuration structures.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnOptions, ColumnSchema};
use crate::error::SinkError;
use crate::event::FormatOptions;
use crate::insert::{BindMode, InsertSynthesizer};
use crate::sink::FlushPolicy;

use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default target table.
pub const DEFAULT_TABLE: &str = "LOG";

/// Default number of events the queue may hold before dropping.
pub const DEFAULT_QUEUE_LIMIT: usize = 10_000;

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_queue_limit() -> Option<usize> {
    Some(DEFAULT_QUEUE_LIMIT)
}

// =============================================================================
// Sink Configuration
// =============================================================================

/// Top-level sink configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Target table (default: "LOG").
    #[serde(default = "default_table")]
    pub table: String,

    /// SQL expression producing the Id value, e.g. `LOG_SEQ.NEXTVAL`.
    /// Without it the Id column is left out.
    #[serde(default)]
    pub id_function: Option<String>,

    /// Statement shape (default: multi_row).
    #[serde(default)]
    pub bind_mode: BindMode,

    /// Queue limit (default: 10000); `null` leaves the queue unbounded.
    #[serde(default = "default_queue_limit")]
    pub queue_limit: Option<usize>,

    /// Flush strategy (default: burst, 100 events / 5s).
    #[serde(default)]
    pub batching: FlushPolicy,

    /// Column layout.
    #[serde(default)]
    pub columns: ColumnOptions,

    /// Value formatting.
    #[serde(default)]
    pub format: FormatOptions,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            id_function: None,
            bind_mode: BindMode::default(),
            queue_limit: default_queue_limit(),
            batching: FlushPolicy::default(),
            columns: ColumnOptions::default(),
            format: FormatOptions::default(),
        }
    }
}

impl SinkConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text.
    ///
    /// `${VAR}` references in `table` and `id_function` are expanded; an
    /// unset variable without a default is rejected.
    ///
    /// # Errors
    /// Returns `ConfigError` if the text cannot be parsed, expanded or validated.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.table = expand_env_vars(&config.table, "table")?;
        config.id_function = match config.id_function.take() {
            Some(function) => Some(expand_env_vars(&function, "id_function")?),
            None => None,
        }
        .filter(|f| !f.trim().is_empty());
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Resolves the column schema and statement layout, so every error a
    /// sink built from this config could raise at construction shows up here.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "table name must not be empty".to_string(),
            ));
        }

        self.batching.validate()?;

        let schema = ColumnSchema::resolve(&self.columns, self.id_function.as_deref())
            .map_err(validation_error)?;
        InsertSynthesizer::new(&self.table, &schema, self.bind_mode).map_err(validation_error)?;

        Ok(())
    }
}

fn validation_error(err: SinkError) -> ConfigError {
    match err {
        SinkError::Configuration(msg) => ConfigError::ValidationError(msg),
        other => ConfigError::ValidationError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::columns::{ColumnRole, ValueKind};
    use crate::sink::Strategy;

    #[test]
    fn test_config_default() {
        let config = SinkConfig::default();
        assert_eq!(config.table, "LOG");
        assert_eq!(config.queue_limit, Some(DEFAULT_QUEUE_LIMIT));
        assert_eq!(config.bind_mode, BindMode::MultiRow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_minimal() {
        let config = SinkConfig::from_yaml_str("table: APP_LOG\n").unwrap();
        assert_eq!(config.table, "APP_LOG");
        assert_eq!(config.batching, FlushPolicy::default());
        assert_eq!(config.columns, ColumnOptions::default());
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
table: AUDIT
id_function: AUDIT_SEQ.NEXTVAL
bind_mode: array_bind
queue_limit: null
batching:
  strategy: periodic
  batch_limit: 20
  period: 2s
columns:
  store: [Id, Message, Level, TimeStamp, LogEvent]
  level:
    column_name: LVL
    store_as_enum: true
  log_event:
    render_message: false
  additional:
    - name: UserName
      max_length: 64
    - name: Elapsed
      kind: int
      nullable: false
format:
  quote_strings: false
  max_depth: 4
"#;
        let config = SinkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.id_function.as_deref(), Some("AUDIT_SEQ.NEXTVAL"));
        assert_eq!(config.bind_mode, BindMode::ArrayBind);
        assert_eq!(config.queue_limit, None);
        assert_eq!(config.batching.strategy(), Strategy::Periodic);
        assert_eq!(config.batching.interval(), Some(Duration::from_secs(2)));
        assert_eq!(config.columns.store[4], ColumnRole::SerializedEvent);
        assert_eq!(config.columns.column_name(ColumnRole::Level), "LVL");
        assert!(config.columns.level.store_as_enum);
        assert!(!config.columns.log_event.render_message);
        assert_eq!(config.columns.additional[0].max_length, Some(64));
        assert_eq!(config.columns.additional[1].kind, ValueKind::Int);
        assert!(!config.columns.additional[1].nullable);
        assert!(!config.format.quote_strings);
        assert_eq!(config.format.max_depth, 4);
    }

    #[test]
    fn test_properties_xml_options_are_flattened() {
        let yaml = r#"
columns:
  properties:
    column_name: PROPS
    root_element_name: props
    use_property_key_as_element_name: true
"#;
        let config = SinkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.columns.column_name(ColumnRole::Properties), "PROPS");
        assert_eq!(config.columns.properties.xml.root_element_name, "props");
        assert!(config.columns.properties.xml.use_property_key_as_element_name);
        assert_eq!(config.columns.properties.xml.item_element_name, "item");
    }

    #[test]
    fn test_env_expansion_in_table_and_id() {
        let yaml = "table: ${NONEXISTENT_TABLE_98765:-EVENTS}\nid_function: ${NONEXISTENT_SEQ_98765:-}\n";
        let config = SinkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.table, "EVENTS");
        assert_eq!(config.id_function, None);
    }

    #[test]
    fn test_unresolved_env_reference_is_rejected() {
        let yaml = "id_function: ${NONEXISTENT_SEQ_98765}.NEXTVAL\n";
        let err = SinkConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("NONEXISTENT_SEQ_98765"));

        let err = SinkConfig::from_yaml_str("table: APP.${NONEXISTENT_TABLE_98765}\n").unwrap_err();
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let yaml = r#"
columns:
  message:
    column_name: level
"#;
        let err = SinkConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().to_lowercase().contains("level"));
    }

    #[test]
    fn test_unknown_role_is_parse_error() {
        let err = SinkConfig::from_yaml_str("columns:\n  store: [Message, Banana]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("Banana"));
    }

    #[test]
    fn test_invalid_batching_is_rejected() {
        let err = SinkConfig::from_yaml_str("batching:\n  strategy: periodic\n  batch_limit: 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("batch_limit"));
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(SinkConfig::from_yaml_str("table: '  '\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table: FILE_LOG\nbatching:\n  strategy: burst\n  batch_limit: 5").unwrap();
        let config = SinkConfig::load(file.path()).unwrap();
        assert_eq!(config.table, "FILE_LOG");
        assert_eq!(config.batching.batch_limit(), Some(5));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SinkConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
