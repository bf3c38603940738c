//! Configuration errors and environment expansion of configured names.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

fn env_var_regex() -> &'static Regex {
    static ENV_VAR_REGEX: OnceLock<Regex> = OnceLock::new();
    ENV_VAR_REGEX.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    })
}

/// Expand `${VAR}` and `${VAR:-default}` in a table name or id function.
///
/// `field` names the setting in error messages. An unset variable without a
/// default, or a `${` that does not form a reference, is a validation error
/// rather than an empty substitution. `${VAR:-}` opts into an empty value.
///
/// # Examples
///
/// ```
/// use batchlog::config::expand_env_vars;
///
/// assert_eq!(expand_env_vars("${BATCHLOG_DOC_UNSET:-LOG}", "table").unwrap(), "LOG");
/// assert_eq!(expand_env_vars("APP.${BATCHLOG_DOC_UNSET:-LOG}", "table").unwrap(), "APP.LOG");
/// assert!(expand_env_vars("${BATCHLOG_DOC_UNSET}.NEXTVAL", "id_function").is_err());
/// ```
pub fn expand_env_vars(input: &str, field: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in env_var_regex().captures_iter(input) {
        let Some(reference) = caps.get(0) else {
            continue;
        };
        push_literal(&mut out, &input[last..reference.start()], field)?;

        let name = &caps[1];
        match (std::env::var(name), caps.get(2)) {
            (Ok(value), _) => out.push_str(&value),
            (Err(_), Some(default)) => out.push_str(default.as_str()),
            (Err(_), None) => {
                return Err(ConfigError::ValidationError(format!(
                    "{field}: environment variable '{name}' is not set and has no default"
                )));
            }
        }
        last = reference.end();
    }

    push_literal(&mut out, &input[last..], field)?;
    Ok(out)
}

fn push_literal(out: &mut String, literal: &str, field: &str) -> Result<(), ConfigError> {
    if literal.contains("${") {
        return Err(ConfigError::ValidationError(format!(
            "{field}: malformed variable reference in '{literal}'"
        )));
    }
    out.push_str(literal);
    Ok(())
}
