//! Event severity levels.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity of a log event.
///
/// Ordered from least to most severe. The ordinal [`code`](Level::code) is
/// what gets stored when the level column is configured as a small integer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Level {
    /// Tracing-level detail.
    Verbose = 0,
    /// Internal diagnostics.
    Debug = 1,
    /// Normal operation.
    Information = 2,
    /// Degraded but functioning.
    Warning = 3,
    /// A failure the application survived.
    Error = 4,
    /// A failure the application cannot recover from.
    Fatal = 5,
}

impl Level {
    /// Ordinal code, `0` (Verbose) through `5` (Fatal).
    pub fn code(self) -> u8 {
        self as u8
    }
}
