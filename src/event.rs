//! Log event model.
//!
//! - [`LogEvent`]: one captured log record with its ordered property bag
//! - [`Level`]: severity with a stable ordinal code
//! - [`PropertyValue`] / [`Scalar`]: the recursive property value union
//! - [`MessageTemplate`]: template parsing and message rendering

mod level;
mod record;
mod template;
mod value;

pub use level::Level;
pub use record::{LogEvent, Properties};
pub use template::{FormatOptions, MessageTemplate, TemplateToken};
pub use value::{DEFAULT_MAX_DEPTH, PropertyValue, Scalar};
