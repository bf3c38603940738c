//! Property serialization.
//!
//! Two renderers walk the same [`PropertyValue`](crate::event::PropertyValue)
//! tree:
//!
//! - [`xml`]: nested-element markup for the Properties column
//! - [`json`]: a structured record of the whole event for the LogEvent column
//!
//! Both are pure and keep the property bag's insertion order.

pub mod json;
pub mod xml;

pub use json::{JsonValue, render_event};
pub use xml::{XmlOptions, render_properties, valid_element_name};
