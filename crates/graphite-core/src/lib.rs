//! graphite-core — configuration for the Graphite metrics reporter.
//!
//! The host framework hands the plugin a flat bag of string properties.
//! [`Properties`] gives typed, default-falling-back access to that bag and
//! [`ReporterConfig`] captures the values the reporter is built from.

pub mod config;
pub mod error;
pub mod properties;

pub use config::{ReporterConfig, reporter_enabled};
pub use error::{CoreError, CoreResult};
pub use properties::Properties;
