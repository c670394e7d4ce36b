//! Name-based exclusion of metrics from a report.

use regex::Regex;
use tracing::warn;

/// Decides which readings are reported.
///
/// An exclusion pattern must match the whole metric name, not a substring.
#[derive(Debug, Clone, Default)]
pub struct MetricFilter {
    exclude: Option<Regex>,
}

impl MetricFilter {
    /// Report everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Drop every metric whose name fully matches `pattern`.
    pub fn excluding(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^(?:{pattern})$");
        Ok(Self {
            exclude: Some(Regex::new(&anchored)?),
        })
    }

    /// Build from an optional configured pattern.
    ///
    /// An invalid pattern is logged and reporting proceeds unfiltered.
    pub fn from_pattern(pattern: Option<&str>) -> Self {
        let Some(pattern) = pattern else {
            return Self::all();
        };
        match Self::excluding(pattern) {
            Ok(filter) => filter,
            Err(e) => {
                warn!(%pattern, error = %e, "invalid metric exclusion pattern, reporting all metrics");
                Self::all()
            }
        }
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.exclude.as_ref().is_none_or(|re| !re.is_match(name))
    }

    pub fn is_filtering(&self) -> bool {
        self.exclude.is_some()
    }
}
