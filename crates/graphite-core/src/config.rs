//! Reporter configuration keys, defaults, and the immutable [`ReporterConfig`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::properties::Properties;

pub const HOST_KEY: &str = "kafka.graphite.metrics.host";
pub const PORT_KEY: &str = "kafka.graphite.metrics.port";
pub const PREFIX_KEY: &str = "kafka.graphite.metrics.group";
pub const EXCLUDE_REGEX_KEY: &str = "kafka.graphite.metrics.exclude.regex";
pub const ENABLED_KEY: &str = "kafka.graphite.metrics.reporter.enabled";
/// Polling interval owned by the host's own metrics configuration.
pub const POLLING_INTERVAL_KEY: &str = "kafka.metrics.polling.interval.secs";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 2003;
pub const DEFAULT_PREFIX: &str = "kafka";
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 10;

/// Everything needed to build a Graphite push reporter.
///
/// Created once from host properties and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub host: String,
    pub port: u16,
    pub prefix: String,
    pub exclude_regex: Option<String>,
    pub polling_interval_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            prefix: DEFAULT_PREFIX.to_string(),
            exclude_regex: None,
            polling_interval_secs: DEFAULT_POLLING_INTERVAL_SECS,
        }
    }
}

impl ReporterConfig {
    /// Read the reporter settings out of a host property bag.
    ///
    /// Missing or malformed values fall back to the defaults. A port of 0 and
    /// a polling interval of 0 are treated as malformed.
    pub fn from_properties(props: &Properties) -> Self {
        let mut port = props.get_u16(PORT_KEY, DEFAULT_PORT);
        if port == 0 {
            warn!(key = PORT_KEY, "port 0 is not usable, using default");
            port = DEFAULT_PORT;
        }

        let mut polling_interval_secs =
            props.get_u64(POLLING_INTERVAL_KEY, DEFAULT_POLLING_INTERVAL_SECS);
        if polling_interval_secs == 0 {
            warn!(key = POLLING_INTERVAL_KEY, "polling interval must be positive, using default");
            polling_interval_secs = DEFAULT_POLLING_INTERVAL_SECS;
        }

        Self {
            host: props.get_string(HOST_KEY, DEFAULT_HOST),
            port,
            // The prefix may legitimately be blank, so read it raw.
            prefix: props
                .get_raw(PREFIX_KEY)
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            // Spaces can be significant in a pattern.
            exclude_regex: props.get_opt_raw(EXCLUDE_REGEX_KEY),
            polling_interval_secs,
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    /// `host:port` as shown in logs.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whether the host asked for the reporter to start as soon as it is initialized.
pub fn reporter_enabled(props: &Properties) -> bool {
    props.get_bool(ENABLED_KEY, false)
}
