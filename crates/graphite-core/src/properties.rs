//! Host-supplied property bag.
//!
//! Values are kept as strings and parsed on access. A value that fails to
//! parse is reported at `warn` and the caller's default is returned instead,
//! so a typo in a property never prevents the plugin from loading.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use tracing::warn;

use crate::error::CoreResult;

/// Flat `key → value` configuration supplied by the host framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from `(key, value)` pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a TOML document into a flat bag.
    ///
    /// Nested tables are flattened into dotted keys, so
    ///
    /// ```toml
    /// [kafka.graphite.metrics]
    /// host = "carbon.internal"
    /// ```
    ///
    /// yields `kafka.graphite.metrics.host = "carbon.internal"`. Quoted dotted
    /// keys at the top level (`"kafka.graphite.metrics.port" = 2003`) are kept
    /// as-is.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut entries = BTreeMap::new();
        flatten_into(&mut entries, None, &table);
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_opt_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Returns the trimmed value, treating a blank value as absent.
    pub fn get_opt_string(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Returns the value untouched, treating a blank value as absent.
    pub fn get_opt_raw(&self, key: &str) -> Option<String> {
        self.get_raw(key)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    pub fn get_u16(&self, key: &str, default: u16) -> u16 {
        self.parse_or(key, default)
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.parse_or(key, default)
    }

    /// Case-insensitive `true`/`false`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let Some(raw) = self.get_opt_string(key) else {
            return default;
        };
        if raw.eq_ignore_ascii_case("true") {
            true
        } else if raw.eq_ignore_ascii_case("false") {
            false
        } else {
            warn!(%key, value = %raw, %default, "malformed property, using default");
            default
        }
    }

    fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + std::fmt::Display,
    {
        let Some(raw) = self.get_opt_string(key) else {
            return default;
        };
        match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(%key, value = %raw, %default, "malformed property, using default");
                default
            }
        }
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_into(out, Some(&full), nested),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            other => {
                out.insert(full, other.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_parse_values() {
        let props = Properties::from_pairs([
            ("port", "2004"),
            ("interval", "30"),
            ("enabled", "true"),
        ]);
        assert_eq!(props.get_u16("port", 1), 2004);
        assert_eq!(props.get_u64("interval", 1), 30);
        assert!(props.get_bool("enabled", false));
    }

    #[test]
    fn missing_keys_use_defaults() {
        let props = Properties::new();
        assert_eq!(props.get_string("host", "localhost"), "localhost");
        assert_eq!(props.get_u16("port", 2003), 2003);
        assert!(!props.get_bool("enabled", false));
        assert_eq!(props.get_opt_string("regex"), None);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let props = Properties::from_pairs([
            ("port", "not-a-port"),
            ("big", "70000"),
            ("enabled", "yes"),
        ]);
        assert_eq!(props.get_u16("port", 2003), 2003);
        // Out of range for u16.
        assert_eq!(props.get_u16("big", 2003), 2003);
        assert!(!props.get_bool("enabled", false));
    }

    #[test]
    fn booleans_ignore_case() {
        let props = Properties::from_pairs([
            ("upper", "TRUE"),
            ("mixed", "False"),
            ("padded", " True "),
        ]);
        assert!(props.get_bool("upper", false));
        assert!(!props.get_bool("mixed", true));
        assert!(props.get_bool("padded", false));
    }

    #[test]
    fn blank_value_is_absent() {
        let props = Properties::from_pairs([("host", "   ")]);
        assert_eq!(props.get_string("host", "localhost"), "localhost");
        assert_eq!(props.get_opt_raw("host"), None);
        assert!(props.contains_key("host"));
    }

    #[test]
    fn opt_raw_keeps_surrounding_spaces() {
        let props = Properties::from_pairs([("regex", " a b ")]);
        assert_eq!(props.get_opt_raw("regex").as_deref(), Some(" a b "));
        assert_eq!(props.get_opt_string("regex").as_deref(), Some("a b"));
    }

    #[test]
    fn toml_tables_flatten_to_dotted_keys() {
        let doc = r#"
"kafka.metrics.polling.interval.secs" = 15

[kafka.graphite.metrics]
host = "carbon.internal"
port = 2004
group = "prod.kafka"

[kafka.graphite.metrics.reporter]
enabled = true
"#;
        let props = Properties::from_toml_str(doc).unwrap();
        assert_eq!(
            props.get_string("kafka.graphite.metrics.host", ""),
            "carbon.internal"
        );
        assert_eq!(props.get_u16("kafka.graphite.metrics.port", 0), 2004);
        assert_eq!(props.get_string("kafka.graphite.metrics.group", ""), "prod.kafka");
        assert!(props.get_bool("kafka.graphite.metrics.reporter.enabled", false));
        assert_eq!(props.get_u64("kafka.metrics.polling.interval.secs", 0), 15);
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Properties::from_toml_str("host = ").is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.toml");
        std::fs::write(&path, "[kafka.graphite.metrics]\nhost = \"10.0.0.5\"\n").unwrap();

        let props = Properties::from_file(&path).unwrap();
        assert_eq!(props.get_string("kafka.graphite.metrics.host", ""), "10.0.0.5");
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = Properties::from_file(Path::new("/nonexistent/reporter.toml")).unwrap_err();
        assert!(matches!(err, crate::CoreError::Io(_)));
    }
}
