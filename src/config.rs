//! Free-text backend configuration.
//!
//! Backends receive their configuration as an opaque string. This module
//! turns it into a key/value map that backends consume key by key;
//! anything left unconsumed is rejected by [`Config::finish`].
//!
//! ```text
//! driver=host; root=/srv/data
//! readonly=true
//! ```

use std::collections::BTreeMap;

use crate::FsError;

/// Parsed `key=value` configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: BTreeMap<String, String>,
}

impl Config {
    /// Parse a configuration string.
    ///
    /// Pairs are separated by `;` or newlines. Whitespace around keys and
    /// values is ignored, and an empty string yields an empty config. With the
    /// `serde` feature a JSON object is accepted as well.
    ///
    /// # Errors
    ///
    /// - [`FsError::Config`] for a pair without `=`, an empty key, or a key
    ///   given twice
    ///
    /// ```rust
    /// use dmfsi::Config;
    ///
    /// let mut cfg = Config::parse("root=/data; readonly=true").unwrap();
    /// assert_eq!(cfg.take("root").as_deref(), Some("/data"));
    /// assert_eq!(cfg.take_bool("readonly").unwrap(), Some(true));
    /// assert!(cfg.finish().is_ok());
    /// ```
    pub fn parse(text: &str) -> Result<Self, FsError> {
        #[cfg(feature = "serde")]
        if text.trim_start().starts_with('{') {
            return Self::from_json(text);
        }

        let mut entries = BTreeMap::new();
        for pair in text.split([';', '\n']) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| FsError::config(format!("expected key=value, got `{pair}`")))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(FsError::config(format!("empty key in `{pair}`")));
            }
            if entries
                .insert(key.to_string(), value.trim().to_string())
                .is_some()
            {
                return Err(FsError::config(format!("duplicate key `{key}`")));
            }
        }
        Ok(Self { entries })
    }

    #[cfg(feature = "serde")]
    fn from_json(text: &str) -> Result<Self, FsError> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| FsError::config(e.to_string()))?;
        let mut entries = BTreeMap::new();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(_) | serde_json::Value::Number(_) => value.to_string(),
                other => {
                    return Err(FsError::config(format!(
                        "`{key}` must be a scalar, got {other}"
                    )));
                }
            };
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    /// Returns `true` if no keys remain.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return a raw value.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Remove and parse a boolean (`true/false`, `yes/no`, `on/off`, `1/0`).
    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>, FsError> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(FsError::config(format!(
                "`{key}` expects a boolean, got `{value}`"
            ))),
        }
    }

    /// Remove and parse an unsigned integer.
    pub fn take_u64(&mut self, key: &str) -> Result<Option<u64>, FsError> {
        self.take(key)
            .map(|value| {
                value.parse().map_err(|_| {
                    FsError::config(format!("`{key}` expects an integer, got `{value}`"))
                })
            })
            .transpose()
    }

    /// Reject any keys nobody consumed.
    ///
    /// # Errors
    ///
    /// - [`FsError::Config`] naming the unknown keys
    pub fn finish(self) -> Result<(), FsError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let keys: Vec<_> = self.entries.into_keys().collect();
        Err(FsError::config(format!("unknown keys: {}", keys.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_empty_config() {
        let cfg = Config::parse("").unwrap();
        assert!(cfg.is_empty());
        assert!(Config::parse("  ;\n ; ").unwrap().is_empty());
    }

    #[test]
    fn parses_pairs_with_both_separators() {
        let mut cfg = Config::parse("a = 1; b=two\nc=").unwrap();
        assert_eq!(cfg.take("a").as_deref(), Some("1"));
        assert_eq!(cfg.take("b").as_deref(), Some("two"));
        assert_eq!(cfg.take("c").as_deref(), Some(""));
        assert!(cfg.finish().is_ok());
    }

    #[test]
    fn rejects_missing_equals() {
        let err = Config::parse("root").unwrap_err();
        assert!(matches!(err, FsError::Config { .. }));
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(
            Config::parse("=value"),
            Err(FsError::Config { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_key() {
        let err = Config::parse("a=1;a=2").unwrap_err();
        assert!(err.to_string().contains("duplicate key `a`"));
    }

    #[test]
    fn finish_reports_unknown_keys() {
        let mut cfg = Config::parse("known=1;stray=2;other=3").unwrap();
        cfg.take("known");
        let err = cfg.finish().unwrap_err();
        assert_eq!(err.to_string(), "config error: unknown keys: other, stray");
    }

    #[test]
    fn typed_accessors() {
        let mut cfg = Config::parse("flag=off;size=4096;bad=x").unwrap();
        assert_eq!(cfg.take_bool("flag").unwrap(), Some(false));
        assert_eq!(cfg.take_u64("size").unwrap(), Some(4096));
        assert_eq!(cfg.take_u64("missing").unwrap(), None);
        assert!(cfg.take_bool("bad").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_json_object() {
        let mut cfg = Config::parse(r#"{"root": "/data", "readonly": true}"#).unwrap();
        assert_eq!(cfg.take("root").as_deref(), Some("/data"));
        assert_eq!(cfg.take_bool("readonly").unwrap(), Some(true));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_nested_json() {
        assert!(Config::parse(r#"{"root": [1]}"#).is_err());
    }
}
