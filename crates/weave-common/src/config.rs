//! Configuration model for a resolution context.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeaveError};

/// Tunables for a registry and the resolutions it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum number of nested constructor frames one resolution may open.
    pub max_resolution_depth: usize,
    /// Log replaced bindings at `warn` instead of `debug`.
    pub warn_on_rebind: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: crate::constants::DEFAULT_MAX_RESOLUTION_DEPTH,
            warn_on_rebind: false,
        }
    }
}

impl ContextConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading context configuration");
        let content = std::fs::read_to_string(path).map_err(|e| WeaveError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::Config`] if `max_resolution_depth` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_resolution_depth == 0 {
            return Err(WeaveError::Config {
                message: "max_resolution_depth must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ContextConfig::default();
        assert_eq!(config.max_resolution_depth, 128);
        assert!(!config.warn_on_rebind);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = ContextConfig::from_json(r#"{"warn_on_rebind": true}"#).expect("parse");
        assert!(config.warn_on_rebind);
        assert_eq!(config.max_resolution_depth, 128);
    }

    #[test]
    fn from_json_rejects_zero_depth() {
        let err = ContextConfig::from_json(r#"{"max_resolution_depth": 0}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("max_resolution_depth"), "got: {msg}");
    }

    #[test]
    fn from_json_reports_malformed_input() {
        let err = ContextConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, WeaveError::Serialization { .. }));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(br#"{"max_resolution_depth": 16}"#)
            .expect("write");
        let config = ContextConfig::load(file.path()).expect("load");
        assert_eq!(config.max_resolution_depth, 16);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = ContextConfig::load(&path).unwrap_err();
        match err {
            WeaveError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn serialization_roundtrip_preserves_values() {
        let config = ContextConfig {
            max_resolution_depth: 7,
            warn_on_rebind: true,
        };
        let json = serde_json::to_string(&config).expect("serialize");
        assert_eq!(ContextConfig::from_json(&json).expect("parse"), config);
    }
}
