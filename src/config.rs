use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::resolve::FootprintPolicy;
use crate::text::read_with_unknown_encoding;
use crate::write::Justify;

/// Engine settings, usually read from a TOML file:
///
/// ```toml
/// net-name-limit = 16
/// justify = "right"
/// footprint-policy = "strict"
/// filter-fallback = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Net names longer than this are shortened on output
    pub net_name_limit: usize,
    /// Which end of a long net name is kept
    pub justify: Justify,
    pub footprint_policy: FootprintPolicy,
    /// Offer the whole catalog when a component's filters match nothing
    pub filter_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            net_name_limit: 16,
            justify: Justify::default(),
            footprint_policy: FootprintPolicy::default(),
            filter_fallback: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = read_with_unknown_encoding(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}: {config:?}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn reads_kebab_case_keys() {
        let config = Config::from_toml_str(
            "net-name-limit = 8\njustify = \"right\"\nfootprint-policy = \"strict\"\nfilter-fallback = false\n",
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                net_name_limit: 8,
                justify: Justify::Right,
                footprint_policy: FootprintPolicy::Strict,
                filter_fallback: false,
            }
        );
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(Config::from_toml_str("footprint-policy = \"lenient\"").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
