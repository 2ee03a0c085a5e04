//! Configuration loading from scope.toml.

use policy::StaticResolver;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Session tokens and the principals they resolve to.
    #[serde(flatten)]
    pub principals: StaticResolver,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Filter directives, used when `SCOPE_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.principals.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise a configuration where every
    /// token is anonymous.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Principals(#[from] policy::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::PrincipalResolver;

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
[log]
filter = "codec=trace"

[[principal]]
token = "dev-admin"
username = "root"
user_id = 1
rights = ["admin"]
"#,
        )
        .unwrap();

        assert_eq!(config.log.filter, "codec=trace");
        let root = config.principals.resolve("dev-admin").unwrap().unwrap();
        assert_eq!(root.user_id, 1);
    }

    #[test]
    fn empty_config_is_all_anonymous() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.log.filter, "warn");
        assert!(config.principals.is_empty());
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let toml = r#"
[[principal]]
token = "t"
username = "a"
user_id = 1

[[principal]]
token = "t"
username = "b"
user_id = 2
"#;
        assert!(matches!(
            Config::parse(toml),
            Err(ConfigError::Principals(_))
        ));
    }
}
