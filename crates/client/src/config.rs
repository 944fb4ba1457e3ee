use std::time::Duration;

use rankgraph_core::graph::{GraphStyle, DEFAULT_LABEL_CHARS};
use rankgraph_core::palette::Rgb;

use crate::messages::DEFAULT_DELIMITER;

/// Default backend base URL for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";

/// Default liveness probe period.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub backend_url: String,
    /// Period of the connection monitor's liveness probe.
    pub heartbeat_interval: Duration,
    /// Colours and label length for graph documents.
    pub graph_style: GraphStyle,
    /// Separator joining transcriptions for the secondary ranking stage.
    pub delimiter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            graph_style: GraphStyle::default(),
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `BACKEND_URL`           | `http://localhost:8000/api` |
    /// | `HEARTBEAT_INTERVAL_MS` | `10000`                     |
    /// | `GRAPH_LOW_COLOR`       | `#5b8ff9`                   |
    /// | `GRAPH_HIGH_COLOR`      | `#f4664a`                   |
    /// | `GRAPH_LABEL_CHARS`     | `30`                        |
    /// | `RESULT_DELIMITER`      | `\|`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend_url = lookup("BACKEND_URL").unwrap_or(defaults.backend_url);

        let heartbeat_interval = match lookup("HEARTBEAT_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_var("HEARTBEAT_INTERVAL_MS", &raw)?),
            None => defaults.heartbeat_interval,
        };
        if heartbeat_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "HEARTBEAT_INTERVAL_MS",
                reason: "must be greater than zero".into(),
            });
        }

        let low_color = match lookup("GRAPH_LOW_COLOR") {
            Some(raw) => parse_color("GRAPH_LOW_COLOR", &raw)?,
            None => defaults.graph_style.low_color,
        };
        let high_color = match lookup("GRAPH_HIGH_COLOR") {
            Some(raw) => parse_color("GRAPH_HIGH_COLOR", &raw)?,
            None => defaults.graph_style.high_color,
        };
        let label_chars = match lookup("GRAPH_LABEL_CHARS") {
            Some(raw) => parse_var("GRAPH_LABEL_CHARS", &raw)?,
            None => DEFAULT_LABEL_CHARS,
        };

        let delimiter = lookup("RESULT_DELIMITER")
            .filter(|d| !d.is_empty())
            .unwrap_or(defaults.delimiter);

        Ok(Self {
            backend_url,
            heartbeat_interval,
            graph_style: GraphStyle {
                low_color,
                high_color,
                label_chars,
            },
            delimiter,
        })
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn parse_color(var: &'static str, raw: &str) -> Result<Rgb, ConfigError> {
    raw.parse().map_err(|e: rankgraph_core::error::CoreError| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(config.graph_style, GraphStyle::default());
        assert_eq!(config.delimiter, "|");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "http://backend:9000"),
            ("HEARTBEAT_INTERVAL_MS", "250"),
            ("GRAPH_LOW_COLOR", "#000000"),
            ("GRAPH_LABEL_CHARS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "http://backend:9000");
        assert_eq!(config.heartbeat_interval, Duration::from_millis(250));
        assert_eq!(config.graph_style.low_color, Rgb::new(0, 0, 0));
        assert_eq!(config.graph_style.label_chars, 12);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = ClientConfig::from_lookup(lookup(&[("HEARTBEAT_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("HEARTBEAT_INTERVAL_MS"));

        let err =
            ClientConfig::from_lookup(lookup(&[("GRAPH_HIGH_COLOR", "red")])).unwrap_err();
        assert!(err.to_string().contains("GRAPH_HIGH_COLOR"));

        assert!(ClientConfig::from_lookup(lookup(&[("HEARTBEAT_INTERVAL_MS", "0")])).is_err());
    }
}
