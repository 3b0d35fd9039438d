use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use swarm_mermaid_core::{
    BindingKey, Direction, EdgeLabels, GraphOptions, NetworkFilter, OutputFormat,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub listen: SocketAddr,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Engine API client timeout; the client's own default when unset.
    pub docker_timeout_secs: Option<u64>,
    pub format: OutputFormat,
    /// Prefix Mermaid output with a `graph <direction>` declaration.
    pub header: bool,
    pub direction: Direction,
    pub graph: GraphOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            shutdown_timeout_secs: 60,
            docker_timeout_secs: None,
            format: OutputFormat::Mermaid,
            header: false,
            direction: Direction::LR,
            graph: GraphOptions::default(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen: Option<SocketAddr>,
    pub shutdown_timeout_secs: Option<u64>,
    pub docker_timeout_secs: Option<u64>,
    pub format: Option<OutputFormat>,
    pub header: bool,
    pub direction: Option<Direction>,
    pub edge_labels: Option<EdgeLabels>,
    pub binding_key: Option<BindingKey>,
    pub network_filter: Option<NetworkFilter>,
}

impl Config {
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(path, &text)
    }

    /// Defaults, then the file (if any), then command-line overrides.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(listen) = overrides.listen {
            self.listen = listen;
        }
        if let Some(secs) = overrides.shutdown_timeout_secs {
            self.shutdown_timeout_secs = secs;
        }
        if let Some(secs) = overrides.docker_timeout_secs {
            self.docker_timeout_secs = Some(secs);
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if overrides.header {
            self.header = true;
        }
        if let Some(direction) = overrides.direction {
            self.direction = direction;
        }
        if let Some(edge_labels) = overrides.edge_labels {
            self.graph.edge_labels = edge_labels;
        }
        if let Some(binding_key) = overrides.binding_key {
            self.graph.binding_key = binding_key;
        }
        if let Some(filter) = overrides.network_filter {
            self.graph.network_filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_historical_server() {
        let config = Config::default();
        assert_eq!(config.listen.to_string(), "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout_secs, 60);
        assert_eq!(config.graph.network_filter, NetworkFilter::overlay());
        assert_eq!(config.format, OutputFormat::Mermaid);
    }

    #[test]
    fn yaml_fills_in_missing_fields_from_defaults() {
        let yaml = "\
listen: 127.0.0.1:9000
format: graphviz
direction: td
graph:
  bindingKey: networkId
  edgeLabels: address
  networkFilter:
    driver: null
";
        let config = Config::from_yaml(Path::new("swarm-mermaid.yaml"), yaml).unwrap();
        assert_eq!(config.listen.to_string(), "127.0.0.1:9000");
        assert_eq!(config.shutdown_timeout_secs, 60);
        assert_eq!(config.format, OutputFormat::Dot);
        assert_eq!(config.direction, Direction::TB);
        assert_eq!(config.graph.binding_key, BindingKey::NetworkId);
        assert_eq!(config.graph.edge_labels, EdgeLabels::Address);
        assert_eq!(config.graph.network_filter, NetworkFilter::all());
    }

    #[test]
    fn invalid_yaml_names_the_file() {
        let err = Config::from_yaml(Path::new("bad.yaml"), "listen: [").unwrap_err();
        assert!(err.to_string().starts_with("invalid config bad.yaml:"));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config =
            Config::from_yaml(Path::new("c.yaml"), "shutdownTimeoutSecs: 5\nheader: true\n").unwrap();
        config.apply(ConfigOverrides {
            shutdown_timeout_secs: Some(30),
            network_filter: Some(NetworkFilter::driver("macvlan")),
            ..Default::default()
        });
        assert_eq!(config.shutdown_timeout_secs, 30);
        // A flag that was not given leaves the file value alone.
        assert!(config.header);
        assert_eq!(
            config.graph.network_filter.driver.as_deref(),
            Some("macvlan")
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::resolve(
            Some(Path::new("/nonexistent/swarm-mermaid.yaml")),
            ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
