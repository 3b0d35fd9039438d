mod config;
mod server;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{Config, ConfigError, ConfigOverrides};
use server::{AppState, ServeError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use swarm_mermaid_core::{
    BindingKey, ClusterState, Direction, EdgeLabels, NetworkFilter, OutputFormat, Snapshot,
    StaticCluster, TopologyGrapher, fetch_snapshot,
};
use swarm_mermaid_docker::DockerCluster;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] swarm_mermaid_core::Error),

    #[error(transparent)]
    Serve(#[from] ServeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "swarm-mermaid", version, about = "Docker Swarm network/service topology as a Mermaid graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// YAML config file; command-line flags take precedence over its values.
    #[arg(long, global = true, env = "SWARM_MERMAID_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    graph: GraphArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve `GET /generate` over HTTP.
    Serve {
        #[arg(long, env = "SWARM_MERMAID_LISTEN")]
        listen: Option<SocketAddr>,

        /// Seconds to wait for in-flight requests after a shutdown signal.
        #[arg(long)]
        shutdown_timeout: Option<u64>,
    },
    /// Render the graph once.
    Generate {
        /// Build from a saved snapshot instead of the Docker daemon.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Dump the cluster networks and services as JSON.
    Snapshot {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct GraphArgs {
    /// mermaid or dot
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    /// Prefix Mermaid output with a `graph <direction>` header.
    #[arg(long, global = true)]
    header: bool,

    /// Header direction (LR, RL, TB, BT); implies --header.
    #[arg(long, global = true)]
    direction: Option<Direction>,

    #[arg(long, global = true, value_enum)]
    edge_labels: Option<EdgeLabelArg>,

    /// Collapse bindings by network name, or keep one per network id.
    #[arg(long, global = true, value_enum)]
    binding_key: Option<BindingKeyArg>,

    /// Only graph networks with this driver (default: overlay).
    #[arg(long, global = true, conflicts_with = "all_networks")]
    network_driver: Option<String>,

    #[arg(long, global = true)]
    all_networks: bool,

    /// Engine API timeout in seconds.
    #[arg(long, global = true)]
    docker_timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EdgeLabelArg {
    None,
    Address,
    Ports,
}

impl From<EdgeLabelArg> for EdgeLabels {
    fn from(value: EdgeLabelArg) -> Self {
        match value {
            EdgeLabelArg::None => EdgeLabels::None,
            EdgeLabelArg::Address => EdgeLabels::Address,
            EdgeLabelArg::Ports => EdgeLabels::Ports,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BindingKeyArg {
    Name,
    Id,
}

impl From<BindingKeyArg> for BindingKey {
    fn from(value: BindingKeyArg) -> Self {
        match value {
            BindingKeyArg::Name => BindingKey::NetworkName,
            BindingKeyArg::Id => BindingKey::NetworkId,
        }
    }
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let graph = &self.graph;
        let network_filter = if graph.all_networks {
            Some(NetworkFilter::all())
        } else {
            graph.network_driver.clone().map(NetworkFilter::driver)
        };
        let (listen, shutdown_timeout_secs) = match &self.command {
            Command::Serve {
                listen,
                shutdown_timeout,
            } => (*listen, *shutdown_timeout),
            _ => (None, None),
        };
        ConfigOverrides {
            listen,
            shutdown_timeout_secs,
            docker_timeout_secs: graph.docker_timeout,
            format: graph.format,
            header: graph.header || graph.direction.is_some(),
            direction: graph.direction,
            edge_labels: graph.edge_labels.map(Into::into),
            binding_key: graph.binding_key.map(Into::into),
            network_filter,
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn docker_cluster(config: &Config) -> DockerCluster {
    let cluster = DockerCluster::from_env();
    match config.docker_timeout_secs {
        Some(secs) => cluster.with_timeout(Duration::from_secs(secs)),
        None => cluster,
    }
}

fn grapher(config: &Config) -> TopologyGrapher {
    TopologyGrapher::new()
        .with_options(config.graph.clone())
        .with_formatter(config.format.formatter(config.header.then_some(config.direction)))
}

fn write_text(text: &str, out: Option<&PathBuf>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

async fn generate_with<C: ClusterState>(
    grapher: &TopologyGrapher,
    cluster: &C,
    out: Option<&PathBuf>,
) -> Result<(), CliError> {
    let graph = grapher.graph(cluster).await?;
    for diagnostic in &graph.diagnostics {
        warn!(%diagnostic, "topology diagnostic");
    }
    write_text(&grapher.render(&graph), out)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::resolve(cli.config.as_deref(), cli.overrides())?;

    match cli.command {
        Command::Serve { .. } => {
            let cluster = docker_cluster(&config);
            let listener = tokio::net::TcpListener::bind(config.listen).await?;
            info!(addr = %listener.local_addr()?, "listening");
            let state = Arc::new(AppState::new(grapher(&config), cluster));
            server::serve(
                listener,
                state,
                server::shutdown_signal(),
                Duration::from_secs(config.shutdown_timeout_secs),
            )
            .await?;
        }
        Command::Generate { snapshot, out } => match snapshot {
            Some(path) => {
                let cluster = StaticCluster::new(Snapshot::from_path(&path)?);
                generate_with(&grapher(&config), &cluster, out.as_ref()).await?;
            }
            None => {
                let cluster = docker_cluster(&config);
                generate_with(&grapher(&config), &cluster, out.as_ref()).await?;
            }
        },
        Command::Snapshot { out } => {
            let cluster = docker_cluster(&config);
            let snapshot = fetch_snapshot(&cluster, &config.graph.network_filter).await?;
            let mut json = snapshot.to_json_pretty()?;
            json.push('\n');
            write_text(&json, out.as_ref())?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(()) => {}
        Err(err @ CliError::Config(_)) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn graph_flags_become_overrides() {
        let cli = Cli::parse_from([
            "swarm-mermaid",
            "generate",
            "--format",
            "dot",
            "--binding-key",
            "id",
            "--edge-labels",
            "ports",
            "--all-networks",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.format, Some(OutputFormat::Dot));
        assert_eq!(overrides.binding_key, Some(BindingKey::NetworkId));
        assert_eq!(overrides.edge_labels, Some(EdgeLabels::Ports));
        assert_eq!(overrides.network_filter, Some(NetworkFilter::all()));
        assert_eq!(overrides.listen, None);
        assert!(!overrides.header);
    }

    #[test]
    fn direction_flag_turns_the_header_on() {
        let cli = Cli::parse_from(["swarm-mermaid", "generate", "--direction", "tb"]);
        let config = Config::resolve(None, cli.overrides()).unwrap();
        assert!(config.header);
        assert_eq!(config.direction, Direction::TB);
        assert_eq!(
            grapher(&config).render_snapshot(&Snapshot::default()),
            "graph TB\n"
        );
    }

    #[test]
    fn serve_flags_reach_the_config() {
        let cli = Cli::parse_from([
            "swarm-mermaid",
            "serve",
            "--listen",
            "127.0.0.1:9000",
            "--shutdown-timeout",
            "5",
            "--network-driver",
            "macvlan",
        ]);
        let config = Config::resolve(None, cli.overrides()).unwrap();
        assert_eq!(config.listen.to_string(), "127.0.0.1:9000");
        assert_eq!(config.shutdown_timeout_secs, 5);
        assert_eq!(config.graph.network_filter, NetworkFilter::driver("macvlan"));
    }

    #[test]
    fn driver_and_all_networks_conflict() {
        let err = Cli::try_parse_from([
            "swarm-mermaid",
            "generate",
            "--network-driver",
            "overlay",
            "--all-networks",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
