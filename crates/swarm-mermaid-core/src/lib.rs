#![forbid(unsafe_code)]

//! Docker Swarm topology as a graph description.
//!
//! Networks and services read from a [`ClusterState`] become graph nodes; each service is
//! connected to the networks it is attached to. Attachment depends on the service's endpoint
//! resolution mode (virtual-IP records or declared network targets, see [`resolve`]).
//!
//! ```no_run
//! use swarm_mermaid_core::{Network, Service, Snapshot, StaticCluster, build_topology_graph};
//! use swarm_mermaid_core::model::ResolutionMode;
//!
//! let snapshot = Snapshot {
//!     networks: vec![Network::new("n1", "net-a")],
//!     services: vec![
//!         Service::new("s1", "web")
//!             .with_mode(ResolutionMode::Vip)
//!             .with_virtual_ip("n1", "10.0.0.5/24"),
//!     ],
//! };
//! let text = futures::executor::block_on(build_topology_graph(&StaticCluster::new(snapshot)))?;
//! assert_eq!(text, "network_n1{net-a}\nservice_s1(web)\nservice_s1 --- network_n1\n");
//! # Ok::<(), swarm_mermaid_core::Error>(())
//! ```

pub mod cluster;
pub mod edge;
pub mod error;
pub mod format;
pub mod graph;
pub mod ids;
pub mod model;
pub mod node;
pub mod resolve;

pub use cluster::{ClusterState, FetchError, NetworkFilter, StaticCluster, fetch_snapshot};
pub use edge::EdgeLabels;
pub use error::{Error, Result};
pub use format::{Direction, DotFormatter, GraphFormatter, MermaidFormatter, OutputFormat};
pub use graph::{GraphLine, GraphOptions, TopologyGraph, TopologyGrapher, build_topology_graph};
pub use ids::NodeKind;
pub use model::{Network, Service, Snapshot};
pub use resolve::{BindingKey, Diagnostic, NetworkBinding};

#[cfg(test)]
mod tests;
