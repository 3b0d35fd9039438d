//! Line sequencing: snapshot in, ordered node/edge declarations out.

use crate::cluster::{ClusterState, NetworkFilter, fetch_snapshot};
use crate::edge::{EdgeLabels, build_edge};
use crate::format::{GraphFormatter, MermaidFormatter};
use crate::ids::NodeKind;
use crate::model::Snapshot;
use crate::node::{KnownNetworks, NetworkNode, ServiceNode};
use crate::resolve::{BindingKey, Diagnostic, resolve};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphOptions {
    /// Networks to declare; defaults to overlay networks only.
    pub network_filter: NetworkFilter,
    pub binding_key: BindingKey,
    pub edge_labels: EdgeLabels,
    /// Emit edges toward direct network targets that are not declared as nodes.
    pub allow_dangling_edges: bool,
}

/// One declaration of the rendered graph. Identifiers are already in graph form
/// (`network_<id>` / `service_<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphLine {
    Node {
        kind: NodeKind,
        id: String,
        label: String,
    },
    Edge {
        from: String,
        to: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl GraphLine {
    pub fn render(&self, formatter: &dyn GraphFormatter) -> String {
        match self {
            GraphLine::Node { kind, id, label } => formatter.node(*kind, id, label),
            GraphLine::Edge { from, to, label } => formatter.edge(from, to, label.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyGraph {
    pub lines: Vec<GraphLine>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TopologyGraph {
    pub fn node_count(&self, kind: NodeKind) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, GraphLine::Node { kind: k, .. } if *k == kind))
            .count()
    }

    pub fn edge_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, GraphLine::Edge { .. }))
            .count()
    }

    /// Renders every line, each terminated by `\n`.
    pub fn render(&self, formatter: &dyn GraphFormatter) -> String {
        let mut out = String::with_capacity(self.lines.len() * 48);
        if let Some(begin) = formatter.begin() {
            out.push_str(&begin);
            out.push('\n');
        }
        for line in &self.lines {
            out.push_str(&line.render(formatter));
            out.push('\n');
        }
        if let Some(end) = formatter.end() {
            out.push_str(&end);
            out.push('\n');
        }
        out
    }
}

pub struct TopologyGrapher {
    options: GraphOptions,
    formatter: Box<dyn GraphFormatter + Send + Sync>,
}

impl Default for TopologyGrapher {
    fn default() -> Self {
        Self {
            options: GraphOptions::default(),
            formatter: Box::new(MermaidFormatter::new()),
        }
    }
}

impl std::fmt::Debug for TopologyGrapher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyGrapher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TopologyGrapher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: GraphOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_formatter(mut self, formatter: Box<dyn GraphFormatter + Send + Sync>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Builds the graph for an already-fetched snapshot.
    ///
    /// Networks are declared first, in snapshot order. Each service follows in snapshot order,
    /// immediately followed by its edges in resolution order. Objects without an id and repeated
    /// ids are skipped so every declaration appears once.
    pub fn build(&self, snapshot: &Snapshot) -> TopologyGraph {
        let mut graph = TopologyGraph::default();

        let mut known = KnownNetworks::new();
        for network in &snapshot.networks {
            let Some(node) = NetworkNode::from_network(network) else {
                let diagnostic = Diagnostic::MissingId {
                    node: NodeKind::Network,
                };
                tracing::debug!(%diagnostic, "skipped");
                graph.diagnostics.push(diagnostic);
                continue;
            };
            if known.contains_key(&node.id) {
                continue;
            }
            graph.lines.push(GraphLine::Node {
                kind: NodeKind::Network,
                id: node.graph_id(),
                label: node.name.clone(),
            });
            known.insert(node.id.clone(), node);
        }

        let mut seen_services = HashSet::new();
        for service in &snapshot.services {
            let Some(node) = ServiceNode::from_service(service) else {
                let diagnostic = Diagnostic::MissingId {
                    node: NodeKind::Service,
                };
                tracing::debug!(%diagnostic, "skipped");
                graph.diagnostics.push(diagnostic);
                continue;
            };
            if !seen_services.insert(node.id.clone()) {
                continue;
            }

            let resolution = resolve(&node, &known, self.options.binding_key);
            graph.diagnostics.extend(resolution.diagnostics);

            graph.lines.push(GraphLine::Node {
                kind: NodeKind::Service,
                id: node.graph_id(),
                label: node.name.clone(),
            });

            for binding in resolution.bindings.values() {
                if !self.options.allow_dangling_edges && !known.contains_key(&binding.network_id) {
                    tracing::debug!(
                        service = %node.id,
                        network = %binding.network_id,
                        "network target is not a declared network, edge skipped"
                    );
                    graph.diagnostics.push(Diagnostic::UnresolvedNetworkReference {
                        service_id: node.id.clone(),
                        network_id: binding.network_id.clone(),
                    });
                    continue;
                }
                graph
                    .lines
                    .push(build_edge(&node, binding, self.options.edge_labels));
            }
        }

        tracing::debug!(
            networks = graph.node_count(NodeKind::Network),
            services = graph.node_count(NodeKind::Service),
            edges = graph.edge_count(),
            diagnostics = graph.diagnostics.len(),
            "topology graph built"
        );
        graph
    }

    /// Fetches a fresh snapshot and builds its graph. A failed listing aborts with that error.
    pub async fn graph<C: ClusterState>(&self, cluster: &C) -> Result<TopologyGraph> {
        let snapshot = fetch_snapshot(cluster, &self.options.network_filter).await?;
        Ok(self.build(&snapshot))
    }

    /// Fetches, builds and renders with the configured formatter.
    pub async fn generate<C: ClusterState>(&self, cluster: &C) -> Result<String> {
        let graph = self.graph(cluster).await?;
        Ok(graph.render(self.formatter.as_ref()))
    }

    /// Renders a built graph with the configured formatter.
    pub fn render(&self, graph: &TopologyGraph) -> String {
        graph.render(self.formatter.as_ref())
    }

    /// Renders an already-fetched snapshot with the configured formatter.
    pub fn render_snapshot(&self, snapshot: &Snapshot) -> String {
        self.build(snapshot).render(self.formatter.as_ref())
    }
}

/// Renders the cluster's overlay topology as Mermaid statements with default options.
pub async fn build_topology_graph<C: ClusterState>(cluster: &C) -> Result<String> {
    TopologyGrapher::new().generate(cluster).await
}
