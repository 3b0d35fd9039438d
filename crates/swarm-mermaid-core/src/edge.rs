use crate::graph::GraphLine;
use crate::ids::{NodeKind, node_id};
use crate::node::ServiceNode;
use crate::resolve::NetworkBinding;
use serde::{Deserialize, Serialize};

/// Optional text drawn on service-to-network edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeLabels {
    #[default]
    None,
    /// The service's virtual IP on that network.
    Address,
    /// Published ports, `published:target/protocol`.
    Ports,
}

pub fn build_edge(service: &ServiceNode, binding: &NetworkBinding, labels: EdgeLabels) -> GraphLine {
    GraphLine::Edge {
        from: service.graph_id(),
        to: node_id(NodeKind::Network, &binding.network_id),
        label: edge_label(binding, labels),
    }
}

fn edge_label(binding: &NetworkBinding, labels: EdgeLabels) -> Option<String> {
    match labels {
        EdgeLabels::None => None,
        EdgeLabels::Address => binding.addr.map(|addr| addr.to_string()),
        EdgeLabels::Ports => {
            let ports = binding
                .ports
                .iter()
                .filter_map(|port| {
                    let target = port.target_port?;
                    Some(match port.published_port {
                        Some(published) => format!("{published}:{target}/{}", port.protocol),
                        None => format!("{target}/{}", port.protocol),
                    })
                })
                .collect::<Vec<_>>();
            (!ports.is_empty()).then(|| ports.join(", "))
        }
    }
}
