use crate::ids::{NodeKind, node_id};
use crate::model::{Network, PortConfig, ResolutionMode, Service, VirtualIp};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
}

impl NetworkNode {
    /// Returns `None` when the network carries no id.
    pub fn from_network(network: &Network) -> Option<Self> {
        if network.id.is_empty() {
            return None;
        }
        Some(Self {
            id: network.id.clone(),
            name: network.name.clone(),
        })
    }

    pub fn graph_id(&self) -> String {
        node_id(NodeKind::Network, &self.id)
    }
}

/// Networks that were declared as graph nodes, keyed by network id, in declaration order.
pub type KnownNetworks = IndexMap<String, NetworkNode>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNode {
    pub id: String,
    pub name: String,
    pub labels: IndexMap<String, String>,
    /// `None` when the service declares no endpoint specification at all.
    pub mode: Option<ResolutionMode>,
    pub virtual_ips: Vec<VirtualIp>,
    pub ports: Vec<PortConfig>,
    pub network_targets: Vec<String>,
}

impl ServiceNode {
    /// Returns `None` when the service carries no id.
    pub fn from_service(service: &Service) -> Option<Self> {
        if service.id.is_empty() {
            return None;
        }

        // Published ports as observed on the endpoint; a service that has not converged yet
        // only has the declared ones.
        let ports = if !service.endpoint.ports.is_empty() {
            service.endpoint.ports.clone()
        } else {
            service
                .endpoint_spec
                .as_ref()
                .map(|spec| spec.ports.clone())
                .unwrap_or_default()
        };

        Some(Self {
            id: service.id.clone(),
            name: service.name.clone(),
            labels: service.labels.clone(),
            mode: service.endpoint_spec.as_ref().map(|spec| spec.mode),
            virtual_ips: service.endpoint.virtual_ips.clone(),
            ports,
            network_targets: service
                .networks
                .iter()
                .map(|target| target.target.clone())
                .collect(),
        })
    }

    pub fn graph_id(&self) -> String {
        node_id(NodeKind::Service, &self.id)
    }
}
