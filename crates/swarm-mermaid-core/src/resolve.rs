//! Service-to-network resolution.
//!
//! Which networks a service is attached to depends on its endpoint resolution mode:
//!
//! - virtual-IP services are attached wherever the orchestrator allocated them a virtual IP;
//!   each record is looked up in the declared networks and carries the bound address
//! - DNS round-robin (or unspecified) services are attached to their declared network targets,
//!   taken verbatim
//! - services without an endpoint specification are not attached anywhere

use crate::ids::NodeKind;
use crate::model::{PortConfig, ResolutionMode};
use crate::node::{KnownNetworks, ServiceNode};
use indexmap::IndexMap;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// What resolved bindings are keyed by.
///
/// Keying by display name means two virtual-IP records on networks that share a name collapse
/// into one binding (the later record wins). This is the historical output; `NetworkId` keeps
/// every network apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingKey {
    #[default]
    NetworkName,
    NetworkId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBinding {
    pub network_id: String,
    pub network_name: String,
    /// Address part of the virtual IP. Only set for virtual-IP bindings that parsed.
    pub addr: Option<IpAddr>,
    pub ports: Vec<PortConfig>,
}

/// Bindings in resolution order, keyed per [`BindingKey`].
pub type Bindings = IndexMap<String, NetworkBinding>;

/// Recoverable findings collected while building a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    #[serde(rename_all = "camelCase")]
    UnresolvedNetworkReference {
        service_id: String,
        network_id: String,
    },
    #[serde(rename_all = "camelCase")]
    MalformedAddress {
        service_id: String,
        network_id: String,
        addr: String,
    },
    MissingId { node: NodeKind },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnresolvedNetworkReference {
                service_id,
                network_id,
            } => write!(
                f,
                "service {service_id} references unknown network {network_id}"
            ),
            Diagnostic::MalformedAddress {
                service_id,
                network_id,
                addr,
            } => write!(
                f,
                "service {service_id} has malformed virtual IP {addr:?} on network {network_id}"
            ),
            Diagnostic::MissingId { node } => write!(f, "{} without id skipped", node.prefix()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub bindings: Bindings,
    pub diagnostics: Vec<Diagnostic>,
}

/// Address component of a CIDR-notated virtual IP (`10.0.0.5/24` -> `10.0.0.5`).
///
/// A bare address without prefix length is accepted as a host address.
pub fn parse_cidr_addr(addr: &str) -> Option<IpAddr> {
    addr.trim().parse::<IpNetwork>().ok().map(|net| net.ip())
}

pub fn resolve(service: &ServiceNode, known: &KnownNetworks, key: BindingKey) -> Resolution {
    match service.mode {
        None => Resolution::default(),
        Some(ResolutionMode::Vip) => resolve_virtual_ips(service, known, key),
        Some(ResolutionMode::Dnsrr | ResolutionMode::Unspecified) => {
            resolve_network_targets(service)
        }
    }
}

fn resolve_virtual_ips(service: &ServiceNode, known: &KnownNetworks, key: BindingKey) -> Resolution {
    let mut out = Resolution::default();

    for vip in &service.virtual_ips {
        let Some(network) = known.get(&vip.network_id) else {
            tracing::debug!(
                service = %service.id,
                network = %vip.network_id,
                "network not found, virtual IP skipped"
            );
            out.diagnostics.push(Diagnostic::UnresolvedNetworkReference {
                service_id: service.id.clone(),
                network_id: vip.network_id.clone(),
            });
            continue;
        };

        let addr = parse_cidr_addr(&vip.addr);
        if addr.is_none() {
            tracing::warn!(
                service = %service.id,
                network = %vip.network_id,
                addr = %vip.addr,
                "malformed virtual IP, binding kept without address"
            );
            out.diagnostics.push(Diagnostic::MalformedAddress {
                service_id: service.id.clone(),
                network_id: vip.network_id.clone(),
                addr: vip.addr.clone(),
            });
        }

        let binding = NetworkBinding {
            network_id: vip.network_id.clone(),
            network_name: network.name.clone(),
            addr,
            ports: service.ports.clone(),
        };
        let map_key = match key {
            BindingKey::NetworkName => binding.network_name.clone(),
            BindingKey::NetworkId => binding.network_id.clone(),
        };
        // `IndexMap::insert` replaces the value in place, so a later record with the same key
        // wins while the edge keeps the position of the first one.
        out.bindings.insert(map_key, binding);
    }

    out
}

fn resolve_network_targets(service: &ServiceNode) -> Resolution {
    let mut out = Resolution::default();
    for target in &service.network_targets {
        out.bindings.insert(
            target.clone(),
            NetworkBinding {
                network_id: target.clone(),
                network_name: target.clone(),
                addr: None,
                ports: service.ports.clone(),
            },
        );
    }
    out
}
