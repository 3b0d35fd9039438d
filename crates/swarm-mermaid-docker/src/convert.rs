//! Engine API models -> snapshot model.

use bollard::models::{
    EndpointPortConfig, EndpointPortConfigProtocolEnum, EndpointSpec as EngineEndpointSpec,
    EndpointSpecModeEnum, Network as EngineNetwork, NetworkAttachmentConfig,
    Service as EngineService,
};
use indexmap::IndexMap;
use swarm_mermaid_core::model::{
    EndpointSpec, NetworkTarget, PortConfig, Protocol, ResolutionMode, ServiceEndpoint, VirtualIp,
};
use swarm_mermaid_core::{Network, Service};

pub fn network_from_engine(network: EngineNetwork) -> Network {
    Network {
        id: network.id.unwrap_or_default(),
        name: network.name.unwrap_or_default(),
        driver: network.driver,
        scope: network.scope,
    }
}

fn resolution_mode(mode: Option<EndpointSpecModeEnum>) -> ResolutionMode {
    match mode {
        Some(EndpointSpecModeEnum::VIP) => ResolutionMode::Vip,
        Some(EndpointSpecModeEnum::DNSRR) => ResolutionMode::Dnsrr,
        Some(EndpointSpecModeEnum::EMPTY) | None => ResolutionMode::Unspecified,
    }
}

fn port_from_engine(port: EndpointPortConfig) -> PortConfig {
    PortConfig {
        name: port.name,
        protocol: match port.protocol {
            Some(EndpointPortConfigProtocolEnum::UDP) => Protocol::Udp,
            Some(EndpointPortConfigProtocolEnum::SCTP) => Protocol::Sctp,
            _ => Protocol::Tcp,
        },
        target_port: port.target_port.and_then(|p| u16::try_from(p).ok()),
        published_port: port.published_port.and_then(|p| u16::try_from(p).ok()),
        publish_mode: port.publish_mode.map(|mode| mode.to_string()),
    }
}

fn endpoint_spec_from_engine(spec: EngineEndpointSpec) -> EndpointSpec {
    EndpointSpec {
        mode: resolution_mode(spec.mode),
        ports: spec
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(port_from_engine)
            .collect(),
    }
}

fn network_target(attachment: NetworkAttachmentConfig) -> Option<NetworkTarget> {
    Some(NetworkTarget {
        target: attachment.target?,
        aliases: attachment.aliases.unwrap_or_default(),
    })
}

pub fn service_from_engine(service: EngineService) -> Service {
    let spec = service.spec.unwrap_or_default();
    let endpoint = service.endpoint.unwrap_or_default();

    // Sorted so saved snapshots are stable across runs.
    let mut labels = spec.labels.unwrap_or_default().into_iter().collect::<Vec<_>>();
    labels.sort();

    // Attachments moved into the task template; older services only have the top-level list.
    let attachments = spec
        .task_template
        .and_then(|task| task.networks)
        .or(spec.networks)
        .unwrap_or_default();

    Service {
        id: service.id.unwrap_or_default(),
        name: spec.name.unwrap_or_default(),
        labels: labels.into_iter().collect::<IndexMap<_, _>>(),
        endpoint_spec: spec.endpoint_spec.map(endpoint_spec_from_engine),
        endpoint: ServiceEndpoint {
            virtual_ips: endpoint
                .virtual_ips
                .unwrap_or_default()
                .into_iter()
                .filter_map(|vip| {
                    Some(VirtualIp {
                        network_id: vip.network_id?,
                        addr: vip.addr.unwrap_or_default(),
                    })
                })
                .collect(),
            ports: endpoint
                .ports
                .unwrap_or_default()
                .into_iter()
                .map(port_from_engine)
                .collect(),
        },
        networks: attachments.into_iter().filter_map(network_target).collect(),
    }
}
