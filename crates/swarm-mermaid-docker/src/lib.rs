#![forbid(unsafe_code)]

//! [`ClusterState`] backed by the Docker Engine API.
//!
//! The connection follows the usual client environment (`DOCKER_HOST`, `DOCKER_TLS_VERIFY`,
//! `DOCKER_CERT_PATH`, or the local socket), so pointing the grapher at a remote swarm manager is
//! a matter of exporting `DOCKER_HOST`.

mod convert;

pub use convert::{network_from_engine, service_from_engine};

use bollard::Docker;
use bollard::network::ListNetworksOptions;
use bollard::service::ListServicesOptions;
use std::collections::HashMap;
use std::time::Duration;
use swarm_mermaid_core::{ClusterState, FetchError, Network, NetworkFilter, Service};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Docker client configuration error: {0}")]
    Connect(#[from] bollard::errors::Error),
}

/// Engine API cluster source.
///
/// Unless a client is supplied, a new one is built from the environment for every listing, so a
/// daemon that is down (or comes back) is only noticed when a graph is requested.
#[derive(Debug, Clone, Default)]
pub struct DockerCluster {
    client: Option<Docker>,
    timeout: Option<Duration>,
}

impl DockerCluster {
    /// Connects through `DOCKER_HOST` (`unix://`, `tcp://`, `https://`), honouring
    /// `DOCKER_TLS_VERIFY` / `DOCKER_CERT_PATH`; the local socket when unset.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn from_client(docker: Docker) -> Self {
        Self {
            client: Some(docker),
            timeout: None,
        }
    }

    /// Per-request timeout of the Engine API client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn client(&self) -> Result<Docker> {
        let docker = match &self.client {
            Some(docker) => docker.clone(),
            None => Docker::connect_with_defaults()?,
        };
        Ok(match self.timeout {
            Some(timeout) => docker.with_timeout(timeout),
            None => docker,
        })
    }
}

fn network_list_options(filter: &NetworkFilter) -> ListNetworksOptions<String> {
    let mut filters = HashMap::new();
    if let Some(driver) = &filter.driver {
        filters.insert("driver".to_string(), vec![driver.clone()]);
    }
    ListNetworksOptions { filters }
}

impl ClusterState for DockerCluster {
    async fn list_networks(
        &self,
        filter: &NetworkFilter,
    ) -> std::result::Result<Vec<Network>, FetchError> {
        let docker = self.client().map_err(FetchError::from_source)?;
        let networks = docker
            .list_networks(Some(network_list_options(filter)))
            .await
            .map_err(FetchError::from_source)?;
        tracing::debug!(count = networks.len(), driver = ?filter.driver, "listed networks");

        Ok(networks
            .into_iter()
            .map(network_from_engine)
            .filter(|network| filter.matches(network))
            .collect())
    }

    async fn list_services(&self) -> std::result::Result<Vec<Service>, FetchError> {
        let docker = self.client().map_err(FetchError::from_source)?;
        let services = docker
            .list_services(None::<ListServicesOptions<String>>)
            .await
            .map_err(FetchError::from_source)?;
        tracing::debug!(count = services.len(), "listed services");
        Ok(services.into_iter().map(service_from_engine).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_filter_is_forwarded_to_the_daemon() {
        let opts = network_list_options(&NetworkFilter::overlay());
        assert_eq!(
            opts.filters.get("driver"),
            Some(&vec!["overlay".to_string()])
        );
    }

    #[test]
    fn unfiltered_listing_sends_no_filters() {
        let opts = network_list_options(&NetworkFilter::all());
        assert!(opts.filters.is_empty());
    }

    #[tokio::test]
    async fn refused_connection_is_a_fetch_error() {
        let docker =
            Docker::connect_with_http("tcp://127.0.0.1:1", 2, bollard::API_DEFAULT_VERSION)
                .unwrap();
        let cluster = DockerCluster::from_client(docker).with_timeout(Duration::from_secs(2));
        assert!(cluster.client().is_ok());

        let err = cluster.list_services().await.unwrap_err();
        assert!(!err.message().is_empty());
    }
}
