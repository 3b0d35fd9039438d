//! The cluster-state collaborator.
//!
//! The grapher never talks to an orchestrator itself; it asks a [`ClusterState`] for the two
//! listings it needs. `swarm-mermaid-docker` provides the Engine API implementation,
//! [`StaticCluster`] serves a saved [`Snapshot`].

use crate::model::{Network, Service, Snapshot};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A listing call failed. The message is shown to clients verbatim.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn from_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Selects which networks become graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkFilter {
    /// Only networks created with this driver. `None` keeps every network.
    pub driver: Option<String>,
}

impl Default for NetworkFilter {
    fn default() -> Self {
        Self::overlay()
    }
}

impl NetworkFilter {
    pub const OVERLAY_DRIVER: &'static str = "overlay";

    pub fn overlay() -> Self {
        Self::driver(Self::OVERLAY_DRIVER)
    }

    pub fn driver(driver: impl Into<String>) -> Self {
        Self {
            driver: Some(driver.into()),
        }
    }

    pub fn all() -> Self {
        Self { driver: None }
    }

    /// A network without a recorded driver (hand-written snapshots) is kept; only a known,
    /// different driver is filtered out.
    pub fn matches(&self, network: &Network) -> bool {
        match (&self.driver, network.driver.as_deref()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

/// Read-only access to the cluster's networks and services.
///
/// Both calls are made once per graph, networks first. No pagination, no retries: an error is
/// reported as-is.
pub trait ClusterState {
    fn list_networks(
        &self,
        filter: &NetworkFilter,
    ) -> impl Future<Output = Result<Vec<Network>, FetchError>> + Send;

    fn list_services(&self) -> impl Future<Output = Result<Vec<Service>, FetchError>> + Send;
}

/// Serves a fixed snapshot, applying the network filter locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCluster {
    snapshot: Snapshot,
}

impl StaticCluster {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl From<Snapshot> for StaticCluster {
    fn from(snapshot: Snapshot) -> Self {
        Self::new(snapshot)
    }
}

impl ClusterState for StaticCluster {
    async fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>, FetchError> {
        Ok(self
            .snapshot
            .networks
            .iter()
            .filter(|network| filter.matches(network))
            .cloned()
            .collect())
    }

    async fn list_services(&self) -> Result<Vec<Service>, FetchError> {
        Ok(self.snapshot.services.clone())
    }
}

/// Reads the full snapshot a [`ClusterState`] exposes under `filter`.
pub async fn fetch_snapshot<C>(cluster: &C, filter: &NetworkFilter) -> crate::Result<Snapshot>
where
    C: ClusterState,
{
    let networks = cluster
        .list_networks(filter)
        .await
        .map_err(crate::Error::ListNetworks)?;
    let services = cluster
        .list_services()
        .await
        .map_err(crate::Error::ListServices)?;
    Ok(Snapshot { networks, services })
}
