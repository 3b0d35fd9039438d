
use crate::cluster::{ClusterState, FetchError, NetworkFilter};
use crate::model::{Network, Service};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Which listing call a [`FailingCluster`] rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailOn {
    Networks,
    Services,
}

/// Serves fixed listings, except for one call that always fails.
#[derive(Debug)]
pub(crate) struct FailingCluster {
    pub(crate) fail_on: FailOn,
    pub(crate) networks: Vec<Network>,
    pub(crate) services: Vec<Service>,
    pub(crate) calls: AtomicUsize,
}

impl FailingCluster {
    pub(crate) fn new(fail_on: FailOn) -> Self {
        Self {
            fail_on,
            networks: vec![Network::new("n1", "net-a").with_driver("overlay")],
            services: vec![Service::new("s1", "web")],
            calls: AtomicUsize::new(0),
        }
    }
}

impl ClusterState for FailingCluster {
    async fn list_networks(&self, _filter: &NetworkFilter) -> Result<Vec<Network>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_on {
            FailOn::Networks => Err(FetchError::new("Cannot connect to the Docker daemon")),
            FailOn::Services => Ok(self.networks.clone()),
        }
    }

    async fn list_services(&self) -> Result<Vec<Service>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_on {
            FailOn::Networks => Ok(self.services.clone()),
            FailOn::Services => Err(FetchError::new("This node is not a swarm manager.")),
        }
    }
}
