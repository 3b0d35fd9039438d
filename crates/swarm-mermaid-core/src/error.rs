use crate::cluster::FetchError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Listing the (filtered) networks failed. Fatal to the whole render.
    #[error(transparent)]
    ListNetworks(FetchError),

    /// Listing the services failed. Fatal to the whole render.
    #[error(transparent)]
    ListServices(FetchError),

    #[error("Invalid snapshot JSON: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
