use super::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Scan(#[from] TransportError),

    #[error("Discovery failed {attempts} time(s) in a row: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<DiscoveryError>,
    },
}
