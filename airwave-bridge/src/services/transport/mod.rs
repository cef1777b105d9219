use airwave_api::protocols::Handle;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::TransportError;

/// A single advertisement seen while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: String,
    pub connectable: bool,
    pub manufacturer_data: Option<Vec<u8>>,
}

pub type AdvertisementStream = BoxStream<'static, Result<Advertisement, TransportError>>;

/// Seam over the Bluetooth LE stack.
///
/// Implementations backed by a blocking stack must move that work off the
/// async runtime themselves (`tokio::task::spawn_blocking`), otherwise a hung
/// call cannot be abandoned by the read deadline.
#[async_trait]
pub trait Radio: Send + Sync {
    /// Start scanning. The scan runs until the returned stream is dropped or
    /// the radio ends it.
    async fn scan(&self) -> Result<AdvertisementStream, TransportError>;

    async fn connect(&self, address: &str) -> Result<Box<dyn Link>, TransportError>;
}

/// An open connection to one peripheral.
#[async_trait]
pub trait Link: Send {
    async fn read_characteristic(&mut self, handle: Handle) -> Result<Vec<u8>, TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}
