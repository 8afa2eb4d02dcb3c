//! Outbound radio link abstraction

use crate::DriverError;

/// Outbound transport for encoded audio.
///
/// Connection state changes are published by the transport's own event
/// handlers into the firmware's device state; they are not part of this
/// contract.
pub trait Transport {
    /// Bring up the link (advertising, services).
    async fn start(&mut self) -> Result<(), DriverError>;

    /// Queue one encoded frame for transmission to the connected peer.
    ///
    /// Must not block and must not retain `frame` after returning.
    fn broadcast(&mut self, frame: &[u8]) -> Result<(), DriverError>;
}
