//! Offline recording storage abstraction

use crate::DriverError;

/// Removable storage that holds recordings while the link is down.
pub trait OfflineStorage {
    /// Mount the filesystem.
    async fn mount(&mut self) -> Result<(), DriverError>;
}
