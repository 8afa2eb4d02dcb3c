//! Vibration motor abstraction

use crate::DriverError;

/// Haptic actuator.
pub trait Haptic {
    /// Configure the drive pin.
    async fn init(&mut self) -> Result<(), DriverError>;

    /// Vibrate for `duration_ms`, returning once the pulse has ended.
    async fn pulse(&mut self, duration_ms: u32);
}
