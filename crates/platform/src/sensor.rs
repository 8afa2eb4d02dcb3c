//! Motion sensor abstraction

use crate::DriverError;

/// Accelerometer.
pub trait Accelerometer {
    /// Power up the sensor and start its sampling.
    async fn start(&mut self) -> Result<(), DriverError>;
}
