//! Power button abstraction

use crate::DriverError;

/// Power button driver.
///
/// The button's event handler owns the device's on/off flag; the core only
/// initialises it and arms its work item.
pub trait ButtonInput {
    /// Configure the button pin and interrupt.
    async fn init(&mut self) -> Result<(), DriverError>;

    /// Arm the button handling work.
    fn activate(&mut self);
}
