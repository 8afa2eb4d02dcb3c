//! Vibration motor on a GPIO-driven MOSFET.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use platform::{DriverError, Haptic};

/// Motor switched by a single output; high = running.
pub struct GpioHaptic<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> GpioHaptic<P, D> {
    /// Wrap the drive pin and a delay source.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }
}

impl<P: OutputPin, D: DelayNs> Haptic for GpioHaptic<P, D> {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.pin.set_low().map_err(|_| DriverError::IO)
    }

    async fn pulse(&mut self, duration_ms: u32) {
        if self.pin.set_high().is_err() {
            warn!("haptic drive failed");
            return;
        }
        self.delay.delay_ms(duration_ms).await;
        if self.pin.set_low().is_err() {
            warn!("haptic release failed");
        }
    }
}
