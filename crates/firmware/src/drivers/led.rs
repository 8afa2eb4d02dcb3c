//! Tri-color status light on three GPIO outputs (active high).

use embedded_hal::digital::OutputPin;
use platform::{DriverError, Indicator, LedChannel, LedSet};

/// Status light driven by one push-pull output per die.
///
/// The driver keeps a shadow of what it last wrote so `is_on` never touches
/// the port.
pub struct GpioIndicator<R, G, B> {
    red: R,
    green: G,
    blue: B,
    lit: LedSet,
}

impl<R, G, B> GpioIndicator<R, G, B>
where
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    /// Wrap three configured output pins.
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self {
            red,
            green,
            blue,
            lit: LedSet::EMPTY,
        }
    }

    fn write(&mut self, channel: LedChannel, on: bool) -> Result<(), DriverError> {
        let result = match (channel, on) {
            (LedChannel::Red, true) => self.red.set_high().map_err(|_| DriverError::IO),
            (LedChannel::Red, false) => self.red.set_low().map_err(|_| DriverError::IO),
            (LedChannel::Green, true) => self.green.set_high().map_err(|_| DriverError::IO),
            (LedChannel::Green, false) => self.green.set_low().map_err(|_| DriverError::IO),
            (LedChannel::Blue, true) => self.blue.set_high().map_err(|_| DriverError::IO),
            (LedChannel::Blue, false) => self.blue.set_low().map_err(|_| DriverError::IO),
        };
        if result.is_ok() {
            self.lit = if on {
                self.lit.union(channel.into())
            } else {
                self.lit.without(channel)
            };
        }
        result
    }
}

impl<R, G, B> Indicator for GpioIndicator<R, G, B>
where
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    async fn start(&mut self) -> Result<(), DriverError> {
        for channel in LedChannel::ALL {
            self.write(channel, false)?;
        }
        Ok(())
    }

    fn set(&mut self, channel: LedChannel, on: bool) {
        if let Err(err) = self.write(channel, on) {
            warn!("{} LED write failed ({})", channel, err);
        }
    }

    fn is_on(&self, channel: LedChannel) -> bool {
        self.lit.contains(channel)
    }
}
