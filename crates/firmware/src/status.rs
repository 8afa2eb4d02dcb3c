//! Status indicator state machine.
//!
//! Once per tick the light is recomputed from the device flags:
//!
//! 1. Charge overlay (green). A pending charge event flips the displayed
//!    charging state and green follows it; with no event pending, green is
//!    cleared and the charging state is kept. A charge event that stays
//!    asserted therefore blinks green at half the tick rate.
//! 2. Off: red and blue dark, green untouched.
//! 3. Connected: blue on, red off.
//! 4. Disconnected: red on, blue off.
//!
//! The machine cannot fail and has no terminal state.

use core::convert::Infallible;

use embedded_hal_async::delay::DelayNs;
use platform::config::STATUS_TICK_MS;
use platform::{Indicator, LedChannel};

use crate::state::{DeviceState, StatusInputs};

/// Color showing the charge overlay.
pub const CHARGE_COLOR: LedChannel = LedChannel::Green;
/// Color showing a connected link.
pub const CONNECTED_COLOR: LedChannel = LedChannel::Blue;
/// Color showing a lost link.
pub const DISCONNECTED_COLOR: LedChannel = LedChannel::Red;

/// Light state produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedFrame {
    /// Charge color.
    pub charge: bool,
    /// Connected color.
    pub connected: bool,
    /// Disconnected color.
    pub disconnected: bool,
}

/// The status machine's own state: the displayed charging phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusIndicator {
    charging: bool,
}

impl StatusIndicator {
    /// Not charging.
    pub const fn new() -> Self {
        Self { charging: false }
    }

    /// Displayed charging phase.
    pub const fn is_charging(&self) -> bool {
        self.charging
    }

    /// Advance one tick and return the light to show.
    pub fn next(&mut self, inputs: StatusInputs) -> LedFrame {
        let charge = if inputs.charge_event {
            self.charging = !self.charging;
            self.charging
        } else {
            false
        };

        if inputs.off {
            LedFrame {
                charge,
                connected: false,
                disconnected: false,
            }
        } else {
            LedFrame {
                charge,
                connected: inputs.connected,
                disconnected: !inputs.connected,
            }
        }
    }

    /// Advance one tick and drive the light.
    pub fn tick<I: Indicator>(&mut self, inputs: StatusInputs, indicator: &mut I) -> LedFrame {
        let frame = self.next(inputs);
        indicator.set(CHARGE_COLOR, frame.charge);
        indicator.set(DISCONNECTED_COLOR, frame.disconnected);
        indicator.set(CONNECTED_COLOR, frame.connected);
        frame
    }
}

/// Tick the status machine forever.
pub async fn status_loop<I, D>(state: &DeviceState, indicator: &mut I, delay: &mut D) -> Infallible
where
    I: Indicator,
    D: DelayNs,
{
    let mut machine = StatusIndicator::new();
    let mut last: Option<LedFrame> = None;
    loop {
        let frame = machine.tick(state.snapshot(), indicator);
        if last != Some(frame) {
            trace!(
                "status: charge={} connected={} disconnected={}",
                frame.charge,
                frame.connected,
                frame.disconnected
            );
            last = Some(frame);
        }
        delay.delay_ms(STATUS_TICK_MS).await;
    }
}
