//! Power button.
//!
//! Active-low push button with an edge-capable input (EXTI on target). Each
//! debounced press flips the device between on and off.
//!
//! The driver comes in two halves. [`PowerButton`] sits on the board and is
//! started by the bring-up sequence; `activate` hands the pin over to the
//! [`ButtonWorker`] task, which owns it from then on.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use platform::{ButtonInput, DriverError};

use crate::state::DeviceState;

/// Settle time before a press is accepted.
pub const DEBOUNCE_MS: u32 = 50;

/// Pin handover from the board half to the worker.
pub type ButtonHandoff<M, P> = Signal<M, P>;

/// Board half of the power button.
pub struct PowerButton<'a, M: RawMutex, P> {
    pin: Option<P>,
    handoff: &'a ButtonHandoff<M, P>,
}

impl<'a, M: RawMutex, P: InputPin> PowerButton<'a, M, P> {
    /// Own `pin` until activation, then pass it through `handoff`.
    pub fn new(pin: P, handoff: &'a ButtonHandoff<M, P>) -> Self {
        Self {
            pin: Some(pin),
            handoff,
        }
    }
}

impl<M: RawMutex, P: InputPin> ButtonInput for PowerButton<'_, M, P> {
    async fn init(&mut self) -> Result<(), DriverError> {
        let pin = self.pin.as_mut().ok_or(DriverError::BUSY)?;
        pin.is_low().map(|_| ()).map_err(|_| DriverError::IO)
    }

    fn activate(&mut self) {
        if let Some(pin) = self.pin.take() {
            self.handoff.signal(pin);
        }
    }
}

/// Press handling loop, run as its own task.
pub struct ButtonWorker<'a, M: RawMutex, P, D> {
    handoff: &'a ButtonHandoff<M, P>,
    delay: D,
    state: &'a DeviceState,
}

impl<'a, M, P, D> ButtonWorker<'a, M, P, D>
where
    M: RawMutex,
    P: Wait + InputPin,
    D: DelayNs,
{
    /// Handle presses on the pin received through `handoff`.
    pub fn new(handoff: &'a ButtonHandoff<M, P>, delay: D, state: &'a DeviceState) -> Self {
        Self {
            handoff,
            delay,
            state,
        }
    }

    /// Wait for one debounced press on `pin` and flip the power flag.
    ///
    /// Returns the new off state, or `None` for a bounce.
    pub async fn next_press(&mut self, pin: &mut P) -> Result<Option<bool>, DriverError> {
        pin.wait_for_falling_edge()
            .await
            .map_err(|_| DriverError::IO)?;
        self.delay.delay_ms(DEBOUNCE_MS).await;
        if !pin.is_low().map_err(|_| DriverError::IO)? {
            return Ok(None);
        }
        let off = self.state.toggle_off();
        info!("power button: device {}", if off { "off" } else { "on" });
        pin.wait_for_high().await.map_err(|_| DriverError::IO)?;
        Ok(Some(off))
    }

    /// Wait for activation, then handle presses forever.
    pub async fn run(mut self) -> Infallible {
        let mut pin = self.handoff.wait().await;
        loop {
            if let Err(err) = self.next_press(&mut pin).await {
                warn!("power button read failed ({})", err);
                self.delay.delay_ms(DEBOUNCE_MS).await;
            }
        }
    }
}
