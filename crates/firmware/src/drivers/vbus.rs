//! USB VBUS sensing.
//!
//! VBUS is wired through a divider to an edge-capable GPIO input. While it
//! reads high the device is on external power and a charge event is pending.
//!
//! Like the power button this is split in two: [`VbusMonitor`] is started by
//! the bring-up sequence, publishes the level once and hands the pin to the
//! [`VbusWatcher`] task, which republishes on every edge.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;
use platform::{DriverError, UsbPower};

use crate::state::DeviceState;

/// Pin handover from the board half to the watcher.
pub type VbusHandoff<M, P> = Signal<M, P>;

fn publish<P: InputPin>(pin: &mut P, state: &DeviceState) -> Result<bool, DriverError> {
    let present = pin.is_high().map_err(|_| DriverError::IO)?;
    state.set_charge_event(present);
    Ok(present)
}

/// Board half of VBUS sensing.
pub struct VbusMonitor<'a, M: RawMutex, P> {
    pin: Option<P>,
    handoff: &'a VbusHandoff<M, P>,
    state: &'a DeviceState,
}

impl<'a, M: RawMutex, P: InputPin> VbusMonitor<'a, M, P> {
    /// Sample `pin` into `state` at init, then pass it through `handoff`.
    pub fn new(pin: P, handoff: &'a VbusHandoff<M, P>, state: &'a DeviceState) -> Self {
        Self {
            pin: Some(pin),
            handoff,
            state,
        }
    }
}

impl<M: RawMutex, P: InputPin> UsbPower for VbusMonitor<'_, M, P> {
    async fn init(&mut self) -> Result<(), DriverError> {
        let mut pin = self.pin.take().ok_or(DriverError::BUSY)?;
        let present = publish(&mut pin, self.state)?;
        info!("VBUS {}", if present { "present" } else { "absent" });
        self.handoff.signal(pin);
        Ok(())
    }
}

/// VBUS edge watcher, run as its own task.
pub struct VbusWatcher<'a, M: RawMutex, P> {
    handoff: &'a VbusHandoff<M, P>,
    state: &'a DeviceState,
}

impl<'a, M, P> VbusWatcher<'a, M, P>
where
    M: RawMutex,
    P: Wait + InputPin,
{
    /// Watch the pin received through `handoff`.
    pub fn new(handoff: &'a VbusHandoff<M, P>, state: &'a DeviceState) -> Self {
        Self { handoff, state }
    }

    /// Wait for one VBUS edge on `pin` and republish the level.
    pub async fn next_edge(&self, pin: &mut P) -> Result<bool, DriverError> {
        pin.wait_for_any_edge()
            .await
            .map_err(|_| DriverError::IO)?;
        publish(pin, self.state)
    }

    /// Wait for the handover, then follow VBUS forever.
    pub async fn run(self) -> Infallible {
        let mut pin = self.handoff.wait().await;
        loop {
            match self.next_edge(&mut pin).await {
                Ok(present) => debug!("VBUS {}", present),
                Err(err) => warn!("VBUS read failed ({})", err),
            }
        }
    }
}
