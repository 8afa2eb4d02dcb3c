//! Device power / link state.
//!
//! Written by the asynchronous event sources (power button, radio link
//! callbacks, VBUS sensing) and read once per status tick. Each flag has a
//! single writer and a single reader, so relaxed atomics are enough: a reader
//! may see a value up to one tick (500 ms) stale, and nothing else depends on
//! the flags being mutually consistent.

use core::sync::atomic::{AtomicBool, Ordering};

/// Snapshot of the flags the status indicator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusInputs {
    /// Device is switched off (light dark except the charge color).
    pub off: bool,
    /// Radio link has a connected peer.
    pub connected: bool,
    /// A charge event is pending.
    pub charge_event: bool,
}

/// Process-wide power / link flags.
#[derive(Debug)]
pub struct DeviceState {
    off: AtomicBool,
    connected: AtomicBool,
    charge_event: AtomicBool,
}

impl DeviceState {
    /// Initial state: off, disconnected, no charge event.
    pub const fn new() -> Self {
        Self {
            off: AtomicBool::new(true),
            connected: AtomicBool::new(false),
            charge_event: AtomicBool::new(false),
        }
    }

    /// Set by the power source (button handler).
    pub fn set_off(&self, off: bool) {
        self.off.store(off, Ordering::Relaxed);
    }

    /// Whether the device is switched off.
    pub fn is_off(&self) -> bool {
        self.off.load(Ordering::Relaxed)
    }

    /// Flip the off flag, returning the new value.
    pub fn toggle_off(&self) -> bool {
        !self.off.fetch_xor(true, Ordering::Relaxed)
    }

    /// Set by the transport's connect / disconnect handlers.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Whether a peer is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Set by the USB / VBUS source.
    pub fn set_charge_event(&self, pending: bool) {
        self.charge_event.store(pending, Ordering::Relaxed);
    }

    /// Whether a charge event is pending.
    pub fn charge_event(&self) -> bool {
        self.charge_event.load(Ordering::Relaxed)
    }

    /// Read all three flags.
    pub fn snapshot(&self) -> StatusInputs {
        StatusInputs {
            off: self.is_off(),
            connected: self.is_connected(),
            charge_event: self.charge_event(),
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
