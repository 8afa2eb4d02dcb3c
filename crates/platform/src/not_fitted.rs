//! Placeholder for optional parts a board does not carry.
//!
//! A board wiring that leaves, say, the accelerometer off the PCB still has
//! to name a type for that slot. `NotFitted` fills it: every start operation
//! fails with [`DriverError::NO_DEVICE`], so enabling the stage on such a
//! board halts bring-up loudly instead of silently skipping it.

use crate::{
    Accelerometer, Battery, ButtonInput, DriverError, Haptic, OfflineStorage, Speaker, UsbPower,
};

/// An optional collaborator that is not fitted on this board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotFitted;

impl Battery for NotFitted {
    async fn init(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }

    async fn start_charging(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }
}

impl ButtonInput for NotFitted {
    async fn init(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }

    fn activate(&mut self) {}
}

impl Accelerometer for NotFitted {
    async fn start(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }
}

impl Speaker for NotFitted {
    async fn init(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }

    async fn play_boot_chime(&mut self) {}
}

impl OfflineStorage for NotFitted {
    async fn mount(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }
}

impl Haptic for NotFitted {
    async fn init(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }

    async fn pulse(&mut self, _duration_ms: u32) {}
}

impl UsbPower for NotFitted {
    async fn init(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NO_DEVICE)
    }
}
