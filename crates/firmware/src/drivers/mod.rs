//! GPIO-level leaf drivers.
//!
//! Written against the `embedded-hal` 1.0 traits so they run on the
//! embassy-stm32 pins in the hardware build and on `embedded-hal-mock` pins
//! in tests.

pub mod button;
pub mod haptic;
pub mod led;
pub mod vbus;

pub use button::{ButtonHandoff, ButtonWorker, PowerButton};
pub use haptic::GpioHaptic;
pub use led::GpioIndicator;
pub use vbus::{VbusHandoff, VbusMonitor, VbusWatcher};
