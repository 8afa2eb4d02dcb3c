//! Collaborator contracts for the Pendant wearable recorder.
//!
//! The firmware core (bring-up sequencer, status indicator, audio bridge)
//! never talks to hardware directly. Every subsystem it sequences or feeds
//! is consumed through one of the narrow traits in this crate, so the core
//! runs unchanged against real drivers, the desktop simulator, or the
//! recording mocks in [`mocks`].
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: boot, status, bridge)
//!         ↓
//! Collaborator contracts (this crate - traits + value types)
//!         ↓
//! Leaf drivers (GPIO LEDs, radio link, codec, PDM sampler, storage, USB)
//! ```
//!
//! # Contracts
//!
//! ## Mandatory collaborators
//! - [`Indicator`] - tri-color status light
//! - [`Transport`] - outbound radio link
//! - [`AudioCodec`] - PCM in, encoded frames out
//! - [`Microphone`] - PCM sampler
//!
//! ## Optional collaborators
//! - [`Battery`], [`UsbPower`] - charge management and VBUS sensing
//! - [`ButtonInput`] - power button
//! - [`Accelerometer`] - motion sensor
//! - [`Speaker`] - boot chime playback
//! - [`OfflineStorage`] - SD card recording store
//! - [`Haptic`] - vibration motor
//!
//! Boards that lack an optional part plug in [`NotFitted`].
//!
//! # Features
//!
//! - `std`: Expose [`mocks`] to other crates' tests
//! - `defmt`: Enable `defmt::Format` derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)] // register and part names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod audio;
pub mod config;
pub mod error;
pub mod haptic;
pub mod indicator;
pub mod input;
pub mod not_fitted;
pub mod power;
pub mod sensor;
pub mod storage;
pub mod transport;

#[cfg(all(feature = "std", not(test)))]
extern crate std;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export the collaborator contracts
pub use audio::{AudioCodec, EncodedFrame, Microphone, PcmFrame, Speaker};
pub use error::DriverError;
pub use haptic::Haptic;
pub use indicator::{Indicator, LedChannel, LedSet};
pub use input::ButtonInput;
pub use not_fitted::NotFitted;
pub use power::{Battery, ResetCause, UsbPower};
pub use sensor::Accelerometer;
pub use storage::OfflineStorage;
pub use transport::Transport;
