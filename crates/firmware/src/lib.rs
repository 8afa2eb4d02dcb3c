//! Wearable recorder firmware
//!
//! Bring-up, status indication and audio bridging for a button-driven
//! voice recorder on STM32WB55.
//!
//! # Architecture
//!
//! ```text
//! Application (main.rs / bin/emulator.rs → app::run)
//!         ↓
//! Bring-up sequencer (boot) · status loop (status) · frame bridge (bridge)
//!         ↓
//! Board (board) over platform contracts
//!         ↓
//! Leaf drivers (drivers, mailbox + companion link)
//!         ↓
//! Platform HAL (Embassy, STM32WB)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the STM32WB55 target (embassy, defmt/RTT)
//! - `emulator` - Build the desktop emulator (tokio, tracing)
//! - `std` - Enable standard library
//! - `battery`, `button`, `accelerometer`, `speaker`, `offline-storage`,
//!   `haptic`, `usb` - Optional bring-up stages
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware,nucleo
//! ```
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --bin emulator --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(async_fn_in_trait)] // contracts are used with static dispatch only
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::type_complexity)] // Board carries one type parameter per stage
#![allow(clippy::unused_async)]

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

pub mod app;
pub mod board;
pub mod boot;
pub mod bridge;
pub mod companion;
pub mod drivers;
pub mod exception_handlers;
pub mod mailbox;
pub mod state;
pub mod status;

#[cfg(feature = "emulator")]
pub mod sim;

pub use app::{run, FrameSlots};
pub use board::Board;
pub use boot::{bring_up, BootConfig, BootError, Stage, StageRunner, BRING_UP_PLAN};
pub use bridge::{CaptureBridge, FrameOutcome, FrameStats, UplinkBridge};
pub use mailbox::{Mailbox, MailboxCodec, MailboxMicrophone, MailboxTransport};
pub use state::{DeviceState, StatusInputs};
pub use status::{LedFrame, StatusIndicator};
