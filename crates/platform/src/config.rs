//! Device configuration and timing constants
//!
//! All branding, cadences and buffer sizes referenced by the firmware live
//! here rather than being hardcoded at the call sites.

/// The device name
pub const APP_NAME: &str = "Pendant";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Audio ────────────────────────────────────────────────────────────────────

/// Microphone sample rate in Hz.
pub const MIC_SAMPLE_RATE_HZ: u32 = 16_000;

/// Samples per microphone block (100 ms at 16 kHz, mono).
pub const MIC_BUFFER_SAMPLES: usize = 1600;

/// Upper bound on one encoded frame handed from the codec to the transport.
pub const CODEC_OUTPUT_MAX_BYTES: usize = 160;

// ── Status indicator ─────────────────────────────────────────────────────────

/// Period of the status indicator tick.
///
/// This is also the staleness bound on the power/link flags: a flag written
/// by an event source becomes visible no later than one tick afterwards.
pub const STATUS_TICK_MS: u32 = 500;

// ── Bring-up visuals ─────────────────────────────────────────────────────────

/// On-time of each color during the power-on sweep.
pub const BOOT_BLINK_MS: u32 = 600;

/// Dark gap between colors during the power-on sweep.
pub const BOOT_PAUSE_MS: u32 = 200;

/// Number of toggles in a stage failure blink.
pub const FAILURE_BLINK_CYCLES: u8 = 5;

/// Period of one toggle in a stage failure blink.
pub const FAILURE_BLINK_PERIOD_MS: u32 = 200;

/// Duration of the haptic confirmation pulse after the codec starts.
pub const HAPTIC_BOOT_PULSE_MS: u32 = 500;

/// How long the "bring-up complete" color stays lit.
pub const BOOT_DONE_FLASH_MS: u32 = 1000;

// ── Mailbox ──────────────────────────────────────────────────────────────────

/// How long a start request waits for the peer's reply.
pub const MAILBOX_REPLY_TIMEOUT_MS: u64 = 2_000;

/// Encoded frames that may queue toward the radio peer before `broadcast`
/// reports busy.
pub const UPLINK_QUEUE_DEPTH: usize = 4;
