//! Integration test: what the capture bridge writes to the log.
//!
//! Tests that:
//!   1. A frame the codec accepts produces no log output
//!   2. A rejected frame produces exactly one error line, and the good
//!      frame after it adds nothing
//!
//! Needs the tracing backend, so it only builds with the emulator feature.
//!
//! Run with: cargo test -p firmware --features emulator --test bridge_logging

#![cfg(feature = "emulator")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use std::io;
use std::sync::{Arc, Mutex};

use firmware::{CaptureBridge, FrameOutcome};
use platform::config::MIC_BUFFER_SAMPLES;
use platform::mocks::{CallLog, MockDevice};
use platform::DriverError;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// Shared buffer every formatted event is written into.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's events into a fresh buffer until the guard drops.
fn capture() -> (Captured, impl Sized) {
    let out = Captured::default();
    let guard = tracing_subscriber::fmt()
        .with_writer(out.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish()
        .set_default();
    (out, guard)
}

#[test]
fn accepted_frame_logs_nothing() {
    let (out, _guard) = capture();
    let mut codec = MockDevice::new("codec", CallLog::new());
    let mut bridge = CaptureBridge::new(&mut codec);
    let block = [0i16; MIC_BUFFER_SAMPLES];

    assert_eq!(bridge.on_pcm_ready(&block), FrameOutcome::Forwarded);
    assert!(out.lines().is_empty(), "unexpected output: {:?}", out.lines());
}

#[test]
fn rejected_frame_logs_one_error() {
    let (out, _guard) = capture();
    let mut codec = MockDevice::new("codec", CallLog::new());
    codec.fail_next_frames(1);
    let mut bridge = CaptureBridge::new(&mut codec);
    let block = [0i16; MIC_BUFFER_SAMPLES];

    assert_eq!(
        bridge.on_pcm_ready(&block),
        FrameOutcome::Dropped(DriverError::IO)
    );
    assert_eq!(bridge.on_pcm_ready(&block), FrameOutcome::Forwarded);

    let lines = out.lines();
    assert_eq!(lines.len(), 1, "expected one line, got {lines:?}");
    assert!(lines[0].contains("ERROR"));
    assert!(lines[0].contains("failed to process PCM data"));
}
