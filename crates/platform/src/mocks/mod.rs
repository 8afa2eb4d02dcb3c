//! Recording mocks for testing
//!
//! Every mock writes into a shared [`CallLog`], so a test can assert the
//! global order of stage starts, LED changes and delays across all
//! collaborators of one bring-up run.

#![cfg(any(test, feature = "std"))]

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use crate::*;

/// One observable interaction with a mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `device.op()` was called (start, init, mount, pulse, ...).
    Op {
        /// Name the mock was created with.
        device: &'static str,
        /// Operation name.
        op: &'static str,
    },
    /// An indicator channel was driven.
    Led(LedChannel, bool),
    /// A delay was awaited.
    DelayMs(u32),
    /// A frame was handed to `device` (PCM samples or encoded bytes).
    Frame {
        /// Name the mock was created with.
        device: &'static str,
        /// Frame length in elements.
        len: usize,
    },
}

/// Shared, append-only interaction log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Event>>>);

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of every event so far.
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// `(device, op)` pairs in call order.
    pub fn ops(&self) -> Vec<(&'static str, &'static str)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Op { device, op } => Some((device, op)),
                _ => None,
            })
            .collect()
    }

    /// Devices that saw at least one call, in first-call order.
    pub fn devices(&self) -> Vec<&'static str> {
        let mut seen: Vec<&'static str> = Vec::new();
        for (device, _) in self.ops() {
            if !seen.contains(&device) {
                seen.push(device);
            }
        }
        seen
    }

    /// Whether `device` was called at all.
    pub fn touched(&self, device: &str) -> bool {
        self.ops().iter().any(|(d, _)| *d == device)
    }

    /// LED writes in order.
    pub fn leds(&self) -> Vec<(LedChannel, bool)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Led(channel, on) => Some((channel, on)),
                _ => None,
            })
            .collect()
    }

    /// Delays in order, in milliseconds.
    pub fn delays(&self) -> Vec<u32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::DelayMs(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }

    /// Frames handed to `device`, as lengths.
    pub fn frames(&self, device: &str) -> Vec<usize> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Frame { device: d, len } if d == device => Some(len),
                _ => None,
            })
            .collect()
    }

    /// Events recorded after the first `Op` on `device`.
    pub fn after_first(&self, device: &str) -> Vec<Event> {
        let events = self.events();
        let start = events
            .iter()
            .position(|e| matches!(e, Event::Op { device: d, .. } if *d == device));
        match start {
            Some(i) => events.into_iter().skip(i.saturating_add(1)).collect(),
            None => Vec::new(),
        }
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Mock tri-color light.
#[derive(Debug, Clone, Default)]
pub struct MockIndicator {
    log: CallLog,
    lit: LedSet,
    start_error: Option<DriverError>,
}

impl MockIndicator {
    /// Indicator that records into `log`.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            lit: LedSet::EMPTY,
            start_error: None,
        }
    }

    /// Indicator whose `start` fails with `err`.
    pub fn failing(log: CallLog, err: DriverError) -> Self {
        Self {
            start_error: Some(err),
            ..Self::new(log)
        }
    }

    /// Channels currently lit.
    pub fn lit(&self) -> LedSet {
        self.lit
    }
}

impl Indicator for MockIndicator {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.log.push(Event::Op {
            device: "indicator",
            op: "start",
        });
        self.start_error.map_or(Ok(()), Err)
    }

    fn set(&mut self, channel: LedChannel, on: bool) {
        self.log.push(Event::Led(channel, on));
        self.lit = if on {
            self.lit.union(channel.into())
        } else {
            self.lit.without(channel)
        };
    }

    fn is_on(&self, channel: LedChannel) -> bool {
        self.lit.contains(channel)
    }
}

/// Delay that returns immediately and records the requested duration.
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    log: CallLog,
}

impl MockDelay {
    /// Delay that records into `log`.
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayMs(ns / 1_000_000));
    }

    async fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayMs(us / 1_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
    }
}

/// General-purpose recording collaborator.
///
/// Implements every collaborator contract except [`Indicator`]. Each call is
/// logged under the mock's name; a single operation can be made to fail, and
/// frame handoffs (`broadcast`, `receive_pcm`) can be made to fail a given
/// number of times.
#[derive(Debug, Clone)]
pub struct MockDevice {
    name: &'static str,
    log: CallLog,
    fail_op: Option<(&'static str, DriverError)>,
    frame_failures: u32,
}

impl MockDevice {
    /// Device named `name` that records into `log` and always succeeds.
    pub fn new(name: &'static str, log: CallLog) -> Self {
        Self {
            name,
            log,
            fail_op: None,
            frame_failures: 0,
        }
    }

    /// Make operation `op` fail with `err`.
    #[must_use]
    pub fn failing(mut self, op: &'static str, err: DriverError) -> Self {
        self.fail_op = Some((op, err));
        self
    }

    /// Make the next `count` frame handoffs fail with [`DriverError::IO`].
    pub fn fail_next_frames(&mut self, count: u32) {
        self.frame_failures = count;
    }

    fn call(&self, op: &'static str) -> Result<(), DriverError> {
        self.log.push(Event::Op {
            device: self.name,
            op,
        });
        match self.fail_op {
            Some((failing, err)) if failing == op => Err(err),
            _ => Ok(()),
        }
    }

    fn frame(&mut self, len: usize) -> Result<(), DriverError> {
        self.log.push(Event::Frame {
            device: self.name,
            len,
        });
        if self.frame_failures > 0 {
            self.frame_failures = self.frame_failures.saturating_sub(1);
            Err(DriverError::IO)
        } else {
            Ok(())
        }
    }
}

impl Battery for MockDevice {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.call("init")
    }

    async fn start_charging(&mut self) -> Result<(), DriverError> {
        self.call("start_charging")
    }
}

impl ButtonInput for MockDevice {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.call("init")
    }

    fn activate(&mut self) {
        let _ = self.call("activate");
    }
}

impl Accelerometer for MockDevice {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.call("start")
    }
}

impl Speaker for MockDevice {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.call("init")
    }

    async fn play_boot_chime(&mut self) {
        let _ = self.call("play_boot_chime");
    }
}

impl OfflineStorage for MockDevice {
    async fn mount(&mut self) -> Result<(), DriverError> {
        self.call("mount")
    }
}

impl Haptic for MockDevice {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.call("init")
    }

    async fn pulse(&mut self, _duration_ms: u32) {
        let _ = self.call("pulse");
    }
}

impl UsbPower for MockDevice {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.call("init")
    }
}

impl Transport for MockDevice {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.call("start")
    }

    fn broadcast(&mut self, frame: &[u8]) -> Result<(), DriverError> {
        self.frame(frame.len())
    }
}

impl AudioCodec for MockDevice {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.call("start")
    }

    fn receive_pcm(&mut self, samples: &[i16]) -> Result<(), DriverError> {
        self.frame(samples.len())
    }
}

impl Microphone for MockDevice {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.call("start")
    }
}
