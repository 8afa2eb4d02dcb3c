//! Desktop stand-ins for the recorder's collaborators.
//!
//! Used by the `emulator` binary to run the real bring-up sequencer, status
//! loop and frame bridge on a workstation. The light is rendered as log
//! lines, the microphone produces a synthetic tone, the codec packs PCM into
//! fixed-size frames, and the transport counts what it is given.

use core::convert::Infallible;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use platform::config::{CODEC_OUTPUT_MAX_BYTES, MIC_BUFFER_SAMPLES, MIC_SAMPLE_RATE_HZ};
use platform::{AudioCodec, DriverError, Indicator, LedChannel, LedSet, Microphone, Transport};

use crate::bridge::{EncodedSender, PcmSender};
use crate::state::DeviceState;

/// Wall-clock delay on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        tokio::time::sleep(Duration::from_nanos(u64::from(ns))).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
    }
}

/// Tri-color light rendered to the log.
#[derive(Debug, Default)]
pub struct TerminalIndicator {
    lit: LedSet,
}

impl TerminalIndicator {
    /// All channels dark.
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self) -> [char; 3] {
        let glyph = |channel: LedChannel, on: char| {
            if self.lit.contains(channel) {
                on
            } else {
                '.'
            }
        };
        [
            glyph(LedChannel::Red, 'R'),
            glyph(LedChannel::Green, 'G'),
            glyph(LedChannel::Blue, 'B'),
        ]
    }
}

impl Indicator for TerminalIndicator {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.lit = LedSet::EMPTY;
        Ok(())
    }

    fn set(&mut self, channel: LedChannel, on: bool) {
        let next = if on {
            self.lit.union(channel.into())
        } else {
            self.lit.without(channel)
        };
        if next != self.lit {
            self.lit = next;
            let [r, g, b] = self.render();
            tracing::debug!(target: "led", "[{}{}{}]", r, g, b);
        }
    }

    fn is_on(&self, channel: LedChannel) -> bool {
        self.lit.contains(channel)
    }
}

/// Microphone whose start arms the [`tone_source`].
pub struct ToneMicrophone<'a, M: RawMutex> {
    armed: &'a Signal<M, ()>,
    start_error: Option<DriverError>,
}

impl<'a, M: RawMutex> ToneMicrophone<'a, M> {
    /// Microphone that arms `armed` when started.
    pub fn new(armed: &'a Signal<M, ()>) -> Self {
        Self {
            armed,
            start_error: None,
        }
    }

    /// Make `start` fail with `err`.
    #[must_use]
    pub fn failing(mut self, err: DriverError) -> Self {
        self.start_error = Some(err);
        self
    }
}

impl<M: RawMutex> Microphone for ToneMicrophone<'_, M> {
    async fn start(&mut self) -> Result<(), DriverError> {
        if let Some(err) = self.start_error {
            return Err(err);
        }
        self.armed.signal(());
        Ok(())
    }
}

/// Fill `block` with a triangle tone continuing from `phase`.
///
/// Returns the phase to continue from.
pub fn fill_tone(block: &mut [i16], mut phase: u16, step: u16) -> u16 {
    for sample in block.iter_mut() {
        // Fold the sawtooth into a triangle spanning the full i16 range.
        let folded = if phase < 0x8000 {
            phase.wrapping_mul(2)
        } else {
            u16::MAX.wrapping_sub(phase).wrapping_mul(2)
        };
        *sample = folded.wrapping_sub(0x8000) as i16;
        phase = phase.wrapping_add(step);
    }
    phase
}

/// Produce one PCM block per buffer period once the microphone is started.
///
/// A block is skipped when the bridge still holds the previous one.
pub async fn tone_source<M, D>(
    armed: &Signal<M, ()>,
    mut pcm: PcmSender<'_, M>,
    mut delay: D,
    tone_hz: u32,
) -> Infallible
where
    M: RawMutex,
    D: DelayNs,
{
    let step = u16::try_from(tone_hz.saturating_mul(65_536) / MIC_SAMPLE_RATE_HZ).unwrap_or(u16::MAX);
    let period_ms = (MIC_BUFFER_SAMPLES as u32).saturating_mul(1000) / MIC_SAMPLE_RATE_HZ;
    let mut phase = 0u16;

    armed.wait().await;
    tracing::info!("tone source running: {} Hz, {} ms blocks", tone_hz, period_ms);
    loop {
        match pcm.try_send() {
            Some(block) => {
                phase = fill_tone(block.as_mut_slice(), phase, step);
                pcm.send_done();
            }
            None => tracing::warn!("PCM slot still held, skipping block"),
        }
        delay.delay_ms(period_ms).await;
    }
}

/// Codec that packs each PCM block into one frame of high bytes.
pub struct PackingCodec<'a, M: RawMutex> {
    encoded: EncodedSender<'a, M>,
    start_error: Option<DriverError>,
}

impl<'a, M: RawMutex> PackingCodec<'a, M> {
    /// Codec that publishes frames into `encoded`.
    pub fn new(encoded: EncodedSender<'a, M>) -> Self {
        Self {
            encoded,
            start_error: None,
        }
    }

    /// Make `start` fail with `err`.
    #[must_use]
    pub fn failing(mut self, err: DriverError) -> Self {
        self.start_error = Some(err);
        self
    }
}

impl<M: RawMutex> AudioCodec for PackingCodec<'_, M> {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.start_error.map_or(Ok(()), Err)
    }

    fn receive_pcm(&mut self, samples: &[i16]) -> Result<(), DriverError> {
        let stride = (samples.len() / CODEC_OUTPUT_MAX_BYTES).max(1);
        let frame = self.encoded.try_send().ok_or(DriverError::BUSY)?;
        frame.clear();
        for sample in samples.iter().step_by(stride).take(CODEC_OUTPUT_MAX_BYTES) {
            let [_, high] = sample.to_le_bytes();
            frame.push(high).map_err(|_| DriverError::INVALID)?;
        }
        self.encoded.send_done();
        Ok(())
    }
}

/// Transport that counts what it is asked to broadcast.
#[derive(Debug, Default)]
pub struct CountingTransport {
    frames: u32,
    bytes: u64,
    start_error: Option<DriverError>,
}

impl CountingTransport {
    /// Transport with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `start` fail with `err`.
    #[must_use]
    pub fn failing(mut self, err: DriverError) -> Self {
        self.start_error = Some(err);
        self
    }

    /// Frames broadcast so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Bytes broadcast so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Transport for CountingTransport {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.start_error.map_or(Ok(()), Err)
    }

    fn broadcast(&mut self, frame: &[u8]) -> Result<(), DriverError> {
        self.frames = self.frames.saturating_add(1);
        self.bytes = self.bytes.saturating_add(frame.len() as u64);
        if self.frames % 50 == 0 {
            tracing::info!(
                target: "uplink",
                "{} frames / {} bytes broadcast",
                self.frames,
                self.bytes
            );
        }
        Ok(())
    }
}

/// One scripted change to the device flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStep {
    /// Radio link connected or lost.
    Link(bool),
    /// Charger plugged or unplugged.
    Charger(bool),
    /// Power button pressed.
    PowerButton,
}

/// Default script: connect, charge for a while, disconnect, switch off and
/// back on. Each entry waits the given milliseconds, then applies the step.
pub const DEFAULT_SCENARIO: [(u32, ScenarioStep); 7] = [
    (2_000, ScenarioStep::Link(true)),
    (3_000, ScenarioStep::Charger(true)),
    (4_000, ScenarioStep::Charger(false)),
    (2_000, ScenarioStep::Link(false)),
    (2_000, ScenarioStep::PowerButton),
    (3_000, ScenarioStep::PowerButton),
    (2_000, ScenarioStep::Link(true)),
];

/// Apply one step to `state`.
pub fn apply(step: ScenarioStep, state: &DeviceState) {
    match step {
        ScenarioStep::Link(up) => state.set_connected(up),
        ScenarioStep::Charger(plugged) => state.set_charge_event(plugged),
        ScenarioStep::PowerButton => {
            state.toggle_off();
        }
    }
}

/// Replay `script` against `state` forever.
pub async fn run_scenario<D: DelayNs>(
    script: &[(u32, ScenarioStep)],
    state: &DeviceState,
    mut delay: D,
) -> Infallible {
    loop {
        for &(wait_ms, step) in script {
            delay.delay_ms(wait_ms).await;
            tracing::info!(target: "scenario", "{:?}", step);
            apply(step, state);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::zerocopy_channel::Channel;
    use platform::{EncodedFrame, PcmFrame};

    #[test]
    fn tone_spans_full_range() {
        let mut block = [0i16; 64];
        let phase = fill_tone(&mut block, 0, 0x0400);
        assert_eq!(phase, 0);
        assert_eq!(block[0], i16::MIN);
        assert_eq!(*block.iter().max().unwrap(), i16::MAX - 1);
    }

    #[test]
    fn packing_codec_emits_one_bounded_frame_per_block() {
        let mut buf = [EncodedFrame::new()];
        let mut slot: Channel<'_, NoopRawMutex, EncodedFrame> = Channel::new(&mut buf);
        let (tx, mut rx) = slot.split();
        let mut codec = PackingCodec::new(tx);

        let block: PcmFrame = [0x1234; MIC_BUFFER_SAMPLES];
        assert_eq!(codec.receive_pcm(&block), Ok(()));
        assert_eq!(codec.receive_pcm(&block), Err(DriverError::BUSY));

        let frame = rx.try_receive().unwrap();
        assert_eq!(frame.len(), CODEC_OUTPUT_MAX_BYTES);
        assert!(frame.iter().all(|&b| b == 0x12));
    }

    #[test]
    fn power_button_step_toggles() {
        let state = DeviceState::new();
        apply(ScenarioStep::PowerButton, &state);
        assert!(!state.is_off());
        apply(ScenarioStep::PowerButton, &state);
        assert!(state.is_off());
    }
}
