//! Audio streaming bridge.
//!
//! Two fixed-direction forwarding stages:
//!
//! ```text
//! sampler ──PCM slot──▶ CaptureBridge ──receive_pcm──▶ codec
//! codec ──encoded slot──▶ UplinkBridge ──broadcast──▶ transport
//! ```
//!
//! Each slot is a one-element [`zerocopy_channel`]: the producer fills the
//! slot in place and marks it sent; the bridge lends it to the consumer for
//! exactly one call and releases it. The producer cannot deliver the next
//! frame before the current one is released, so frames are forwarded in
//! arrival order with one frame in flight per direction.
//!
//! A consumer error drops that frame: it is counted and logged, never retried
//! or buffered, and the next frame is forwarded normally. Nothing is logged on
//! the success path.
//!
//! [`zerocopy_channel`]: embassy_sync::zerocopy_channel

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::zerocopy_channel::{Receiver, Sender};
use platform::{AudioCodec, DriverError, EncodedFrame, PcmFrame, Transport};

/// Producer end of the PCM slot.
pub type PcmSender<'a, M> = Sender<'a, M, PcmFrame>;
/// Consumer end of the PCM slot.
pub type PcmReceiver<'a, M> = Receiver<'a, M, PcmFrame>;
/// Producer end of the encoded-frame slot.
pub type EncodedSender<'a, M> = Sender<'a, M, EncodedFrame>;
/// Consumer end of the encoded-frame slot.
pub type EncodedReceiver<'a, M> = Receiver<'a, M, EncodedFrame>;

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum FrameOutcome {
    /// The consumer accepted the frame.
    Forwarded,
    /// The consumer rejected the frame; it is gone.
    Dropped(DriverError),
}

/// Per-direction frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Frames accepted by the consumer.
    pub forwarded: u32,
    /// Frames rejected by the consumer.
    pub dropped: u32,
}

impl FrameStats {
    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Forwarded => self.forwarded = self.forwarded.saturating_add(1),
            FrameOutcome::Dropped(_) => self.dropped = self.dropped.saturating_add(1),
        }
    }
}

/// Capture → encode stage.
pub struct CaptureBridge<'a, C> {
    codec: &'a mut C,
    stats: FrameStats,
}

impl<'a, C: AudioCodec> CaptureBridge<'a, C> {
    /// Bridge into `codec`.
    pub fn new(codec: &'a mut C) -> Self {
        Self {
            codec,
            stats: FrameStats::default(),
        }
    }

    /// Forward one block of PCM to the codec.
    pub fn on_pcm_ready(&mut self, samples: &[i16]) -> FrameOutcome {
        let outcome = match self.codec.receive_pcm(samples) {
            Ok(()) => FrameOutcome::Forwarded,
            Err(err) => {
                error!("failed to process PCM data ({})", err);
                FrameOutcome::Dropped(err)
            }
        };
        self.stats.record(outcome);
        outcome
    }

    /// Counters so far.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Encode → transmit stage.
pub struct UplinkBridge<'a, T> {
    transport: &'a mut T,
    stats: FrameStats,
}

impl<'a, T: Transport> UplinkBridge<'a, T> {
    /// Bridge into `transport`.
    pub fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            stats: FrameStats::default(),
        }
    }

    /// Forward one encoded frame to the transport.
    pub fn on_encoded_ready(&mut self, frame: &[u8]) -> FrameOutcome {
        let outcome = match self.transport.broadcast(frame) {
            Ok(()) => FrameOutcome::Forwarded,
            Err(err) => {
                error!("failed to broadcast audio packet ({})", err);
                FrameOutcome::Dropped(err)
            }
        };
        self.stats.record(outcome);
        outcome
    }

    /// Counters so far.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Wait for the next PCM block, forward it, release the slot.
pub async fn capture_once<M, C>(
    bridge: &mut CaptureBridge<'_, C>,
    pcm: &mut PcmReceiver<'_, M>,
) -> FrameOutcome
where
    M: RawMutex,
    C: AudioCodec,
{
    let samples = pcm.receive().await;
    let outcome = bridge.on_pcm_ready(samples.as_slice());
    pcm.receive_done();
    outcome
}

/// Wait for the next encoded frame, forward it, release the slot.
pub async fn uplink_once<M, T>(
    bridge: &mut UplinkBridge<'_, T>,
    encoded: &mut EncodedReceiver<'_, M>,
) -> FrameOutcome
where
    M: RawMutex,
    T: Transport,
{
    let frame = encoded.receive().await;
    let outcome = bridge.on_encoded_ready(frame.as_slice());
    encoded.receive_done();
    outcome
}

/// Forward PCM blocks for the rest of the device's life.
pub async fn run_capture<M, C>(
    mut bridge: CaptureBridge<'_, C>,
    mut pcm: PcmReceiver<'_, M>,
) -> Infallible
where
    M: RawMutex,
    C: AudioCodec,
{
    loop {
        let _ = capture_once(&mut bridge, &mut pcm).await;
    }
}

/// Forward encoded frames for the rest of the device's life.
pub async fn run_uplink<M, T>(
    mut bridge: UplinkBridge<'_, T>,
    mut encoded: EncodedReceiver<'_, M>,
) -> Infallible
where
    M: RawMutex,
    T: Transport,
{
    loop {
        let _ = uplink_once(&mut bridge, &mut encoded).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::zerocopy_channel::Channel;
    use platform::config::MIC_BUFFER_SAMPLES;
    use platform::mocks::{CallLog, MockDevice};

    #[test]
    fn accepted_pcm_is_not_dropped() {
        let log = CallLog::new();
        let mut codec = MockDevice::new("codec", log.clone());
        let mut bridge = CaptureBridge::new(&mut codec);

        let block = [0i16; MIC_BUFFER_SAMPLES];
        assert_eq!(bridge.on_pcm_ready(&block), FrameOutcome::Forwarded);
        assert_eq!(
            bridge.stats(),
            FrameStats {
                forwarded: 1,
                dropped: 0
            }
        );
        assert_eq!(log.frames("codec"), [MIC_BUFFER_SAMPLES]);
    }

    #[test]
    fn rejected_frame_is_dropped_once() {
        let log = CallLog::new();
        let mut link = MockDevice::new("link", log.clone());
        link.fail_next_frames(1);
        let mut bridge = UplinkBridge::new(&mut link);

        assert_eq!(
            bridge.on_encoded_ready(&[1, 2, 3]),
            FrameOutcome::Dropped(DriverError::IO)
        );
        assert_eq!(bridge.on_encoded_ready(&[4, 5]), FrameOutcome::Forwarded);
        assert_eq!(
            bridge.stats(),
            FrameStats {
                forwarded: 1,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn slot_is_released_after_forwarding() {
        let log = CallLog::new();
        let mut link = MockDevice::new("link", log.clone());
        let mut bridge = UplinkBridge::new(&mut link);

        let mut buf = [EncodedFrame::new()];
        let mut channel: Channel<'_, NoopRawMutex, EncodedFrame> = Channel::new(&mut buf);
        let (mut tx, mut rx) = channel.split();

        let slot = tx.try_send().unwrap();
        slot.clear();
        slot.extend_from_slice(&[9; 40]).unwrap();
        tx.send_done();
        assert!(tx.try_send().is_none());

        assert_eq!(uplink_once(&mut bridge, &mut rx).await, FrameOutcome::Forwarded);
        assert!(tx.try_send().is_some());
        assert_eq!(log.frames("link"), [40]);
    }
}
