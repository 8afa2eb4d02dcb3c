//! Audio capture and playback contracts
//!
//! Frames move between the sampler, the codec and the transport through
//! single-slot handoffs owned by the firmware; the traits here only cover
//! what the core itself calls.

use crate::config::{CODEC_OUTPUT_MAX_BYTES, MIC_BUFFER_SAMPLES};
use crate::DriverError;

/// One block of signed 16-bit mono PCM as delivered by the sampler.
pub type PcmFrame = [i16; MIC_BUFFER_SAMPLES];

/// One encoded frame as delivered by the codec.
pub type EncodedFrame = heapless::Vec<u8, CODEC_OUTPUT_MAX_BYTES>;

/// Audio encoder fed with microphone PCM.
///
/// Encoded output is pushed by the codec into the encoded-frame slot it was
/// wired to at construction; the core drains that slot into the transport.
pub trait AudioCodec {
    /// Start the encoder.
    async fn start(&mut self) -> Result<(), DriverError>;

    /// Accept one block of PCM for encoding.
    ///
    /// Called from the capture path: must not block, must not retain
    /// `samples` after returning.
    fn receive_pcm(&mut self, samples: &[i16]) -> Result<(), DriverError>;
}

/// PCM sampler.
///
/// Once started, the sampler fills the PCM slot it was wired to at
/// construction at a fixed cadence (one [`PcmFrame`] per block period).
pub trait Microphone {
    /// Start sampling.
    async fn start(&mut self) -> Result<(), DriverError>;
}

/// Playback path used for the boot chime.
pub trait Speaker {
    /// Bring up the amplifier and output stream.
    async fn init(&mut self) -> Result<(), DriverError>;

    /// Play the power-on chime. Best effort: playback problems are the
    /// speaker driver's to report.
    async fn play_boot_chime(&mut self);
}
