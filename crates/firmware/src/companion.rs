//! Serial link to the companion processor.
//!
//! Carries the [`Mailbox`] traffic and both PCM directions over a byte
//! stream (a UART on target). Every message is a 4-byte header followed by
//! `len` payload bytes:
//!
//! ```text
//! ┌──────┬──────┬────────┬────────┬─────────────┐
//! │ 0xA5 │ tag  │ len lo │ len hi │ payload ... │
//! └──────┴──────┴────────┴────────┴─────────────┘
//! ```
//!
//! | Tag    | Direction   | Payload                               |
//! |--------|-------------|---------------------------------------|
//! | `0x01` | to peer     | start request: service id             |
//! | `0x02` | to peer     | PCM block for the encoder (i16 LE)    |
//! | `0x03` | to peer     | encoded frame to broadcast            |
//! | `0x81` | from peer   | start reply: service id, status i32 LE|
//! | `0x82` | from peer   | PCM block from the sampler (i16 LE)   |
//! | `0x83` | from peer   | encoded frame from the encoder        |
//! | `0x84` | from peer   | link state: 1 = connected, 0 = lost   |
//!
//! Frames arriving while the matching slot is still occupied are read off
//! the wire and dropped; the link never stalls the peer.
//!
//! A header that fails validation costs one byte: the receiver slides
//! forward until the next sync byte starts a well-formed header.

use core::convert::Infallible;

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io_async::{Read, Write};
use platform::config::{CODEC_OUTPUT_MAX_BYTES, MIC_BUFFER_SAMPLES};
use platform::DriverError;

use crate::bridge::{EncodedSender, PcmReceiver, PcmSender};
use crate::mailbox::{Mailbox, Reply, Request, Service};
use crate::state::DeviceState;

/// Bytes in one PCM block on the wire.
pub const PCM_BLOCK_BYTES: usize = MIC_BUFFER_SAMPLES * 2;

const CHUNK_SAMPLES: usize = 64;
const CHUNK_BYTES: usize = CHUNK_SAMPLES * 2;
const REPLY_BYTES: usize = 5;

/// First byte of every header.
pub const SYNC: u8 = 0xA5;

/// Header bytes on the wire, sync byte included.
pub const HEADER_BYTES: usize = 4;

/// Message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tag {
    /// Start request (to peer).
    Start,
    /// PCM for the encoder (to peer).
    CodecPcm,
    /// Encoded frame to broadcast (to peer).
    Uplink,
    /// Start reply (from peer).
    Reply,
    /// PCM from the sampler (from peer).
    MicPcm,
    /// Encoded frame (from peer).
    Encoded,
    /// Radio link state change (from peer).
    Link,
}

impl Tag {
    const fn byte(self) -> u8 {
        match self {
            Self::Start => 0x01,
            Self::CodecPcm => 0x02,
            Self::Uplink => 0x03,
            Self::Reply => 0x81,
            Self::MicPcm => 0x82,
            Self::Encoded => 0x83,
            Self::Link => 0x84,
        }
    }

    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Start),
            0x02 => Some(Self::CodecPcm),
            0x03 => Some(Self::Uplink),
            0x81 => Some(Self::Reply),
            0x82 => Some(Self::MicPcm),
            0x83 => Some(Self::Encoded),
            0x84 => Some(Self::Link),
            _ => None,
        }
    }
}

/// Message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    /// Message kind.
    pub tag: Tag,
    /// Payload length in bytes.
    pub len: u16,
}

impl Header {
    /// Header bytes.
    pub const fn encode(self) -> [u8; HEADER_BYTES] {
        let [lo, hi] = self.len.to_le_bytes();
        [SYNC, self.tag.byte(), lo, hi]
    }

    /// Parse and validate a header.
    pub fn decode(bytes: [u8; HEADER_BYTES]) -> Result<Self, DriverError> {
        let [sync, tag, lo, hi] = bytes;
        if sync != SYNC {
            return Err(DriverError::INVALID);
        }
        let tag = Tag::from_byte(tag).ok_or(DriverError::INVALID)?;
        let len = u16::from_le_bytes([lo, hi]);
        let valid = match tag {
            Tag::Start | Tag::Link => len == 1,
            Tag::Reply => usize::from(len) == REPLY_BYTES,
            Tag::CodecPcm | Tag::MicPcm => usize::from(len) == PCM_BLOCK_BYTES,
            Tag::Uplink | Tag::Encoded => usize::from(len) <= CODEC_OUTPUT_MAX_BYTES,
        };
        if valid {
            Ok(Self { tag, len })
        } else {
            Err(DriverError::INVALID)
        }
    }
}

/// Parse a start reply payload.
pub fn decode_reply(payload: [u8; REPLY_BYTES]) -> Result<Reply, DriverError> {
    let [id, a, b, c, d] = payload;
    let service = Service::from_id(id).ok_or(DriverError::INVALID)?;
    Ok(Reply {
        service,
        status: i32::from_le_bytes([a, b, c, d]),
    })
}

fn len_u16(len: usize) -> Result<u16, DriverError> {
    u16::try_from(len).map_err(|_| DriverError::INVALID)
}

async fn send<W: Write>(link: &mut W, tag: Tag, payload: &[u8]) -> Result<(), DriverError> {
    let header = Header {
        tag,
        len: len_u16(payload.len())?,
    };
    link.write_all(&header.encode())
        .await
        .map_err(|_| DriverError::IO)?;
    link.write_all(payload).await.map_err(|_| DriverError::IO)
}

async fn send_pcm<W: Write>(link: &mut W, samples: &[i16]) -> Result<(), DriverError> {
    let header = Header {
        tag: Tag::CodecPcm,
        len: len_u16(samples.len().saturating_mul(2))?,
    };
    link.write_all(&header.encode())
        .await
        .map_err(|_| DriverError::IO)?;
    let mut bytes = [0u8; CHUNK_BYTES];
    for chunk in samples.chunks(CHUNK_SAMPLES) {
        for (sample, out) in chunk.iter().zip(bytes.chunks_exact_mut(2)) {
            out.copy_from_slice(&sample.to_le_bytes());
        }
        let used = bytes
            .get(..chunk.len().saturating_mul(2))
            .ok_or(DriverError::INVALID)?;
        link.write_all(used).await.map_err(|_| DriverError::IO)?;
    }
    Ok(())
}

async fn read_pcm<R: Read>(link: &mut R, samples: &mut [i16]) -> Result<(), DriverError> {
    let mut bytes = [0u8; CHUNK_BYTES];
    for chunk in samples.chunks_mut(CHUNK_SAMPLES) {
        let raw = bytes
            .get_mut(..chunk.len().saturating_mul(2))
            .ok_or(DriverError::INVALID)?;
        link.read_exact(raw).await.map_err(|_| DriverError::IO)?;
        for (sample, pair) in chunk.iter_mut().zip(raw.chunks_exact(2)) {
            if let [lo, hi] = *pair {
                *sample = i16::from_le_bytes([lo, hi]);
            }
        }
    }
    Ok(())
}

/// Read the next well-formed header, sliding past bytes that do not start one.
async fn next_header<R: Read>(link: &mut R) -> Result<Header, DriverError> {
    let mut window = [0u8; HEADER_BYTES];
    link.read_exact(&mut window)
        .await
        .map_err(|_| DriverError::IO)?;
    let mut skipped: usize = 0;
    loop {
        if let Ok(header) = Header::decode(window) {
            if skipped > 0 {
                warn!("companion link resynced after {} bytes", skipped);
            }
            return Ok(header);
        }
        let mut next = [0u8; 1];
        link.read_exact(&mut next).await.map_err(|_| DriverError::IO)?;
        let [byte] = next;
        window.rotate_left(1);
        if let Some(last) = window.last_mut() {
            *last = byte;
        }
        skipped = skipped.saturating_add(1);
    }
}

async fn discard<R: Read>(link: &mut R, mut len: usize) -> Result<(), DriverError> {
    let mut scratch = [0u8; CHUNK_BYTES];
    while len > 0 {
        let take = len.min(CHUNK_BYTES);
        let buf = scratch.get_mut(..take).ok_or(DriverError::INVALID)?;
        link.read_exact(buf).await.map_err(|_| DriverError::IO)?;
        len = len.saturating_sub(take);
    }
    Ok(())
}

/// Outbound half: start requests, encoder PCM and uplink frames to the peer.
///
/// Returns only on a link error.
pub async fn run_tx<M, W>(
    mailbox: &Mailbox<M>,
    codec_pcm: &mut PcmReceiver<'_, M>,
    link: &mut W,
) -> Result<Infallible, DriverError>
where
    M: RawMutex,
    W: Write,
{
    loop {
        let event = select3(
            mailbox.next_request(),
            mailbox.next_uplink(),
            codec_pcm.receive(),
        )
        .await;
        match event {
            Either3::First(Request::Start(service)) => {
                send(link, Tag::Start, &[service.id()]).await?;
            }
            Either3::Second(frame) => {
                send(link, Tag::Uplink, &frame).await?;
            }
            Either3::Third(samples) => {
                let sent = send_pcm(link, samples.as_slice()).await;
                codec_pcm.receive_done();
                sent?;
            }
        }
    }
}

/// Inbound half: replies into the mailbox, sampler PCM and encoded frames
/// into the bridge slots, link state into `state`.
///
/// Returns only on a link error or a message the peer must never send.
pub async fn run_rx<M, R>(
    mailbox: &Mailbox<M>,
    mic_pcm: &mut PcmSender<'_, M>,
    encoded: &mut EncodedSender<'_, M>,
    state: &DeviceState,
    link: &mut R,
) -> Result<Infallible, DriverError>
where
    M: RawMutex,
    R: Read,
{
    loop {
        let header = next_header(link).await?;
        let len = usize::from(header.len);

        match header.tag {
            Tag::Reply => {
                let mut payload = [0u8; REPLY_BYTES];
                link.read_exact(&mut payload)
                    .await
                    .map_err(|_| DriverError::IO)?;
                mailbox.reply(decode_reply(payload)?);
            }
            Tag::MicPcm => match mic_pcm.try_send() {
                Some(slot) => {
                    read_pcm(link, slot.as_mut_slice()).await?;
                    mic_pcm.send_done();
                }
                None => {
                    trace!("PCM slot busy, dropping block");
                    discard(link, len).await?;
                }
            },
            Tag::Encoded => {
                let mut payload = [0u8; CODEC_OUTPUT_MAX_BYTES];
                let body = payload.get_mut(..len).ok_or(DriverError::INVALID)?;
                link.read_exact(body).await.map_err(|_| DriverError::IO)?;
                match encoded.try_send() {
                    Some(slot) => {
                        slot.clear();
                        slot.extend_from_slice(body)
                            .map_err(|_| DriverError::INVALID)?;
                        encoded.send_done();
                    }
                    None => trace!("encoded slot busy, dropping frame"),
                }
            }
            Tag::Link => {
                let mut flag = [0u8; 1];
                link.read_exact(&mut flag).await.map_err(|_| DriverError::IO)?;
                let connected = flag != [0];
                info!("radio link {}", if connected { "up" } else { "down" });
                state.set_connected(connected);
            }
            Tag::Start | Tag::CodecPcm | Tag::Uplink => {
                warn!("unexpected message from companion");
                return Err(DriverError::INVALID);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::zerocopy_channel::Channel as Slot;
    use platform::{EncodedFrame, PcmFrame};

    #[test]
    fn header_rejects_oversized_frames() {
        let ok = Header {
            tag: Tag::Encoded,
            len: 160,
        };
        assert_eq!(Header::decode(ok.encode()), Ok(ok));
        assert_eq!(Header::decode([SYNC, 0x83, 161, 0]), Err(DriverError::INVALID));
        assert_eq!(Header::decode([SYNC, 0x7f, 0, 0]), Err(DriverError::INVALID));
        assert_eq!(Header::decode([0x00, 0x83, 160, 0]), Err(DriverError::INVALID));
    }

    #[test]
    fn reply_carries_signed_status() {
        let reply = decode_reply([2, 0xfe, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(reply.service, Service::Codec);
        assert_eq!(reply.status, -2);
    }

    fn message(tag: Tag, payload: &[u8]) -> std::vec::Vec<u8> {
        let mut out = Header {
            tag,
            len: payload.len() as u16,
        }
        .encode()
        .to_vec();
        out.extend_from_slice(payload);
        out
    }

    #[tokio::test]
    async fn inbound_frames_land_in_their_slots() {
        let mailbox: Mailbox<NoopRawMutex> = Mailbox::new();
        let state = DeviceState::new();
        let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut pcm_slot: Slot<'_, NoopRawMutex, PcmFrame> = Slot::new(&mut pcm_buf);
        let (mut pcm_tx, mut pcm_rx) = pcm_slot.split();
        let mut enc_buf = [EncodedFrame::new()];
        let mut enc_slot: Slot<'_, NoopRawMutex, EncodedFrame> = Slot::new(&mut enc_buf);
        let (mut enc_tx, mut enc_rx) = enc_slot.split();

        let pcm: std::vec::Vec<u8> = (0..MIC_BUFFER_SAMPLES)
            .flat_map(|i| (i as i16).to_le_bytes())
            .collect();
        let mut wire = message(Tag::Reply, &[3, 0, 0, 0, 0]);
        wire.extend(message(Tag::MicPcm, &pcm));
        wire.extend(message(Tag::Encoded, &[1, 2, 3, 4]));
        wire.extend(message(Tag::Link, &[1]));

        let mut link: &[u8] = &wire;
        let (started, end) = embassy_futures::join::join(
            mailbox.start(Service::Microphone),
            run_rx(&mailbox, &mut pcm_tx, &mut enc_tx, &state, &mut link),
        )
        .await;

        assert_eq!(started, Ok(()));
        assert_eq!(end.err(), Some(DriverError::IO));
        let block = pcm_rx.try_receive().unwrap();
        assert_eq!(block[0], 0);
        assert_eq!(block[MIC_BUFFER_SAMPLES - 1], (MIC_BUFFER_SAMPLES - 1) as i16);
        assert_eq!(enc_rx.try_receive().unwrap().as_slice(), &[1, 2, 3, 4]);
        assert!(state.is_connected());
    }

    #[tokio::test]
    async fn busy_slot_drops_block_and_keeps_framing() {
        let mailbox: Mailbox<NoopRawMutex> = Mailbox::new();
        let state = DeviceState::new();
        let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut pcm_slot: Slot<'_, NoopRawMutex, PcmFrame> = Slot::new(&mut pcm_buf);
        let (mut pcm_tx, mut pcm_rx) = pcm_slot.split();
        let mut enc_buf = [EncodedFrame::new()];
        let mut enc_slot: Slot<'_, NoopRawMutex, EncodedFrame> = Slot::new(&mut enc_buf);
        let (mut enc_tx, mut enc_rx) = enc_slot.split();

        let mut wire = message(Tag::MicPcm, &[0x11; PCM_BLOCK_BYTES]);
        wire.extend(message(Tag::MicPcm, &[0x22; PCM_BLOCK_BYTES]));
        wire.extend(message(Tag::Encoded, &[9]));

        let mut link: &[u8] = &wire;
        let end = run_rx(&mailbox, &mut pcm_tx, &mut enc_tx, &state, &mut link).await;

        assert_eq!(end.err(), Some(DriverError::IO));
        assert_eq!(pcm_rx.try_receive().unwrap()[0], 0x1111);
        assert_eq!(enc_rx.try_receive().unwrap().as_slice(), &[9]);
    }

    #[tokio::test]
    async fn host_bound_tag_from_peer_is_rejected() {
        let mailbox: Mailbox<NoopRawMutex> = Mailbox::new();
        let state = DeviceState::new();
        let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut pcm_slot: Slot<'_, NoopRawMutex, PcmFrame> = Slot::new(&mut pcm_buf);
        let (mut pcm_tx, _pcm_rx) = pcm_slot.split();
        let mut enc_buf = [EncodedFrame::new()];
        let mut enc_slot: Slot<'_, NoopRawMutex, EncodedFrame> = Slot::new(&mut enc_buf);
        let (mut enc_tx, _enc_rx) = enc_slot.split();

        let wire = message(Tag::Start, &[1]);
        let mut link: &[u8] = &wire;
        let end = run_rx(&mailbox, &mut pcm_tx, &mut enc_tx, &state, &mut link).await;
        assert_eq!(end.err(), Some(DriverError::INVALID));
    }

    #[tokio::test]
    async fn corrupted_header_resyncs_on_next_message() {
        let mailbox: Mailbox<NoopRawMutex> = Mailbox::new();
        let state = DeviceState::new();
        let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut pcm_slot: Slot<'_, NoopRawMutex, PcmFrame> = Slot::new(&mut pcm_buf);
        let (mut pcm_tx, mut pcm_rx) = pcm_slot.split();
        let mut enc_buf = [EncodedFrame::new()];
        let mut enc_slot: Slot<'_, NoopRawMutex, EncodedFrame> = Slot::new(&mut enc_buf);
        let (mut enc_tx, mut enc_rx) = enc_slot.split();

        // One flipped bit in the length of a PCM header, then its payload.
        let mut wire = message(Tag::MicPcm, &[0; PCM_BLOCK_BYTES]);
        wire[2] ^= 0x04;
        for _ in 0..20 {
            wire.extend(message(Tag::Link, &[1]));
        }
        wire.extend(message(Tag::Encoded, &[7, 7]));

        let mut link: &[u8] = &wire;
        let end = run_rx(&mailbox, &mut pcm_tx, &mut enc_tx, &state, &mut link).await;

        assert_eq!(end.err(), Some(DriverError::IO));
        assert!(state.is_connected());
        assert!(pcm_rx.try_receive().is_none());
        assert_eq!(enc_rx.try_receive().unwrap().as_slice(), &[7, 7]);
    }

    #[tokio::test]
    async fn line_noise_before_first_header_is_skipped() {
        let mailbox: Mailbox<NoopRawMutex> = Mailbox::new();
        let state = DeviceState::new();
        let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut pcm_slot: Slot<'_, NoopRawMutex, PcmFrame> = Slot::new(&mut pcm_buf);
        let (mut pcm_tx, _pcm_rx) = pcm_slot.split();
        let mut enc_buf = [EncodedFrame::new()];
        let mut enc_slot: Slot<'_, NoopRawMutex, EncodedFrame> = Slot::new(&mut enc_buf);
        let (mut enc_tx, _enc_rx) = enc_slot.split();

        let mut wire = vec![0xff, SYNC, 0x7f, SYNC];
        wire.extend(message(Tag::Link, &[1]));

        let mut link: &[u8] = &wire;
        let end = run_rx(&mailbox, &mut pcm_tx, &mut enc_tx, &state, &mut link).await;

        assert_eq!(end.err(), Some(DriverError::IO));
        assert!(state.is_connected());
    }
}
