//! Mailbox adapters for collaborators running off this image.
//!
//! On the target the radio link, the encoder and the PCM sampler live on a
//! companion processor. The core still sees them through the ordinary
//! [`Transport`], [`AudioCodec`] and [`Microphone`] contracts: start requests
//! go through the [`Mailbox`] and wait for the peer's reply, and frame
//! handoffs are non-blocking queue/slot writes the link task drains.
//!
//! ```text
//!   MailboxTransport ─start─┐            ┌─ replies ◀─┐
//!   MailboxCodec ─────start─┼─ requests ─┤            │  companion
//!   MailboxMicrophone start─┘            └──────────▶ │  link task
//!   MailboxTransport ─broadcast─▶ uplink queue ─────▶ │
//!   MailboxCodec ─receive_pcm─▶ codec PCM slot ─────▶ │
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use platform::config::{MAILBOX_REPLY_TIMEOUT_MS, MIC_BUFFER_SAMPLES, UPLINK_QUEUE_DEPTH};
use platform::{AudioCodec, DriverError, EncodedFrame, Microphone, Transport};

use crate::bridge::PcmSender;

/// Outstanding start requests the peer may lag behind by.
pub const REQUEST_QUEUE_DEPTH: usize = 4;

/// A service hosted by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Service {
    /// Radio link
    Transport,
    /// Audio encoder
    Codec,
    /// PCM sampler
    Microphone,
}

impl Service {
    /// Wire identifier.
    pub const fn id(self) -> u8 {
        match self {
            Self::Transport => 1,
            Self::Codec => 2,
            Self::Microphone => 3,
        }
    }

    /// Inverse of [`Service::id`].
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Transport),
            2 => Some(Self::Codec),
            3 => Some(Self::Microphone),
            _ => None,
        }
    }
}

impl core::fmt::Display for Service {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Codec => write!(f, "codec"),
            Self::Microphone => write!(f, "microphone"),
        }
    }
}

/// Request to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Start a service.
    Start(Service),
}

/// Peer's answer to a [`Request::Start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// Which service answered.
    pub service: Service,
    /// Peer's status code (`0` = started).
    pub status: i32,
}

/// Request/reply and uplink queues shared with the companion link task.
pub struct Mailbox<M: RawMutex> {
    requests: Channel<M, Request, REQUEST_QUEUE_DEPTH>,
    replies: Signal<M, Reply>,
    uplink: Channel<M, EncodedFrame, UPLINK_QUEUE_DEPTH>,
}

impl<M: RawMutex> Mailbox<M> {
    /// Empty mailbox.
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            replies: Signal::new(),
            uplink: Channel::new(),
        }
    }

    /// Ask the peer to start `service` and wait for its reply.
    ///
    /// Fails with [`DriverError::TIMED_OUT`] if the peer does not answer
    /// within the reply timeout, or with the peer's own status code.
    pub async fn start(&self, service: Service) -> Result<(), DriverError> {
        self.replies.reset();
        self.requests.send(Request::Start(service)).await;
        let reply = with_timeout(
            Duration::from_millis(MAILBOX_REPLY_TIMEOUT_MS),
            self.reply_for(service),
        )
        .await;
        match reply {
            Ok(status) => DriverError::check(status),
            Err(_) => {
                warn!("{} did not answer", service);
                Err(DriverError::TIMED_OUT)
            }
        }
    }

    async fn reply_for(&self, service: Service) -> i32 {
        loop {
            let reply = self.replies.wait().await;
            if reply.service == service {
                return reply.status;
            }
            debug!("discarding stale reply from {}", reply.service);
        }
    }

    /// Queue one encoded frame for the peer without waiting.
    pub fn post_uplink(&self, frame: &[u8]) -> Result<(), DriverError> {
        let frame = EncodedFrame::from_slice(frame).map_err(|_| DriverError::INVALID)?;
        self.uplink.try_send(frame).map_err(|_| DriverError::BUSY)
    }

    /// Peer side: next start request.
    pub async fn next_request(&self) -> Request {
        self.requests.receive().await
    }

    /// Peer side: answer a start request.
    pub fn reply(&self, reply: Reply) {
        self.replies.signal(reply);
    }

    /// Peer side: next encoded frame to transmit.
    pub async fn next_uplink(&self) -> EncodedFrame {
        self.uplink.receive().await
    }
}

impl<M: RawMutex> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Transport`] hosted by the peer.
pub struct MailboxTransport<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M>,
}

impl<'a, M: RawMutex> MailboxTransport<'a, M> {
    /// Adapter over `mailbox`.
    pub fn new(mailbox: &'a Mailbox<M>) -> Self {
        Self { mailbox }
    }
}

impl<M: RawMutex> Transport for MailboxTransport<'_, M> {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.mailbox.start(Service::Transport).await
    }

    fn broadcast(&mut self, frame: &[u8]) -> Result<(), DriverError> {
        self.mailbox.post_uplink(frame)
    }
}

/// [`AudioCodec`] hosted by the peer.
///
/// PCM goes to the peer through a single-slot handoff the link task drains;
/// encoded output comes back through the link task into the bridge's encoded
/// slot.
pub struct MailboxCodec<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M>,
    pcm_out: PcmSender<'a, M>,
}

impl<'a, M: RawMutex> MailboxCodec<'a, M> {
    /// Adapter over `mailbox`, feeding PCM into `pcm_out`.
    pub fn new(mailbox: &'a Mailbox<M>, pcm_out: PcmSender<'a, M>) -> Self {
        Self { mailbox, pcm_out }
    }
}

impl<M: RawMutex> AudioCodec for MailboxCodec<'_, M> {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.mailbox.start(Service::Codec).await
    }

    fn receive_pcm(&mut self, samples: &[i16]) -> Result<(), DriverError> {
        if samples.len() != MIC_BUFFER_SAMPLES {
            return Err(DriverError::INVALID);
        }
        let slot = self.pcm_out.try_send().ok_or(DriverError::BUSY)?;
        slot.copy_from_slice(samples);
        self.pcm_out.send_done();
        Ok(())
    }
}

/// [`Microphone`] hosted by the peer.
pub struct MailboxMicrophone<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M>,
}

impl<'a, M: RawMutex> MailboxMicrophone<'a, M> {
    /// Adapter over `mailbox`.
    pub fn new(mailbox: &'a Mailbox<M>) -> Self {
        Self { mailbox }
    }
}

impl<M: RawMutex> Microphone for MailboxMicrophone<'_, M> {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.mailbox.start(Service::Microphone).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embassy_futures::join::join;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::zerocopy_channel::Channel as Slot;
    use platform::config::CODEC_OUTPUT_MAX_BYTES;
    use platform::PcmFrame;

    #[tokio::test]
    async fn start_returns_peer_status() {
        let mailbox: Mailbox<CriticalSectionRawMutex> = Mailbox::new();
        let peer = async {
            let Request::Start(service) = mailbox.next_request().await;
            mailbox.reply(Reply { service, status: 5 });
        };
        let (result, ()) = join(mailbox.start(Service::Transport), peer).await;
        assert_eq!(result, Err(DriverError::new(5)));
    }

    #[tokio::test]
    async fn start_times_out_without_peer() {
        let mailbox: Mailbox<CriticalSectionRawMutex> = Mailbox::new();
        assert_eq!(
            mailbox.start(Service::Microphone).await,
            Err(DriverError::TIMED_OUT)
        );
    }

    #[tokio::test]
    async fn reply_for_other_service_is_ignored() {
        let mailbox: Mailbox<CriticalSectionRawMutex> = Mailbox::new();
        let peer = async {
            let Request::Start(service) = mailbox.next_request().await;
            mailbox.reply(Reply {
                service: Service::Transport,
                status: 7,
            });
            embassy_futures::yield_now().await;
            mailbox.reply(Reply { service, status: 0 });
        };
        let (result, ()) = join(mailbox.start(Service::Codec), peer).await;
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn broadcast_is_bounded_and_non_blocking() {
        let mailbox: Mailbox<CriticalSectionRawMutex> = Mailbox::new();
        let mut link = MailboxTransport::new(&mailbox);

        assert_eq!(
            link.broadcast(&[0; CODEC_OUTPUT_MAX_BYTES + 1]),
            Err(DriverError::INVALID)
        );
        for _ in 0..UPLINK_QUEUE_DEPTH {
            assert_eq!(link.broadcast(&[1, 2, 3]), Ok(()));
        }
        assert_eq!(link.broadcast(&[1, 2, 3]), Err(DriverError::BUSY));
    }

    #[test]
    fn codec_pcm_reports_busy_until_drained() {
        let mailbox: Mailbox<CriticalSectionRawMutex> = Mailbox::new();
        let mut buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut slot: Slot<'_, CriticalSectionRawMutex, PcmFrame> = Slot::new(&mut buf);
        let (tx, mut rx) = slot.split();
        let mut codec = MailboxCodec::new(&mailbox, tx);

        let block = [7i16; MIC_BUFFER_SAMPLES];
        assert_eq!(codec.receive_pcm(&block), Ok(()));
        assert_eq!(codec.receive_pcm(&block), Err(DriverError::BUSY));

        assert_eq!(rx.try_receive().unwrap()[0], 7);
        rx.receive_done();
        assert_eq!(codec.receive_pcm(&block), Ok(()));
    }

    #[test]
    fn codec_pcm_rejects_partial_block() {
        let mailbox: Mailbox<CriticalSectionRawMutex> = Mailbox::new();
        let mut buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
        let mut slot: Slot<'_, CriticalSectionRawMutex, PcmFrame> = Slot::new(&mut buf);
        let (tx, mut rx) = slot.split();
        let mut codec = MailboxCodec::new(&mailbox, tx);

        let short = [3i16; MIC_BUFFER_SAMPLES / 2];
        assert_eq!(codec.receive_pcm(&short), Err(DriverError::INVALID));
        assert!(rx.try_receive().is_none());

        let long = [3i16; MIC_BUFFER_SAMPLES + 1];
        assert_eq!(codec.receive_pcm(&long), Err(DriverError::INVALID));
        assert!(rx.try_receive().is_none());
    }
}
