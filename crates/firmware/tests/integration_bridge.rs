//! Integration test: audio frames through the bridge and the full app loop.
//!
//! Tests that:
//!   1. PCM blocks reach the codec in arrival order, one in flight at a time
//!   2. A rejected frame is dropped once and the next one goes through
//!   3. `app::run` returns the bring-up error and never starts the loops
//!   4. After a clean bring-up the device is on and both directions flow
//!
//! Run with: cargo test -p firmware --test integration_bridge

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::zerocopy_channel::Channel;
use embedded_hal_async::delay::DelayNs;
use firmware::boot::{BootConfig, Stage};
use firmware::bridge::{capture_once, uplink_once};
use firmware::{
    Board, CaptureBridge, DeviceState, FrameOutcome, FrameSlots, FrameStats, UplinkBridge,
};
use platform::config::MIC_BUFFER_SAMPLES;
use platform::mocks::{CallLog, MockDelay, MockDevice, MockIndicator};
use platform::{DriverError, EncodedFrame, PcmFrame};

/// Records like `MockDelay` but yields once, so concurrent loops make progress.
struct YieldingDelay(MockDelay);

impl DelayNs for YieldingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.delay_ns(ns).await;
        yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.delay_ms(ms).await;
        yield_now().await;
    }
}

#[tokio::test]
async fn pcm_blocks_reach_codec_in_order() {
    let log = CallLog::new();
    let mut codec = MockDevice::new("codec", log.clone());
    let mut bridge = CaptureBridge::new(&mut codec);

    let mut buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
    let mut slot: Channel<'_, NoopRawMutex, PcmFrame> = Channel::new(&mut buf);
    let (mut tx, mut rx) = slot.split();

    for block in 0..3i16 {
        let frame = tx.try_send().expect("slot must be free after forwarding");
        frame.fill(block);
        tx.send_done();
        assert!(tx.try_send().is_none(), "single frame in flight");
        assert_eq!(capture_once(&mut bridge, &mut rx).await, FrameOutcome::Forwarded);
    }

    assert_eq!(bridge.stats(), FrameStats { forwarded: 3, dropped: 0 });
    assert_eq!(log.frames("codec"), [MIC_BUFFER_SAMPLES; 3]);
}

#[tokio::test]
async fn failed_uplink_does_not_cascade() {
    let log = CallLog::new();
    let mut link = MockDevice::new("transport", log.clone());
    link.fail_next_frames(1);
    let mut bridge = UplinkBridge::new(&mut link);

    let mut buf = [EncodedFrame::new()];
    let mut slot: Channel<'_, NoopRawMutex, EncodedFrame> = Channel::new(&mut buf);
    let (mut tx, mut rx) = slot.split();

    let mut outcomes = Vec::new();
    for len in [20usize, 30] {
        let frame = tx.try_send().unwrap();
        frame.clear();
        frame.resize(len, 0xAA).unwrap();
        tx.send_done();
        outcomes.push(uplink_once(&mut bridge, &mut rx).await);
    }

    assert_eq!(
        outcomes,
        [FrameOutcome::Dropped(DriverError::IO), FrameOutcome::Forwarded]
    );
    assert_eq!(bridge.stats(), FrameStats { forwarded: 1, dropped: 1 });
    assert_eq!(log.frames("transport"), [20, 30]);
}

#[tokio::test]
async fn app_returns_bring_up_error() {
    let log = CallLog::new();
    let mut board = Board::new(
        MockDevice::new("transport", log.clone()),
        MockDevice::new("codec", log.clone()).failing("start", DriverError::new(2)),
        MockDevice::new("mic", log.clone()),
    );
    let mut led = MockIndicator::new(log.clone());
    let mut delay = MockDelay::new(log.clone());
    let state = DeviceState::new();

    let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
    let mut pcm: Channel<'_, NoopRawMutex, PcmFrame> = Channel::new(&mut pcm_buf);
    let (_pcm_tx, pcm_rx) = pcm.split();
    let mut enc_buf = [EncodedFrame::new()];
    let mut enc: Channel<'_, NoopRawMutex, EncodedFrame> = Channel::new(&mut enc_buf);
    let (_enc_tx, enc_rx) = enc.split();

    let err = firmware::run(
        BootConfig::MINIMAL,
        &mut board,
        &mut led,
        &state,
        FrameSlots {
            pcm: pcm_rx,
            encoded: enc_rx,
        },
        &mut delay,
    )
    .await;

    assert_eq!(err.stage, Stage::Codec);
    assert_eq!(err.code(), 2);
    assert!(state.is_off(), "device stays off after a failed bring-up");
    assert!(!log.touched("mic"));
}

#[tokio::test]
async fn app_switches_on_and_streams_after_bring_up() {
    let log = CallLog::new();
    let mut board = Board::new(
        MockDevice::new("transport", log.clone()),
        MockDevice::new("codec", log.clone()),
        MockDevice::new("mic", log.clone()),
    );
    let mut led = MockIndicator::new(log.clone());
    let mut delay = YieldingDelay(MockDelay::new(log.clone()));
    let state = DeviceState::new();

    let mut pcm_buf: [PcmFrame; 1] = [[0; MIC_BUFFER_SAMPLES]];
    let mut pcm: Channel<'_, NoopRawMutex, PcmFrame> = Channel::new(&mut pcm_buf);
    let (mut pcm_tx, pcm_rx) = pcm.split();
    let mut enc_buf = [EncodedFrame::new()];
    let mut enc: Channel<'_, NoopRawMutex, EncodedFrame> = Channel::new(&mut enc_buf);
    let (mut enc_tx, enc_rx) = enc.split();

    let app = firmware::run(
        BootConfig::MINIMAL,
        &mut board,
        &mut led,
        &state,
        FrameSlots {
            pcm: pcm_rx,
            encoded: enc_rx,
        },
        &mut delay,
    );
    let producer = async {
        pcm_tx.send().await.fill(1);
        pcm_tx.send_done();
        let frame = enc_tx.send().await;
        frame.clear();
        frame.extend_from_slice(&[1, 2, 3]).unwrap();
        enc_tx.send_done();
        while log.frames("codec").is_empty() || log.frames("transport").is_empty() {
            yield_now().await;
        }
    };

    match select(app, producer).await {
        Either::First(err) => panic!("bring-up failed: {err}"),
        Either::Second(()) => {}
    }

    assert!(!state.is_off());
    assert_eq!(log.frames("codec"), [MIC_BUFFER_SAMPLES]);
    assert_eq!(log.frames("transport"), [3]);
}
