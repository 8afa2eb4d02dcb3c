//! Desktop emulator for the recorder firmware.
//!
//! Runs the real bring-up sequencer, status loop and frame bridge against
//! the `sim` collaborators on a tokio current-thread runtime. The light is
//! printed on the `led` log target.
//!
//! ```bash
//! RUST_LOG=info,led=debug cargo run -p firmware --bin emulator --features emulator
//! ```
//!
//! Set `EMULATOR_FAIL=transport|codec|microphone` to make that stage's start
//! fail and watch the failure visuals.

// Desktop binary: no rustdoc requirement on private items.
#![allow(missing_docs)]

use embassy_futures::join::join;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use embassy_sync::zerocopy_channel::Channel;
use firmware::boot::BootConfig;
use firmware::sim::{
    run_scenario, tone_source, CountingTransport, PackingCodec, TerminalIndicator, TokioDelay,
    ToneMicrophone, DEFAULT_SCENARIO,
};
use firmware::{Board, DeviceState, FrameSlots};
use platform::config::MIC_BUFFER_SAMPLES;
use platform::{DriverError, EncodedFrame, PcmFrame};
use tracing_subscriber::EnvFilter;

const TONE_HZ: u32 = 440;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,led=debug")),
        )
        .init();

    let fail = std::env::var("EMULATOR_FAIL").ok();
    let fail_on = |stage: &str| {
        (fail.as_deref() == Some(stage)).then_some(DriverError::IO)
    };

    tracing::info!("Pendant recorder emulator v{}", env!("CARGO_PKG_VERSION"));

    let state = DeviceState::new();
    let armed: Signal<NoopRawMutex, ()> = Signal::new();

    let mut pcm_buf: Box<[PcmFrame; 1]> = Box::new([[0; MIC_BUFFER_SAMPLES]]);
    let mut pcm_slot: Channel<'_, NoopRawMutex, PcmFrame> = Channel::new(&mut *pcm_buf);
    let (pcm_tx, pcm_rx) = pcm_slot.split();
    let mut encoded_buf = [EncodedFrame::new()];
    let mut encoded_slot: Channel<'_, NoopRawMutex, EncodedFrame> =
        Channel::new(&mut encoded_buf);
    let (encoded_tx, encoded_rx) = encoded_slot.split();

    let mut transport = CountingTransport::new();
    if let Some(err) = fail_on("transport") {
        transport = transport.failing(err);
    }
    let mut codec = PackingCodec::new(encoded_tx);
    if let Some(err) = fail_on("codec") {
        codec = codec.failing(err);
    }
    let mut microphone = ToneMicrophone::new(&armed);
    if let Some(err) = fail_on("microphone") {
        microphone = microphone.failing(err);
    }

    let mut board = Board::new(transport, codec, microphone);
    let mut indicator = TerminalIndicator::new();
    let mut delay = TokioDelay;

    let app = firmware::run(
        BootConfig::MINIMAL,
        &mut board,
        &mut indicator,
        &state,
        FrameSlots {
            pcm: pcm_rx,
            encoded: encoded_rx,
        },
        &mut delay,
    );
    let world = join(
        tone_source(&armed, pcm_tx, TokioDelay, TONE_HZ),
        run_scenario(&DEFAULT_SCENARIO, &state, TokioDelay),
    );

    match select(app, world).await {
        Either::First(err) => {
            tracing::error!("bring-up failed: {} (code {})", err, err.code());
            std::process::ExitCode::FAILURE
        }
        Either::Second((never, _)) => match never {},
    }
}
