//! Application entry: bring-up, then the three runtime loops.

use embassy_futures::join::join3;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use platform::{AudioCodec, Indicator, Transport};

use crate::board::Board;
use crate::boot::{self, BootConfig, BootError, StageRunner};
use crate::bridge::{self, CaptureBridge, EncodedReceiver, PcmReceiver, UplinkBridge};
use crate::state::DeviceState;
use crate::status;

/// Consumer ends of the two frame slots.
pub struct FrameSlots<'a, M: RawMutex> {
    /// Filled by the sampler.
    pub pcm: PcmReceiver<'a, M>,
    /// Filled by the codec.
    pub encoded: EncodedReceiver<'a, M>,
}

/// Bring the device up and run it.
///
/// Returns only if bring-up fails; the caller reports the error and halts.
/// After a successful bring-up the device is marked on, and the status tick,
/// the capture bridge and the uplink bridge run concurrently for good.
#[allow(clippy::too_many_arguments)]
pub async fn run<T, C, Mic, B, Btn, A, S, St, H, U, I, D, M>(
    config: BootConfig,
    board: &mut Board<T, C, Mic, B, Btn, A, S, St, H, U>,
    indicator: &mut I,
    state: &DeviceState,
    slots: FrameSlots<'_, M>,
    delay: &mut D,
) -> BootError
where
    Board<T, C, Mic, B, Btn, A, S, St, H, U>: StageRunner,
    T: Transport,
    C: AudioCodec,
    I: Indicator,
    D: DelayNs,
    M: RawMutex,
{
    if let Err(err) = boot::bring_up(config, board, indicator, delay).await {
        return err;
    }

    state.set_off(false);
    info!("entering main loop");

    let (never, _, _) = join3(
        status::status_loop(state, indicator, delay),
        bridge::run_capture(CaptureBridge::new(&mut board.codec), slots.pcm),
        bridge::run_uplink(UplinkBridge::new(&mut board.transport), slots.encoded),
    )
    .await;
    match never {}
}
