//! Concrete collaborator wiring.
//!
//! A [`Board`] owns one driver per stage and dispatches the sequencer's
//! [`StageRunner`] calls to them. Parts a board does not carry are
//! [`NotFitted`]; the type parameters default to it so a wiring only names
//! what is on the PCB.

use platform::config::HAPTIC_BOOT_PULSE_MS;
use platform::{
    Accelerometer, AudioCodec, Battery, ButtonInput, DriverError, Haptic, Microphone, NotFitted,
    OfflineStorage, Speaker, Transport, UsbPower,
};

use crate::boot::{Stage, StageRunner};

/// Every collaborator the bring-up sequence starts, except the light.
#[allow(clippy::struct_field_names)]
pub struct Board<
    T,
    C,
    M,
    B = NotFitted,
    Btn = NotFitted,
    A = NotFitted,
    S = NotFitted,
    St = NotFitted,
    H = NotFitted,
    U = NotFitted,
> {
    /// Radio link.
    pub transport: T,
    /// Audio encoder.
    pub codec: C,
    /// PCM sampler.
    pub microphone: M,
    /// Charger / fuel gauge.
    pub battery: B,
    /// Power button.
    pub button: Btn,
    /// Motion sensor.
    pub accelerometer: A,
    /// Speaker.
    pub speaker: S,
    /// SD card.
    pub storage: St,
    /// Vibration motor.
    pub haptic: H,
    /// USB power path.
    pub usb: U,
}

impl<T, C, M> Board<T, C, M> {
    /// A board carrying only the mandatory parts.
    pub fn new(transport: T, codec: C, microphone: M) -> Self {
        Self {
            transport,
            codec,
            microphone,
            battery: NotFitted,
            button: NotFitted,
            accelerometer: NotFitted,
            speaker: NotFitted,
            storage: NotFitted,
            haptic: NotFitted,
            usb: NotFitted,
        }
    }
}

impl<T, C, M, B, Btn, A, S, St, H, U> Board<T, C, M, B, Btn, A, S, St, H, U> {
    /// Fit a charger.
    pub fn with_battery<X>(self, battery: X) -> Board<T, C, M, X, Btn, A, S, St, H, U> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery,
            button: self.button,
            accelerometer: self.accelerometer,
            speaker: self.speaker,
            storage: self.storage,
            haptic: self.haptic,
            usb: self.usb,
        }
    }

    /// Fit a power button.
    pub fn with_button<X>(self, button: X) -> Board<T, C, M, B, X, A, S, St, H, U> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery: self.battery,
            button,
            accelerometer: self.accelerometer,
            speaker: self.speaker,
            storage: self.storage,
            haptic: self.haptic,
            usb: self.usb,
        }
    }

    /// Fit a motion sensor.
    pub fn with_accelerometer<X>(self, accelerometer: X) -> Board<T, C, M, B, Btn, X, S, St, H, U> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery: self.battery,
            button: self.button,
            accelerometer,
            speaker: self.speaker,
            storage: self.storage,
            haptic: self.haptic,
            usb: self.usb,
        }
    }

    /// Fit a speaker.
    pub fn with_speaker<X>(self, speaker: X) -> Board<T, C, M, B, Btn, A, X, St, H, U> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery: self.battery,
            button: self.button,
            accelerometer: self.accelerometer,
            speaker,
            storage: self.storage,
            haptic: self.haptic,
            usb: self.usb,
        }
    }

    /// Fit an SD card.
    pub fn with_storage<X>(self, storage: X) -> Board<T, C, M, B, Btn, A, S, X, H, U> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery: self.battery,
            button: self.button,
            accelerometer: self.accelerometer,
            speaker: self.speaker,
            storage,
            haptic: self.haptic,
            usb: self.usb,
        }
    }

    /// Fit a vibration motor.
    pub fn with_haptic<X>(self, haptic: X) -> Board<T, C, M, B, Btn, A, S, St, X, U> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery: self.battery,
            button: self.button,
            accelerometer: self.accelerometer,
            speaker: self.speaker,
            storage: self.storage,
            haptic,
            usb: self.usb,
        }
    }

    /// Fit a USB power path.
    pub fn with_usb<X>(self, usb: X) -> Board<T, C, M, B, Btn, A, S, St, H, X> {
        Board {
            transport: self.transport,
            codec: self.codec,
            microphone: self.microphone,
            battery: self.battery,
            button: self.button,
            accelerometer: self.accelerometer,
            speaker: self.speaker,
            storage: self.storage,
            haptic: self.haptic,
            usb,
        }
    }
}

impl<T, C, M, B, Btn, A, S, St, H, U> StageRunner for Board<T, C, M, B, Btn, A, S, St, H, U>
where
    T: Transport,
    C: AudioCodec,
    M: Microphone,
    B: Battery,
    Btn: ButtonInput,
    A: Accelerometer,
    S: Speaker,
    St: OfflineStorage,
    H: Haptic,
    U: UsbPower,
{
    async fn start_stage(&mut self, stage: Stage) -> Result<(), DriverError> {
        match stage {
            // Started by the sequencer itself.
            Stage::Indicator => Ok(()),
            Stage::Battery => {
                self.battery.init().await?;
                self.battery.start_charging().await
            }
            Stage::Button => {
                self.button.init().await?;
                self.button.activate();
                Ok(())
            }
            Stage::Accelerometer => self.accelerometer.start().await,
            Stage::Speaker => self.speaker.init().await,
            Stage::OfflineStorage => self.storage.mount().await,
            Stage::Haptic => self.haptic.init().await,
            Stage::Usb => self.usb.init().await,
            Stage::Transport => self.transport.start().await,
            Stage::BootChime => {
                self.speaker.play_boot_chime().await;
                Ok(())
            }
            Stage::Codec => self.codec.start().await,
            Stage::HapticPulse => {
                self.haptic.pulse(HAPTIC_BOOT_PULSE_MS).await;
                Ok(())
            }
            Stage::Microphone => self.microphone.start().await,
        }
    }
}
