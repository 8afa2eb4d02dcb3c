//! Power-on bring-up sequencer.
//!
//! Bring-up order (MUST be respected; every later visual needs the light,
//! and the microphone must not produce PCM before the codec can take it):
//!
//! | # | Stage          | Required          | Busy colors  | On failure         |
//! |---|----------------|-------------------|--------------|--------------------|
//! | 1 | Indicator      | always            | -            | return (no light)  |
//! | 2 | Battery        | `battery`         | -            | return             |
//! | 3 | Button         | `button`          | -            | return             |
//! | 4 | Accelerometer  | `accelerometer`   | -            | return             |
//! | 5 | Speaker        | `speaker`         | -            | return             |
//! | 6 | OfflineStorage | `offline-storage` | -            | return             |
//! | 7 | Haptic         | `haptic`          | -            | return             |
//! | 8 | Usb            | `usb`             | -            | return             |
//! | 9 | Transport      | always            | -            | return             |
//! |10 | BootChime      | `speaker`         | -            | cannot fail        |
//! |11 | Codec          | always            | blue         | blink blue, return |
//! |12 | HapticPulse    | `haptic`          | blue         | cannot fail        |
//! |13 | Microphone     | always            | red + green  | blink red+green    |
//!
//! The order and the per-stage visuals are data ([`BRING_UP_PLAN`]); the
//! sequencer walks the table once, never retries, and stops at the first
//! failure.

pub mod pattern;

use embedded_hal_async::delay::DelayNs;
use platform::{DriverError, Indicator, LedChannel, LedSet};
use thiserror_no_std::Error;

pub use pattern::SignalPattern;

/// One named unit of initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Tri-color light driver
    Indicator,
    /// Charger / fuel gauge (init, then start charging)
    Battery,
    /// Power button (init, then arm its work item)
    Button,
    /// Motion sensor
    Accelerometer,
    /// Speaker amplifier
    Speaker,
    /// SD card mount
    OfflineStorage,
    /// Haptic drive pin
    Haptic,
    /// USB / VBUS detection
    Usb,
    /// Radio link
    Transport,
    /// Power-on chime
    BootChime,
    /// Audio encoder
    Codec,
    /// Half-second vibration after the codec is up
    HapticPulse,
    /// PCM sampler
    Microphone,
}

impl Stage {
    /// Human-readable stage name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Indicator => "indicator",
            Self::Battery => "battery",
            Self::Button => "button",
            Self::Accelerometer => "accelerometer",
            Self::Speaker => "speaker",
            Self::OfflineStorage => "offline storage",
            Self::Haptic => "haptic",
            Self::Usb => "usb",
            Self::Transport => "transport",
            Self::BootChime => "boot chime",
            Self::Codec => "codec",
            Self::HapticPulse => "haptic pulse",
            Self::Microphone => "microphone",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A build-time selectable part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feature {
    /// `battery`
    Battery,
    /// `button`
    Button,
    /// `accelerometer`
    Accelerometer,
    /// `speaker`
    Speaker,
    /// `offline-storage`
    OfflineStorage,
    /// `haptic`
    Haptic,
    /// `usb`
    Usb,
}

/// Whether a stage always runs or depends on a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Requirement {
    /// Runs on every build; failure aborts bring-up.
    Mandatory,
    /// Runs only when the feature is enabled; failure then aborts bring-up.
    Optional(Feature),
}

/// How one stage is run and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StageDescriptor {
    /// Which stage.
    pub stage: Stage,
    /// When it runs.
    pub requirement: Requirement,
    /// Pulsed immediately before the stage starts.
    pub lead_in: Option<LedChannel>,
    /// Lit for the duration of the start call.
    pub busy: LedSet,
    /// Played when the start call fails.
    pub on_failure: Option<SignalPattern>,
    /// Pulsed after the start call succeeds.
    pub progress: Option<LedChannel>,
}

impl StageDescriptor {
    const fn mandatory(stage: Stage) -> Self {
        Self {
            stage,
            requirement: Requirement::Mandatory,
            lead_in: None,
            busy: LedSet::EMPTY,
            on_failure: None,
            progress: None,
        }
    }

    const fn optional(stage: Stage, feature: Feature) -> Self {
        Self {
            requirement: Requirement::Optional(feature),
            progress: Some(LedChannel::Green),
            ..Self::mandatory(stage)
        }
    }

    const fn quiet(self) -> Self {
        Self {
            progress: None,
            ..self
        }
    }

    const fn lead_in(self, channel: LedChannel) -> Self {
        Self {
            lead_in: Some(channel),
            ..self
        }
    }

    const fn busy(self, colors: LedSet) -> Self {
        Self {
            busy: colors,
            ..self
        }
    }

    const fn blink_on_failure(self) -> Self {
        Self {
            on_failure: Some(SignalPattern::failure(self.busy)),
            ..self
        }
    }
}

const MIC_BUSY: LedSet = LedSet::RED.union(LedSet::GREEN);

/// The bring-up order. Transport failure shows no blink.
pub static BRING_UP_PLAN: [StageDescriptor; 13] = [
    StageDescriptor::mandatory(Stage::Indicator),
    StageDescriptor::optional(Stage::Battery, Feature::Battery),
    StageDescriptor::optional(Stage::Button, Feature::Button),
    StageDescriptor::optional(Stage::Accelerometer, Feature::Accelerometer),
    StageDescriptor::optional(Stage::Speaker, Feature::Speaker),
    StageDescriptor::optional(Stage::OfflineStorage, Feature::OfflineStorage),
    StageDescriptor::optional(Stage::Haptic, Feature::Haptic),
    StageDescriptor::optional(Stage::Usb, Feature::Usb),
    StageDescriptor::mandatory(Stage::Transport).lead_in(LedChannel::Green),
    StageDescriptor::optional(Stage::BootChime, Feature::Speaker).quiet(),
    StageDescriptor::mandatory(Stage::Codec)
        .busy(LedSet::BLUE)
        .blink_on_failure(),
    StageDescriptor::optional(Stage::HapticPulse, Feature::Haptic)
        .quiet()
        .busy(LedSet::BLUE),
    StageDescriptor::mandatory(Stage::Microphone)
        .busy(MIC_BUSY)
        .blink_on_failure(),
];

/// Which optional parts this build carries.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootConfig {
    /// Charger / fuel gauge
    pub battery: bool,
    /// Power button
    pub button: bool,
    /// Motion sensor
    pub accelerometer: bool,
    /// Speaker and boot chime
    pub speaker: bool,
    /// SD card
    pub offline_storage: bool,
    /// Haptic pin and boot pulse
    pub haptic: bool,
    /// USB / VBUS
    pub usb: bool,
}

impl BootConfig {
    /// Only the mandatory stages.
    pub const MINIMAL: Self = Self {
        battery: false,
        button: false,
        accelerometer: false,
        speaker: false,
        offline_storage: false,
        haptic: false,
        usb: false,
    };

    /// Every optional stage.
    pub const FULL: Self = Self {
        battery: true,
        button: true,
        accelerometer: true,
        speaker: true,
        offline_storage: true,
        haptic: true,
        usb: true,
    };

    /// Selection made by this build's cargo features.
    pub const fn from_features() -> Self {
        Self {
            battery: cfg!(feature = "battery"),
            button: cfg!(feature = "button"),
            accelerometer: cfg!(feature = "accelerometer"),
            speaker: cfg!(feature = "speaker"),
            offline_storage: cfg!(feature = "offline-storage"),
            haptic: cfg!(feature = "haptic"),
            usb: cfg!(feature = "usb"),
        }
    }

    /// Whether `feature` is selected.
    pub const fn has(self, feature: Feature) -> bool {
        match feature {
            Feature::Battery => self.battery,
            Feature::Button => self.button,
            Feature::Accelerometer => self.accelerometer,
            Feature::Speaker => self.speaker,
            Feature::OfflineStorage => self.offline_storage,
            Feature::Haptic => self.haptic,
            Feature::Usb => self.usb,
        }
    }

    /// Copy of `self` with `feature` set to `on`.
    pub const fn with(mut self, feature: Feature, on: bool) -> Self {
        match feature {
            Feature::Battery => self.battery = on,
            Feature::Button => self.button = on,
            Feature::Accelerometer => self.accelerometer = on,
            Feature::Speaker => self.speaker = on,
            Feature::OfflineStorage => self.offline_storage = on,
            Feature::Haptic => self.haptic = on,
            Feature::Usb => self.usb = on,
        }
        self
    }

    /// Whether a stage with `requirement` runs under this selection.
    pub const fn enables(self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Mandatory => true,
            Requirement::Optional(feature) => self.has(feature),
        }
    }
}

/// Starts the individual subsystems on behalf of the sequencer.
///
/// Called at most once per stage, in plan order. [`Stage::Indicator`] is
/// never dispatched here; the sequencer starts the light itself.
pub trait StageRunner {
    /// Start one stage.
    async fn start_stage(&mut self, stage: Stage) -> Result<(), DriverError>;
}

/// A stage failed and bring-up stopped there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{stage} failed to start ({cause})")]
pub struct BootError {
    /// The failing stage.
    pub stage: Stage,
    /// What the collaborator reported.
    pub cause: DriverError,
}

impl BootError {
    /// The collaborator's status code, as returned to the entry point.
    pub const fn code(&self) -> i32 {
        self.cause.code()
    }
}

/// Run the full bring-up sequence.
///
/// On success every enabled stage has started, the light has shown the
/// power-on sweep and the ready flash, and all channels are dark. On failure
/// no later stage has been touched.
pub async fn bring_up<R, I, D>(
    config: BootConfig,
    runner: &mut R,
    indicator: &mut I,
    delay: &mut D,
) -> Result<(), BootError>
where
    R: StageRunner,
    I: Indicator,
    D: DelayNs,
{
    info!("bring-up starting");

    indicator.start().await.map_err(|cause| {
        error!("failed to start indicator ({})", cause);
        BootError {
            stage: Stage::Indicator,
            cause,
        }
    })?;
    pattern::boot_sweep(indicator, delay).await;

    for step in BRING_UP_PLAN.iter().skip(1) {
        if config.enables(step.requirement) {
            run_stage(step, runner, indicator, delay).await?;
        }
    }

    info!("bring-up complete");
    pattern::ready_flash(indicator, delay).await;
    Ok(())
}

async fn run_stage<R, I, D>(
    step: &StageDescriptor,
    runner: &mut R,
    indicator: &mut I,
    delay: &mut D,
) -> Result<(), BootError>
where
    R: StageRunner,
    I: Indicator,
    D: DelayNs,
{
    if let Some(channel) = step.lead_in {
        pattern::pulse(indicator, channel);
    }
    indicator.set_all(step.busy, true);

    match runner.start_stage(step.stage).await {
        Ok(()) => {
            indicator.set_all(step.busy, false);
            if let Some(channel) = step.progress {
                pattern::pulse(indicator, channel);
            }
            debug!("{} started", step.stage);
            Ok(())
        }
        Err(cause) => {
            error!("failed to start {} ({})", step.stage, cause);
            if let Some(blink) = step.on_failure {
                blink.play(indicator, delay).await;
            }
            indicator.set_all(step.busy, false);
            Err(BootError {
                stage: step.stage,
                cause,
            })
        }
    }
}
