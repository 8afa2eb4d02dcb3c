//! Indicator visuals used during bring-up.

use embedded_hal_async::delay::DelayNs;
use platform::config::{
    BOOT_BLINK_MS, BOOT_DONE_FLASH_MS, BOOT_PAUSE_MS, FAILURE_BLINK_CYCLES,
    FAILURE_BLINK_PERIOD_MS,
};
use platform::{Indicator, LedChannel, LedSet};

/// A bounded blink: toggle every color of `colors` once per period, for
/// `cycles` periods, then force them all off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalPattern {
    /// Channels that blink together.
    pub colors: LedSet,
    /// Number of toggles.
    pub cycles: u8,
    /// Time between toggles.
    pub period_ms: u32,
}

impl SignalPattern {
    /// The stage-failure blink (5 toggles, 200 ms apart) on `colors`.
    pub const fn failure(colors: LedSet) -> Self {
        Self {
            colors,
            cycles: FAILURE_BLINK_CYCLES,
            period_ms: FAILURE_BLINK_PERIOD_MS,
        }
    }

    /// Play the pattern to completion.
    ///
    /// Each toggle inverts the channel's current state as read back from the
    /// indicator, so a color that was lit before the pattern starts goes dark
    /// on the first cycle.
    pub async fn play<I, D>(&self, indicator: &mut I, delay: &mut D)
    where
        I: Indicator,
        D: DelayNs,
    {
        for _ in 0..self.cycles {
            for channel in self.colors.iter() {
                let lit = indicator.is_on(channel);
                indicator.set(channel, !lit);
            }
            delay.delay_ms(self.period_ms).await;
        }
        indicator.set_all(self.colors, false);
    }
}

/// Power-on sweep: red, green, blue one after another, then all three,
/// then dark.
pub async fn boot_sweep<I, D>(indicator: &mut I, delay: &mut D)
where
    I: Indicator,
    D: DelayNs,
{
    for channel in LedChannel::ALL {
        indicator.set(channel, true);
        delay.delay_ms(BOOT_BLINK_MS).await;
        indicator.set(channel, false);
        delay.delay_ms(BOOT_PAUSE_MS).await;
    }
    indicator.set_all(LedSet::ALL, true);
    delay.delay_ms(BOOT_BLINK_MS).await;
    indicator.set_all(LedSet::ALL, false);
}

/// Momentary on/off of one channel, with no hold time.
pub fn pulse<I: Indicator>(indicator: &mut I, channel: LedChannel) {
    indicator.set(channel, true);
    indicator.set(channel, false);
}

/// Bring-up complete: blue held for one second.
pub async fn ready_flash<I, D>(indicator: &mut I, delay: &mut D)
where
    I: Indicator,
    D: DelayNs,
{
    indicator.set(LedChannel::Blue, true);
    delay.delay_ms(BOOT_DONE_FLASH_MS).await;
    indicator.set(LedChannel::Blue, false);
}
