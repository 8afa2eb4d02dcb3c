//! Power management abstraction
//!
//! Charge control, VBUS sensing and reset-cause decoding.

use crate::DriverError;

/// Battery charger and fuel gauge.
pub trait Battery {
    /// Configure the gauge and charger.
    async fn init(&mut self) -> Result<(), DriverError>;

    /// Enable charging.
    async fn start_charging(&mut self) -> Result<(), DriverError>;
}

/// USB power path.
///
/// Once initialised, the USB driver publishes VBUS presence as the device's
/// charge event.
pub trait UsbPower {
    /// Configure the USB peripheral / VBUS detection.
    async fn init(&mut self) -> Result<(), DriverError>;
}

/// Why the MCU last came out of reset.
///
/// Decoded from the reset flag bits of `RCC_CSR` (STM32WB55 RM0434 §8.4.37);
/// several flags may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetCause {
    bits: u32,
}

impl ResetCause {
    /// Low-power management reset.
    pub const LOW_POWER: u32 = 1 << 31;
    /// Window watchdog reset.
    pub const WINDOW_WATCHDOG: u32 = 1 << 30;
    /// Independent watchdog reset.
    pub const INDEPENDENT_WATCHDOG: u32 = 1 << 29;
    /// Software (`SYSRESETREQ`) reset.
    pub const SOFTWARE: u32 = 1 << 28;
    /// Brown-out reset.
    pub const BROWN_OUT: u32 = 1 << 27;
    /// NRST pin reset.
    pub const PIN: u32 = 1 << 26;
    /// Option-byte loader reset.
    pub const OPTION_BYTE: u32 = 1 << 25;

    const MASK: u32 = 0xFE00_0000;

    /// Decode the reset flags from a raw `RCC_CSR` value.
    pub const fn from_rcc_csr(csr: u32) -> Self {
        Self {
            bits: csr & Self::MASK,
        }
    }

    /// The masked reset flag bits.
    pub const fn bits(self) -> u32 {
        self.bits
    }

    /// Whether `flag` is set.
    pub const fn has(self, flag: u32) -> bool {
        self.bits & flag != 0
    }

    /// Whether a watchdog (independent or window) caused the reset.
    pub const fn is_watchdog(self) -> bool {
        self.has(Self::INDEPENDENT_WATCHDOG) || self.has(Self::WINDOW_WATCHDOG)
    }

    /// The most specific single cause, for logging.
    pub const fn primary(self) -> &'static str {
        if self.has(Self::INDEPENDENT_WATCHDOG) {
            "independent watchdog"
        } else if self.has(Self::WINDOW_WATCHDOG) {
            "window watchdog"
        } else if self.has(Self::SOFTWARE) {
            "software"
        } else if self.has(Self::LOW_POWER) {
            "low-power"
        } else if self.has(Self::OPTION_BYTE) {
            "option byte load"
        } else if self.has(Self::PIN) {
            "reset pin"
        } else if self.has(Self::BROWN_OUT) {
            "brown-out / power-on"
        } else {
            "unknown"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_reports_brown_out_and_pin() {
        // POR sets BORRSTF and PINRSTF together.
        let cause = ResetCause::from_rcc_csr(0x0C00_0000);
        assert!(cause.has(ResetCause::BROWN_OUT));
        assert!(cause.has(ResetCause::PIN));
        assert_eq!(cause.primary(), "reset pin");
    }

    #[test]
    fn watchdog_takes_precedence() {
        let cause = ResetCause::from_rcc_csr(ResetCause::INDEPENDENT_WATCHDOG | ResetCause::PIN);
        assert!(cause.is_watchdog());
        assert_eq!(cause.primary(), "independent watchdog");
    }

    #[test]
    fn non_flag_bits_are_masked() {
        // LSI on/ready and RMVF are not reset causes.
        let cause = ResetCause::from_rcc_csr(0x0080_0003);
        assert_eq!(cause.bits(), 0);
        assert_eq!(cause.primary(), "unknown");
    }
}
