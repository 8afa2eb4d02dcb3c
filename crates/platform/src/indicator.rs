//! Tri-color status light.
//!
//! The light has three independent channels. The firmware assigns them
//! fixed roles:
//!
//! | Channel | Role                                          |
//! |---------|-----------------------------------------------|
//! | Red     | link lost (status), microphone bring-up       |
//! | Green   | charging (status), stage progress pulses      |
//! | Blue    | link up (status), codec bring-up, boot done   |

/// One channel of the tri-color light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedChannel {
    /// Red die
    Red,
    /// Green die
    Green,
    /// Blue die
    Blue,
}

impl LedChannel {
    /// All channels in a fixed order (red, green, blue).
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    const fn bit(self) -> u8 {
        match self {
            Self::Red => 0b001,
            Self::Green => 0b010,
            Self::Blue => 0b100,
        }
    }
}

impl core::fmt::Display for LedChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// A set of channels, used for "light these while busy" and blink patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedSet(u8);

impl LedSet {
    /// No channel.
    pub const EMPTY: Self = Self(0);
    /// Red only.
    pub const RED: Self = Self::single(LedChannel::Red);
    /// Green only.
    pub const GREEN: Self = Self::single(LedChannel::Green);
    /// Blue only.
    pub const BLUE: Self = Self::single(LedChannel::Blue);
    /// Every channel.
    pub const ALL: Self = Self(0b111);

    /// Set holding exactly `channel`.
    pub const fn single(channel: LedChannel) -> Self {
        Self(channel.bit())
    }

    /// Channels present in either set.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self` with `channel` removed.
    pub const fn without(self, channel: LedChannel) -> Self {
        Self(self.0 & !channel.bit())
    }

    /// Whether `channel` is a member.
    pub const fn contains(self, channel: LedChannel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// Whether no channel is a member.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in red, green, blue order.
    pub fn iter(self) -> impl Iterator<Item = LedChannel> {
        LedChannel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl From<LedChannel> for LedSet {
    fn from(channel: LedChannel) -> Self {
        Self::single(channel)
    }
}

/// Tri-color indicator driver.
///
/// `start` must succeed before any other subsystem is started; every later
/// visual (boot sweep, progress pulses, failure blinks, status) goes through
/// `set`. Setting a channel to the state it already has is a no-op.
pub trait Indicator {
    /// Claim and configure the LED outputs.
    async fn start(&mut self) -> Result<(), crate::DriverError>;

    /// Drive one channel on or off.
    fn set(&mut self, channel: LedChannel, on: bool);

    /// Current state of one channel.
    fn is_on(&self, channel: LedChannel) -> bool;

    /// Drive every channel of `set` to the same state.
    fn set_all(&mut self, set: LedSet, on: bool) {
        for channel in set.iter() {
            self.set(channel, on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let set = LedSet::RED.union(LedSet::GREEN);
        assert!(set.contains(LedChannel::Red));
        assert!(set.contains(LedChannel::Green));
        assert!(!set.contains(LedChannel::Blue));
    }

    #[test]
    fn iter_is_ordered() {
        let order: std::vec::Vec<_> = LedSet::ALL.iter().collect();
        assert_eq!(order, [LedChannel::Red, LedChannel::Green, LedChannel::Blue]);
    }

    #[test]
    fn empty_set_iterates_nothing() {
        assert!(LedSet::EMPTY.is_empty());
        assert_eq!(LedSet::EMPTY.iter().count(), 0);
    }
}
