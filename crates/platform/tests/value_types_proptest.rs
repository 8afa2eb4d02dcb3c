//! Property-based tests for the platform value types.

use platform::{DriverError, LedChannel, LedSet, ResetCause};

fn channel(i: u8) -> LedChannel {
    match i % 3 {
        0 => LedChannel::Red,
        1 => LedChannel::Green,
        _ => LedChannel::Blue,
    }
}

proptest::proptest! {
    /// Every channel added to a set is a member, and nothing else is.
    #[test]
    fn led_set_union_membership(a in 0u8..3, b in 0u8..3) {
        let set = LedSet::single(channel(a)).union(channel(b).into());
        for c in LedChannel::ALL {
            assert_eq!(set.contains(c), c == channel(a) || c == channel(b));
        }
    }

    /// Removing a channel only removes that channel.
    #[test]
    fn led_set_without_is_exact(a in 0u8..3) {
        let set = LedSet::ALL.without(channel(a));
        assert!(!set.contains(channel(a)));
        assert_eq!(set.iter().count(), 2);
    }

    /// `check` maps exactly zero to success and keeps every other code.
    #[test]
    fn driver_status_round_trips(code in i32::MIN..=i32::MAX) {
        match DriverError::check(code) {
            Ok(()) => assert_eq!(code, 0),
            Err(err) => assert_eq!(i32::from(err), code),
        }
    }

    /// Decoding never reports bits outside the reset flag field.
    #[test]
    fn reset_cause_masks_non_flags(csr in 0u32..=u32::MAX) {
        let cause = ResetCause::from_rcc_csr(csr);
        assert_eq!(cause.bits() & 0x01FF_FFFF, 0);
        assert_eq!(cause.primary() == "unknown", cause.bits() == 0);
    }
}
