//! Status indicator behaviour over tick sequences.
//!
//! Run with: cargo test -p firmware --test status_indicator

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use firmware::status::{CHARGE_COLOR, CONNECTED_COLOR, DISCONNECTED_COLOR};
use firmware::{DeviceState, StatusIndicator, StatusInputs};
use platform::mocks::{CallLog, MockIndicator};
use platform::Indicator;

fn inputs(off: bool, connected: bool, charge_event: bool) -> StatusInputs {
    StatusInputs {
        off,
        connected,
        charge_event,
    }
}

#[test]
fn connected_and_disconnected_are_mutually_exclusive_when_on() {
    let mut led = MockIndicator::new(CallLog::new());
    let mut machine = StatusIndicator::new();

    machine.tick(inputs(false, true, false), &mut led);
    assert!(led.is_on(CONNECTED_COLOR));
    assert!(!led.is_on(DISCONNECTED_COLOR));

    machine.tick(inputs(false, false, false), &mut led);
    assert!(!led.is_on(CONNECTED_COLOR));
    assert!(led.is_on(DISCONNECTED_COLOR));
}

#[test]
fn two_charge_events_restore_charging_state() {
    let mut led = MockIndicator::new(CallLog::new());
    let mut machine = StatusIndicator::new();

    machine.tick(inputs(false, true, true), &mut led);
    assert!(machine.is_charging());
    assert!(led.is_on(CHARGE_COLOR));

    machine.tick(inputs(false, true, true), &mut led);
    assert!(!machine.is_charging());
    assert!(!led.is_on(CHARGE_COLOR));
}

#[test]
fn power_off_keeps_charge_overlay() {
    let mut led = MockIndicator::new(CallLog::new());
    let mut machine = StatusIndicator::new();

    machine.tick(inputs(false, false, false), &mut led);
    machine.tick(inputs(true, false, true), &mut led);

    assert!(led.is_on(CHARGE_COLOR));
    assert!(!led.is_on(CONNECTED_COLOR));
    assert!(!led.is_on(DISCONNECTED_COLOR));
}

#[test]
fn device_state_drives_the_machine() {
    let state = DeviceState::new();
    let mut led = MockIndicator::new(CallLog::new());
    let mut machine = StatusIndicator::new();

    machine.tick(state.snapshot(), &mut led);
    assert!(led.lit().is_empty(), "dark until switched on");

    state.set_off(false);
    state.set_connected(true);
    machine.tick(state.snapshot(), &mut led);
    assert!(led.is_on(CONNECTED_COLOR));

    state.set_connected(false);
    machine.tick(state.snapshot(), &mut led);
    assert!(led.is_on(DISCONNECTED_COLOR));
}

proptest::proptest! {
    /// Off forces both link colors dark whatever else is set.
    #[test]
    fn off_hides_link_colors(
        history in proptest::collection::vec(
            (proptest::bool::ANY, proptest::bool::ANY, proptest::bool::ANY),
            0..16,
        ),
        connected in proptest::bool::ANY,
        charge_event in proptest::bool::ANY,
    ) {
        let mut machine = StatusIndicator::new();
        for (off, conn, charge) in history {
            let _ = machine.next(inputs(off, conn, charge));
        }
        let frame = machine.next(inputs(true, connected, charge_event));
        assert!(!frame.connected);
        assert!(!frame.disconnected);
    }

    /// Charging flips exactly once per tick with a pending event.
    #[test]
    fn charging_parity_matches_event_count(events in proptest::collection::vec(proptest::bool::ANY, 0..32)) {
        let mut machine = StatusIndicator::new();
        for &event in &events {
            let frame = machine.next(inputs(false, false, event));
            if event {
                assert_eq!(frame.charge, machine.is_charging());
            } else {
                assert!(!frame.charge);
            }
        }
        let flips = events.iter().filter(|&&e| e).count();
        assert_eq!(machine.is_charging(), flips % 2 == 1);
    }
}
