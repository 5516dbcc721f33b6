//! Button monitor and display driver against mock and simulated pins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;

use roomstock::adapters::hardware::build_sim;
use roomstock::app::ports::{Button, share_indicators};
use roomstock::config::SystemConfig;
use roomstock::drivers::button::ButtonMonitor;
use roomstock::drivers::display::{DisplayDriver, segment_levels};
use roomstock::drivers::task::{ShutdownSignal, join_bounded, spawn_named};

use crate::mock_hw::{IndicatorCall, MockButtons, Rig};

const POLL: Duration = Duration::from_millis(10);
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Press and release `button` once, sampling at 10 ms steps from `t`.
/// Returns the time after the release.
fn tap(monitor: &mut ButtonMonitor<MockButtons>, buttons: &MockButtons, button: Button, t: Instant) -> Instant {
    buttons.set(button, PinState::Low);
    monitor.poll_once(t);
    buttons.set(button, PinState::High);
    monitor.poll_once(t + POLL);
    t + POLL * 2
}

#[test]
fn honoured_presses_add_up_to_the_ceiling() {
    let rig = Rig::new(95);
    rig.service.enter(0).unwrap();
    let buttons = MockButtons::new();
    let mut monitor = ButtonMonitor::new(buttons.clone(), rig.service.clone(), POLL, DEBOUNCE);

    let mut t = Instant::now();
    for _ in 0..8 {
        tap(&mut monitor, &buttons, Button::Add, t);
        t += DEBOUNCE;
    }
    assert_eq!(rig.counts()[0], 99);
}

#[test]
fn presses_inside_the_window_count_once() {
    let rig = Rig::new(10);
    rig.service.enter(1).unwrap();
    let buttons = MockButtons::new();
    let mut monitor = ButtonMonitor::new(buttons.clone(), rig.service.clone(), POLL, DEBOUNCE);

    let t0 = Instant::now();
    let t1 = tap(&mut monitor, &buttons, Button::Remove, t0);
    tap(&mut monitor, &buttons, Button::Remove, t1);
    assert_eq!(rig.counts()[1], 9);

    tap(&mut monitor, &buttons, Button::Remove, t0 + DEBOUNCE);
    assert_eq!(rig.counts()[1], 8);
}

#[test]
fn presses_without_active_room_change_nothing() {
    let rig = Rig::new(10);
    let buttons = MockButtons::new();
    let mut monitor = ButtonMonitor::new(buttons.clone(), rig.service.clone(), POLL, DEBOUNCE);

    let t0 = Instant::now();
    tap(&mut monitor, &buttons, Button::Add, t0);
    assert_eq!(rig.counts(), [10, 10, 10]);

    // The discarded press still started a cooldown.
    rig.service.enter(0).unwrap();
    tap(&mut monitor, &buttons, Button::Add, t0 + POLL * 5);
    assert_eq!(rig.counts()[0], 10);
    tap(&mut monitor, &buttons, Button::Add, t0 + DEBOUNCE);
    assert_eq!(rig.counts()[0], 11);
}

#[test]
fn button_held_at_startup_is_ignored() {
    let rig = Rig::new(10);
    rig.service.enter(0).unwrap();
    let buttons = MockButtons::new();
    buttons.set(Button::Add, PinState::Low);
    let mut monitor = ButtonMonitor::new(buttons.clone(), rig.service.clone(), POLL, DEBOUNCE);
    assert_eq!(monitor.poll_once(Instant::now()), 0);
    assert_eq!(rig.counts()[0], 10);
}

#[test]
fn display_renders_active_count_on_sim_pins() {
    let mut config = SystemConfig::default();
    config.digit_hold_ms = 1;
    let ports = build_sim(&config);
    let sim = ports.sim.clone().unwrap();
    let indicators = Arc::new(parking_lot::Mutex::new(ports.indicators));

    let rig = Rig::new(10);
    rig.store.set_active(Some(2)).unwrap();
    rig.store.set_exact(2, 8).unwrap();

    let mut display = DisplayDriver::new(rig.store.clone(), indicators, &config);
    display.render_once();

    // Last digit written was the ones digit; its enable is released.
    let levels: Vec<_> = sim.segments.iter().map(|p| p.level()).collect();
    assert_eq!(levels, segment_levels(8, config.polarity));
    assert!(sim.digit_enables.iter().all(|p| p.level() == PinState::Low));
}

#[test]
fn display_loop_blanks_on_shutdown() {
    let mut config = SystemConfig::default();
    config.digit_hold_ms = 1;
    config.display_tick_ms = 2;
    let rig = Rig::new(42);
    rig.store.set_active(Some(0)).unwrap();

    let mock = crate::mock_hw::MockIndicators::new();
    let display = DisplayDriver::new(rig.store.clone(), share_indicators(mock.clone()), &config);
    let stop = ShutdownSignal::new();
    let s = stop.clone();
    let handle = spawn_named("display-test", 64, move || display.run(s)).unwrap();

    std::thread::sleep(Duration::from_millis(30));
    stop.raise();
    assert!(join_bounded(vec![handle], Duration::from_secs(2)));

    let history = mock.history();
    assert!(history.contains(&IndicatorCall::Enable(0, true)));
    assert!(history.contains(&IndicatorCall::Enable(1, true)));
    // Ends blanked: every enable low after the final segment writes.
    assert_eq!(history.last(), Some(&IndicatorCall::Enable(1, false)));
    let tail = &history[history.len() - 9..];
    assert!(tail[..7].iter().all(|c| matches!(c, IndicatorCall::Segment(_, PinState::High))));
}
