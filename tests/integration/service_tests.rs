//! Integration tests for the InventoryService control plane and button path.

use std::sync::Arc;
use std::time::Duration;

use roomstock::adapters::mirror::{mirror_mailbox, run_mirror_worker};
use roomstock::app::commands::{UpdateAction, UpdateRequest};
use roomstock::app::events::AppEvent;
use roomstock::app::ports::{Button, Led};
use roomstock::drivers::task::ShutdownSignal;
use roomstock::Error;

use crate::mock_hw::{IndicatorCall, RecordingMirror, Rig};

#[test]
fn start_lights_warning_leds_for_low_initial_counts() {
    let rig = Rig::new(0);
    assert!((0..3).all(|id| rig.indicators.led_on(Led::Warning(id))));
    assert!((0..3).all(|id| !rig.indicators.led_on(Led::Room(id))));
    assert_eq!(rig.indicators.history()[0], IndicatorCall::AllOff);
}

#[test]
fn remove_six_then_add_two_scenario() {
    let rig = Rig::new(10);
    rig.service.enter(0).unwrap();

    for _ in 0..6 {
        rig.service.press(Button::Remove);
    }
    assert_eq!(rig.counts(), [4, 10, 10]);
    assert!(rig.store.snapshot().rooms[0].warning_active);
    assert!(rig.indicators.led_on(Led::Warning(0)));

    for _ in 0..2 {
        rig.service.press(Button::Add);
    }
    assert_eq!(rig.counts(), [6, 10, 10]);
    assert!(!rig.store.snapshot().rooms[0].warning_active);
    assert!(!rig.indicators.led_on(Led::Warning(0)));
}

#[test]
fn remove_six_then_add_two_through_updates() {
    let rig = Rig::new(10);
    rig.service.enter(0).unwrap();

    for _ in 0..6 {
        rig.service.update(UpdateRequest::new(0, UpdateAction::Remove)).unwrap();
    }
    let room = rig.store.snapshot().rooms[0];
    assert_eq!(room.count, 4);
    assert!(room.warning_active);
    assert!(rig.indicators.led_on(Led::Warning(0)));

    let mut last = room;
    for _ in 0..2 {
        last = rig.service.update(UpdateRequest::new(0, UpdateAction::Add)).unwrap();
    }
    assert_eq!(last.count, 6);
    assert!(!last.warning_active);
    assert!(!rig.indicators.led_on(Led::Warning(0)));
    assert_eq!(rig.counts(), [6, 10, 10]);
}

#[test]
fn set_out_of_range_is_ignored() {
    let rig = Rig::new(10);
    let room = rig
        .service
        .update(UpdateRequest::new(1, UpdateAction::Set(150)))
        .unwrap();
    assert_eq!(room.count, 10);
    assert_eq!(rig.counts(), [10, 10, 10]);
    assert!(rig.events.all().iter().any(|e| matches!(
        e,
        AppEvent::UpdateIgnored {
            room: 1,
            reason: "quantity out of range"
        }
    )));
}

#[test]
fn set_in_range_applies_and_logs_change() {
    let rig = Rig::new(10);
    rig.service
        .update(UpdateRequest::from_form(2, "set", Some("3")))
        .unwrap();
    assert_eq!(rig.counts(), [10, 10, 3]);
    assert!(rig.events.all().contains(&AppEvent::LowStockChanged {
        room: 2,
        low_stock: true
    }));
    assert!(rig.events.all().contains(&AppEvent::CountChanged {
        room: 2,
        count: 3,
        low_stock: true
    }));
}

#[test]
fn entering_a_second_room_clears_the_first() {
    let rig = Rig::new(10);
    rig.service.enter(0).unwrap();
    rig.indicators.clear();
    rig.service.enter(1).unwrap();

    let history = rig.indicators.history();
    let lit_b = history
        .iter()
        .position(|c| *c == IndicatorCall::Led(Led::Room(1), true))
        .expect("room 1 LED lit");
    let dark_a = history
        .iter()
        .position(|c| *c == IndicatorCall::Led(Led::Room(0), false))
        .expect("room 0 LED cleared");
    assert!(dark_a < lit_b, "old LED must go low before new goes high");

    assert!(!rig.indicators.led_on(Led::Room(0)));
    assert!(rig.indicators.led_on(Led::Room(1)));
    assert_eq!(rig.store.snapshot().active_room, Some(1));
}

#[test]
fn entering_the_active_room_again_is_noop() {
    let rig = Rig::new(10);
    rig.service.enter(2).unwrap();
    rig.indicators.clear();
    rig.service.enter(2).unwrap();
    assert!(rig.indicators.history().is_empty());
}

#[test]
fn unknown_room_surfaces_as_error() {
    let rig = Rig::new(10);
    assert!(matches!(rig.service.enter(3), Err(Error::UnknownRoom(3))));
    assert!(matches!(rig.service.leave(3), Err(Error::UnknownRoom(3))));
    assert!(matches!(
        rig.service.update(UpdateRequest::from_form(8, "add", None)),
        Err(Error::UnknownRoom(8))
    ));
}

#[test]
fn adds_clamp_at_ceiling() {
    let rig = Rig::new(97);
    rig.service.enter(0).unwrap();
    for _ in 0..10 {
        rig.service.press(Button::Add);
    }
    assert_eq!(rig.counts()[0], 99);
}

#[test]
fn concurrent_updates_and_presses_are_not_lost() {
    let rig = Rig::new(0);
    rig.service.enter(0).unwrap();

    let mut workers = Vec::new();
    for _ in 0..3 {
        let svc = Arc::clone(&rig.service);
        workers.push(std::thread::spawn(move || {
            for _ in 0..15 {
                svc.update(UpdateRequest::new(0, UpdateAction::Add)).unwrap();
            }
        }));
    }
    let svc = Arc::clone(&rig.service);
    workers.push(std::thread::spawn(move || {
        for _ in 0..15 {
            svc.press(Button::Add);
        }
    }));
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(rig.counts()[0], 60);
    let changes = rig
        .events
        .all()
        .iter()
        .filter(|e| matches!(e, AppEvent::CountChanged { room: 0, .. }))
        .count();
    assert_eq!(changes, 60);
}

/// Run `updates` from three threads and `presses` from a fourth against
/// room 0, then check the recorded count changes replay as one serial
/// sequence of unit steps from `initial`.  Returns (ups, downs, final).
fn hammer_room_zero(
    initial: u8,
    update: UpdateAction,
    press: Button,
    updates_per_thread: usize,
    presses: usize,
) -> (usize, usize, u8) {
    let rig = Rig::new(initial);
    rig.service.enter(0).unwrap();

    let mut workers = Vec::new();
    for _ in 0..3 {
        let svc = Arc::clone(&rig.service);
        workers.push(std::thread::spawn(move || {
            for _ in 0..updates_per_thread {
                svc.update(UpdateRequest::new(0, update)).unwrap();
            }
        }));
    }
    let svc = Arc::clone(&rig.service);
    workers.push(std::thread::spawn(move || {
        for _ in 0..presses {
            assert!(svc.press(press).is_some());
        }
    }));
    for w in workers {
        w.join().unwrap();
    }

    let (mut ups, mut downs, mut at) = (0, 0, initial);
    for event in rig.events.all() {
        if let AppEvent::CountChanged { room: 0, count, low_stock } = event {
            assert_eq!(low_stock, count <= 5);
            match i16::from(count) - i16::from(at) {
                1 => ups += 1,
                -1 => downs += 1,
                step => panic!("count moved by {step} in one change"),
            }
            at = count;
        }
    }
    let last = rig.counts()[0];
    assert_eq!(last, at, "store disagrees with the change log");
    (ups, downs, last)
}

#[test]
fn concurrent_traffic_clamped_at_zero_is_serialisable() {
    // 45 removes race 10 adds from 2: adds can never clamp, so all ten
    // must appear, and every remove either stepped down or hit zero.
    let (ups, downs, last) = hammer_room_zero(2, UpdateAction::Remove, Button::Add, 15, 10);
    assert_eq!(ups, 10);
    assert!(downs <= 45);
    assert_eq!(usize::from(last), 2 + ups - downs);
    assert!(last <= 12);
}

#[test]
fn concurrent_traffic_clamped_at_ceiling_is_serialisable() {
    let (ups, downs, last) = hammer_room_zero(97, UpdateAction::Add, Button::Remove, 15, 10);
    assert_eq!(downs, 10);
    assert!(ups <= 45);
    assert_eq!(usize::from(last), 97 + ups - downs);
    assert!(last >= 87);
}

#[test]
fn press_at_the_floor_still_refreshes_and_pushes() {
    let (tx, rx) = mirror_mailbox();
    let rig = Rig::with_mirror(0, Some(tx));
    rig.service.enter(1).unwrap();
    rig.indicators.clear();

    let change = rig.service.press(Button::Remove).expect("room 1 is active");
    assert!(!change.changed());
    assert_eq!(
        rig.indicators.history(),
        [IndicatorCall::Led(Led::Warning(1), true)]
    );
    let pushed = rx.take_within(Duration::from_millis(20)).expect("snapshot queued");
    assert_eq!(pushed.rooms[1].count, 0);
    assert!(!rig
        .events
        .all()
        .iter()
        .any(|e| matches!(e, AppEvent::CountChanged { .. })));
}

#[test]
fn mutations_reach_the_mirror() {
    let (tx, rx) = mirror_mailbox();
    let mirror = RecordingMirror::failing(1);
    let stop = ShutdownSignal::new();
    let worker = {
        let mirror = mirror.clone();
        let stop = stop.clone();
        std::thread::spawn(move || run_mirror_worker(mirror, rx, 4, stop))
    };

    let rig = Rig::with_mirror(10, Some(tx));
    assert!(rig.service.mirror_enabled());
    rig.service
        .update(UpdateRequest::new(2, UpdateAction::Set(4)))
        .unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while mirror.last().is_none() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    stop.raise();
    worker.join().unwrap();

    let pushed = mirror.last().expect("snapshot pushed after retry");
    assert_eq!(pushed.rooms[2].count, 4);
    assert!(pushed.rooms[2].warning_active);
}

#[test]
fn ignored_update_does_not_push() {
    let (tx, rx) = mirror_mailbox();
    let rig = Rig::with_mirror(10, Some(tx));
    rig.service
        .update(UpdateRequest::from_form(0, "launch", None))
        .unwrap();
    assert!(rx.take_within(Duration::from_millis(20)).is_none());

    rig.service.update(UpdateRequest::new(0, UpdateAction::Add)).unwrap();
    assert_eq!(rx.take_within(Duration::from_millis(20)).unwrap().rooms[0].count, 11);
}

#[test]
fn shutdown_quiesces_outputs() {
    let rig = Rig::new(2);
    rig.service.enter(1).unwrap();
    rig.service.shutdown();
    assert_eq!(rig.indicators.history().last(), Some(&IndicatorCall::AllOff));
    assert!(!rig.indicators.led_on(Led::Room(1)));
    assert!(!rig.indicators.led_on(Led::Warning(1)));
}
