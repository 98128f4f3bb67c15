//! Integration tests for the BrightnessService decision loop.
//!
//! Sensor → model → hysteresis → ramp → history, end to end against the
//! recording mocks.

use super::mock_hw::{MemoryHistory, MockHardware, NOON, RecordingSink, test_config, test_service};

use beelight::app::commands::{Command, Response, Stats};
use beelight::app::events::{AdjustSource, AppEvent};
use beelight::app::external::{ExternalChange, ExternalChanges};
use beelight::app::service::CycleOutcome;
use beelight::config::SystemConfig;
use beelight::error::{Error, TransitionError};
use beelight::model::{DataPoint, RETENTION_SECS, TrainOutcome};

fn manual_config() -> SystemConfig {
    SystemConfig {
        start_in_auto: false,
        ..test_config()
    }
}

// ── Automatic cycle ───────────────────────────────────────────

#[test]
fn untrained_cycle_ramps_to_closed_form_target_and_records_it() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(500, 0);
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    let outcome = svc
        .automatic_cycle(NOON, &mut hw, &mut store, &mut sink)
        .unwrap();

    let CycleOutcome::Adjusted { ambient, from, to, steps } = outcome else {
        panic!("expected an adjustment, got {outcome:?}");
    };
    assert_eq!((ambient, from), (500, 0));
    assert!(to > 0);
    assert_eq!(steps, hw.writes.len());
    assert_eq!(hw.last_write(), Some(to));
    assert_eq!(store.points, vec![DataPoint::automatic(NOON, 500, to)]);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::Adjusted {
                source: AdjustSource::Automatic,
                ..
            }
        )),
        1
    );
    // automatic cycles never count as user activity
    assert_eq!(svc.state().last_activity_time, NOON);
    // and never train the model
    assert_eq!(svc.model().sample_count(), 0);
}

#[test]
fn converged_prediction_is_held_without_writes() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(500, 0);
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    // the smoothing ring fills over three cycles
    for _ in 0..3 {
        let outcome = svc
            .automatic_cycle(NOON, &mut hw, &mut store, &mut sink)
            .unwrap();
        assert!(matches!(outcome, CycleOutcome::Adjusted { .. }));
    }
    let writes = hw.writes.len();

    let outcome = svc
        .automatic_cycle(NOON, &mut hw, &mut store, &mut sink)
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Held { .. }), "{outcome:?}");
    assert_eq!(hw.writes.len(), writes);
    assert_eq!(store.points.len(), 3);
}

#[test]
fn manual_mode_cycle_touches_nothing() {
    let mut svc = test_service(&manual_config());
    let mut hw = MockHardware::new(500, 0);
    hw.fail_sensor = true;
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    let outcome = svc
        .automatic_cycle(NOON, &mut hw, &mut store, &mut sink)
        .unwrap();
    assert_eq!(outcome, CycleOutcome::Disabled);
    assert_eq!(hw.sensor_reads, 0);
    assert!(hw.writes.is_empty());
}

#[test]
fn sensor_failure_aborts_cycle_without_side_effects() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(500, 0);
    hw.fail_sensor = true;
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    let err = svc
        .automatic_cycle(NOON, &mut hw, &mut store, &mut sink)
        .unwrap_err();
    assert!(matches!(err, Error::Sensor(_)));
    assert!(hw.writes.is_empty());
    assert!(store.points.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn backlight_read_failure_aborts_cycle() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(500, 0);
    hw.fail_backlight_read = true;
    let err = svc
        .automatic_cycle(NOON, &mut hw, &mut MemoryHistory::new(), &mut RecordingSink::new())
        .unwrap_err();
    assert!(matches!(err, Error::Actuator(_)));
    assert!(hw.writes.is_empty());
}

// ── Manual adjustment ─────────────────────────────────────────

#[test]
fn manual_adjustment_clamps_applies_and_trains() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    let written = svc
        .manual_adjustment(99_999, NOON + 60, &mut hw, &mut store, &mut sink)
        .unwrap();

    assert_eq!(written, 24_000);
    assert_eq!(hw.last_write(), Some(24_000));
    assert_eq!(svc.state().last_activity_time, NOON + 60);
    assert_eq!(store.points, vec![DataPoint::manual(NOON + 60, 300, 24_000)]);
    assert_eq!(svc.model().bins()[1].len(), 1);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::Adjusted {
                source: AdjustSource::Manual,
                to_raw: 24_000,
                ..
            }
        )),
        1
    );
}

#[test]
fn manual_adjustment_bypasses_hysteresis() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    svc.manual_adjustment(5010, NOON, &mut hw, &mut MemoryHistory::new(), &mut RecordingSink::new())
        .unwrap();
    assert_eq!(hw.last_write(), Some(5010));
}

#[test]
fn failed_ramp_leaves_model_and_history_untouched() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    hw.fail_write_at = Some(2);
    let mut store = MemoryHistory::new();

    let err = svc
        .manual_adjustment(20_000, NOON + 60, &mut hw, &mut store, &mut RecordingSink::new())
        .unwrap_err();

    match err {
        Error::Transition(TransitionError::Aborted {
            steps_written,
            last_written,
            ..
        }) => {
            assert_eq!(steps_written, 2);
            assert_eq!(last_written, hw.last_write());
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(hw.writes.len(), 2);
    assert!(store.points.is_empty());
    assert_eq!(svc.model().sample_count(), 0);
    assert_eq!(svc.state().last_activity_time, NOON);
}

#[test]
fn history_failure_does_not_fail_adjustment() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    let mut store = MemoryHistory::new();
    store.fail_append = true;

    let written = svc
        .manual_adjustment(6000, NOON, &mut hw, &mut store, &mut RecordingSink::new())
        .unwrap();
    assert_eq!(written, 6000);
    assert_eq!(svc.model().sample_count(), 1);
}

// ── External changes ──────────────────────────────────────────

#[test]
fn external_change_trains_without_actuating() {
    let mut svc = test_service(&test_config());
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    let outcome = svc.external_change_observed(9000, 300, NOON + 100, &mut store, &mut sink);

    assert_eq!(outcome, TrainOutcome::Accepted { bin: 1 });
    assert_eq!(svc.state().last_activity_time, NOON + 100);
    assert_eq!(store.points, vec![DataPoint::manual(NOON + 100, 300, 9000)]);
    assert_eq!(
        sink.events,
        vec![AppEvent::ExternalChange {
            raw: 9000,
            ambient: 300
        }]
    );
}

#[test]
fn drain_reads_ambient_once_and_empties_queue() {
    let mut svc = test_service(&manual_config());
    let mut hw = MockHardware::new(300, 5000);
    let queue = ExternalChanges::new(8);
    queue.notify(ExternalChange {
        raw: 5000,
        observed_at: NOON + 10,
    });
    queue.notify(ExternalChange {
        raw: 5050,
        observed_at: NOON + 20,
    });

    let n = svc
        .drain_external_changes(&queue, &mut hw, &mut MemoryHistory::new(), &mut RecordingSink::new())
        .unwrap();

    assert_eq!(n, 2);
    assert!(queue.is_empty());
    assert_eq!(hw.sensor_reads, 1);
    assert!(hw.writes.is_empty());
    assert_eq!(svc.model().sample_count(), 2);
    assert_eq!(svc.state().last_activity_time, NOON + 20);
}

#[test]
fn drain_keeps_queue_when_sensor_fails() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    hw.fail_sensor = true;
    let queue = ExternalChanges::new(8);
    queue.notify(ExternalChange {
        raw: 5000,
        observed_at: NOON,
    });

    assert!(
        svc.drain_external_changes(&queue, &mut hw, &mut MemoryHistory::new(), &mut RecordingSink::new())
            .is_err()
    );
    assert_eq!(queue.len(), 1);
    assert_eq!(svc.model().sample_count(), 0);
}

#[test]
fn empty_queue_skips_sensor() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    let n = svc
        .drain_external_changes(
            &ExternalChanges::new(2),
            &mut hw,
            &mut MemoryHistory::new(),
            &mut RecordingSink::new(),
        )
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(hw.sensor_reads, 0);
}

#[test]
fn external_value_stands_in_manual_mode() {
    let mut svc = test_service(&manual_config());
    let mut hw = MockHardware::new(300, 7000);
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    svc.external_change_observed(7000, 300, NOON, &mut store, &mut sink);
    let outcome = svc
        .automatic_cycle(NOON + 3, &mut hw, &mut store, &mut sink)
        .unwrap();
    assert_eq!(outcome, CycleOutcome::Disabled);
    assert_eq!(hw.level, 7000);
    assert!(hw.writes.is_empty());
}

// ── Mode switching ────────────────────────────────────────────

#[test]
fn entering_auto_runs_one_cycle() {
    let mut svc = test_service(&manual_config());
    let mut hw = MockHardware::new(500, 0);
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    assert!(svc.set_auto_mode(true, NOON, &mut hw, &mut store, &mut sink));
    assert!(svc.auto_mode());
    assert!(!hw.writes.is_empty());
    assert!(sink.events.contains(&AppEvent::ModeChanged { auto_mode: true }));

    let writes = hw.writes.len();
    assert!(!svc.set_auto_mode(false, NOON, &mut hw, &mut store, &mut sink));
    assert_eq!(hw.writes.len(), writes);

    assert!(svc.toggle_auto(NOON, &mut hw, &mut store, &mut sink));
}

#[test]
fn setting_same_mode_is_a_no_op() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(500, 0);
    let mut sink = RecordingSink::new();
    assert!(svc.set_auto_mode(true, NOON, &mut hw, &mut MemoryHistory::new(), &mut sink));
    assert!(sink.events.is_empty());
    assert!(hw.writes.is_empty());
}

#[test]
fn failed_initial_cycle_keeps_auto_mode() {
    let mut svc = test_service(&manual_config());
    let mut hw = MockHardware::new(500, 0);
    hw.fail_sensor = true;

    let enabled = svc.set_auto_mode(true, NOON, &mut hw, &mut MemoryHistory::new(), &mut RecordingSink::new());
    assert!(enabled);
    assert!(svc.auto_mode());
    assert!(hw.writes.is_empty());
}

// ── Command surface ───────────────────────────────────────────

#[test]
fn commands_map_to_operations() {
    let mut svc = test_service(&manual_config());
    let mut hw = MockHardware::new(300, 12_000);
    let mut store = MemoryHistory::new();
    let mut sink = RecordingSink::new();

    let r = svc.handle_command(Command::GetBrightness, NOON, &mut hw, &mut store, &mut sink);
    assert_eq!(r, Response::Brightness { percent: 50.0 });

    let r = svc.handle_command(Command::GetStats, NOON, &mut hw, &mut store, &mut sink);
    assert_eq!(
        r,
        Response::Stats(Stats {
            ambient: 300,
            brightness_percent: 50.0,
            auto_mode: false,
        })
    );

    let r = svc.handle_command(
        Command::SetBrightness { percent: 25.0 },
        NOON,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(r, Response::Ok);
    assert_eq!(hw.level, 6000);

    let r = svc.handle_command(
        Command::SetAuto { enabled: false },
        NOON,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(r, Response::AutoMode { enabled: false });
}

#[test]
fn command_errors_become_error_responses() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 12_000);
    hw.fail_sensor = true;

    let r = svc.handle_command(
        Command::SetBrightness { percent: 80.0 },
        NOON,
        &mut hw,
        &mut MemoryHistory::new(),
        &mut RecordingSink::new(),
    );
    let Response::Error { message } = r else {
        panic!("expected an error response, got {r:?}");
    };
    assert!(message.contains("sensor"));
    assert!(hw.writes.is_empty());
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn seed_and_start_report_history() {
    let mut svc = test_service(&test_config());
    let store = MemoryHistory::with_points(vec![
        DataPoint::manual(NOON - 100, 300, 6000),
        DataPoint::automatic(NOON - 50, 300, 9000),
        DataPoint::manual(NOON - 10, 320, 6040),
    ]);
    let mut sink = RecordingSink::new();

    let seeded = svc.seed(&store, NOON).unwrap();
    svc.start(seeded, &mut sink);

    assert_eq!(seeded, 2);
    assert_eq!(
        sink.events,
        vec![AppEvent::Started {
            auto_mode: true,
            seeded_points: 2
        }]
    );
}

#[test]
fn maintenance_prunes_expired_samples() {
    let mut svc = test_service(&test_config());
    let mut hw = MockHardware::new(300, 5000);
    let mut sink = RecordingSink::new();
    svc.manual_adjustment(6000, NOON, &mut hw, &mut MemoryHistory::new(), &mut sink)
        .unwrap();
    sink.events.clear();

    assert_eq!(svc.maintenance(NOON + RETENTION_SECS, &mut sink), 0);
    assert!(sink.events.is_empty());
    assert_eq!(svc.maintenance(NOON + RETENTION_SECS + 1, &mut sink), 1);
    assert_eq!(sink.events, vec![AppEvent::Pruned { removed: 1 }]);
}
