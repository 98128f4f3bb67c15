//! Integration tests for the daemon core: the pieces the threads run,
//! driven by hand with a backlight another agent can change.

use super::mock_hw::{FixedSensor, MemoryHistory, NOON, RecordingSink, SharedPanel, test_config, test_service};

use beelight::adapters::hardware::HardwareAdapter;
use beelight::adapters::tracked::TrackedBacklight;
use beelight::app::commands::{Command, Response};
use beelight::app::external::{ExternalChange, ExternalChanges};
use beelight::app::service::CycleOutcome;
use beelight::config::SystemConfig;
use beelight::daemon::Core;

type TestCore = Core<HardwareAdapter<FixedSensor, TrackedBacklight<SharedPanel>>, MemoryHistory, RecordingSink>;

fn core(config: &SystemConfig, panel: &SharedPanel) -> (TestCore, TrackedBacklight<SharedPanel>) {
    let backlight = TrackedBacklight::new(panel.clone());
    let watched = backlight.clone();
    let hw = HardwareAdapter::new(FixedSensor(300), backlight);
    let core = Core::new(
        test_service(config),
        hw,
        MemoryHistory::new(),
        RecordingSink::new(),
        NOON,
    );
    (core, watched)
}

#[test]
fn foreign_change_is_learned_and_left_standing_in_manual_mode() {
    let panel = SharedPanel::new(5000);
    let config = SystemConfig {
        start_in_auto: false,
        ..test_config()
    };
    let (mut core, watched) = core(&config, &panel);
    let queue = ExternalChanges::new(4);

    assert_eq!(watched.poll_external().unwrap(), None);
    panel.set_by_other_agent(5040);
    let raw = watched.poll_external().unwrap().unwrap();
    assert_eq!(raw, 5040);
    assert!(queue.notify(ExternalChange {
        raw,
        observed_at: NOON + 5,
    }));

    let outcome = core.tick(NOON + 10, &queue).unwrap();

    assert_eq!(outcome, CycleOutcome::Disabled);
    assert!(queue.is_empty());
    assert_eq!(core.service.model().sample_count(), 1);
    assert_eq!(core.store.points.len(), 1);
    assert_eq!(panel.get(), 5040);
}

#[test]
fn own_ramp_is_not_reported_as_external() {
    let panel = SharedPanel::new(0);
    let (mut core, watched) = core(&test_config(), &panel);
    let queue = ExternalChanges::new(4);

    assert_eq!(watched.poll_external().unwrap(), None);
    let outcome = core.tick(NOON, &queue).unwrap();
    let CycleOutcome::Adjusted { to, .. } = outcome else {
        panic!("expected an adjustment, got {outcome:?}");
    };
    assert_eq!(panel.get(), to);
    assert_eq!(watched.poll_external().unwrap(), None);
}

#[test]
fn maintenance_runs_on_its_interval() {
    let panel = SharedPanel::new(0);
    let (mut core, _) = core(&test_config(), &panel);
    assert_eq!(core.maintain(NOON + 10, 3600), None);
    assert_eq!(core.maintain(NOON + 3600, 3600), Some(0));
    assert_eq!(core.maintain(NOON + 3700, 3600), None);
}

#[test]
fn commands_go_through_the_core() {
    let panel = SharedPanel::new(6000);
    let (mut core, watched) = core(&test_config(), &panel);
    watched.poll_external().unwrap();

    assert_eq!(
        core.handle(Command::GetBrightness, NOON),
        Response::Brightness { percent: 25.0 }
    );
    assert_eq!(
        core.handle(Command::SetBrightness { percent: 50.0 }, NOON),
        Response::Ok
    );
    assert_eq!(panel.get(), 12_000);
    // a command write is ours, not an external change
    assert_eq!(watched.poll_external().unwrap(), None);
}
