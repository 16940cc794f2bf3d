//! Control loop against scripted measurements: decisions, failure policy,
//! stop handling and cleanup.

use std::panic::{AssertUnwindSafe, catch_unwind};

use embedded_hal::digital::PinState::{High, Low};
use rangelight::app::events::AppEvent;
use rangelight::app::ports::PinDirection;
use rangelight::app::service::{ControlLoop, OutputState};
use rangelight::config::{FailurePolicy, RangerConfig};
use rangelight::error::{EchoEdge, Error, PinError};
use rangelight::pins::LED_GPIO;
use rangelight::shutdown::StopToken;

use crate::mock_hw::{
    PinCall, RecordingSink, ScriptedHw, at, cleanup_count, timeout, writes_to,
};

fn config(policy: FailurePolicy) -> RangerConfig {
    RangerConfig {
        failure_policy: policy,
        ..RangerConfig::default()
    }
}

#[test]
fn threshold_scenario_drives_led_sequence() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(5.0), at(20.0), at(9.0), at(10.0), at(11.0)], stop.clone());
    let mut sink = RecordingSink::new();
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let stats = ctl.run(&mut hw, &stop, &mut sink).unwrap();

    assert_eq!(stats.iterations, 5);
    assert_eq!(stats.asserted, 2);
    // start (low), five decisions, cleanup (low)
    assert_eq!(
        writes_to(&hw.calls, LED_GPIO),
        vec![Low, High, Low, High, Low, Low, Low]
    );

    let outputs: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Sample { output, .. } => Some(*output),
            _ => None,
        })
        .collect();
    use OutputState::{Asserted as A, Deasserted as D};
    assert_eq!(outputs, vec![A, D, A, D, D]);
}

#[test]
fn start_configures_sensor_and_led_before_sampling() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(50.0)], stop.clone());
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    ctl.run(&mut hw, &stop, &mut RecordingSink::new()).unwrap();

    assert!(hw.sensor_initialised);
    assert_eq!(
        hw.calls[0],
        PinCall::Setup {
            pin: LED_GPIO,
            direction: PinDirection::Output
        }
    );
    assert_eq!(
        hw.calls[1],
        PinCall::Write {
            pin: LED_GPIO,
            level: Low
        }
    );
}

#[test]
fn timeout_treated_as_far_deasserts_and_continues() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new(
        [at(3.0), timeout(EchoEdge::Rising), at(3.0)],
        stop.clone(),
    );
    let mut sink = RecordingSink::new();
    let mut ctl = ControlLoop::new(&config(FailurePolicy::TreatAsFar));

    let stats = ctl.run(&mut hw, &stop, &mut sink).unwrap();

    assert_eq!(stats.iterations, 3);
    assert_eq!(stats.failures, 1);
    assert_eq!(
        writes_to(&hw.calls, LED_GPIO),
        vec![Low, High, Low, High, Low]
    );
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::MeasurementFailed {
            output: OutputState::Deasserted,
            ..
        }
    )));
}

#[test]
fn timeout_with_hold_previous_keeps_last_output() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new(
        [
            at(3.0),
            timeout(EchoEdge::Falling),
            at(30.0),
            timeout(EchoEdge::Rising),
        ],
        stop.clone(),
    );
    let mut ctl = ControlLoop::new(&config(FailurePolicy::HoldPrevious));

    ctl.run(&mut hw, &stop, &mut RecordingSink::new()).unwrap();

    // Held outputs are still written every iteration.
    assert_eq!(
        writes_to(&hw.calls, LED_GPIO),
        vec![Low, High, High, Low, Low, Low]
    );
}

#[test]
fn stop_before_first_iteration_cleans_up_once() {
    let stop = StopToken::new();
    stop.request_stop();
    let mut hw = ScriptedHw::new([at(1.0)], stop.clone());
    let mut sink = RecordingSink::new();
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let stats = ctl.run(&mut hw, &stop, &mut sink).unwrap();

    assert_eq!(stats.iterations, 0);
    assert_eq!(hw.measurements(), 0);
    assert_eq!(cleanup_count(&hw.calls), 1);
    assert_eq!(hw.calls.last(), Some(&PinCall::Cleanup));
}

#[test]
fn stop_during_sleep_ends_after_that_iteration() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(1.0), at(1.0), at(1.0), at(1.0)], stop.clone());
    hw.stop_after_measurements = None;
    hw.stop_during_sleep = Some(2);
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let stats = ctl.run(&mut hw, &stop, &mut RecordingSink::new()).unwrap();

    assert_eq!(stats.iterations, 2);
    assert_eq!(cleanup_count(&hw.calls), 1);
    // Cleanup turns the LED off even though the last decision was "on".
    assert_eq!(writes_to(&hw.calls, LED_GPIO).last(), Some(&Low));
}

#[test]
fn iterations_are_paced_by_sample_interval() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(1.0), at(2.0), at(3.0)], stop.clone());
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    ctl.run(&mut hw, &stop, &mut RecordingSink::new()).unwrap();

    assert_eq!(hw.elapsed_ms(), 3 * 500);
}

#[test]
fn stop_event_carries_final_stats() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(4.0), timeout(EchoEdge::Rising)], stop.clone());
    let mut sink = RecordingSink::new();
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let stats = ctl.run(&mut hw, &stop, &mut sink).unwrap();

    assert!(matches!(sink.events.first(), Some(AppEvent::Started { .. })));
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped(stats)));
    assert_eq!(stats.samples, 1);
    assert_eq!(stats.failures, 1);
}

#[test]
fn pin_failure_at_startup_is_fatal_and_skips_loop() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(1.0)], stop.clone());
    hw.fail_setup_on = Some(LED_GPIO);
    let mut sink = RecordingSink::new();
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let err = ctl.run(&mut hw, &stop, &mut sink).unwrap_err();

    assert_eq!(err, Error::PinAccess(PinError::SetupFailed(LED_GPIO)));
    assert_eq!(hw.measurements(), 0);
    assert!(sink.events.is_empty());
    // The guard still releases whatever was configured.
    assert_eq!(cleanup_count(&hw.calls), 1);
}

#[test]
fn led_write_failures_do_not_stop_the_loop() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(1.0), at(50.0), at(1.0)], stop.clone());
    hw.fail_writes_after = Some(1); // only the startup write succeeds
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let stats = ctl.run(&mut hw, &stop, &mut RecordingSink::new()).unwrap();

    assert_eq!(stats.iterations, 3);
    assert_eq!(ctl.output(), OutputState::Asserted);
    assert_eq!(cleanup_count(&hw.calls), 1);
}

#[test]
fn panic_mid_loop_still_releases_pins_once() {
    let stop = StopToken::new();
    let mut hw = ScriptedHw::new([at(1.0)], stop.clone());
    hw.panic_on_measure = true;
    let mut ctl = ControlLoop::new(&RangerConfig::default());

    let result = catch_unwind(AssertUnwindSafe(|| {
        ctl.run(&mut hw, &stop, &mut RecordingSink::new())
    }));

    assert!(result.is_err());
    assert_eq!(cleanup_count(&hw.calls), 1);
    assert_eq!(writes_to(&hw.calls, LED_GPIO).last(), Some(&Low));
}
