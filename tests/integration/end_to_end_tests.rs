//! Real driver + control loop over a simulated HC-SR04 wire.

use embedded_hal::digital::PinState::{High, Low};
use rangelight::adapters::hardware::HardwareAdapter;
use rangelight::app::events::AppEvent;
use rangelight::app::ports::PinDirection;
use rangelight::app::service::{ControlLoop, OutputState};
use rangelight::config::RangerConfig;
use rangelight::error::{EchoEdge, SensorError};
use rangelight::pins::{ECHO_GPIO, LED_GPIO, TRIGGER_GPIO};
use rangelight::sensors::ultrasonic::DistanceSensor;
use rangelight::shutdown::StopToken;

use crate::mock_hw::{
    Echo, EchoPins, PinCall, RecordingSink, Timeline, VirtualClock, cleanup_count, writes_to,
};

fn precise_config() -> RangerConfig {
    RangerConfig {
        echo_poll_us: 1,
        ..RangerConfig::default()
    }
}

fn board(
    config: &RangerConfig,
    script: impl IntoIterator<Item = Echo>,
    stop: &StopToken,
) -> (Timeline, HardwareAdapter<EchoPins, VirtualClock>) {
    let now = Timeline::default();
    let pins = EchoPins::new(now.clone(), TRIGGER_GPIO, ECHO_GPIO, script, stop.clone());
    let hw = HardwareAdapter::new(pins, VirtualClock(now.clone()), DistanceSensor::new(config));
    (now, hw)
}

#[test]
fn measured_distances_drive_the_led() {
    let config = precise_config();
    let stop = StopToken::new();
    let (_, mut hw) = board(
        &config,
        [
            Echo::for_distance(5.0),
            Echo::for_distance(20.0),
            Echo::for_distance(9.0),
            Echo::for_distance(11.0),
        ],
        &stop,
    );
    let mut sink = RecordingSink::new();

    let stats = ControlLoop::new(&config).run(&mut hw, &stop, &mut sink).unwrap();
    assert_eq!(stats.iterations, 4);

    let samples: Vec<(f32, OutputState)> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Sample {
                distance_cm,
                output,
            } => Some((*distance_cm, *output)),
            _ => None,
        })
        .collect();
    let expected = [5.0, 20.0, 9.0, 11.0];
    assert_eq!(samples.len(), expected.len());
    for ((got, _), want) in samples.iter().zip(expected) {
        assert!((got - want).abs() < 0.1, "measured {got}, expected {want}");
    }

    let (pins, _) = hw.into_parts();
    assert_eq!(
        writes_to(&pins.calls, LED_GPIO),
        vec![Low, High, Low, High, Low, Low]
    );
}

#[test]
fn missing_and_stuck_echoes_fail_without_stopping_the_loop() {
    let config = precise_config();
    let stop = StopToken::new();
    let (_, mut hw) = board(
        &config,
        [Echo::Silent, Echo::Stuck, Echo::for_distance(4.0)],
        &stop,
    );
    let mut sink = RecordingSink::new();

    let stats = ControlLoop::new(&config).run(&mut hw, &stop, &mut sink).unwrap();

    assert_eq!(stats.iterations, 3);
    assert_eq!(stats.failures, 2);
    let failures: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::MeasurementFailed { error, .. } => Some(*error),
            _ => None,
        })
        .collect();
    assert_eq!(
        failures,
        vec![
            SensorError::MeasurementTimeout {
                edge: EchoEdge::Rising
            },
            SensorError::MeasurementTimeout {
                edge: EchoEdge::Falling
            },
        ]
    );
    assert_eq!(hw.into_parts().0.triggers(), 3);
}

#[test]
fn echo_timeouts_are_bounded() {
    let config = precise_config();
    let stop = StopToken::new();
    let (now, mut hw) = board(&config, [Echo::Silent, Echo::Stuck], &stop);

    ControlLoop::new(&config)
        .run(&mut hw, &stop, &mut RecordingSink::new())
        .unwrap();

    // Two sleeps plus at most ~one timeout window per iteration (the stuck
    // echo spends one latency gap before the falling-edge wait starts).
    let elapsed_us = now.get() / 1_000;
    let budget_us = 2 * 500_000 + 2 * u64::from(config.echo_timeout_us) + 1_000;
    assert!(elapsed_us <= budget_us, "took {elapsed_us} us");
}

#[test]
fn pins_are_configured_then_released() {
    let config = RangerConfig::default();
    let stop = StopToken::new();
    let (_, mut hw) = board(&config, [Echo::for_distance(30.0)], &stop);

    ControlLoop::new(&config)
        .run(&mut hw, &stop, &mut RecordingSink::new())
        .unwrap();

    let (pins, _) = hw.into_parts();
    let setups: Vec<_> = pins
        .calls
        .iter()
        .filter(|c| matches!(c, PinCall::Setup { .. }))
        .cloned()
        .collect();
    assert_eq!(
        setups,
        vec![
            PinCall::Setup {
                pin: TRIGGER_GPIO,
                direction: PinDirection::Output
            },
            PinCall::Setup {
                pin: ECHO_GPIO,
                direction: PinDirection::Input
            },
            PinCall::Setup {
                pin: LED_GPIO,
                direction: PinDirection::Output
            },
        ]
    );
    assert_eq!(cleanup_count(&pins.calls), 1);
    assert_eq!(pins.calls.last(), Some(&PinCall::Cleanup));
}
