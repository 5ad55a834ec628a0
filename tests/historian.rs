// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use fixtures::test_pid::{make_builder, DT};

use cyclic_pid::historian::{Channel, ChannelSet, HistorianConfig};
use cyclic_pid::pid::{ConfigError, PidController, PidMode};

#[test]
fn test_zero_capacity_is_rejected() {
    let config = make_builder().build().unwrap();
    let historian = HistorianConfig::new(Channel::Output).with_capacity(0);

    assert!(matches!(
        PidController::with_historian(config, historian),
        Err(ConfigError::InvalidHistorianCapacity)
    ));
}

#[test]
fn test_selected_channels_record_every_cycle() {
    let config = make_builder().kp(1.0).build().unwrap();
    let historian = HistorianConfig::new(Channel::Output | Channel::Error);
    let mut pid = PidController::with_historian(config, historian).unwrap();

    for sp in [1.0, 2.0, 3.0] {
        pid.compute(0.0, sp, DT).unwrap();
    }

    assert_eq!(pid.historian().len(), 3);
    assert_eq!(pid.historian().samples(Channel::Output), vec![1.0, 2.0, 3.0]);
    assert_eq!(pid.historian().samples(Channel::Error), vec![1.0, 2.0, 3.0]);

    // Unselected channels stay empty even while recording is active
    assert!(pid.historian().samples(Channel::Integral).is_empty());
    assert!(pid.historian().samples(Channel::Derivative).is_empty());
}

#[test]
fn test_ring_buffer_eviction_through_the_controller() {
    let config = make_builder().kp(1.0).build().unwrap();
    let historian = HistorianConfig::new(Channel::Output).with_capacity(3);
    let mut pid = PidController::with_historian(config, historian).unwrap();

    for sp in [1.0, 2.0, 3.0, 4.0, 5.0] {
        pid.compute(0.0, sp, DT).unwrap();
    }

    // Only the newest three samples survive, in arrival order
    assert_eq!(pid.historian().len(), 3);
    assert_eq!(pid.historian().samples(Channel::Output), vec![3.0, 4.0, 5.0]);
    assert_eq!(pid.historian().capacity(), 3);
}

#[test]
fn test_time_channel_is_cumulative_elapsed_time() {
    let config = make_builder().kp(1.0).build().unwrap();
    let historian = HistorianConfig::new(Channel::Output);
    let mut pid = PidController::with_historian(config, historian).unwrap();

    // The first cycle's elapsed time is forced to zero, so the time channel
    // starts at zero and climbs by DT per cycle thereafter
    for _ in 0..4 {
        pid.compute(0.0, 1.0, DT).unwrap();
    }

    assert_eq!(pid.historian().time(), vec![0.0, DT, 2.0 * DT, 3.0 * DT]);
}

#[test]
fn test_time_tracks_eviction() {
    let config = make_builder().kp(1.0).build().unwrap();
    let historian = HistorianConfig::new(Channel::Output).with_capacity(2);
    let mut pid = PidController::with_historian(config, historian).unwrap();

    for _ in 0..4 {
        pid.compute(0.0, 1.0, DT).unwrap();
    }

    // The time channel evicts in lockstep with the sample channels
    assert_eq!(pid.historian().time(), vec![2.0 * DT, 3.0 * DT]);
}

#[test]
fn test_setpoint_channel_records_the_raw_setpoint() {
    let config = make_builder().kp(1.0).setpoint_ramp(10.0).build().unwrap();
    let historian = HistorianConfig::new(Channel::Setpoint | Channel::Output);
    let mut pid = PidController::with_historian(config, historian).unwrap();

    pid.compute(0.0, 0.0, 0.0).unwrap();
    pid.compute(0.0, 10.0, 0.1).unwrap();
    pid.compute(0.0, 10.0, 0.1).unwrap();

    // The output follows the ramped setpoint; the historian records the raw
    // operator request so the trend shows what was asked for
    assert_eq!(pid.historian().samples(Channel::Setpoint), vec![0.0, 10.0, 10.0]);
    assert_eq!(pid.historian().samples(Channel::Output), vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_manual_cycles_record_zero_terms() {
    let config = make_builder().kp(1.0).ki(0.5).build().unwrap();
    let historian = HistorianConfig::new(ChannelSet::ALL);
    let mut pid = PidController::with_historian(config, historian).unwrap();

    pid.compute(1.0, 3.0, 0.0).unwrap();

    pid.set_mode(PidMode::Manual);
    pid.set_manual_value(2.0);
    pid.compute(1.0, 3.0, DT).unwrap();

    // The manual cycle has no P, D or error; the inputs and the applied
    // command are still recorded
    assert_eq!(pid.historian().samples(Channel::Proportional), vec![2.0, 0.0]);
    assert_eq!(pid.historian().samples(Channel::Derivative), vec![0.0, 0.0]);
    assert_eq!(pid.historian().samples(Channel::Error), vec![2.0, 0.0]);
    assert_eq!(pid.historian().samples(Channel::Output), vec![2.0, 2.0]);
    assert_eq!(pid.historian().samples(Channel::Setpoint), vec![3.0, 3.0]);
    assert_eq!(pid.historian().samples(Channel::ProcessValue), vec![1.0, 1.0]);
}

#[test]
fn test_disabled_historian_records_nothing() {
    let config = make_builder().kp(1.0).build().unwrap();
    let mut pid = PidController::new(config);

    for _ in 0..10 {
        pid.compute(0.0, 1.0, DT).unwrap();
    }

    assert!(pid.historian().is_empty());
    assert!(pid.historian().channels().is_empty());
}

#[test]
fn test_channel_set_composition() {
    let set = Channel::Output | Channel::Error | Channel::Setpoint;
    assert!(set.contains(Channel::Output));
    assert!(set.contains(Channel::Error));
    assert!(set.contains(Channel::Setpoint));
    assert!(!set.contains(Channel::Integral));
    assert_eq!(set.iter().count(), 3);

    let merged = set | ChannelSet::from(Channel::Integral);
    assert!(merged.contains(Channel::Integral));

    let collected: ChannelSet = Channel::ALL.into_iter().collect();
    assert_eq!(collected, ChannelSet::ALL);
    assert!(ChannelSet::EMPTY.is_empty());
}
