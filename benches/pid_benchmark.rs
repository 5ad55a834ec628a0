//! Benchmark for the PID controller
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

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cyclic_pid::historian::{Channel, HistorianConfig};
use cyclic_pid::pid;

fn make_config() -> pid::PidConfig<f64> {
    pid::PidConfigBuilder::default()
        .kp(1.0)
        .ki(0.5)
        .kd(0.1)
        .output_limits(-10.0, 10.0)
        .build()
        .unwrap()
}

/// The full per-cycle transfer function without recording. Each computation
/// should take time on the order of nanoseconds.
fn bench_pid_compute(c: &mut Criterion) {
    let mut pid = pid::PidController::new(make_config());
    let setpoint = 1.0;
    let mut measurement = 0.9;
    let dt = 0.01;
    let mut output: f64 = 0.0;

    c.bench_function("PID compute", |b| {
        b.iter(|| {
            output = pid
                .compute(black_box(measurement), black_box(setpoint), dt)
                .unwrap();
            measurement += 0.0001; // prevent constant inputs
            black_box(output);
        });
    });
}

/// The same cycle with every channel recorded. Once the ring buffers are
/// warm each insertion is a pop and a push, so this should stay within a
/// small constant factor of the bare compute.
fn bench_pid_compute_with_historian(c: &mut Criterion) {
    let historian = HistorianConfig::new(
        Channel::Proportional
            | Channel::Integral
            | Channel::Derivative
            | Channel::Error
            | Channel::Setpoint
            | Channel::ProcessValue
            | Channel::Output,
    )
    .with_capacity(10_000);
    let mut pid = pid::PidController::with_historian(make_config(), historian).unwrap();
    let setpoint = 1.0;
    let mut measurement = 0.9;
    let dt = 0.01;
    let mut output: f64 = 0.0;

    c.bench_function("PID compute with historian", |b| {
        b.iter(|| {
            output = pid
                .compute(black_box(measurement), black_box(setpoint), dt)
                .unwrap();
            measurement += 0.0001; // prevent constant inputs
            black_box(output);
        });
    });
}

struct SimplePidConfig {
    kp: f64,
    ki: f64,
    kd: f64,
}

// The naive PID implementation updates the integral and derivative terms
// straight from the mathematical definition, with NO input validation, NO
// setpoint ramping, NO deadband or stability bookkeeping and NO recording.
// Even so, it should not be > 50% faster than the PidController.
fn bench_naive_pid(c: &mut Criterion) {
    let kp = 1.0;
    let ki = 0.5;
    let kd = 0.1;
    let mut err_sum: f64 = 0.0;
    let mut last_err: f64 = 0.1;

    let mut measurement = 0.9;
    let setpoint = 1.0;

    let mut now = 0.01;
    let mut last_time: f64 = 0.0;
    let cfg = SimplePidConfig { kp, ki, kd };
    let mut output: f64 = 0.0;
    c.bench_function("naive PID", |b| {
        b.iter(|| {
            black_box(measurement);
            black_box(setpoint);
            let time_change = now - last_time;
            if time_change <= 1e-6 {
                return; // avoid division by zero
            }
            // Compute all the working error variables
            let error = setpoint - measurement;
            err_sum += error * time_change;

            // Clamping the integral term is the bare minimum we could do to
            // ensure safety. Leave it in the benchmark
            err_sum = err_sum.clamp(-10.0, 10.0);
            let d_err = (error - last_err) / time_change;

            // Compute PID Output
            output = cfg.kp * error + cfg.ki * err_sum + cfg.kd * d_err;
            // Ditto about clamping the output
            output = output.clamp(-10.0, 10.0);
            /*Remember some variables for next time*/
            last_err = error;
            last_time = now;
            black_box(output);

            now += 0.01;

            measurement += 0.0001; // prevent constant inputs
        });
    });
}

criterion_group!(
    benches,
    bench_pid_compute,
    bench_pid_compute_with_historian,
    bench_naive_pid,
);
criterion_main!(benches);
