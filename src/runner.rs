// Fixed-cadence cyclic execution of a PID controller on a timing thread
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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::fault::{FaultSink, RunnerFault};
use crate::historian::Channel;
use crate::pid::{ConfigError, PidController, PidMode};

struct LoopState {
    pid: PidController<f64>,
    setpoint: f64,
    process_value: f64,
}

struct Shared {
    state: Mutex<LoopState>,
    quit: AtomicBool,
}

/// Runs a [`PidController`] autonomously at a fixed period on a dedicated
/// timing thread.
///
/// Each cycle captures the current setpoint and process value, measures the
/// elapsed time since the previous cycle start on a monotonic clock, invokes
/// the controller and publishes the output, then sleeps for the remainder of
/// the period. If cycle work exceeds the period, the next cycle starts
/// immediately; cycles never overlap and an overrun is reported through the
/// injected [`FaultSink`] rather than aborting the loop.
///
/// Termination is cooperative: [`CyclicPid::stop`] (or dropping the runner)
/// raises a quit signal that is observed at cycle boundaries, so the
/// in-flight cycle always finishes and shutdown latency is bounded by roughly
/// one period. All accessors are safe to call from any thread; writes can
/// never be observed torn.
///
/// ```no_run
/// use std::time::Duration;
///
/// use cyclic_pid::fault::NullSink;
/// use cyclic_pid::pid::{PidConfigBuilder, PidController};
/// use cyclic_pid::runner::CyclicPid;
///
/// let config = PidConfigBuilder::default()
///     .kp(2.0)
///     .ki(0.5)
///     .output_limits(0.0, 100.0)
///     .build()
///     .expect("invalid PID config");
///
/// let runner = CyclicPid::spawn(
///     PidController::new(config),
///     Duration::from_millis(10),
///     Box::new(NullSink),
/// )
/// .expect("invalid cycle period");
///
/// runner.set_setpoint(50.0);
/// runner.set_process_value(42.0); // typically fed from a sensor
/// let _command = runner.output();
/// runner.stop();
/// ```
pub struct CyclicPid {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl CyclicPid {
    /// Starts the timing thread running `pid` every `period`.
    ///
    /// Setpoint and process value start at zero until written through the
    /// accessors. Per-cycle faults and overruns are reported through `sink`.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidCyclePeriod)` if the period is zero.
    pub fn spawn(
        pid: PidController<f64>,
        period: Duration,
        sink: Box<dyn FaultSink>,
    ) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::InvalidCyclePeriod);
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(LoopState {
                pid,
                setpoint: 0.0,
                process_value: 0.0,
            }),
            quit: AtomicBool::new(false),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || run_loop(&worker, period, sink.as_ref()));

        Ok(Self {
            shared,
            handle: Some(handle),
            period,
        })
    }

    /// Returns the configured cycle period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the current setpoint.
    pub fn setpoint(&self) -> f64 {
        self.lock().setpoint
    }

    /// Sets the setpoint consumed on the next cycle.
    pub fn set_setpoint(&self, setpoint: f64) {
        self.lock().setpoint = setpoint;
    }

    /// Returns the most recently pushed process value.
    pub fn process_value(&self) -> f64 {
        self.lock().process_value
    }

    /// Pushes a new process value, consumed on the next cycle.
    pub fn set_process_value(&self, process_value: f64) {
        self.lock().process_value = process_value;
    }

    /// Returns the most recently published output.
    pub fn output(&self) -> f64 {
        self.lock().pid.output()
    }

    /// Returns the error of the most recent automatic cycle.
    pub fn error(&self) -> f64 {
        self.lock().pid.error()
    }

    /// Retunes the controller gains, effective on the next cycle.
    pub fn set_gains(&self, kp: f64, ki: f64, kd: f64) -> Result<(), ConfigError> {
        self.lock().pid.config_mut().set_gains(kp, ki, kd)
    }

    /// Returns the current operating mode.
    pub fn mode(&self) -> PidMode {
        self.lock().pid.mode()
    }

    /// Switches between automatic and manual mode, effective on the next
    /// cycle.
    pub fn set_mode(&self, mode: PidMode) {
        self.lock().pid.set_mode(mode);
    }

    /// Returns the manual output value.
    pub fn manual_value(&self) -> f64 {
        self.lock().pid.manual_value()
    }

    /// Sets the output applied while in manual mode.
    pub fn set_manual_value(&self, value: f64) {
        self.lock().pid.set_manual_value(value);
    }

    /// Returns true if integral accumulation is explicitly frozen.
    pub fn integral_freeze(&self) -> bool {
        self.lock().pid.integral_freeze()
    }

    /// Explicitly freezes or resumes integral accumulation.
    pub fn set_integral_freeze(&self, freeze: bool) {
        self.lock().pid.set_integral_freeze(freeze);
    }

    /// Returns the debounced setpoint-reached flag.
    pub fn setpoint_reached(&self) -> bool {
        self.lock().pid.setpoint_reached()
    }

    /// Returns the debounced process-value stabilization flag.
    pub fn process_value_stabilized(&self) -> bool {
        self.lock().pid.process_value_stabilized()
    }

    /// Copies out the recorded samples of a historian channel.
    ///
    /// The internal lock is held only for the duration of the copy.
    pub fn samples(&self, channel: Channel) -> Vec<f64> {
        self.lock().pid.historian().samples(channel)
    }

    /// Copies out the historian's shared time channel.
    pub fn sample_times(&self) -> Vec<f64> {
        self.lock().pid.historian().time()
    }

    /// Signals the timing thread to quit, lets it finish the in-flight cycle
    /// and joins it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shared.quit.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoopState> {
        // A poisoned state mutex only means a panic unwound mid-cycle; the
        // controller state itself is always left consistent by value writes
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CyclicPid {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(shared: &Shared, period: Duration, sink: &dyn FaultSink) {
    let mut last_start = Instant::now();

    while !shared.quit.load(Ordering::Acquire) {
        let start = Instant::now();
        let elapsed = start.duration_since(last_start);
        last_start = start;

        {
            let mut state = shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let (process_value, setpoint) = (state.process_value, state.setpoint);
            if let Err(fault) = state.pid.compute(process_value, setpoint, elapsed.as_secs_f64()) {
                sink.report(RunnerFault::CycleSkipped(fault));
            }
        }

        let work = start.elapsed();
        if work >= period {
            // Overrun: re-enter immediately, absorbing the drift
            sink.report(RunnerFault::Overrun { period, work });
            continue;
        }

        // Observe the quit signal before sleeping so shutdown latency stays
        // bounded by one period; no lock is held across the sleep
        if shared.quit.load(Ordering::Acquire) {
            break;
        }
        thread::sleep(period - work);
    }
}
