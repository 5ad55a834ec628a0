#![warn(missing_docs)]

//! # Cyclic PID Controller Library
//!
//! This library provides a closed-loop PID (Proportional-Integral-Derivative)
//! controller for cyclic execution inside control applications, together with
//! a fixed-cadence threaded runner and a bounded historian.
//!
//! ## Features
//!
//! - Respects the best practices for PID control:
//!   - Configurable and fully validated behavioral modes, immutable after
//!     construction.
//!   - Anti reset-windup: symmetric integral clamp plus deadband freezing.
//!   - Optional proportional- and derivative-on-measurement to mitigate
//!     setpoint-step kick.
//!   - Setpoint ramping and bumpless manual/automatic transfer.
//!   - Debounced setpoint-reached and process-value-stabilized detection.
//!
//! - Explicit support for **cyclic** execution:
//!   - Deterministic elapsed-time semantics: pass the cycle time explicitly,
//!     or let the controller or the runner derive it from a monotonic clock.
//!   - A [`runner::CyclicPid`] timing thread with overrun absorption,
//!     cooperative shutdown and thread-safe accessors.
//!
//! - Observability without unbounded memory growth:
//!   - The [`historian::Historian`] samples selected internal signals every
//!     cycle into fixed-capacity ring buffers.
//!   - Per-cycle faults are contained and surfaced through an injected
//!     [`fault::FaultSink`], never a process-wide logger.
//!
//! ## Usage
//!
//! ### Driving the controller yourself
//!
//! Calling [`pid::PidController::compute`] with an explicit elapsed time
//! keeps the loop fully deterministic, which suits simulation and unit
//! testing as well as externally paced control tasks.
//!
//! ```rust
//! use cyclic_pid::historian::{Channel, HistorianConfig};
//! use cyclic_pid::pid::{PidConfigBuilder, PidController};
//!
//! let config = PidConfigBuilder::default()
//!     .kp(2.0)
//!     .ki(0.2)
//!     .output_limits(-10.0, 10.0)
//!     .build()
//!     .expect("invalid PID config");
//!
//! let historian = HistorianConfig::new(Channel::Output | Channel::Error);
//! let mut pid = PidController::with_historian(config, historian)
//!     .expect("invalid historian config");
//!
//! let setpoint = 2.0;
//! let mut process_value = 0.0;
//! for _ in 0..100 {
//!     let command = pid
//!         .compute(process_value, setpoint, 0.01)
//!         .expect("well-formed cycle inputs");
//!     process_value += command * 0.01; // stand-in for the real process
//! }
//!
//! assert_eq!(pid.historian().samples(Channel::Output).len(), 100);
//! ```
//!
//! ### Running autonomously on a timing thread
//!
//! [`runner::CyclicPid`] owns the controller and runs it at a fixed period;
//! the rest of the application pushes process values and reads commands
//! through thread-safe accessors.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cyclic_pid::fault::NullSink;
//! use cyclic_pid::pid::{PidConfigBuilder, PidController};
//! use cyclic_pid::runner::CyclicPid;
//!
//! let config = PidConfigBuilder::default()
//!     .kp(1.0)
//!     .ki(1.0)
//!     .build()
//!     .expect("invalid PID config");
//!
//! let runner = CyclicPid::spawn(
//!     PidController::new(config),
//!     Duration::from_millis(10),
//!     Box::new(NullSink),
//! )
//! .expect("invalid cycle period");
//!
//! runner.set_setpoint(10.0);
//! loop {
//!     // read the sensor, push it, apply the published command ...
//!     runner.set_process_value(9.5);
//!     let _command = runner.output();
//!     # break;
//! }
//! runner.stop(); // finish the in-flight cycle, then join
//! ```

/// The main module for the PID controller.
pub mod pid;

/// Debounce timers backing the deadband and the stability detectors.
pub mod debounce;

/// Per-cycle fault taxonomy and the reporting-sink capability.
pub mod fault;

/// Bounded recording of controller-internal signals.
pub mod historian;

/// The fixed-cadence timing thread that runs a controller autonomously.
pub mod runner;

/// Plant models for closed-loop testing and demonstration.
pub mod sim;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
