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

use std::time::{Duration, Instant};

use num_traits::{clamp, Float, NumCast};

use crate::debounce::DebounceTimer;
use crate::fault::CycleFault;
use crate::historian::{CycleRecord, Historian, HistorianConfig};

/// A fatal configuration error, raised at construction and never recovered
/// internally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The proportional gain is NaN or infinite.
    #[error("proportional gain must be finite")]
    InvalidProportionalGain,

    /// The integral gain is NaN or infinite.
    #[error("integral gain must be finite")]
    InvalidIntegralGain,

    /// The derivative gain is NaN or infinite.
    #[error("derivative gain must be finite")]
    InvalidDerivativeGain,

    /// The output limits are NaN or the minimum exceeds the maximum.
    #[error("output limits must satisfy min <= max and not be NaN")]
    InvalidOutputLimits,

    /// The integral limit is NaN or not positive.
    #[error("integral limit must be positive")]
    InvalidIntegralLimit,

    /// The deadband width is not positive and finite, or the activation time
    /// is negative or non-finite.
    #[error("deadband width must be positive and finite, activation time non-negative and finite")]
    InvalidDeadband,

    /// The setpoint ramp rate is not positive and finite.
    #[error("setpoint ramp rate must be positive and finite")]
    InvalidSetpointRamp,

    /// A stability limit is not positive and finite, or a stability time is
    /// negative or non-finite.
    #[error("stability limit must be positive and finite, stability time non-negative and finite")]
    InvalidStabilityCriterion,

    /// The cycle period of the runner is zero.
    #[error("cycle period must be positive")]
    InvalidCyclePeriod,

    /// The historian capacity is zero.
    #[error("historian capacity must be nonzero")]
    InvalidHistorianCapacity,
}

/// Validated, construction-time controller configuration.
///
/// Every field is immutable after construction except the three gains, which
/// may be retuned at any time and take effect on the next cycle. No unit
/// conversion is performed internally; the caller's unit system is
/// authoritative, with times in seconds.
#[derive(Copy, Clone, Debug)]
pub struct PidConfig<F: Float> {
    /// Proportional gain coefficient.
    /// Defaults to 1.0.
    kp: F,

    /// Integral gain coefficient.
    /// Defaults to 0.0.
    ki: F,

    /// Derivative gain coefficient.
    /// Defaults to 0.0.
    kd: F,

    /// Inverts the control action: error = process value - setpoint.
    /// Defaults to false (direct action).
    indirect_action: bool,

    /// Computes the proportional term from the process value instead of the
    /// error, removing the step discontinuity from sudden setpoint changes.
    /// Defaults to false.
    proportional_on_measurement: bool,

    /// Computes the derivative term from the process value instead of the
    /// error, removing derivative spikes from setpoint steps.
    /// Defaults to false.
    derivative_on_measurement: bool,

    /// Minimum output value.
    /// Defaults to negative infinity, i.e. no limit.
    output_min: F,

    /// Maximum output value.
    /// Defaults to positive infinity, i.e. no limit.
    output_max: F,

    /// Symmetric clamp on the integral accumulator.
    /// Defaults to positive infinity, i.e. no limit.
    integral_limit: F,

    /// Error tolerance within which integral action freezes after holding
    /// continuously for the activation time.
    /// Defaults to disabled.
    deadband: Option<F>,

    /// Duration the error must stay within the deadband before integral
    /// action freezes, in seconds.
    deadband_activation_time: F,

    /// Maximum rate at which the effective setpoint follows the raw setpoint,
    /// in units per second.
    /// Defaults to disabled (the raw setpoint applies immediately).
    setpoint_ramp: Option<F>,

    /// Error tolerance for the setpoint-reached detector.
    /// Defaults to disabled.
    setpoint_stable_limit: Option<F>,

    /// Duration the error must stay within the setpoint-reached tolerance,
    /// in seconds.
    setpoint_stable_time: F,

    /// Process-value rate tolerance for the stabilization detector.
    /// Defaults to disabled.
    process_value_stable_limit: Option<F>,

    /// Duration the process-value rate must stay within tolerance, in
    /// seconds.
    process_value_stable_time: F,

    /// Forces output continuity across manual/automatic transitions.
    /// Defaults to true. When disabled, a mismatch between the manual value
    /// and the last output at the switch produces a deliberate output step,
    /// which can destabilize the loop.
    bumpless_switching: bool,
}

impl<F: Float> Default for PidConfig<F> {
    fn default() -> Self {
        PidConfig {
            kp: F::one(),
            ki: F::zero(),
            kd: F::zero(),
            indirect_action: false,
            proportional_on_measurement: false,
            derivative_on_measurement: false,
            output_min: F::neg_infinity(),
            output_max: F::infinity(),
            integral_limit: F::infinity(),
            deadband: None,
            deadband_activation_time: F::zero(),
            setpoint_ramp: None,
            setpoint_stable_limit: None,
            setpoint_stable_time: F::zero(),
            process_value_stable_limit: None,
            process_value_stable_time: F::zero(),
            bumpless_switching: true,
        }
    }
}

impl<F: Float> PidConfig<F> {
    /// Returns the proportional gain.
    pub fn kp(&self) -> F {
        self.kp
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> F {
        self.ki
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> F {
        self.kd
    }

    /// Convenience method that returns the three gains together as a tuple.
    pub fn gains(&self) -> (F, F, F) {
        (self.kp, self.ki, self.kd)
    }

    /// Returns true if the control action is inverted.
    pub fn indirect_action(&self) -> bool {
        self.indirect_action
    }

    /// Returns true if the proportional term is computed on the measurement.
    pub fn proportional_on_measurement(&self) -> bool {
        self.proportional_on_measurement
    }

    /// Returns true if the derivative term is computed on the measurement.
    pub fn derivative_on_measurement(&self) -> bool {
        self.derivative_on_measurement
    }

    /// Returns the minimum output limit.
    pub fn output_min(&self) -> F {
        self.output_min
    }

    /// Returns the maximum output limit.
    pub fn output_max(&self) -> F {
        self.output_max
    }

    /// Returns the symmetric integral limit.
    pub fn integral_limit(&self) -> F {
        self.integral_limit
    }

    /// Returns the deadband width, if configured.
    pub fn deadband(&self) -> Option<F> {
        self.deadband
    }

    /// Returns the deadband activation time in seconds.
    pub fn deadband_activation_time(&self) -> F {
        self.deadband_activation_time
    }

    /// Returns the setpoint ramp rate in units per second, if configured.
    pub fn setpoint_ramp(&self) -> Option<F> {
        self.setpoint_ramp
    }

    /// Returns the setpoint-reached tolerance, if configured.
    pub fn setpoint_stable_limit(&self) -> Option<F> {
        self.setpoint_stable_limit
    }

    /// Returns the setpoint-reached debounce duration in seconds.
    pub fn setpoint_stable_time(&self) -> F {
        self.setpoint_stable_time
    }

    /// Returns the process-value stabilization tolerance, if configured.
    pub fn process_value_stable_limit(&self) -> Option<F> {
        self.process_value_stable_limit
    }

    /// Returns the process-value stabilization debounce duration in seconds.
    pub fn process_value_stable_time(&self) -> F {
        self.process_value_stable_time
    }

    /// Returns true if bumpless manual/automatic switching is enabled.
    pub fn bumpless_switching(&self) -> bool {
        self.bumpless_switching
    }

    /// Sets the proportional gain, effective on the next cycle.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidProportionalGain)` if the gain is NaN or
    ///   infinite; the previous gain is retained.
    pub fn set_kp(&mut self, kp: F) -> Result<(), ConfigError> {
        if !kp.is_finite() {
            return Err(ConfigError::InvalidProportionalGain);
        }
        self.kp = kp;
        Ok(())
    }

    /// Sets the integral gain, effective on the next cycle.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidIntegralGain)` if the gain is NaN or
    ///   infinite; the previous gain is retained.
    pub fn set_ki(&mut self, ki: F) -> Result<(), ConfigError> {
        if !ki.is_finite() {
            return Err(ConfigError::InvalidIntegralGain);
        }
        self.ki = ki;
        Ok(())
    }

    /// Sets the derivative gain, effective on the next cycle.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidDerivativeGain)` if the gain is NaN or
    ///   infinite; the previous gain is retained.
    pub fn set_kd(&mut self, kd: F) -> Result<(), ConfigError> {
        if !kd.is_finite() {
            return Err(ConfigError::InvalidDerivativeGain);
        }
        self.kd = kd;
        Ok(())
    }

    /// Sets the three gains together. If any gain is invalid, none of them
    /// changes.
    pub fn set_gains(&mut self, kp: F, ki: F, kd: F) -> Result<(), ConfigError> {
        if !kp.is_finite() {
            return Err(ConfigError::InvalidProportionalGain);
        }
        if !ki.is_finite() {
            return Err(ConfigError::InvalidIntegralGain);
        }
        if !kd.is_finite() {
            return Err(ConfigError::InvalidDerivativeGain);
        }
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        Ok(())
    }
}

/// Builder for [`PidConfig`]; validation happens in [`PidConfigBuilder::build`].
#[derive(Copy, Clone, Debug)]
pub struct PidConfigBuilder<F: Float> {
    config: PidConfig<F>,
}

impl<F: Float> Default for PidConfigBuilder<F> {
    fn default() -> Self {
        PidConfigBuilder {
            config: PidConfig::default(),
        }
    }
}

impl<F: Float> PidConfigBuilder<F> {
    /// Sets the proportional gain.
    #[must_use]
    pub fn kp(mut self, kp: F) -> Self {
        self.config.kp = kp;
        self
    }

    /// Sets the integral gain.
    #[must_use]
    pub fn ki(mut self, ki: F) -> Self {
        self.config.ki = ki;
        self
    }

    /// Sets the derivative gain.
    #[must_use]
    pub fn kd(mut self, kd: F) -> Self {
        self.config.kd = kd;
        self
    }

    /// Inverts the control action so that error = process value - setpoint.
    #[must_use]
    pub fn indirect_action(mut self, indirect: bool) -> Self {
        self.config.indirect_action = indirect;
        self
    }

    /// Computes the proportional term on the measurement instead of the
    /// error.
    ///
    /// This removes the step discontinuity from sudden setpoint changes at
    /// the cost of slower rise; behavior under process disturbance is
    /// identical to the normal form.
    #[must_use]
    pub fn proportional_on_measurement(mut self, enabled: bool) -> Self {
        self.config.proportional_on_measurement = enabled;
        self
    }

    /// Computes the derivative term on the measurement instead of the error,
    /// mitigating derivative kick.
    #[must_use]
    pub fn derivative_on_measurement(mut self, enabled: bool) -> Self {
        self.config.derivative_on_measurement = enabled;
        self
    }

    /// Sets the output limits. Either side may be infinite to disable
    /// clamping on that side.
    #[must_use]
    pub fn output_limits(mut self, output_min: F, output_max: F) -> Self {
        self.config.output_min = output_min;
        self.config.output_max = output_max;
        self
    }

    /// Sets the symmetric clamp on the integral accumulator.
    #[must_use]
    pub fn integral_limit(mut self, limit: F) -> Self {
        self.config.integral_limit = limit;
        self
    }

    /// Enables the deadband: once the error magnitude stays at or below
    /// `width` continuously for `activation_time` seconds, integral
    /// accumulation freezes; it resumes the instant the error leaves the
    /// band.
    #[must_use]
    pub fn deadband(mut self, width: F, activation_time: F) -> Self {
        self.config.deadband = Some(width);
        self.config.deadband_activation_time = activation_time;
        self
    }

    /// Limits how fast the effective setpoint follows the raw setpoint, in
    /// units per second.
    #[must_use]
    pub fn setpoint_ramp(mut self, rate: F) -> Self {
        self.config.setpoint_ramp = Some(rate);
        self
    }

    /// Enables the setpoint-reached detector: the flag becomes true once the
    /// error magnitude stays at or below `limit` continuously for `time`
    /// seconds.
    #[must_use]
    pub fn setpoint_stability(mut self, limit: F, time: F) -> Self {
        self.config.setpoint_stable_limit = Some(limit);
        self.config.setpoint_stable_time = time;
        self
    }

    /// Enables the process-value stabilization detector: the flag becomes
    /// true once the process-value rate magnitude stays at or below `limit`
    /// continuously for `time` seconds.
    #[must_use]
    pub fn process_value_stability(mut self, limit: F, time: F) -> Self {
        self.config.process_value_stable_limit = Some(limit);
        self.config.process_value_stable_time = time;
        self
    }

    /// Enables or disables bumpless manual/automatic switching.
    #[must_use]
    pub fn bumpless_switching(mut self, enabled: bool) -> Self {
        self.config.bumpless_switching = enabled;
        self
    }

    /// Validates the accumulated settings and produces the configuration.
    pub fn build(self) -> Result<PidConfig<F>, ConfigError> {
        let c = &self.config;
        if !c.kp.is_finite() {
            return Err(ConfigError::InvalidProportionalGain);
        }
        if !c.ki.is_finite() {
            return Err(ConfigError::InvalidIntegralGain);
        }
        if !c.kd.is_finite() {
            return Err(ConfigError::InvalidDerivativeGain);
        }
        if c.output_min.is_nan() || c.output_max.is_nan() || c.output_min > c.output_max {
            return Err(ConfigError::InvalidOutputLimits);
        }
        if c.integral_limit.is_nan() || c.integral_limit <= F::zero() {
            return Err(ConfigError::InvalidIntegralLimit);
        }
        if let Some(width) = c.deadband {
            let time = c.deadband_activation_time;
            if !width.is_finite() || width <= F::zero() || !time.is_finite() || time < F::zero() {
                return Err(ConfigError::InvalidDeadband);
            }
        }
        if let Some(rate) = c.setpoint_ramp {
            if !rate.is_finite() || rate <= F::zero() {
                return Err(ConfigError::InvalidSetpointRamp);
            }
        }
        for (limit, time) in [
            (c.setpoint_stable_limit, c.setpoint_stable_time),
            (c.process_value_stable_limit, c.process_value_stable_time),
        ] {
            if let Some(limit) = limit {
                if !limit.is_finite()
                    || limit <= F::zero()
                    || !time.is_finite()
                    || time < F::zero()
                {
                    return Err(ConfigError::InvalidStabilityCriterion);
                }
            }
        }
        Ok(self.config)
    }
}

/// Operating mode of the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PidMode {
    /// The per-cycle transfer function drives the output.
    Auto,
    /// The externally set manual value drives the output.
    Manual,
}

/// A closed-loop PID controller for cyclic execution.
///
/// One call to [`PidController::compute`] is one control cycle: given the
/// measured process value, the setpoint and the time elapsed since the
/// previous cycle, the controller updates its internal state and produces a
/// clamped command. The behavioral modes (anti-windup, on-measurement
/// weighting, deadband freezing, setpoint ramping, manual/automatic bumpless
/// transfer and stability detection) are fixed by the validated
/// [`PidConfig`].
///
/// The controller is a single-threaded-safe data structure; wrap it in
/// [`crate::runner::CyclicPid`] to run it autonomously on a timing thread.
#[derive(Clone, Debug)]
pub struct PidController<F: Float> {
    config: PidConfig<F>,
    integral: F,
    last_error: F,
    last_process_value: F,
    ramped_setpoint: Option<F>,
    last_output: F,
    manual_mode: bool,
    was_manual: bool,
    manual_value: F,
    integral_freeze: bool,
    deadband_timer: Option<DebounceTimer<F>>,
    setpoint_watch: Option<DebounceTimer<F>>,
    process_value_watch: Option<DebounceTimer<F>>,
    initialized: bool,
    elapsed_total: F,
    historian: Historian<F>,
    last_instant: Option<Instant>,
}

impl<F: Float> PidController<F> {
    /// Creates a controller with a disabled historian.
    pub fn new(config: PidConfig<F>) -> Self {
        Self::build(config, Historian::new(HistorianConfig::default()))
    }

    /// Creates a controller that records the selected channels every cycle.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidHistorianCapacity)` if the historian
    ///   capacity is zero.
    pub fn with_historian(
        config: PidConfig<F>,
        historian: HistorianConfig,
    ) -> Result<Self, ConfigError> {
        if historian.capacity == 0 {
            return Err(ConfigError::InvalidHistorianCapacity);
        }
        Ok(Self::build(config, Historian::new(historian)))
    }

    fn build(config: PidConfig<F>, historian: Historian<F>) -> Self {
        Self {
            config,
            integral: F::zero(),
            last_error: F::zero(),
            last_process_value: F::zero(),
            ramped_setpoint: None,
            last_output: F::zero(),
            manual_mode: false,
            was_manual: false,
            manual_value: F::zero(),
            integral_freeze: false,
            deadband_timer: config
                .deadband
                .map(|_| DebounceTimer::new(config.deadband_activation_time)),
            setpoint_watch: config
                .setpoint_stable_limit
                .map(|_| DebounceTimer::new(config.setpoint_stable_time)),
            process_value_watch: config
                .process_value_stable_limit
                .map(|_| DebounceTimer::new(config.process_value_stable_time)),
            initialized: false,
            elapsed_total: F::zero(),
            historian,
            last_instant: None,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PidConfig<F> {
        &self.config
    }

    /// Returns the configuration for retuning the gains.
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        &mut self.config
    }

    /// Returns the last computed (clamped) output.
    pub fn output(&self) -> F {
        self.last_output
    }

    /// Returns the error of the last automatic cycle.
    pub fn error(&self) -> F {
        self.last_error
    }

    /// Returns the current integral accumulator.
    pub fn integral(&self) -> F {
        self.integral
    }

    /// Returns the current operating mode.
    pub fn mode(&self) -> PidMode {
        if self.manual_mode {
            PidMode::Manual
        } else {
            PidMode::Auto
        }
    }

    /// Switches between automatic and manual mode.
    ///
    /// The transition takes effect on the next cycle. With bumpless switching
    /// enabled, re-entering automatic mode re-seeds the integral accumulator
    /// so that the output is continuous at the switch instant.
    pub fn set_mode(&mut self, mode: PidMode) {
        self.manual_mode = mode == PidMode::Manual;
    }

    /// Returns the manual output value.
    pub fn manual_value(&self) -> F {
        self.manual_value
    }

    /// Sets the output value applied while in manual mode.
    pub fn set_manual_value(&mut self, value: F) {
        self.manual_value = value;
    }

    /// Returns true if integral accumulation is explicitly frozen.
    pub fn integral_freeze(&self) -> bool {
        self.integral_freeze
    }

    /// Explicitly freezes or resumes integral accumulation.
    pub fn set_integral_freeze(&mut self, freeze: bool) {
        self.integral_freeze = freeze;
    }

    /// Returns true once the error has stayed within the setpoint-reached
    /// tolerance for the configured duration; false immediately on any
    /// violation, and always false if the detector is not configured.
    pub fn setpoint_reached(&self) -> bool {
        self.setpoint_watch.map_or(false, |w| w.satisfied())
    }

    /// Returns true once the process-value rate has stayed within the
    /// stabilization tolerance for the configured duration; false immediately
    /// on any violation, and always false if the detector is not configured.
    pub fn process_value_stabilized(&self) -> bool {
        self.process_value_watch.map_or(false, |w| w.satisfied())
    }

    /// Returns the historian.
    pub fn historian(&self) -> &Historian<F> {
        &self.historian
    }

    /// Runs one control cycle with an explicitly supplied elapsed time in
    /// seconds, for deterministic or simulated time.
    ///
    /// The first invocation uses an elapsed time of zero and performs no
    /// derivative or integral contribution.
    ///
    /// # Returns
    /// - the clamped command on success.
    /// - `Err(CycleFault)` if an input or the elapsed time is ill-formed; the
    ///   cycle is skipped, state is untouched and the previous output remains
    ///   in effect.
    pub fn compute(&mut self, process_value: F, setpoint: F, elapsed: F) -> Result<F, CycleFault> {
        if !process_value.is_finite() || !setpoint.is_finite() {
            return Err(CycleFault::NonFiniteInput);
        }
        if !elapsed.is_finite() {
            return Err(CycleFault::NonFiniteElapsedTime);
        }
        if elapsed < F::zero() {
            return Err(CycleFault::NegativeElapsedTime);
        }

        let elapsed = if self.initialized { elapsed } else { F::zero() };
        self.initialized = true;
        self.elapsed_total = self.elapsed_total + elapsed;

        let exiting_manual = self.was_manual && !self.manual_mode;
        self.was_manual = self.manual_mode;

        if self.manual_mode {
            return Ok(self.manual_cycle(process_value, setpoint));
        }

        // Setpoint ramp: move the effective setpoint toward the raw setpoint
        // by at most rate * elapsed, never overshooting it
        let ramped = match (self.config.setpoint_ramp, self.ramped_setpoint) {
            (Some(rate), Some(previous)) => {
                let max_step = rate * elapsed;
                previous + clamp(setpoint - previous, -max_step, max_step)
            }
            _ => setpoint,
        };
        self.ramped_setpoint = Some(ramped);

        let error = if self.config.indirect_action {
            process_value - ramped
        } else {
            ramped - process_value
        };

        let p = if self.config.proportional_on_measurement {
            -(process_value * self.config.kp)
        } else {
            error * self.config.kp
        };

        if exiting_manual && self.config.bumpless_switching {
            // Re-seed the integral so that P + integral equals the manual
            // value, and re-baseline the derivative sources so this cycle
            // contributes no D; output continuity at the switch is exact
            self.integral = self.clamp_integral(self.clamp_output(self.manual_value) - p);
            self.last_error = error;
            self.last_process_value = process_value;
        }

        // The deadband timer is driven before the accumulation decision so
        // integral action resumes on the very cycle the error leaves the band
        let in_deadband = match (self.config.deadband, self.deadband_timer.as_mut()) {
            (Some(width), Some(timer)) => timer.observe(error.abs() <= width, elapsed),
            _ => false,
        };
        if !(exiting_manual || self.integral_freeze || in_deadband) {
            self.integral = self.clamp_integral(self.integral + error * self.config.ki * elapsed);
        }

        if let (Some(limit), Some(watch)) = (
            self.config.setpoint_stable_limit,
            self.setpoint_watch.as_mut(),
        ) {
            watch.observe(error.abs() <= limit, elapsed);
        }
        if let (Some(limit), Some(watch)) = (
            self.config.process_value_stable_limit,
            self.process_value_watch.as_mut(),
        ) {
            let rate = if elapsed > F::zero() {
                ((process_value - self.last_process_value) / elapsed).abs()
            } else {
                F::zero()
            };
            watch.observe(rate <= limit, elapsed);
        }

        let d = if elapsed > F::zero() {
            if self.config.derivative_on_measurement {
                // Note reversed order of operands
                -(((process_value - self.last_process_value) / elapsed) * self.config.kd)
            } else {
                ((error - self.last_error) / elapsed) * self.config.kd
            }
        } else {
            F::zero()
        };

        let output = self.clamp_output(p + self.integral + d);

        // Track the output into the manual value so entering manual mode
        // starts from the current command
        if self.config.bumpless_switching {
            self.manual_value = output;
        }

        self.last_error = error;
        self.last_process_value = process_value;
        self.last_output = output;

        self.historian.record(
            &CycleRecord {
                p,
                i: self.integral,
                d,
                error,
                setpoint,
                process_value,
                output,
            },
            self.elapsed_total,
        );

        Ok(output)
    }

    /// Runs one control cycle with the elapsed time derived from a monotonic
    /// clock. The first invocation uses an elapsed time of zero.
    ///
    /// A skipped cycle does not advance the clock reference, so the next
    /// successful cycle spans the gap.
    pub fn compute_timed(&mut self, process_value: F, setpoint: F) -> Result<F, CycleFault> {
        let now = Instant::now();
        let elapsed = match self.last_instant {
            Some(last) => now.duration_since(last),
            None => Duration::ZERO,
        };
        let dt = <F as NumCast>::from(elapsed.as_secs_f64()).unwrap_or_else(F::zero);
        let output = self.compute(process_value, setpoint, dt)?;
        self.last_instant = Some(now);
        Ok(output)
    }

    fn manual_cycle(&mut self, process_value: F, setpoint: F) -> F {
        let output = self.clamp_output(self.manual_value);
        self.last_output = output;
        let zero = F::zero();
        self.historian.record(
            &CycleRecord {
                p: zero,
                i: self.integral,
                d: zero,
                error: zero,
                setpoint,
                process_value,
                output,
            },
            self.elapsed_total,
        );
        output
    }

    fn clamp_output(&self, value: F) -> F {
        clamp(value, self.config.output_min, self.config.output_max)
    }

    fn clamp_integral(&self, value: F) -> F {
        clamp(
            value,
            -self.config.integral_limit,
            self.config.integral_limit,
        )
    }
}
