// Debounce timers backing the deadband freeze and the stability detectors
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

use num_traits::Float;

/// A timer that requires a condition to hold continuously for a minimum
/// duration before reporting it as satisfied.
///
/// The caller evaluates the tolerance predicate itself and feeds the verdict
/// into [`DebounceTimer::observe`] together with the time elapsed since the
/// previous observation. The accumulated in-tolerance duration resets to zero
/// the instant the predicate is violated; the timer reports satisfied once the
/// accumulated duration reaches the required duration, and keeps reporting
/// satisfied until the next violation.
#[derive(Copy, Clone, Debug)]
pub struct DebounceTimer<F: Float> {
    required: F,
    accumulated: F,
    satisfied: bool,
}

impl<F: Float> DebounceTimer<F> {
    /// Creates a timer that reports satisfied after the condition has held
    /// continuously for `required` seconds.
    pub fn new(required: F) -> Self {
        Self {
            required,
            accumulated: F::zero(),
            satisfied: false,
        }
    }

    /// Feeds one observation into the timer and returns the debounced verdict.
    ///
    /// `in_tolerance` is the current value of the tolerance predicate and
    /// `elapsed` the time in seconds since the previous observation.
    pub fn observe(&mut self, in_tolerance: bool, elapsed: F) -> bool {
        if in_tolerance {
            self.accumulated = self.accumulated + elapsed;
        } else {
            self.accumulated = F::zero();
        }
        self.satisfied = in_tolerance && self.accumulated >= self.required;
        self.satisfied
    }

    /// Returns the verdict of the most recent observation.
    pub fn satisfied(&self) -> bool {
        self.satisfied
    }

    /// Returns the in-tolerance duration accumulated so far.
    pub fn accumulated(&self) -> F {
        self.accumulated
    }

    /// Clears the accumulator and the satisfied flag.
    pub fn reset(&mut self) {
        self.accumulated = F::zero();
        self.satisfied = false;
    }
}

#[cfg(test)]
mod tests {
    use super::DebounceTimer;

    #[test]
    fn test_satisfied_only_after_required_duration() {
        let mut timer = DebounceTimer::new(1.0);

        for _ in 0..3 {
            assert!(!timer.observe(true, 0.25));
        }
        assert!(timer.observe(true, 0.25));
        assert!(timer.satisfied());
    }

    #[test]
    fn test_violation_resets_accumulator() {
        let mut timer = DebounceTimer::new(1.0);

        assert!(!timer.observe(true, 0.75));
        assert!(!timer.observe(false, 0.25));
        assert_eq!(timer.accumulated(), 0.0);

        // The full duration is required again after a violation
        assert!(!timer.observe(true, 0.75));
        assert!(timer.observe(true, 0.25));
    }

    #[test]
    fn test_stays_satisfied_while_predicate_holds() {
        let mut timer = DebounceTimer::new(0.5);

        assert!(timer.observe(true, 0.5));
        for _ in 0..5 {
            assert!(timer.observe(true, 0.1));
        }
        assert!(!timer.observe(false, 0.1));
        assert!(!timer.satisfied());
    }

    #[test]
    fn test_zero_required_duration_is_immediate() {
        let mut timer = DebounceTimer::new(0.0);

        assert!(timer.observe(true, 0.0));
        assert!(!timer.observe(false, 0.1));
    }
}
