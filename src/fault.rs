// Per-cycle fault taxonomy and the reporting-sink capability
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

use std::time::Duration;

/// A recoverable fault in a single controller cycle.
///
/// The offending cycle is skipped with the controller state untouched, so the
/// previous output remains in effect. The next cycle with well-formed inputs
/// proceeds normally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CycleFault {
    /// The supplied elapsed time is negative.
    #[error("negative elapsed time")]
    NegativeElapsedTime,

    /// The supplied elapsed time is NaN or infinite.
    #[error("non-finite elapsed time")]
    NonFiniteElapsedTime,

    /// The setpoint or the process value is NaN or infinite.
    #[error("non-finite setpoint or process value")]
    NonFiniteInput,
}

/// A condition surfaced by the cyclic runner through its [`FaultSink`].
///
/// No fault propagates out of the runner thread; every per-cycle condition is
/// contained and reported here instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RunnerFault {
    /// The controller rejected this cycle's inputs; the previous output was
    /// retained.
    #[error("cycle skipped: {0}")]
    CycleSkipped(#[from] CycleFault),

    /// Cycle work took longer than the configured period. The next cycle
    /// starts immediately; the overrun extends wall-clock drift but no cycle
    /// is queued or dropped.
    #[error("cycle overrun: work took {work:?}, period is {period:?}")]
    Overrun {
        /// The configured cycle period.
        period: Duration,
        /// The wall-clock time the cycle's work actually took.
        work: Duration,
    },
}

/// Capability for receiving fault reports from a cyclic runner.
///
/// Injected at construction; the crate never reports through a process-wide
/// sink. Implementations must not block: reports are made from the timing
/// thread between compute and sleep.
pub trait FaultSink: Send {
    /// Receives one fault report.
    fn report(&self, fault: RunnerFault);
}

/// A sink that discards every report.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl FaultSink for NullSink {
    fn report(&self, _fault: RunnerFault) {}
}

impl<S: FaultSink + ?Sized> FaultSink for Box<S> {
    fn report(&self, fault: RunnerFault) {
        (**self).report(fault)
    }
}
