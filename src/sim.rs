// Plant models for closed-loop testing and demonstration
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

/// Contract between the controller and a process under control.
///
/// The controller never depends on a plant's internals, only on this
/// "compute the next process value given the command and the elapsed time"
/// operation, so a model can be substituted with a real sensor/actuator pair.
pub trait Plant {
    /// Advances the plant by `elapsed` seconds under the given command and
    /// returns the new process value.
    fn step(&mut self, command: f64, elapsed: f64) -> f64;
}

/// A first-order lag process: y' = (K·u − y) / τ.
#[derive(Copy, Clone, Debug)]
pub struct FirstOrderPlant {
    gain: f64,
    time_constant: f64,
    output: f64,
}

impl FirstOrderPlant {
    /// Creates a plant with static gain `gain` and time constant
    /// `time_constant` seconds, at rest at zero.
    pub fn new(gain: f64, time_constant: f64) -> Self {
        Self {
            gain,
            time_constant,
            output: 0.0,
        }
    }

    /// Returns the current process value.
    pub fn output(&self) -> f64 {
        self.output
    }
}

impl Plant for FirstOrderPlant {
    fn step(&mut self, command: f64, elapsed: f64) -> f64 {
        self.output += (self.gain * command - self.output) / self.time_constant * elapsed;
        self.output
    }
}

#[cfg(feature = "simulation")]
mod mass_spring_damper {
    use nalgebra as na;

    use super::Plant;

    /// A mass-spring-damper process in state-space form:
    /// ┌     ┐   ┌              ┐┌    ┐   ┌     ┐
    /// │ p'  │ = │  0     1     ││ p  │ + │ 0   │ u
    /// │ p'' │   │  -ωₙ²  -2ζωₙ ││ p' │   │ ωₙ² │
    /// └     ┘   └              ┘└    ┘   └     ┘
    /// integrated by forward Euler in [`Plant::step`].
    #[derive(Copy, Clone, Debug)]
    pub struct MassSpringDamper {
        /// Natural frequency ωₙ in rad/s.
        pub natural_frequency: f64,
        /// Damping ratio ζ.
        pub damping_ratio: f64,
        state: na::Vector2<f64>,
    }

    impl MassSpringDamper {
        /// Creates the plant at rest at the origin.
        pub fn new(natural_frequency: f64, damping_ratio: f64) -> Self {
            Self {
                natural_frequency,
                damping_ratio,
                state: na::Vector2::zeros(),
            }
        }

        fn f(&self, x: na::Vector2<f64>, u: f64) -> na::Vector2<f64> {
            let omega_sq = self.natural_frequency.powi(2);
            let two_zeta_omega = 2.0 * self.natural_frequency * self.damping_ratio;

            let mat_a = na::Matrix2::new(0.0, 1.0, -omega_sq, -two_zeta_omega);
            let mat_b = na::Vector2::new(0.0, omega_sq);

            mat_a * x + mat_b * u
        }
    }

    impl Plant for MassSpringDamper {
        fn step(&mut self, command: f64, elapsed: f64) -> f64 {
            self.state += self.f(self.state, command) * elapsed;
            self.state[0]
        }
    }
}

#[cfg(feature = "simulation")]
pub use mass_spring_damper::MassSpringDamper;
