// Bounded time-series recording of controller-internal signals
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

use std::collections::VecDeque;
use std::ops::BitOr;

use num_traits::Float;

/// A controller-internal signal that the historian can record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The proportional term.
    Proportional,
    /// The integral accumulator.
    Integral,
    /// The derivative term.
    Derivative,
    /// The control error.
    Error,
    /// The raw setpoint passed into the cycle.
    Setpoint,
    /// The process value passed into the cycle.
    ProcessValue,
    /// The clamped controller output.
    Output,
}

impl Channel {
    /// All recordable channels, in recording order.
    pub const ALL: [Channel; 7] = [
        Channel::Proportional,
        Channel::Integral,
        Channel::Derivative,
        Channel::Error,
        Channel::Setpoint,
        Channel::ProcessValue,
        Channel::Output,
    ];

    fn index(self) -> usize {
        match self {
            Channel::Proportional => 0,
            Channel::Integral => 1,
            Channel::Derivative => 2,
            Channel::Error => 3,
            Channel::Setpoint => 4,
            Channel::ProcessValue => 5,
            Channel::Output => 6,
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// A set of [`Channel`]s selecting what the historian records.
///
/// Channels compose with `|`, so a selection reads the same way it did as a
/// flag union in classic historian configurations:
///
/// ```
/// use cyclic_pid::historian::{Channel, ChannelSet};
///
/// let set = Channel::Output | Channel::Error | Channel::Setpoint;
/// assert!(set.contains(Channel::Output));
/// assert!(!set.contains(Channel::Integral));
/// assert_eq!(set.iter().count(), 3);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelSet(u8);

impl ChannelSet {
    /// The empty selection; the historian records nothing, not even time.
    pub const EMPTY: ChannelSet = ChannelSet(0);

    /// Every recordable channel.
    pub const ALL: ChannelSet = ChannelSet((1 << 7) - 1);

    /// Returns this selection with `channel` added.
    #[must_use]
    pub fn with(self, channel: Channel) -> Self {
        ChannelSet(self.0 | channel.bit())
    }

    /// Returns true if `channel` is selected.
    pub fn contains(self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// Returns true if no channel is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the selected channels in recording order.
    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |ch| self.contains(*ch))
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        ChannelSet::EMPTY.with(channel)
    }
}

impl BitOr for Channel {
    type Output = ChannelSet;

    fn bitor(self, rhs: Channel) -> ChannelSet {
        ChannelSet::EMPTY.with(self).with(rhs)
    }
}

impl BitOr<Channel> for ChannelSet {
    type Output = ChannelSet;

    fn bitor(self, rhs: Channel) -> ChannelSet {
        self.with(rhs)
    }
}

impl BitOr for ChannelSet {
    type Output = ChannelSet;

    fn bitor(self, rhs: ChannelSet) -> ChannelSet {
        ChannelSet(self.0 | rhs.0)
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<T: IntoIterator<Item = Channel>>(iter: T) -> Self {
        iter.into_iter().fold(ChannelSet::EMPTY, ChannelSet::with)
    }
}

/// Construction-time historian settings.
#[derive(Copy, Clone, Debug)]
pub struct HistorianConfig {
    /// The channels to record each cycle.
    pub channels: ChannelSet,
    /// Maximum samples retained per channel before the oldest is evicted.
    pub capacity: usize,
}

impl HistorianConfig {
    /// Default retention per channel.
    pub const DEFAULT_CAPACITY: usize = 100_000;

    /// Records `channels` with the default capacity.
    pub fn new(channels: impl Into<ChannelSet>) -> Self {
        Self {
            channels: channels.into(),
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    /// Replaces the per-channel capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for HistorianConfig {
    fn default() -> Self {
        HistorianConfig::new(ChannelSet::EMPTY)
    }
}

/// One cycle's worth of recordable signals.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CycleRecord<F> {
    pub p: F,
    pub i: F,
    pub d: F,
    pub error: F,
    pub setpoint: F,
    pub process_value: F,
    pub output: F,
}

impl<F: Copy> CycleRecord<F> {
    fn get(&self, channel: Channel) -> F {
        match channel {
            Channel::Proportional => self.p,
            Channel::Integral => self.i,
            Channel::Derivative => self.d,
            Channel::Error => self.error,
            Channel::Setpoint => self.setpoint,
            Channel::ProcessValue => self.process_value,
            Channel::Output => self.output,
        }
    }
}

/// Bounded per-channel sample buffers written by the controller every cycle.
///
/// Each selected channel owns a fixed-capacity FIFO ring buffer; once full,
/// the oldest sample is evicted on each insertion. A shared time channel is
/// recorded whenever any other channel is recorded, and only then, holding
/// the cumulative elapsed time since the first sample.
#[derive(Clone, Debug)]
pub struct Historian<F> {
    channels: ChannelSet,
    capacity: usize,
    buffers: [VecDeque<F>; 7],
    time: VecDeque<F>,
}

impl<F: Float> Historian<F> {
    pub(crate) fn new(config: HistorianConfig) -> Self {
        Self {
            channels: config.channels,
            capacity: config.capacity,
            buffers: Default::default(),
            time: VecDeque::new(),
        }
    }

    /// Returns the selected channels.
    pub fn channels(&self) -> ChannelSet {
        self.channels
    }

    /// Returns the maximum number of samples retained per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of samples currently stored per selected channel.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns true if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Copies out the recorded samples of `channel` in recording order.
    ///
    /// Returns an empty sequence for channels that are not selected.
    pub fn samples(&self, channel: Channel) -> Vec<F> {
        self.buffers[channel.index()].iter().copied().collect()
    }

    /// Copies out the shared time channel in recording order.
    pub fn time(&self) -> Vec<F> {
        self.time.iter().copied().collect()
    }

    pub(crate) fn record(&mut self, record: &CycleRecord<F>, time: F) {
        if self.channels.is_empty() || self.capacity == 0 {
            return;
        }
        for channel in self.channels.iter() {
            Self::push(&mut self.buffers[channel.index()], record.get(channel), self.capacity);
        }
        Self::push(&mut self.time, time, self.capacity);
    }

    fn push(buffer: &mut VecDeque<F>, value: F, capacity: usize) {
        if buffer.len() == capacity {
            buffer.pop_front();
        }
        buffer.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: f64) -> CycleRecord<f64> {
        CycleRecord {
            p: value,
            i: value,
            d: value,
            error: value,
            setpoint: value,
            process_value: value,
            output: value,
        }
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let config = HistorianConfig::new(Channel::Output).with_capacity(3);
        let mut historian = Historian::new(config);

        for (i, value) in [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().enumerate() {
            historian.record(&record(value), i as f64);
        }

        assert_eq!(historian.samples(Channel::Output), vec![3.0, 4.0, 5.0]);
        assert_eq!(historian.time(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_time_recorded_iff_any_channel_recorded() {
        let mut empty = Historian::<f64>::new(HistorianConfig::default());
        empty.record(&record(1.0), 0.0);
        assert!(empty.is_empty());
        assert!(empty.time().is_empty());

        let mut single = Historian::new(HistorianConfig::new(Channel::Error));
        single.record(&record(1.0), 0.0);
        assert_eq!(single.len(), 1);
        assert_eq!(single.time(), vec![0.0]);
    }

    #[test]
    fn test_unselected_channel_reads_empty() {
        let mut historian = Historian::new(HistorianConfig::new(Channel::Output));
        historian.record(&record(1.0), 0.0);
        assert!(historian.samples(Channel::Integral).is_empty());
    }
}
