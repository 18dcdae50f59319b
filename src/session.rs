//! Measurement of one workload invocation: read, run, read, subtract.

use core::fmt;

use log::info;

use crate::controller::CycleCounter;
use crate::CycleCounterBackend;

/// All ones in the low `width` bits.
pub(crate) fn width_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// One raw reading of the cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSample {
    value: u64,
    width: u32,
}

impl CycleSample {
    /// A reading of a counter `width` bits wide. Bits above the width are
    /// dropped.
    pub fn new(value: u64, width: u32) -> Self {
        CycleSample {
            value: value & width_mask(width),
            width,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

/// Cycles elapsed between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CycleDelta(u64);

impl CycleDelta {
    /// `after - before` modulo the counter width.
    ///
    /// The counter is free running, so `after` may be numerically smaller
    /// than `before`. That is a wrap, not an error; the result is right as
    /// long as the counter wrapped at most once.
    pub fn between(before: CycleSample, after: CycleSample) -> Self {
        debug_assert_eq!(before.width, after.width);
        CycleDelta(after.value.wrapping_sub(before.value) & width_mask(after.width))
    }

    pub fn cycles(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CycleDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<B: CycleCounterBackend> CycleCounter<B> {
    /// Count the cycles `workload` takes.
    ///
    /// Panics in `workload` are not caught.
    pub fn measure<F: FnOnce()>(&self, workload: F) -> CycleDelta {
        self.measure_with(workload).0
    }

    /// Like [`measure`](Self::measure), also handing back what the workload
    /// returned.
    pub fn measure_with<T, F: FnOnce() -> T>(&self, workload: F) -> (CycleDelta, T) {
        let before = self.read();
        let output = workload();
        let after = self.read();

        let delta = CycleDelta::between(before, after);
        info!("PMU Test - CPU cycle count: {}", delta);
        (delta, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound_yields_elapsed_cycles() {
        for width in [8, 16, 32, 48, 64] {
            let top = width_mask(width);
            let before = CycleSample::new(top - 4, width);
            let after = CycleSample::new(3, width);
            assert_eq!(CycleDelta::between(before, after).cycles(), 8, "width {width}");
        }
    }

    #[test]
    fn delta_without_wrap_is_plain_subtraction() {
        let before = CycleSample::new(1_000, 32);
        let after = CycleSample::new(1_750, 32);
        assert_eq!(CycleDelta::between(before, after).cycles(), 750);
        assert_eq!(CycleDelta::between(before, before).cycles(), 0);
    }

    #[test]
    fn sample_drops_bits_above_width() {
        let sample = CycleSample::new(0x1_0000_0005, 32);
        assert_eq!(sample.value(), 5);
        assert_eq!(sample.width(), 32);
        assert_eq!(CycleSample::new(u64::MAX, 64).value(), u64::MAX);
    }
}

#[cfg(all(test, feature = "sim"))]
mod sim_tests {
    use super::*;
    use crate::sim::SimulatedPmu;

    #[test]
    fn measure_counts_workload_cycles() {
        let sim = SimulatedPmu::new().with_ambient_cycles(0);
        let counter = CycleCounter::start(&sim).unwrap();

        let delta = counter.measure(|| sim.advance(1_234));
        assert_eq!(delta.cycles(), 1_234);
    }

    #[test]
    fn measure_across_a_wrap() {
        let sim = SimulatedPmu::new().with_ambient_cycles(0);
        let counter = CycleCounter::start(&sim).unwrap();
        sim.preload((1 << 32) - 5);

        let delta = counter.measure(|| sim.advance(8));
        assert_eq!(sim.counter(), 3);
        assert_eq!(delta.cycles(), 8);
    }

    #[test]
    fn back_to_back_reads_advance_a_little() {
        let sim = SimulatedPmu::new();
        let counter = CycleCounter::start(&sim).unwrap();

        let before = counter.read();
        let after = counter.read();
        assert!(after.value() >= before.value());
        assert_eq!(
            CycleDelta::between(before, after).cycles(),
            SimulatedPmu::DEFAULT_AMBIENT_CYCLES
        );
    }

    #[test]
    fn measure_with_returns_workload_output() {
        let sim = SimulatedPmu::new().with_ambient_cycles(0);
        let counter = CycleCounter::start(&sim).unwrap();

        let (delta, sum) = counter.measure_with(|| {
            sim.advance(10);
            (1..=4).sum::<u32>()
        });
        assert_eq!(sum, 10);
        assert_eq!(delta.cycles(), 10);
    }
}
