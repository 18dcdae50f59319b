//! In-memory PMU register bank.
//!
//! Behaves like the ARMv8 registers closely enough to check the controller's
//! write sequence and the measurement arithmetic without privileged hardware:
//! PMCR_EL0.C clears the counter, the set registers ignore zero bits, and the
//! counter only advances while PMCR_EL0.E and PMCNTENSET_EL0.C are both set.
//!
//! The backend trait is implemented for `&SimulatedPmu`, so a test keeps its
//! own handle on the bank while the controller owns the reference.

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::armv8::regs::{Pmcntenset, Pmcr};
use crate::session::width_mask;
use crate::{CycleCounterBackend, PmuError};

/// One register access, in the order the backend saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAccess {
    Isb,
    Pmuserenr(u32),
    Pmcr(u32),
    Pmintenset(u32),
    Pmcntenset(u32),
    /// A PMCCNTR_EL0 read and the value it returned.
    Pmccntr(u64),
}

/// What `check_access` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    #[default]
    Granted,
    Denied,
    Unsupported,
}

#[derive(Debug)]
pub struct SimulatedPmu {
    width: u32,
    ambient_cycles: u64,
    policy: AccessPolicy,
    pmuserenr: Cell<u32>,
    pmcr: Cell<u32>,
    pmintenset: Cell<u32>,
    pmcntenset: Cell<u32>,
    pmccntr: Cell<u64>,
    idle_reads: Cell<usize>,
    trace: RefCell<Vec<RegisterAccess>>,
}

impl Default for SimulatedPmu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPmu {
    /// Cycles that pass between two back to back reads of a running counter.
    pub const DEFAULT_AMBIENT_CYCLES: u64 = 4;

    /// A 32-bit counter with every register at zero.
    pub fn new() -> Self {
        SimulatedPmu {
            width: 32,
            ambient_cycles: Self::DEFAULT_AMBIENT_CYCLES,
            policy: AccessPolicy::Granted,
            pmuserenr: Cell::new(0),
            pmcr: Cell::new(0),
            pmintenset: Cell::new(0),
            pmcntenset: Cell::new(0),
            pmccntr: Cell::new(0),
            idle_reads: Cell::new(0),
            trace: RefCell::new(Vec::new()),
        }
    }

    /// Counter width in bits, clamped to `1..=64`.
    pub fn with_width(mut self, bits: u32) -> Self {
        self.width = bits.clamp(1, 64);
        self
    }

    pub fn with_ambient_cycles(mut self, cycles: u64) -> Self {
        self.ambient_cycles = cycles;
        self
    }

    pub fn with_access(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run `cycles` cycles of work. Ignored unless the counter is counting.
    pub fn advance(&self, cycles: u64) {
        if self.is_counting() {
            let next = self.pmccntr.get().wrapping_add(cycles) & width_mask(self.width);
            self.pmccntr.set(next);
        }
    }

    /// Set the raw counter value, e.g. just below the wrap point.
    pub fn preload(&self, value: u64) {
        self.pmccntr.set(value & width_mask(self.width));
    }

    pub fn is_counting(&self) -> bool {
        Pmcr::from_bits_retain(self.pmcr.get()).contains(Pmcr::E)
            && Pmcntenset::from_bits_retain(self.pmcntenset.get()).contains(Pmcntenset::C)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn pmuserenr(&self) -> u32 {
        self.pmuserenr.get()
    }

    pub fn pmcr(&self) -> u32 {
        self.pmcr.get()
    }

    pub fn pmintenset(&self) -> u32 {
        self.pmintenset.get()
    }

    pub fn pmcntenset(&self) -> u32 {
        self.pmcntenset.get()
    }

    pub fn counter(&self) -> u64 {
        self.pmccntr.get()
    }

    /// PMCCNTR_EL0 reads taken while the counter was not counting.
    pub fn idle_reads(&self) -> usize {
        self.idle_reads.get()
    }

    pub fn trace(&self) -> Vec<RegisterAccess> {
        self.trace.borrow().clone()
    }

    /// The trace without counter reads.
    pub fn writes(&self) -> Vec<RegisterAccess> {
        self.trace
            .borrow()
            .iter()
            .copied()
            .filter(|access| !matches!(access, RegisterAccess::Pmccntr(_)))
            .collect()
    }

    fn record(&self, access: RegisterAccess) {
        self.trace.borrow_mut().push(access);
    }
}

impl CycleCounterBackend for &SimulatedPmu {
    fn counter_width(&self) -> u32 {
        self.width
    }

    fn check_access(&self) -> Result<(), PmuError> {
        match self.policy {
            AccessPolicy::Granted => Ok(()),
            AccessPolicy::Denied => Err(PmuError::PrivilegeDenied),
            AccessPolicy::Unsupported => Err(PmuError::UnsupportedPlatform),
        }
    }

    fn isb(&mut self) {
        self.record(RegisterAccess::Isb);
    }

    fn write_pmuserenr(&mut self, value: u32) {
        self.record(RegisterAccess::Pmuserenr(value));
        self.pmuserenr.set(value);
    }

    fn write_pmcr(&mut self, value: u32) {
        self.record(RegisterAccess::Pmcr(value));
        // P would reset the event counters, none are modelled.
        if Pmcr::from_bits_retain(value).contains(Pmcr::C) {
            self.pmccntr.set(0);
        }
        self.pmcr.set(value);
    }

    fn write_pmintenset(&mut self, value: u32) {
        self.record(RegisterAccess::Pmintenset(value));
        self.pmintenset.set(self.pmintenset.get() | value);
    }

    fn write_pmcntenset(&mut self, value: u32) {
        self.record(RegisterAccess::Pmcntenset(value));
        self.pmcntenset.set(self.pmcntenset.get() | value);
    }

    fn read_pmccntr(&self) -> u64 {
        let value = self.pmccntr.get();
        self.record(RegisterAccess::Pmccntr(value));
        if self.is_counting() {
            self.advance(self.ambient_cycles);
        } else {
            self.idle_reads.set(self.idle_reads.get() + 1);
        }
        value
    }
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;

    #[test]
    fn counter_is_frozen_until_enabled() {
        let sim = SimulatedPmu::new();
        sim.advance(100);
        assert_eq!(sim.counter(), 0);

        let mut backend = &sim;
        backend.write_pmcntenset(Pmcntenset::C.bits());
        assert!(!sim.is_counting());
        backend.write_pmcr(Pmcr::E.bits());
        assert!(sim.is_counting());

        sim.advance(100);
        assert_eq!(sim.counter(), 100);
    }

    #[test]
    fn cycle_reset_bit_clears_the_counter() {
        let sim = SimulatedPmu::new();
        sim.preload(1234);

        let mut backend = &sim;
        backend.write_pmcr((Pmcr::P | Pmcr::C).bits());
        assert_eq!(sim.counter(), 0);
    }

    #[test]
    fn set_registers_ignore_zero_writes() {
        let sim = SimulatedPmu::new();
        let mut backend = &sim;
        backend.write_pmcntenset(Pmcntenset::C.bits());
        backend.write_pmcntenset(0);
        assert_eq!(sim.pmcntenset(), Pmcntenset::C.bits());
    }

    #[test]
    fn counter_wraps_at_width() {
        let sim = SimulatedPmu::new().with_width(8);
        let mut backend = &sim;
        backend.write_pmcntenset(Pmcntenset::C.bits());
        backend.write_pmcr(Pmcr::E.bits());

        sim.preload(250);
        sim.advance(10);
        assert_eq!(sim.counter(), 4);
    }

    #[test]
    fn reads_of_a_stopped_counter_are_counted() {
        let sim = SimulatedPmu::new();
        let backend = &sim;
        assert_eq!(backend.read_pmccntr(), 0);
        assert_eq!(sim.idle_reads(), 1);
        assert_eq!(sim.trace(), vec![RegisterAccess::Pmccntr(0)]);
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn access_policy() {
        let denied = SimulatedPmu::new().with_access(AccessPolicy::Denied);
        assert_eq!((&denied).check_access(), Err(PmuError::PrivilegeDenied));

        let unsupported = SimulatedPmu::new().with_access(AccessPolicy::Unsupported);
        assert_eq!(
            (&unsupported).check_access(),
            Err(PmuError::UnsupportedPlatform)
        );
    }
}
