#![cfg_attr(not(test), no_std)]

#[cfg(feature = "sim")]
extern crate alloc;

pub mod armv8;
pub mod controller;
pub mod error;
pub mod session;
#[cfg(feature = "sim")]
pub mod sim;
pub mod workload;

pub use crate::armv8::Armv8Pmu;
pub use crate::controller::{CycleCounter, PmuState};
pub use crate::error::PmuError;
pub use crate::session::{CycleDelta, CycleSample};

/// Raw access to the registers behind the cycle counter.
///
/// Implementations do no sequencing and no masking, they only move values in
/// and out of registers. The order of writes is owned by [`CycleCounter`].
pub trait CycleCounterBackend {
    /// Number of significant bits returned by `read_pmccntr`.
    fn counter_width(&self) -> u32;

    /// Check that the calling context may write the privileged registers.
    fn check_access(&self) -> Result<(), PmuError>;

    /// Instruction synchronization barrier.
    fn isb(&mut self);

    /// Write PMUSERENR_EL0.
    fn write_pmuserenr(&mut self, value: u32);

    /// Write PMCR_EL0. The value is written as given.
    fn write_pmcr(&mut self, value: u32);

    /// Write PMINTENSET_EL1.
    fn write_pmintenset(&mut self, value: u32);

    /// Write PMCNTENSET_EL0.
    fn write_pmcntenset(&mut self, value: u32);

    /// Read PMCCNTR_EL0.
    fn read_pmccntr(&self) -> u64;
}
