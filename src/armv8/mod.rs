//! Hardware backend for the ARMv8-A PMU cycle counter.
//!
//! Registers are accessed with `mrs`/`msr`. Every access here is privileged
//! except the PMCCNTR_EL0 read, which EL0 may take once PMUSERENR_EL0 grants
//! it.

pub mod regs;

use crate::{CycleCounterBackend, PmuError};

#[cfg(target_arch = "aarch64")]
use aarch64_cpu::{asm::barrier, registers::*};
#[cfg(target_arch = "aarch64")]
use core::{arch::asm, marker::PhantomData};
#[cfg(target_arch = "aarch64")]
use log::debug;

/// PMCR_EL0.LC is never set, so PMCCNTR_EL0 overflows at 32 bits.
pub const CYCLE_COUNTER_WIDTH: u32 = 32;

/// The cycle counter of the core this value was probed on.
///
/// Not `Send`: the counter registers are banked per core, moving the value
/// to another core would program a different counter.
#[derive(Debug)]
pub struct Armv8Pmu {
    #[cfg(target_arch = "aarch64")]
    _per_core: PhantomData<*const ()>,
    #[cfg(not(target_arch = "aarch64"))]
    never: core::convert::Infallible,
}

impl Armv8Pmu {
    /// Check that this core implements PMUv3 and that we run privileged.
    ///
    /// # Safety
    ///
    /// Must run at EL1 or above (CurrentEL is not readable from EL0), and the
    /// caller must stay on the same core until the counter is stopped.
    pub unsafe fn probe() -> Result<Self, PmuError> {
        #[cfg(target_arch = "aarch64")]
        {
            let el = CurrentEL.read(CurrentEL::EL);
            if el == 0 {
                return Err(PmuError::PrivilegeDenied);
            }

            let dfr0: u64;
            asm!("mrs {}, id_aa64dfr0_el1", out(reg) dfr0);
            // PMUVer, bits [11:8]. 0b1111 is an IMPLEMENTATION DEFINED PMU.
            let pmuver = (dfr0 >> 8) & 0xf;
            debug!("PMUVer {:#x} at EL{}", pmuver, el);
            if pmuver == 0 || pmuver == 0xf {
                return Err(PmuError::UnsupportedPlatform);
            }

            Ok(Armv8Pmu {
                _per_core: PhantomData,
            })
        }

        #[cfg(not(target_arch = "aarch64"))]
        {
            Err(PmuError::UnsupportedPlatform)
        }
    }
}

#[cfg(target_arch = "aarch64")]
impl CycleCounterBackend for Armv8Pmu {
    fn counter_width(&self) -> u32 {
        CYCLE_COUNTER_WIDTH
    }

    fn check_access(&self) -> Result<(), PmuError> {
        if CurrentEL.read(CurrentEL::EL) == 0 {
            return Err(PmuError::PrivilegeDenied);
        }
        Ok(())
    }

    fn isb(&mut self) {
        barrier::isb(barrier::SY);
    }

    fn write_pmuserenr(&mut self, value: u32) {
        // SAFETY: probe() established we run at EL1 or above.
        unsafe { asm!("msr pmuserenr_el0, {}", in(reg) value as u64) };
    }

    fn write_pmcr(&mut self, value: u32) {
        // SAFETY: as above. The controller masks reserved bits before this.
        unsafe { asm!("msr pmcr_el0, {}", in(reg) value as u64) };
    }

    fn write_pmintenset(&mut self, value: u32) {
        // SAFETY: as above.
        unsafe { asm!("msr pmintenset_el1, {}", in(reg) value as u64) };
    }

    fn write_pmcntenset(&mut self, value: u32) {
        // SAFETY: as above.
        unsafe { asm!("msr pmcntenset_el0, {}", in(reg) value as u64) };
    }

    fn read_pmccntr(&self) -> u64 {
        let value: u64;
        // SAFETY: readable at EL1, and at EL0 once PMUSERENR_EL0.CR is set.
        unsafe { asm!("mrs {}, pmccntr_el0", out(reg) value) };
        value
    }
}

// No value of `Armv8Pmu` exists off aarch64; probe() always fails there.
#[cfg(not(target_arch = "aarch64"))]
impl CycleCounterBackend for Armv8Pmu {
    fn counter_width(&self) -> u32 {
        match self.never {}
    }

    fn check_access(&self) -> Result<(), PmuError> {
        match self.never {}
    }

    fn isb(&mut self) {
        match self.never {}
    }

    fn write_pmuserenr(&mut self, _value: u32) {
        match self.never {}
    }

    fn write_pmcr(&mut self, _value: u32) {
        match self.never {}
    }

    fn write_pmintenset(&mut self, _value: u32) {
        match self.never {}
    }

    fn write_pmcntenset(&mut self, _value: u32) {
        match self.never {}
    }

    fn read_pmccntr(&self) -> u64 {
        match self.never {}
    }
}
