//! This is the controller for the PMU cycle counter.
//!
//! A [`CycleCounter`] only exists between a successful `start` and `stop`,
//! so holding one is the proof that PMCCNTR_EL0 may be read.
//!
//! Single core, no locking: the caller keeps `start`, `measure` and `stop`
//! on one core and never runs them concurrently.

use log::{debug, info, warn};

use crate::armv8::regs::{
    Pmcntenset, Pmcr, Pmuserenr, PMCNTENSET_DISABLE, PMCR_MASK, PMINTENSET_DISABLE,
};
use crate::session::CycleSample;
use crate::{CycleCounterBackend, PmuError};

/// Whether the counter subsystem is enabled on this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PmuState {
    enabled: bool,
}

impl PmuState {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Mask `value` to the writable PMCR_EL0 bits, synchronize, then write it.
///
/// Every control register write goes through here so reserved bits are
/// never asserted.
pub(crate) fn pmcr_write<B: CycleCounterBackend>(backend: &mut B, value: u32) {
    let value = value & PMCR_MASK;
    backend.isb();
    backend.write_pmcr(value);
}

/// An enabled cycle counter.
#[must_use = "the counter stays enabled until `stop` is called"]
#[derive(Debug)]
pub struct CycleCounter<B: CycleCounterBackend> {
    backend: B,
    state: PmuState,
}

impl<B: CycleCounterBackend> CycleCounter<B> {
    /// Grant user reads, reset the counters and start the cycle counter.
    ///
    /// The five writes happen in a fixed order; reordering them can leave the
    /// counter stopped or raising overflow interrupts. Nothing is written if
    /// the backend refuses access. A failure after that point is not rolled
    /// back.
    pub fn start(mut backend: B) -> Result<Self, PmuError> {
        if let Err(e) = backend.check_access() {
            warn!("PMU enable refused: {}", e);
            return Err(e);
        }

        // User mode read access to the cycle and event counters.
        backend.write_pmuserenr((Pmuserenr::EN | Pmuserenr::ER | Pmuserenr::CR).bits());
        // Reset event counters and the cycle counter.
        pmcr_write(&mut backend, (Pmcr::P | Pmcr::C).bits());
        // No overflow interrupt.
        backend.write_pmintenset(PMINTENSET_DISABLE.bits());
        backend.write_pmcntenset(Pmcntenset::C.bits());
        pmcr_write(&mut backend, Pmcr::E.bits());
        debug!("cycle counter running, width {}", backend.counter_width());

        info!("PMU access enabled.");
        Ok(CycleCounter {
            backend,
            state: PmuState { enabled: true },
        })
    }

    /// Current value of the cycle counter.
    pub fn read(&self) -> CycleSample {
        debug_assert!(self.state.enabled);
        CycleSample::new(self.backend.read_pmccntr(), self.backend.counter_width())
    }

    /// Stop the cycle counter and revoke user access, returning the backend.
    ///
    /// The control register receives `!E` masked to 0x3f rather than the
    /// current value with E cleared. That also asserts P, C, D, X and DP. It
    /// is kept bit-for-bit for hardware compatibility but is most likely
    /// unintended.
    pub fn stop(mut self) -> Result<B, PmuError> {
        if let Err(e) = self.backend.check_access() {
            warn!("PMU disable refused: {}", e);
            return Err(e);
        }

        self.backend.write_pmcntenset(PMCNTENSET_DISABLE.bits());
        pmcr_write(&mut self.backend, !Pmcr::E.bits());
        self.backend.write_pmuserenr(Pmuserenr::empty().bits());
        self.state.enabled = false;

        info!("PMU access disabled.");
        Ok(self.backend)
    }

    pub fn state(&self) -> PmuState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
