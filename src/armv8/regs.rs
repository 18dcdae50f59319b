//! Bit layouts for PMCR_EL0, PMUSERENR_EL0, PMCNTENSET_EL0 and PMINTENSET_EL1.
//!
//! Only the bits the cycle counter lifecycle touches are named.

use bitflags::bitflags;

bitflags! {
    /// Performance Monitors Control Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pmcr: u32 {
        /// Enable all counters, including PMCCNTR_EL0.
        const E = 1 << 0;
        /// Reset all event counters except PMCCNTR_EL0.
        const P = 1 << 1;
        /// Reset PMCCNTR_EL0.
        const C = 1 << 2;
        /// Clock divider.
        const D = 1 << 3;
        /// Export enable.
        const X = 1 << 4;
        /// Disable cycle counter when event counting is prohibited.
        const DP = 1 << 5;
    }
}

/// Bits of PMCR_EL0 that may be written. Everything above is reserved here.
pub const PMCR_MASK: u32 = 0x3f;

bitflags! {
    /// Performance Monitors User Enable Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pmuserenr: u32 {
        /// Traps access enable.
        const EN = 1 << 0;
        /// Cycle counter read access enable.
        const CR = 1 << 2;
        /// Event counter read access enable.
        const ER = 1 << 3;
    }
}

bitflags! {
    /// Performance Monitors Count Enable Set register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pmcntenset: u32 {
        /// Cycle counter enable.
        const C = 1 << 31;
    }
}

bitflags! {
    /// Performance Monitors Interrupt Enable Set register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pmintenset: u32 {
        /// Cycle counter overflow interrupt enable.
        const C = 1 << 31;
    }
}

/// Value written to PMCNTENSET_EL0 to turn the cycle counter off.
///
/// PMCNTENSET ignores zero bits, so on hardware this write changes nothing;
/// the counter actually stops because PMCR_EL0.E is cleared afterwards.
pub const PMCNTENSET_DISABLE: Pmcntenset = Pmcntenset::empty();

/// Value written to PMINTENSET_EL1 to leave the overflow interrupt off.
pub const PMINTENSET_DISABLE: Pmintenset = Pmintenset::empty();
