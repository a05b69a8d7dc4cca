//! The exception controller (§4.I): priority resolution, vector
//! addresses, and the register/mode-switch sequence common to every
//! exception entry.

use crate::psr::{Mode, Psr, F, I, T};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Reset,
    DataAbort,
    Fiq,
    Irq,
    PrefetchAbort,
    Undefined,
    Swi,
}

impl ExceptionKind {
    /// Lower is higher priority. Reset beats everything; a data abort
    /// beats FIQ/IRQ since a stuck bus needs servicing first; prefetch
    /// abort and undefined/SWI are lowest because they only matter once
    /// the faulting instruction is actually about to execute.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Reset => 0,
            Self::DataAbort => 1,
            Self::Fiq => 2,
            Self::Irq => 3,
            Self::PrefetchAbort => 4,
            Self::Undefined | Self::Swi => 5,
        }
    }

    #[must_use]
    pub const fn vector(self) -> u32 {
        match self {
            Self::Reset => 0x0000_0000,
            Self::Undefined => 0x0000_0004,
            Self::Swi => 0x0000_0008,
            Self::PrefetchAbort => 0x0000_000C,
            Self::DataAbort => 0x0000_0010,
            Self::Irq => 0x0000_0018,
            Self::Fiq => 0x0000_001C,
        }
    }

    #[must_use]
    pub const fn target_mode(self) -> Mode {
        match self {
            Self::Reset | Self::Swi => Mode::Svc,
            Self::Undefined => Mode::Und,
            Self::PrefetchAbort | Self::DataAbort => Mode::Abt,
            Self::Irq => Mode::Irq,
            Self::Fiq => Mode::Fiq,
        }
    }

    /// Amount subtracted from the saved link value to recover the address
    /// at which execution should resume (e.g. `SUBS PC, LR, #offset`).
    /// The caller supplies the link value as "address of the instruction
    /// after the one that trapped, as seen by the fetch stage" (PC+4 in
    /// this core's pipeline convention); this offset corrects for that.
    #[must_use]
    pub const fn link_offset(self) -> u32 {
        match self {
            Self::Reset => 0,
            Self::DataAbort => 8,
            Self::Undefined | Self::Swi | Self::PrefetchAbort | Self::Irq | Self::Fiq => 4,
        }
    }

    /// Whether entry masks FIQ in addition to IRQ. Only reset and FIQ
    /// itself do (FIQ is non-nestable by default).
    #[must_use]
    pub const fn masks_fiq(self) -> bool {
        matches!(self, Self::Reset | Self::Fiq)
    }
}

/// Result of resolving the highest-priority pending exception against the
/// CPU's current interrupt mask state. `None` means nothing pending (or
/// everything pending is masked).
#[must_use]
pub fn highest_priority(pending: &[ExceptionKind], psr: Psr) -> Option<ExceptionKind> {
    pending
        .iter()
        .copied()
        .filter(|k| match k {
            ExceptionKind::Irq => !psr.irq_disabled(),
            ExceptionKind::Fiq => !psr.fiq_disabled(),
            _ => true,
        })
        .min_by_key(|k| k.priority())
}

/// The entry sequence common to every exception (§4.I step-by-step):
/// save SPSR, switch mode, mask interrupts as required, clear Thumb,
/// compute the new PC. Register banking itself (writing `LR_<mode>`) is
/// the caller's job since it needs the register file, not just PSRs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionEntry {
    pub new_mode: Mode,
    pub new_cpsr: Psr,
    pub spsr_to_save: Psr,
    pub new_pc: u32,
    pub link_value: u32,
}

#[must_use]
pub fn enter(kind: ExceptionKind, current_cpsr: Psr, link_value: u32) -> ExceptionEntry {
    let mut new_cpsr = current_cpsr;
    new_cpsr.set_mode(kind.target_mode());
    new_cpsr.set_flag(I, true);
    if kind.masks_fiq() {
        new_cpsr.set_flag(F, true);
    }
    new_cpsr.set_flag(T, false);
    ExceptionEntry {
        new_mode: kind.target_mode(),
        new_cpsr,
        spsr_to_save: current_cpsr,
        new_pc: kind.vector(),
        link_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_outranks_everything() {
        let pending = [ExceptionKind::Fiq, ExceptionKind::Reset, ExceptionKind::Irq];
        assert_eq!(
            highest_priority(&pending, Psr::from_bits(0)),
            Some(ExceptionKind::Reset)
        );
    }

    #[test]
    fn masked_irq_is_skipped() {
        let mut psr = Psr::from_bits(0);
        psr.set_flag(I, true);
        let pending = [ExceptionKind::Irq, ExceptionKind::PrefetchAbort];
        assert_eq!(
            highest_priority(&pending, psr),
            Some(ExceptionKind::PrefetchAbort)
        );
    }

    #[test]
    fn fiq_entry_masks_both_irq_and_fiq() {
        let entry = enter(ExceptionKind::Fiq, Psr::from_bits(0), 0x1000);
        assert!(entry.new_cpsr.irq_disabled());
        assert!(entry.new_cpsr.fiq_disabled());
        assert_eq!(entry.new_mode, Mode::Fiq);
    }

    #[test]
    fn irq_entry_leaves_fiq_unmasked() {
        let entry = enter(ExceptionKind::Irq, Psr::from_bits(0), 0x1000);
        assert!(entry.new_cpsr.irq_disabled());
        assert!(!entry.new_cpsr.fiq_disabled());
    }

    #[test]
    fn data_abort_link_offset_is_eight() {
        assert_eq!(ExceptionKind::DataAbort.link_offset(), 8);
        assert_eq!(ExceptionKind::Swi.link_offset(), 4);
    }
}
