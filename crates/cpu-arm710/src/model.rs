//! The CPU variant selector, in the same shape as
//! `motorola-68000/src/model.rs`'s `CpuModel`/`CpuCapabilities`: a closed
//! enum of supported cores plus a capability table keyed off it, instead
//! of scattering `if variant == ...` checks through the MMU and
//! coprocessor code.

/// Which MMU architecture revision this core's CP15 implements. The v3
/// and v4 MMUs share the same register *numbers* for some operations but
/// disagree on what a few of them mean (§6 "CP15 ID word").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuVariant {
    /// ARM710-class core with a v3 MMU: register 5/6/7 are
    /// FLUSH_TLB/FLUSH_TLB_ENTRY/FLUSH_CACHE.
    ArmV3,
    /// v4 MMU: register 5/6 are FSR/FAR, and cache/TLB maintenance moves
    /// to registers 7/8 with a sub-opcode field.
    ArmV4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCapabilities {
    /// CP15 register 0 (ID) value MRC returns.
    pub id_word: u32,
    /// Whether register 7 is CACHE_OPS (v4) rather than FLUSH_CACHE (v3).
    pub has_cache_ops_register: bool,
    /// Whether register 8 is TLB_OPS (v4) rather than the v3
    /// FLUSH_TLB/FLUSH_TLB_ENTRY pair living at registers 5/6.
    pub has_tlb_ops_register: bool,
}

impl CpuVariant {
    #[must_use]
    pub const fn capabilities(self) -> CpuCapabilities {
        match self {
            Self::ArmV3 => CpuCapabilities {
                id_word: 0x4100_7100,
                has_cache_ops_register: false,
                has_tlb_ops_register: false,
            },
            Self::ArmV4 => CpuCapabilities {
                id_word: 0x4101_8100,
                has_cache_ops_register: true,
                has_tlb_ops_register: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v3_uses_legacy_flush_registers() {
        let caps = CpuVariant::ArmV3.capabilities();
        assert_eq!(caps.id_word, 0x4100_7100);
        assert!(!caps.has_cache_ops_register);
        assert!(!caps.has_tlb_ops_register);
    }

    #[test]
    fn v4_uses_cache_and_tlb_ops_registers() {
        let caps = CpuVariant::ArmV4.capabilities();
        assert_eq!(caps.id_word, 0x4101_8100);
        assert!(caps.has_cache_ops_register);
        assert!(caps.has_tlb_ops_register);
    }
}
