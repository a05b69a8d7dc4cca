//! Integration coverage for the translate path against a flat physical
//! memory fixture, mirroring the concrete page-table-walk scenario.

use std::collections::HashMap;

use cpu_arm710::CpuVariant;
use mmu_arm710::{Mmu, PhysicalMemory};

struct FlatMemory(HashMap<u32, u32>);

impl FlatMemory {
    fn new() -> Self {
        Self(HashMap::new())
    }
}

impl PhysicalMemory for FlatMemory {
    fn read_phys_word(&mut self, phys_addr: u32) -> u32 {
        *self.0.get(&phys_addr).unwrap_or(&0xFFFF_FFFF)
    }

    fn write_phys_word(&mut self, phys_addr: u32, value: u32) {
        self.0.insert(phys_addr, value);
    }
}

#[test]
fn page_table_walk_reads_through_to_physical_page() {
    let mut mem = FlatMemory::new();
    // TTB = 0x4000; L1[0] = page table at 0x8000, domain 0.
    mem.write_phys_word(0x4000, 0x0000_8001);
    // L2[0] = small page at 0x10000, AP0 allowing all, C=1 B=1.
    mem.write_phys_word(0x8000, 0x0001_0C3E);
    mem.write_phys_word(0x10000, 0xCAFE_BABE);

    let mut mmu = Mmu::new(CpuVariant::ArmV3);
    mmu.regs.control |= mmu_arm710::control::MMU_ENABLE;
    mmu.regs.translation_table_base = 0x4000;
    mmu.regs.domain_access_control = 0x3; // domain 0 = client

    let value = mmu.translate_read(0, false, &mut mem).expect("should translate");
    assert_eq!(value, 0xCAFE_BABE);
}

#[test]
fn tlb_caches_translation_until_invalidated() {
    let mut mem = FlatMemory::new();
    mem.write_phys_word(0x4000, 0x0000_8001);
    mem.write_phys_word(0x8000, 0x0001_0C3E);
    mem.write_phys_word(0x10000, 1);

    let mut mmu = Mmu::new(CpuVariant::ArmV3);
    mmu.regs.control |= mmu_arm710::control::MMU_ENABLE;
    mmu.regs.translation_table_base = 0x4000;
    mmu.regs.domain_access_control = 0x3;

    assert_eq!(mmu.translate_read(0, false, &mut mem).unwrap(), 1);

    // Break the page table; a cached TLB entry should still resolve.
    mem.write_phys_word(0x8000, 0);
    assert_eq!(mmu.translate_read(0, false, &mut mem).unwrap(), 1);

    mmu.invalidate_tlb_entry(0);
    assert!(mmu.translate_read(0, false, &mut mem).is_err());
}

#[test]
fn cache_hit_serves_without_rewalking_until_invalidated() {
    let mut mem = FlatMemory::new();
    mem.write_phys_word(0x4000, 0x0000_8001);
    mem.write_phys_word(0x8000, 0x0001_0C3E);
    mem.write_phys_word(0x10000, 0x1111_1111);
    mem.write_phys_word(0x10004, 0x2222_2222);

    let mut mmu = Mmu::new(CpuVariant::ArmV3);
    mmu.regs.control |=
        mmu_arm710::control::MMU_ENABLE | mmu_arm710::control::CACHE_ENABLE;
    mmu.regs.translation_table_base = 0x4000;
    mmu.regs.domain_access_control = 0x3;

    assert_eq!(mmu.translate_read(0, false, &mut mem).unwrap(), 0x1111_1111);
    // Same quadword, second word: should hit the cache line filled above.
    assert_eq!(mmu.translate_read(4, false, &mut mem).unwrap(), 0x2222_2222);

    mem.write_phys_word(0x10000, 0);
    assert_eq!(mmu.translate_read(0, false, &mut mem).unwrap(), 0x1111_1111);

    mmu.invalidate_all();
    assert_eq!(mmu.translate_read(0, false, &mut mem).unwrap(), 0);
}
