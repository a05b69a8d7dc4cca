//! Top-level MMU: wires the TLB, cache, page-table walker and permission
//! checker into the word-granularity translate path the bus façade calls,
//! and exposes CP15 as a coprocessor slot (§4.B, §4.C).

use cpu_arm710::{CoprocAck, CoprocOp, Coprocessor, CpuVariant, MrcResult};

use crate::bus::PhysicalMemory;
use crate::cache::Cache;
use crate::control::{reg, Cp15Registers};
use crate::fault::Fault;
use crate::pagetable;
use crate::permission;
use crate::tlb::Tlb;

pub struct Mmu {
    pub regs: Cp15Registers,
    tlb: Tlb,
    cache: Cache,
}

impl Mmu {
    #[must_use]
    pub fn new(variant: CpuVariant) -> Self {
        Self {
            regs: Cp15Registers::new(variant),
            tlb: Tlb::new(),
            cache: Cache::new(),
        }
    }

    pub fn reset(&mut self) {
        let variant = self.regs.variant;
        self.regs = Cp15Registers::new(variant);
        self.tlb.invalidate_all();
        self.cache.invalidate_all();
    }

    /// Resolve `virt_addr` to a `{entry, phys_addr}` pair, walking the page
    /// tables and filling the TLB on a miss, then checking domain/AP
    /// permission. Shared by the read and write paths (§4.B steps 4-7).
    fn resolve(
        &mut self,
        virt_addr: u32,
        user: bool,
        read: bool,
        phys_mem: &mut impl PhysicalMemory,
    ) -> Result<(u32, bool), Fault> {
        let entry = match self.tlb.search(virt_addr) {
            Some(entry) => entry,
            None => {
                let entry =
                    pagetable::walk(self.regs.translation_table_base, virt_addr, phys_mem)?;
                self.tlb.insert(entry);
                entry
            }
        };
        permission::check_access(&mut self.regs, virt_addr, entry, user, read)?;
        let mask = entry.mapping.addr_mask();
        let phys_addr = (entry.phys & mask) | (virt_addr & !mask);
        Ok((phys_addr, entry.cacheable()))
    }

    /// Word-granularity translated read (§4.B steps 1-4, 8).
    pub fn translate_read(
        &mut self,
        virt_addr: u32,
        user: bool,
        phys_mem: &mut impl PhysicalMemory,
    ) -> Result<u32, Fault> {
        if !self.regs.mmu_enabled() {
            return Ok(phys_mem.read_phys_word(virt_addr));
        }
        if virt_addr & 3 != 0 && self.regs.align_fault_enabled() {
            return Err(Fault::AlignmentFault);
        }
        if self.regs.cache_enabled() {
            if let Some(word) = self.cache.lookup(virt_addr) {
                return Ok(word);
            }
        }
        let result = self.resolve(virt_addr, user, true, phys_mem);
        let (phys_addr, cacheable) = match result {
            Ok(v) => v,
            Err(fault) => {
                self.regs.record_fault(fault.status_nibble(), virt_addr);
                return Err(fault);
            }
        };
        if cacheable && self.regs.cache_enabled() {
            let base = phys_addr & 0xFFFF_FFF0;
            let words = [
                phys_mem.read_phys_word(base),
                phys_mem.read_phys_word(base + 4),
                phys_mem.read_phys_word(base + 8),
                phys_mem.read_phys_word(base + 12),
            ];
            self.cache.fill(virt_addr, words);
            Ok(words[((virt_addr >> 2) & 3) as usize])
        } else {
            Ok(phys_mem.read_phys_word(phys_addr))
        }
    }

    /// Word-granularity translated write (§4.B steps 1-2, 4-7).
    pub fn translate_write(
        &mut self,
        virt_addr: u32,
        value: u32,
        user: bool,
        phys_mem: &mut impl PhysicalMemory,
    ) -> Result<(), Fault> {
        if !self.regs.mmu_enabled() {
            phys_mem.write_phys_word(virt_addr, value);
            return Ok(());
        }
        if virt_addr & 3 != 0 && self.regs.align_fault_enabled() {
            return Err(Fault::AlignmentFault);
        }
        // Keep a stale cache line in sync even before the permission check
        // resolves, matching `armmmu.c: mmu_write_word`'s ordering.
        if self.regs.cache_enabled() {
            if let Some(slot) = self.cache.write_through(virt_addr) {
                *slot = value;
            }
        }
        match self.resolve(virt_addr, user, false, phys_mem) {
            Ok((phys_addr, _)) => {
                phys_mem.write_phys_word(phys_addr, value);
                Ok(())
            }
            Err(fault) => {
                self.regs.record_fault(fault.status_nibble(), virt_addr);
                Err(fault)
            }
        }
    }

    pub fn invalidate_tlb_entry(&mut self, virt_addr: u32) {
        self.tlb.invalidate_entry(virt_addr);
    }

    pub fn invalidate_all(&mut self) {
        self.tlb.invalidate_all();
        self.cache.invalidate_all();
    }
}

impl Coprocessor for Mmu {
    fn mrc(&mut self, op: CoprocOp) -> MrcResult {
        match op.crn {
            reg::ID => MrcResult::Value(self.regs.variant.capabilities().id_word),
            reg::CONTROL => MrcResult::Value(self.regs.control),
            reg::TTB => MrcResult::Value(self.regs.translation_table_base),
            reg::DACR => MrcResult::Value(self.regs.domain_access_control),
            reg::FSR => MrcResult::Value(self.regs.fault_status),
            reg::FAR => MrcResult::Value(self.regs.fault_address),
            _ => MrcResult::Undefined,
        }
    }

    fn mcr(&mut self, op: CoprocOp, value: u32) -> CoprocAck {
        let caps = self.regs.variant.capabilities();
        match op.crn {
            reg::CONTROL => {
                self.regs.write_control(value);
                CoprocAck::Ok
            }
            reg::TTB => {
                self.regs.write_ttb(value);
                CoprocAck::Ok
            }
            reg::DACR => {
                self.regs.domain_access_control = value;
                CoprocAck::Ok
            }
            reg::FSR if caps.has_tlb_ops_register => {
                self.regs.fault_status = value & 0xFF;
                CoprocAck::Ok
            }
            reg::FAR if caps.has_tlb_ops_register => {
                self.regs.fault_address = value;
                CoprocAck::Ok
            }
            reg::V4_CACHE_OPS if caps.has_cache_ops_register => {
                if op.cp_info == 0 {
                    self.cache.invalidate_all();
                }
                CoprocAck::Ok
            }
            reg::V4_TLB_OPS if caps.has_tlb_ops_register => {
                match op.cp_info {
                    0 => self.tlb.invalidate_all(),
                    1 => self.tlb.invalidate_entry(value),
                    _ => {}
                }
                CoprocAck::Ok
            }
            reg::V3_FLUSH_TLB if !caps.has_tlb_ops_register => {
                self.tlb.invalidate_all();
                CoprocAck::Ok
            }
            reg::V3_FLUSH_TLB_ENTRY if !caps.has_tlb_ops_register => {
                self.tlb.invalidate_entry(value);
                CoprocAck::Ok
            }
            reg::V3_FLUSH_CACHE if !caps.has_cache_ops_register => {
                self.cache.invalidate_all();
                CoprocAck::Ok
            }
            _ => CoprocAck::Undefined,
        }
    }
}
