//! The `CoreBus` implementation: routes every core access through the
//! MMU, synthesises byte/half access over the word-granular translate
//! path, and keeps the cycle counters (§3, §4.D).
//!
//! The MMU is also installed as coprocessor 15 on the core itself (so
//! `MRC`/`MCR` can reach its registers), so it is shared with that slot
//! through an `Rc<RefCell<_>>` rather than owned outright by the bus.

use std::cell::RefCell;
use std::rc::Rc;

use cpu_arm710::{Abort, CoreBus, CycleKind, Size};
use mmu_arm710::{Fault, Mmu, PhysicalMemory};

pub type SharedMmu = Rc<RefCell<Mmu>>;

/// Sequential/non-sequential/internal/coprocessor cycle tallies plus
/// retired-instruction count (§3 "Observable state").
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleCounters {
    pub sequential: u64,
    pub non_sequential: u64,
    pub internal: u64,
    pub coprocessor: u64,
    pub retired: u64,
}

impl CycleCounters {
    fn bump(&mut self, kind: CycleKind) {
        match kind {
            CycleKind::Sequential => self.sequential += 1,
            CycleKind::NonSequential => self.non_sequential += 1,
            CycleKind::Internal => self.internal += 1,
        }
    }
}

/// Wires a CPU core to an MMU and a physical bank dispatcher, in whatever
/// privilege mode the caller last told it the CPU is running in.
pub struct Bus<'a, M> {
    pub mmu: SharedMmu,
    pub mem: &'a mut M,
    pub counters: &'a mut CycleCounters,
    pub user_mode: bool,
    pub big_endian: bool,
}

fn fault_to_abort(fault: Fault) -> Abort {
    if fault.is_translation_fault() {
        Abort::Prefetch
    } else {
        Abort::Data
    }
}

impl<M: PhysicalMemory> Bus<'_, M> {
    fn read_word(&mut self, addr: u32) -> (u32, Abort) {
        let result = self
            .mmu
            .borrow_mut()
            .translate_read(addr, self.user_mode, self.mem);
        match result {
            Ok(word) => (word, Abort::None),
            Err(fault) => (0xFFFF_FFFF, fault_to_abort(fault)),
        }
    }

    fn write_word(&mut self, addr: u32, value: u32) -> Abort {
        let result = self
            .mmu
            .borrow_mut()
            .translate_write(addr, value, self.user_mode, self.mem);
        match result {
            Ok(()) => Abort::None,
            Err(fault) => fault_to_abort(fault),
        }
    }

    /// Bit shift into the enclosing word for a byte/half access, with the
    /// control register's big-endian bit reversing lane order within the
    /// word (§4.D).
    fn lane_shift(&self, addr: u32, size: Size) -> u32 {
        let byte_in_word = addr & 3;
        match size {
            Size::Word => 0,
            Size::Half => {
                let half_in_word = byte_in_word & 2;
                if self.big_endian {
                    (2 - half_in_word) * 8
                } else {
                    half_in_word * 8
                }
            }
            Size::Byte => {
                if self.big_endian {
                    (3 - byte_in_word) * 8
                } else {
                    byte_in_word * 8
                }
            }
        }
    }
}

impl<M: PhysicalMemory> CoreBus for Bus<'_, M> {
    fn fetch(&mut self, addr: u32, kind: CycleKind) -> (u32, Abort) {
        self.counters.bump(kind);
        self.read_word(addr & !3)
    }

    fn read(&mut self, addr: u32, size: Size, kind: CycleKind) -> (u32, Abort) {
        self.counters.bump(kind);
        let (word, abort) = self.read_word(addr & !3);
        if abort != Abort::None {
            return (word, abort);
        }
        let value = match size {
            Size::Word => word,
            Size::Half => {
                let shift = self.lane_shift(addr, Size::Half);
                (word >> shift) & 0xFFFF
            }
            Size::Byte => {
                let shift = self.lane_shift(addr, Size::Byte);
                (word >> shift) & 0xFF
            }
        };
        (value, Abort::None)
    }

    fn write(&mut self, addr: u32, size: Size, value: u32, kind: CycleKind) -> Abort {
        self.counters.bump(kind);
        let word_addr = addr & !3;
        match size {
            Size::Word => self.write_word(word_addr, value),
            Size::Half | Size::Byte => {
                let (current, abort) = self.read_word(word_addr);
                if abort != Abort::None {
                    return abort;
                }
                let (shift, mask) = match size {
                    Size::Half => (self.lane_shift(addr, Size::Half), 0xFFFFu32),
                    Size::Byte => (self.lane_shift(addr, Size::Byte), 0xFFu32),
                    Size::Word => unreachable!(),
                };
                let merged = (current & !(mask << shift)) | ((value & mask) << shift);
                self.write_word(word_addr, merged)
            }
        }
    }

    fn big_endian(&self) -> bool {
        self.big_endian
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FlatMemory(HashMap<u32, u32>);

    impl PhysicalMemory for FlatMemory {
        fn read_phys_word(&mut self, phys_addr: u32) -> u32 {
            *self.0.get(&phys_addr).unwrap_or(&0xFFFF_FFFF)
        }
        fn write_phys_word(&mut self, phys_addr: u32, value: u32) {
            self.0.insert(phys_addr, value);
        }
    }

    fn bus<'a>(
        mmu: &SharedMmu,
        mem: &'a mut FlatMemory,
        counters: &'a mut CycleCounters,
    ) -> Bus<'a, FlatMemory> {
        Bus {
            mmu: Rc::clone(mmu),
            mem,
            counters,
            user_mode: false,
            big_endian: false,
        }
    }

    #[test]
    fn little_endian_byte_lanes() {
        let mmu: SharedMmu = Rc::new(RefCell::new(Mmu::new(cpu_arm710::CpuVariant::ArmV3)));
        let mut mem = FlatMemory(HashMap::new());
        mem.write_phys_word(0, 0x1122_3344);
        let mut counters = CycleCounters::default();
        let mut b = bus(&mmu, &mut mem, &mut counters);
        let (byte0, abort) = b.read(0, Size::Byte, CycleKind::NonSequential);
        assert_eq!(abort, Abort::None);
        assert_eq!(byte0, 0x44);
        let (byte3, _) = b.read(3, Size::Byte, CycleKind::NonSequential);
        assert_eq!(byte3, 0x11);
    }

    #[test]
    fn write_merges_into_enclosing_word() {
        let mmu: SharedMmu = Rc::new(RefCell::new(Mmu::new(cpu_arm710::CpuVariant::ArmV3)));
        let mut mem = FlatMemory(HashMap::new());
        mem.write_phys_word(0, 0xFFFF_FFFF);
        let mut counters = CycleCounters::default();
        let mut b = bus(&mmu, &mut mem, &mut counters);
        b.write(1, Size::Byte, 0x00, CycleKind::NonSequential);
        let (word, _) = b.read(0, Size::Word, CycleKind::NonSequential);
        assert_eq!(word, 0xFFFF_00FF);
    }

    #[test]
    fn counters_track_cycle_kinds() {
        let mmu: SharedMmu = Rc::new(RefCell::new(Mmu::new(cpu_arm710::CpuVariant::ArmV3)));
        let mut mem = FlatMemory(HashMap::new());
        let mut counters = CycleCounters::default();
        let mut b = bus(&mmu, &mut mem, &mut counters);
        b.fetch(0, CycleKind::NonSequential);
        b.read(0, Size::Word, CycleKind::Sequential);
        assert_eq!(counters.non_sequential, 1);
        assert_eq!(counters.sequential, 1);
    }
}
