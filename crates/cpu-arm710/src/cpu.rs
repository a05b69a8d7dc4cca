//! The top-level `Cpu`: ties registers, PSRs, the pipeline, the
//! coprocessor bus, and the dispatch table together behind a single
//! `step` entry point.

use emu_core::{Observable, Value};

use crate::alu;
use crate::blockxfer;
use crate::branch;
use crate::bus::{Abort, CoreBus, CycleKind, Size};
use crate::coproc::{CoprocOp, CoprocessorBus, CoprocAck, MrcResult};
use crate::dataproc::{self, DpOp};
use crate::decode::{self, HalfwordKind, Instruction, Operand2};
use crate::exceptions::{self, ExceptionKind};
use crate::loadstore;
use crate::model::CpuVariant;
use crate::pipeline::Pipeline;

use crate::psr::{condition_holds, Mode, Psr, C, F, I as I_FLAG, N, T, V, Z};
use crate::registers::{Registers, LR, PC};
use crate::shifter::{self, Shifted};

/// Saved-PSR bank: one SPSR per exception-capable mode. USR/SYS have no
/// SPSR (reading it there is undefined and never attempted by this core).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SpsrBank {
    fiq: Psr,
    irq: Psr,
    svc: Psr,
    abt: Psr,
    und: Psr,
}

impl SpsrBank {
    fn get(&self, mode: Mode) -> Psr {
        match mode {
            Mode::Fiq => self.fiq,
            Mode::Irq => self.irq,
            Mode::Svc => self.svc,
            Mode::Abt => self.abt,
            Mode::Und => self.und,
            Mode::Usr | Mode::Sys => Psr::from_bits(0),
        }
    }

    fn set(&mut self, mode: Mode, psr: Psr) {
        match mode {
            Mode::Fiq => self.fiq = psr,
            Mode::Irq => self.irq = psr,
            Mode::Svc => self.svc = psr,
            Mode::Abt => self.abt = psr,
            Mode::Und => self.und = psr,
            Mode::Usr | Mode::Sys => {}
        }
    }
}

/// External interrupt request lines, sampled once per instruction
/// boundary (§4.I).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSignals {
    pub irq: bool,
    pub fiq: bool,
}

/// The instruction-accurate ARM core.
pub struct Cpu {
    regs: Registers,
    cpsr: Psr,
    spsr: SpsrBank,
    pipeline: Pipeline,
    coprocessors: CoprocessorBus,
    variant: CpuVariant,
    pending: PendingSignals,
    halted: bool,
    /// `R15` as it should read when used as an ALU/address operand by the
    /// instruction currently executing: the address that instruction was
    /// fetched from, plus 8 (the architectural pipeline offset, §3). This
    /// is distinct from `regs[PC]`, which tracks the address the *next*
    /// fetch will use.
    pc_operand: u32,
    /// Instructions that have left the pipeline's execute stage,
    /// including ones skipped by a failing condition code (§3 "Cycle
    /// counters").
    retired: u64,
    /// Coprocessor register-transfer/data-operation cycles (MRC/MCR/CDP),
    /// the one bus-cycle category with no memory access of its own (§3
    /// "Cycle counters"). LDC/STC bump the ordinary N-cycle counter
    /// instead, through `CoreBus::read`/`write`.
    coprocessor_cycles: u64,
}

impl Cpu {
    #[must_use]
    pub fn new(variant: CpuVariant) -> Self {
        let mut cpu = Self {
            regs: Registers::new(),
            cpsr: Psr::from_bits(0),
            spsr: SpsrBank::default(),
            pipeline: Pipeline::new(),
            coprocessors: CoprocessorBus::new(),
            variant,
            pending: PendingSignals::default(),
            halted: false,
            pc_operand: 0,
            retired: 0,
            coprocessor_cycles: 0,
        };
        cpu.reset();
        cpu
    }

    #[must_use]
    pub const fn variant(self: &Self) -> CpuVariant {
        self.variant
    }

    pub fn coprocessors_mut(&mut self) -> &mut CoprocessorBus {
        &mut self.coprocessors
    }

    pub fn request_irq(&mut self, level: bool) {
        self.pending.irq = level;
    }

    pub fn request_fiq(&mut self, level: bool) {
        self.pending.fiq = level;
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    #[must_use]
    pub const fn coprocessor_cycles(&self) -> u64 {
        self.coprocessor_cycles
    }

    /// Reset (§3 "Lifecycle"): zero every register and bank, enter SVC
    /// with both interrupt sources masked, clear Thumb, flush the
    /// pipeline, and set `R15` to the reset vector.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.cpsr = Psr::from_bits(Mode::Svc.bits());
        self.cpsr.set_flag(I_FLAG, true);
        self.cpsr.set_flag(F, true);
        self.spsr = SpsrBank::default();
        self.pipeline.flush();
        self.pending = PendingSignals::default();
        self.halted = false;
        self.pc_operand = ExceptionKind::Reset.vector();
        self.regs.set_raw(PC, ExceptionKind::Reset.vector());
        self.retired = 0;
        self.coprocessor_cycles = 0;
    }

    /// The architectural value of `R15` as software would read it right
    /// now (instruction address + 8), not the raw fetch cursor.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc_operand
    }

    #[must_use]
    pub const fn cpsr(&self) -> Psr {
        self.cpsr
    }

    #[must_use]
    pub fn register(&self, i: usize) -> u32 {
        if i == PC {
            self.pc_operand
        } else {
            self.regs.raw(i)
        }
    }

    /// Read a register as an ALU/address operand: `R15` reads as the
    /// address of the current instruction plus 8, the architectural
    /// pipeline offset (§3, §4.F).
    fn operand(&self, i: usize) -> u32 {
        if i == PC {
            self.pc_operand
        } else {
            self.regs.raw(i)
        }
    }

    /// Run one pipeline cycle: fetch, and (once the pipeline is primed)
    /// retire and execute whatever was fetched two cycles ago. An
    /// unhandled SWI with no installed handler loops forever in real
    /// hardware; a host runner checks `is_halted`/its own step budget
    /// instead of relying on this method to terminate itself.
    pub fn step<B: CoreBus>(&mut self, bus: &mut B) {
        if self.halted {
            return;
        }

        if let Some(kind) = self.poll_exceptions() {
            self.enter_exception(kind, self.pc_operand);
            return;
        }

        let fetch_addr = self.regs.raw(PC);
        let cycle_kind = self.pipeline.next_cycle_kind();
        let (word, abort) = bus.fetch(fetch_addr, cycle_kind);
        let retiring = self.pipeline.advance(word, abort != Abort::None);
        // `fetch_addr` is exactly the operand value R15 should present
        // while the instruction retiring this cycle executes (it was
        // fetched two cycles ago, when this address was two words ahead
        // of it — see pipeline.rs).
        self.pc_operand = fetch_addr;
        self.regs.set_raw(PC, fetch_addr.wrapping_add(4));

        let Some(slot) = retiring else {
            // Still priming the pipeline; nothing to execute yet.
            return;
        };
        if slot.aborted {
            self.enter_exception(ExceptionKind::PrefetchAbort, self.pc_operand);
            return;
        }
        self.retired += 1;

        let instruction = decode::decode(slot.word);
        let cond = condition_code(&instruction);
        if !condition_holds(self.cpsr, cond) {
            return;
        }

        self.execute(instruction, bus);
    }

    fn poll_exceptions(&mut self) -> Option<ExceptionKind> {
        let mut pending = Vec::with_capacity(2);
        if self.pending.fiq {
            pending.push(ExceptionKind::Fiq);
        }
        if self.pending.irq {
            pending.push(ExceptionKind::Irq);
        }
        exceptions::highest_priority(&pending, self.cpsr)
    }

    /// `link_value` is the raw PC-as-operand value at the point of the
    /// trap (instruction address + 8, per `pc_operand`'s convention); a
    /// handler recovers the resume address with
    /// `SUBS PC, LR, #kind.link_offset()`, matching real hardware, which
    /// deposits the raw value and leaves the subtraction to software.
    fn enter_exception(&mut self, kind: ExceptionKind, link_value: u32) {
        let entry = exceptions::enter(kind, self.cpsr, link_value);
        self.spsr.set(entry.new_mode, entry.spsr_to_save);
        self.regs.switch_mode(self.cpsr.mode(), entry.new_mode);
        self.regs.set_raw(LR, link_value);
        self.cpsr = entry.new_cpsr;
        self.regs.set_raw(PC, entry.new_pc);
        self.pc_operand = entry.new_pc;
        self.pipeline.resume();
    }

    fn execute<B: CoreBus>(&mut self, instruction: Instruction, bus: &mut B) {
        match instruction {
            Instruction::DataProcessing(dp) => self.exec_data_processing(&dp),
            Instruction::Multiply(m) => self.exec_multiply(&m),
            Instruction::MultiplyLong(m) => self.exec_multiply_long(&m),
            Instruction::SingleDataSwap(s) => self.exec_swap(&s, bus),
            Instruction::BranchExchange(b) => self.exec_branch_exchange(&b),
            Instruction::HalfwordTransfer(h) => self.exec_halfword_transfer(&h, bus),
            Instruction::SingleDataTransfer(s) => self.exec_single_transfer(&s, bus),
            Instruction::BlockDataTransfer(b) => self.exec_block_transfer(&b, bus),
            Instruction::Branch(b) => self.exec_branch(&b),
            Instruction::CoprocDataTransfer(c) => self.exec_coproc_data_transfer(&c, bus),
            Instruction::CoprocRegTransfer(c) => self.exec_coproc_reg_transfer(&c),
            Instruction::CoprocDataOp(c) => self.exec_coproc_data_op(&c),
            Instruction::Mrs(m) => self.exec_mrs(&m),
            Instruction::Msr(m) => self.exec_msr(&m),
            Instruction::Swi(_) => self.enter_exception(ExceptionKind::Swi, self.pc_operand),
            Instruction::Undefined { .. } => {
                self.enter_exception(ExceptionKind::Undefined, self.pc_operand)
            }
        }
    }

    fn resolve_operand2(&self, operand2: Operand2) -> (u32, bool) {
        match operand2 {
            Operand2::Immediate { rotated, carry_out } => {
                (rotated, carry_out.unwrap_or(self.cpsr.carry()))
            }
            Operand2::Register {
                rm,
                op,
                amount_is_register,
                amount_reg,
                amount_imm,
            } => {
                let value = self.operand(rm as usize);
                let amount = if amount_is_register {
                    self.operand(amount_reg as usize) & 0xFF
                } else {
                    amount_imm
                };
                let Shifted { value, carry_out } =
                    shifter::shift(op, value, amount, self.cpsr.carry(), amount_is_register);
                (value, carry_out)
            }
        }
    }

    fn exec_data_processing(&mut self, dp: &decode::DataProcessing) {
        let op = DpOp::from_bits(dp.opcode);
        let rn = self.operand(dp.rn as usize);
        let (operand2, shifter_carry) = self.resolve_operand2(dp.operand2);
        let result = dataproc::evaluate(op, rn, operand2, self.cpsr.carry(), shifter_carry);

        if op.writes_rd() {
            self.regs.set_raw(dp.rd as usize, result.value);
            if dp.rd as usize == PC {
                self.flush_after_branch();
                if dp.set_flags {
                    // MOVS/etc into R15 with S set restores CPSR from SPSR
                    // (§4.H "return from exception" idiom).
                    self.cpsr = self.spsr.get(self.cpsr.mode());
                    return;
                }
            }
        }
        if dp.set_flags {
            if dp.rd as usize == PC {
                return;
            }
            alu::apply_flags(&mut self.cpsr, result, op.is_arithmetic());
        }
    }

    fn exec_mrs(&mut self, m: &decode::Mrs) {
        let psr = if m.to_spsr { self.spsr.get(self.cpsr.mode()) } else { self.cpsr };
        self.regs.set_raw(m.rd as usize, psr.bits());
    }

    fn exec_msr(&mut self, m: &decode::Msr) {
        let source = match m.source {
            decode::MsrSource::Register(rm) => self.operand(rm as usize),
            decode::MsrSource::Immediate { rotated } => rotated,
        };
        let write_control = m.write_control && self.cpsr.mode().is_privileged();
        if m.to_spsr {
            let mode = self.cpsr.mode();
            let mut spsr = self.spsr.get(mode);
            spsr.write_masked(source, m.write_flags, write_control);
            self.spsr.set(mode, spsr);
            return;
        }
        let old_mode = self.cpsr.mode();
        self.cpsr.write_masked(source, m.write_flags, write_control);
        let new_mode = self.cpsr.mode();
        if write_control && new_mode != old_mode {
            self.regs.switch_mode(old_mode, new_mode);
        }
    }

    fn exec_multiply(&mut self, m: &decode::Multiply) {
        let rs = self.operand(m.rs as usize);
        let rm = self.operand(m.rm as usize);
        let accumulate = if m.accumulate { self.operand(m.rn as usize) } else { 0 };
        let result = crate::multiply::mul32(rm, rs, accumulate);
        self.regs.set_raw(m.rd as usize, result);
        if m.set_flags {
            self.cpsr.set_flag(N, result >> 31 != 0);
            self.cpsr.set_flag(Z, result == 0);
        }
    }

    fn exec_multiply_long(&mut self, m: &decode::MultiplyLong) {
        let rs = self.operand(m.rs as usize);
        let rm = self.operand(m.rm as usize);
        let accumulate = if m.accumulate {
            (u64::from(self.operand(m.rdhi as usize)) << 32) | u64::from(self.operand(m.rdlo as usize))
        } else {
            0
        };
        let result = crate::multiply::mul64(rm, rs, m.signed, accumulate);
        self.regs.set_raw(m.rdlo as usize, result as u32);
        self.regs.set_raw(m.rdhi as usize, (result >> 32) as u32);
        if m.set_flags {
            self.cpsr.set_flag(N, result >> 63 != 0);
            self.cpsr.set_flag(Z, result == 0);
        }
    }

    fn exec_branch(&mut self, b: &decode::Branch) {
        let pc = self.operand(PC);
        let target = branch::branch_target(pc, b.offset);
        if b.link {
            self.regs.set_raw(LR, self.pc_operand.wrapping_sub(4));
        }
        self.regs.set_raw(PC, target);
        self.flush_after_branch();
    }

    fn exec_branch_exchange(&mut self, b: &decode::BranchExchange) {
        let (target, thumb) = branch::exchange_target(self.operand(b.rm as usize));
        self.cpsr.set_flag(T, thumb);
        self.regs.set_raw(PC, target);
        self.flush_after_branch();
    }

    fn flush_after_branch(&mut self) {
        self.pipeline.flush();
    }

    fn exec_swap<B: CoreBus>(&mut self, s: &decode::SingleDataSwap, bus: &mut B) {
        let addr = self.operand(s.rn as usize);
        let size = if s.byte { Size::Byte } else { Size::Word };
        let (loaded, abort) = bus.read(addr, size, CycleKind::NonSequential);
        if abort != Abort::None {
            self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
            return;
        }
        let store_value = self.operand(s.rm as usize);
        let _ = bus.write(addr, size, store_value, CycleKind::Internal);
        self.regs.set_raw(s.rd as usize, loaded);
    }

    fn exec_halfword_transfer<B: CoreBus>(&mut self, h: &decode::HalfwordTransfer, bus: &mut B) {
        let base = self.regs.raw(h.rn as usize);
        let offset = if h.offset_is_immediate {
            h.offset_imm
        } else {
            self.operand(h.offset_reg as usize)
        };
        let (addr, new_base) = loadstore::effective_address(base, offset, h.add, h.pre_indexed);

        if h.load {
            let size = match h.kind {
                HalfwordKind::UnsignedHalfword | HalfwordKind::SignedHalfword => Size::Half,
                HalfwordKind::SignedByte => Size::Byte,
            };
            let (raw, abort) = bus.read(addr, size, CycleKind::NonSequential);
            if abort != Abort::None {
                self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                return;
            }
            let value = match h.kind {
                HalfwordKind::UnsignedHalfword => raw & 0xFFFF,
                HalfwordKind::SignedHalfword => loadstore::sign_extend_halfword(raw as u16),
                HalfwordKind::SignedByte => loadstore::sign_extend_byte(raw as u8),
            };
            self.regs.set_raw(h.rd as usize, value);
        } else {
            let value = self.operand(h.rd as usize) & 0xFFFF;
            let abort = bus.write(addr, Size::Half, value, CycleKind::NonSequential);
            if abort != Abort::None {
                self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                return;
            }
        }

        if loadstore::should_writeback(h.pre_indexed, h.writeback, h.load, h.rd, h.rn) {
            self.regs.set_raw(h.rn as usize, new_base);
        }
    }

    fn exec_single_transfer<B: CoreBus>(&mut self, s: &decode::SingleDataTransfer, bus: &mut B) {
        let base = self.regs.raw(s.rn as usize);
        let (offset, _) = self.resolve_operand2(s.offset);
        let (addr, new_base) = loadstore::effective_address(base, offset, s.add, s.pre_indexed);
        let size = if s.byte { Size::Byte } else { Size::Word };

        if s.load {
            let (raw, abort) = bus.read(addr, size, CycleKind::NonSequential);
            if abort != Abort::None {
                self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                return;
            }
            let value = match size {
                Size::Word => loadstore::rotate_misaligned_word(raw, addr),
                Size::Byte => u32::from(raw as u8),
                Size::Half => raw & 0xFFFF,
            };
            self.regs.set_raw(s.rd as usize, value);
            if s.rd as usize == PC {
                self.flush_after_branch();
            }
        } else {
            let value = self.operand(s.rd as usize);
            let abort = bus.write(addr, size, value, CycleKind::NonSequential);
            if abort != Abort::None {
                self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                return;
            }
        }

        if loadstore::should_writeback(s.pre_indexed, s.writeback, s.load, s.rd, s.rn) {
            self.regs.set_raw(s.rn as usize, new_base);
        }
    }

    fn exec_block_transfer<B: CoreBus>(&mut self, b: &decode::BlockDataTransfer, bus: &mut B) {
        let base = self.regs.raw(b.rn as usize);
        let (transfer_slots, new_base) =
            blockxfer::slots(base, b.register_list, b.pre_indexed, b.add);

        // User-bank register transfer: an LDM/STM with the `^` suffix and
        // no R15 in the list accesses the USR bank regardless of current
        // mode (§4.G.5). We emulate that by switching banks for the
        // duration of the transfer, which is transparent since USR/SYS R13
        // are otherwise untouched here.
        let user_bank_transfer = b.psr_or_user && !reg_in_list(b.register_list, PC as u32);
        let current_mode = self.cpsr.mode();
        if user_bank_transfer {
            self.regs.switch_mode(current_mode, Mode::Usr);
        }

        let mut base_written_back = false;
        for (index, slot) in transfer_slots.iter().enumerate() {
            let kind = if index == 0 {
                CycleKind::NonSequential
            } else {
                CycleKind::Sequential
            };
            if b.load {
                let (raw, abort) = bus.read(slot.address, Size::Word, kind);
                if abort != Abort::None {
                    // Data abort mid-LDM: restore the base register to its
                    // pre-transfer value and abandon the remaining
                    // transfers (§4.G.5, §8 "data-abort-mid-LDM").
                    if user_bank_transfer {
                        self.regs.switch_mode(Mode::Usr, current_mode);
                    }
                    self.regs.set_raw(b.rn as usize, base);
                    self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                    return;
                }
                self.regs.set_raw(slot.register as usize, raw);
                if slot.register as usize == PC {
                    if b.psr_or_user {
                        self.cpsr = self.spsr.get(current_mode);
                    }
                    self.flush_after_branch();
                }
            } else {
                let value = if slot.register as usize == PC {
                    self.pc_operand
                } else {
                    self.regs.raw(slot.register as usize)
                };
                let abort = bus.write(slot.address, Size::Word, value, kind);
                if abort != Abort::None {
                    if user_bank_transfer {
                        self.regs.switch_mode(Mode::Usr, current_mode);
                    }
                    self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                    return;
                }
            }

            // Writeback happens after the first transfer so a reused base
            // register in the list sees the updated value on later
            // transfers of an STM, matching the architecture's rule that
            // only the very first transfer uses the pre-transfer base.
            if b.writeback && !base_written_back {
                self.regs.set_raw(b.rn as usize, new_base);
                base_written_back = true;
            }
        }

        if user_bank_transfer {
            self.regs.switch_mode(Mode::Usr, current_mode);
        }
        if b.writeback && !base_written_back {
            self.regs.set_raw(b.rn as usize, new_base);
        }
    }

    fn exec_coproc_data_transfer<B: CoreBus>(&mut self, c: &decode::CoprocDataTransfer, bus: &mut B) {
        let base = self.regs.raw(c.rn as usize);
        let offset = c.offset << 2;
        let (addr, new_base) = loadstore::effective_address(base, offset, c.add, c.pre_indexed);
        let op = CoprocOp {
            cp_num: c.cp_num,
            cp_opcode: 0,
            crn: c.crd,
            crm: 0,
            cp_info: u32::from(c.long),
        };
        if c.load {
            let (raw, abort) = bus.read(addr, Size::Word, CycleKind::NonSequential);
            if abort != Abort::None {
                self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                return;
            }
            let _ = self
                .coprocessors
                .data_transfer(c.cp_num as usize, op, Some(raw));
        } else {
            match self.coprocessors.data_transfer(c.cp_num as usize, op, None) {
                Ok(Some(value)) => {
                    let abort = bus.write(addr, Size::Word, value, CycleKind::NonSequential);
                    if abort != Abort::None {
                        self.enter_exception(ExceptionKind::DataAbort, self.pc_operand);
                        return;
                    }
                }
                _ => {
                    self.enter_exception(ExceptionKind::Undefined, self.pc_operand);
                    return;
                }
            }
        }
        if c.writeback {
            self.regs.set_raw(c.rn as usize, new_base);
        }
    }

    fn exec_coproc_reg_transfer(&mut self, c: &decode::CoprocRegTransfer) {
        self.coprocessor_cycles += 1;
        let op = CoprocOp {
            cp_num: c.cp_num,
            cp_opcode: c.cp_opcode,
            crn: c.crn,
            crm: c.crm,
            cp_info: c.cp_info,
        };
        if c.load {
            match self.coprocessors.mrc(c.cp_num as usize, op) {
                MrcResult::Value(value) => {
                    if c.rd as usize == PC {
                        // MRC into R15 updates flags only (N/Z/C/V), a
                        // rarely-used form retained for completeness.
                        self.cpsr.set_flag(N, value & N != 0);
                        self.cpsr.set_flag(Z, value & Z != 0);
                        self.cpsr.set_flag(C, value & C != 0);
                        self.cpsr.set_flag(V, value & V != 0);
                    } else {
                        self.regs.set_raw(c.rd as usize, value);
                    }
                }
                MrcResult::Undefined => {
                    self.enter_exception(ExceptionKind::Undefined, self.pc_operand);
                }
            }
        } else {
            let value = self.operand(c.rd as usize);
            if self.coprocessors.mcr(c.cp_num as usize, op, value) == CoprocAck::Undefined {
                self.enter_exception(ExceptionKind::Undefined, self.pc_operand);
            }
        }
    }

    fn exec_coproc_data_op(&mut self, c: &decode::CoprocDataOp) {
        self.coprocessor_cycles += 1;
        let op = CoprocOp {
            cp_num: c.cp_num,
            cp_opcode: c.cp_opcode,
            crn: c.crn,
            crm: c.crm,
            cp_info: c.cp_info,
        };
        let _ = c.crd;
        if self.coprocessors.cdp(c.cp_num as usize, op) == CoprocAck::Undefined {
            self.enter_exception(ExceptionKind::Undefined, self.pc_operand);
        }
    }
}

fn reg_in_list(list: u16, register: u32) -> bool {
    list & (1 << register) != 0
}

fn condition_code(instruction: &Instruction) -> u8 {
    match instruction {
        Instruction::DataProcessing(i) => i.cond,
        Instruction::Multiply(i) => i.cond,
        Instruction::MultiplyLong(i) => i.cond,
        Instruction::SingleDataSwap(i) => i.cond,
        Instruction::BranchExchange(i) => i.cond,
        Instruction::HalfwordTransfer(i) => i.cond,
        Instruction::SingleDataTransfer(i) => i.cond,
        Instruction::BlockDataTransfer(i) => i.cond,
        Instruction::Branch(i) => i.cond,
        Instruction::CoprocDataTransfer(i) => i.cond,
        Instruction::CoprocRegTransfer(i) => i.cond,
        Instruction::CoprocDataOp(i) => i.cond,
        Instruction::Swi(i) => i.cond,
        Instruction::Mrs(i) => i.cond,
        Instruction::Msr(i) => i.cond,
        Instruction::Undefined { cond } => *cond,
    }
}

impl Observable for Cpu {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix('r') {
            if let Ok(n) = rest.parse::<usize>() {
                if n < 16 {
                    return Some(Value::U32(self.register(n)));
                }
            }
        }
        match path {
            "cpsr" => Some(Value::U32(self.cpsr.bits())),
            "mode" => Some(Value::String(format!("{:?}", self.cpsr.mode()))),
            "halted" => Some(Value::Bool(self.halted)),
            "primed" => Some(Value::Bool(self.pipeline.is_primed())),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13",
            "r14", "r15", "cpsr", "mode", "halted", "primed",
        ]
    }
}
