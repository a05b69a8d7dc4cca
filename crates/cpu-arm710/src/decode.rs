//! Instruction decode: classification of a raw 32-bit word into one of
//! the instruction families (§4.E's 256-entry dispatch over bits 20-27),
//! each carrying its already-extracted fields so execution never has to
//! re-parse bit patterns.

use crate::shifter::ShiftOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand2 {
    Immediate { rotated: u32, carry_out: Option<bool> },
    Register {
        rm: u32,
        op: ShiftOp,
        amount_is_register: bool,
        amount_reg: u32,
        amount_imm: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataProcessing {
    pub cond: u8,
    pub opcode: u32,
    pub set_flags: bool,
    pub rn: u32,
    pub rd: u32,
    pub operand2: Operand2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiply {
    pub cond: u8,
    pub accumulate: bool,
    pub set_flags: bool,
    pub rd: u32,
    pub rn: u32,
    pub rs: u32,
    pub rm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplyLong {
    pub cond: u8,
    pub signed: bool,
    pub accumulate: bool,
    pub set_flags: bool,
    pub rdhi: u32,
    pub rdlo: u32,
    pub rs: u32,
    pub rm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleDataSwap {
    pub cond: u8,
    pub byte: bool,
    pub rn: u32,
    pub rd: u32,
    pub rm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchExchange {
    pub cond: u8,
    pub rm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordKind {
    UnsignedHalfword,
    SignedByte,
    SignedHalfword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfwordTransfer {
    pub cond: u8,
    pub pre_indexed: bool,
    pub add: bool,
    pub writeback: bool,
    pub load: bool,
    pub rn: u32,
    pub rd: u32,
    pub kind: HalfwordKind,
    pub offset_is_immediate: bool,
    pub offset_imm: u32,
    pub offset_reg: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleDataTransfer {
    pub cond: u8,
    pub pre_indexed: bool,
    pub add: bool,
    pub byte: bool,
    pub writeback: bool,
    pub load: bool,
    pub rn: u32,
    pub rd: u32,
    pub offset: Operand2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDataTransfer {
    pub cond: u8,
    pub pre_indexed: bool,
    pub add: bool,
    pub psr_or_user: bool,
    pub writeback: bool,
    pub load: bool,
    pub rn: u32,
    pub register_list: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub cond: u8,
    pub link: bool,
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoprocDataTransfer {
    pub cond: u8,
    pub pre_indexed: bool,
    pub add: bool,
    pub long: bool,
    pub writeback: bool,
    pub load: bool,
    pub rn: u32,
    pub crd: u32,
    pub cp_num: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoprocRegTransfer {
    pub cond: u8,
    pub load: bool,
    pub cp_opcode: u32,
    pub crn: u32,
    pub rd: u32,
    pub cp_num: u32,
    pub cp_info: u32,
    pub crm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoprocDataOp {
    pub cond: u8,
    pub cp_opcode: u32,
    pub crn: u32,
    pub crd: u32,
    pub cp_num: u32,
    pub cp_info: u32,
    pub crm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swi {
    pub cond: u8,
    pub comment: u32,
}

/// MRS: move the current CPSR or the current mode's SPSR into a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mrs {
    pub cond: u8,
    pub to_spsr: bool,
    pub rd: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsrSource {
    Register(u32),
    Immediate { rotated: u32 },
}

/// MSR: write CPSR or the current mode's SPSR, gated by the field mask
/// (bit 19 = flags byte, bit 16 = control byte; the status/extension
/// bytes this core doesn't implement are ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msr {
    pub cond: u8,
    pub to_spsr: bool,
    pub write_flags: bool,
    pub write_control: bool,
    pub source: MsrSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    DataProcessing(DataProcessing),
    Multiply(Multiply),
    MultiplyLong(MultiplyLong),
    SingleDataSwap(SingleDataSwap),
    BranchExchange(BranchExchange),
    HalfwordTransfer(HalfwordTransfer),
    SingleDataTransfer(SingleDataTransfer),
    BlockDataTransfer(BlockDataTransfer),
    Branch(Branch),
    CoprocDataTransfer(CoprocDataTransfer),
    CoprocRegTransfer(CoprocRegTransfer),
    CoprocDataOp(CoprocDataOp),
    Swi(Swi),
    Mrs(Mrs),
    Msr(Msr),
    Undefined { cond: u8 },
}

fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    (word >> lo) & ((1 << (hi - lo + 1)) - 1)
}

fn shift_op(code: u32) -> ShiftOp {
    match code & 0x3 {
        0 => ShiftOp::Lsl,
        1 => ShiftOp::Lsr,
        2 => ShiftOp::Asr,
        _ => ShiftOp::Ror,
    }
}

/// Decode one 32-bit ARM-state word into a classified [`Instruction`].
/// Bits 27-26 pick the broad family, further fields narrow within it,
/// following the architecture's own encoding layout rather than a
/// literal 256-way jump table, but with equivalent dispatch behaviour.
#[must_use]
pub fn decode(word: u32) -> Instruction {
    let cond = bits(word, 31, 28) as u8;
    let op_27_26 = bits(word, 27, 26);

    match op_27_26 {
        0b00 => decode_00(word, cond),
        0b01 => Instruction::SingleDataTransfer(decode_single_transfer(word, cond)),
        0b10 => decode_10(word, cond),
        0b11 => decode_11(word, cond),
        _ => unreachable!(),
    }
}

fn decode_00(word: u32, cond: u8) -> Instruction {
    let bit4 = bits(word, 4, 4) != 0;
    let bit7 = bits(word, 7, 7) != 0;

    if bits(word, 27, 22) == 0b000000 && bit4 && bit7 && bits(word, 24, 23) == 0b00 {
        return Instruction::Multiply(Multiply {
            cond,
            accumulate: bits(word, 21, 21) != 0,
            set_flags: bits(word, 20, 20) != 0,
            rd: bits(word, 19, 16),
            rn: bits(word, 15, 12),
            rs: bits(word, 11, 8),
            rm: bits(word, 3, 0),
        });
    }
    if bits(word, 27, 23) == 0b00001 && bit4 && bit7 {
        return Instruction::MultiplyLong(MultiplyLong {
            cond,
            signed: bits(word, 22, 22) != 0,
            accumulate: bits(word, 21, 21) != 0,
            set_flags: bits(word, 20, 20) != 0,
            rdhi: bits(word, 19, 16),
            rdlo: bits(word, 15, 12),
            rs: bits(word, 11, 8),
            rm: bits(word, 3, 0),
        });
    }
    if bits(word, 27, 23) == 0b00010 && bits(word, 21, 20) == 0b00 && bit4 && bit7 && bits(word, 11, 8) == 0 {
        return Instruction::SingleDataSwap(SingleDataSwap {
            cond,
            byte: bits(word, 22, 22) != 0,
            rn: bits(word, 19, 16),
            rd: bits(word, 15, 12),
            rm: bits(word, 3, 0),
        });
    }
    if word & 0x0FFF_FFF0 == 0x012F_FF10 {
        return Instruction::BranchExchange(BranchExchange {
            cond,
            rm: bits(word, 3, 0),
        });
    }
    if bits(word, 25, 25) == 0 && bit7 && bits(word, 4, 4) != 0 && bits(word, 6, 5) != 0b00 {
        return decode_halfword(word, cond);
    }
    if let Some(instr) = decode_psr_transfer(word, cond) {
        return instr;
    }

    let opcode = bits(word, 24, 21);
    let set_flags = bits(word, 20, 20) != 0;
    let rn = bits(word, 19, 16);
    let rd = bits(word, 15, 12);
    let immediate = bits(word, 25, 25) != 0;
    let operand2 = if immediate {
        let imm = bits(word, 7, 0);
        let rotate = bits(word, 11, 8) * 2;
        let rotated = imm.rotate_right(rotate);
        let carry_out = if rotate == 0 { None } else { Some(rotated >> 31 != 0) };
        Operand2::Immediate { rotated, carry_out }
    } else {
        Operand2::Register {
            rm: bits(word, 3, 0),
            op: shift_op(bits(word, 6, 5)),
            amount_is_register: bit4,
            amount_reg: bits(word, 11, 8),
            amount_imm: bits(word, 11, 7),
        }
    };
    Instruction::DataProcessing(DataProcessing {
        cond,
        opcode,
        set_flags,
        rn,
        rd,
        operand2,
    })
}

/// MRS/MSR are disguised TST/TEQ/CMP/CMN encodings (S bit clear, Rn or Rd
/// forced to the all-ones "SBO" field) inside the `00` family. Returns
/// `None` for anything that doesn't match the strict field layout, so an
/// unpredictable near-miss still falls through to ordinary data-processing
/// decode rather than being misclassified.
fn decode_psr_transfer(word: u32, cond: u8) -> Option<Instruction> {
    if bits(word, 24, 23) != 0b10 || bits(word, 20, 20) != 0 {
        return None;
    }
    let to_spsr = bits(word, 22, 22) != 0;
    if bits(word, 21, 21) == 0 {
        if bits(word, 19, 16) == 0b1111 && bits(word, 11, 0) == 0 {
            return Some(Instruction::Mrs(Mrs {
                cond,
                to_spsr,
                rd: bits(word, 15, 12),
            }));
        }
        return None;
    }
    if bits(word, 15, 12) != 0b1111 {
        return None;
    }
    let field_mask = bits(word, 19, 16);
    let write_flags = field_mask & 0b1000 != 0;
    let write_control = field_mask & 0b0001 != 0;
    let source = if bits(word, 25, 25) != 0 {
        let imm = bits(word, 7, 0);
        let rotate = bits(word, 11, 8) * 2;
        MsrSource::Immediate {
            rotated: imm.rotate_right(rotate),
        }
    } else {
        if bits(word, 11, 4) != 0 {
            return None;
        }
        MsrSource::Register(bits(word, 3, 0))
    };
    Some(Instruction::Msr(Msr {
        cond,
        to_spsr,
        write_flags,
        write_control,
        source,
    }))
}

fn decode_halfword(word: u32, cond: u8) -> Instruction {
    let pre_indexed = bits(word, 24, 24) != 0;
    let add = bits(word, 23, 23) != 0;
    let offset_is_immediate = bits(word, 22, 22) != 0;
    let writeback = bits(word, 21, 21) != 0;
    let load = bits(word, 20, 20) != 0;
    let rn = bits(word, 19, 16);
    let rd = bits(word, 15, 12);
    let sh = bits(word, 6, 5);
    let kind = match sh {
        0b01 => HalfwordKind::UnsignedHalfword,
        0b10 => HalfwordKind::SignedByte,
        _ => HalfwordKind::SignedHalfword,
    };
    let offset_imm = (bits(word, 11, 8) << 4) | bits(word, 3, 0);
    let offset_reg = bits(word, 3, 0);
    Instruction::HalfwordTransfer(HalfwordTransfer {
        cond,
        pre_indexed,
        add,
        writeback,
        load,
        rn,
        rd,
        kind,
        offset_is_immediate,
        offset_imm,
        offset_reg,
    })
}

fn decode_single_transfer(word: u32, cond: u8) -> SingleDataTransfer {
    let immediate_offset = bits(word, 25, 25) == 0;
    let pre_indexed = bits(word, 24, 24) != 0;
    let add = bits(word, 23, 23) != 0;
    let byte = bits(word, 22, 22) != 0;
    let writeback = bits(word, 21, 21) != 0;
    let load = bits(word, 20, 20) != 0;
    let rn = bits(word, 19, 16);
    let rd = bits(word, 15, 12);
    let offset = if immediate_offset {
        Operand2::Immediate {
            rotated: bits(word, 11, 0),
            carry_out: None,
        }
    } else {
        Operand2::Register {
            rm: bits(word, 3, 0),
            op: shift_op(bits(word, 6, 5)),
            amount_is_register: false,
            amount_reg: 0,
            amount_imm: bits(word, 11, 7),
        }
    };
    SingleDataTransfer {
        cond,
        pre_indexed,
        add,
        byte,
        writeback,
        load,
        rn,
        rd,
        offset,
    }
}

fn decode_10(word: u32, cond: u8) -> Instruction {
    if bits(word, 25, 25) == 0 {
        Instruction::BlockDataTransfer(BlockDataTransfer {
            cond,
            pre_indexed: bits(word, 24, 24) != 0,
            add: bits(word, 23, 23) != 0,
            psr_or_user: bits(word, 22, 22) != 0,
            writeback: bits(word, 21, 21) != 0,
            load: bits(word, 20, 20) != 0,
            rn: bits(word, 19, 16),
            register_list: bits(word, 15, 0) as u16,
        })
    } else {
        let link = bits(word, 24, 24) != 0;
        let raw = bits(word, 23, 0);
        let signed = (raw << 8) as i32 >> 8;
        Instruction::Branch(Branch {
            cond,
            link,
            offset: signed << 2,
        })
    }
}

fn decode_11(word: u32, cond: u8) -> Instruction {
    let is_swi = bits(word, 25, 24) == 0b11;
    if is_swi {
        return Instruction::Swi(Swi {
            cond,
            comment: bits(word, 23, 0),
        });
    }
    let is_register_transfer = bits(word, 25, 25) != 0 && bits(word, 4, 4) != 0;
    if is_register_transfer {
        return Instruction::CoprocRegTransfer(CoprocRegTransfer {
            cond,
            load: bits(word, 20, 20) != 0,
            cp_opcode: bits(word, 23, 21),
            crn: bits(word, 19, 16),
            rd: bits(word, 15, 12),
            cp_num: bits(word, 11, 8),
            cp_info: bits(word, 7, 5),
            crm: bits(word, 3, 0),
        });
    }
    if bits(word, 25, 25) != 0 {
        return Instruction::CoprocDataOp(CoprocDataOp {
            cond,
            cp_opcode: bits(word, 23, 20),
            crn: bits(word, 19, 16),
            crd: bits(word, 15, 12),
            cp_num: bits(word, 11, 8),
            cp_info: bits(word, 7, 5),
            crm: bits(word, 3, 0),
        });
    }
    Instruction::CoprocDataTransfer(CoprocDataTransfer {
        cond,
        pre_indexed: bits(word, 24, 24) != 0,
        add: bits(word, 23, 23) != 0,
        long: bits(word, 22, 22) != 0,
        writeback: bits(word, 21, 21) != 0,
        load: bits(word, 20, 20) != 0,
        rn: bits(word, 19, 16),
        crd: bits(word, 15, 12),
        cp_num: bits(word, 11, 8),
        offset: bits(word, 7, 0),
    })
}
