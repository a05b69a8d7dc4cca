//! General-purpose and banked register files.
//!
//! `R0..R15` are visible through [`Registers::r`]/[`Registers::set_r`]. The
//! banked registers for FIQ/IRQ/SVC/ABT/UND live in side arrays and are
//! swapped into the visible file on a mode switch ([`Registers::switch_mode`]).
//!
//! 26-bit ("alternate") mode reuses the same per-mode R13/R14 banks as
//! 32-bit mode — only the CPSR/PC encoding differs (see `psr.rs`). There is
//! no separate bank set for `USR26`/`FIQ26`/etc.

use crate::psr::Mode;

/// Program counter register index.
pub const PC: usize = 15;
/// Link register index.
pub const LR: usize = 14;
/// Stack pointer register index.
pub const SP: usize = 13;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bank13_14 {
    r13: u32,
    r14: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FiqBank {
    r8_12: [u32; 5],
    r13: u32,
    r14: u32,
}

/// The 16 general registers plus every mode's banked shadow copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// Currently-visible register file, `R0..R15`.
    r: [u32; 16],
    fiq_bank: FiqBank,
    irq_bank: Bank13_14,
    svc_bank: Bank13_14,
    abt_bank: Bank13_14,
    und_bank: Bank13_14,
    /// USR/SYS bank, used as the "home" bank and as the source/destination
    /// for user-bank register transfers (LDM/STM `^` without R15, §4.G.5).
    usr_bank: Bank13_14,
    usr_r8_12: [u32; 5],
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            r: [0; 16],
            fiq_bank: FiqBank {
                r8_12: [0; 5],
                r13: 0,
                r14: 0,
            },
            irq_bank: Bank13_14 { r13: 0, r14: 0 },
            svc_bank: Bank13_14 { r13: 0, r14: 0 },
            abt_bank: Bank13_14 { r13: 0, r14: 0 },
            und_bank: Bank13_14 { r13: 0, r14: 0 },
            usr_bank: Bank13_14 { r13: 0, r14: 0 },
            usr_r8_12: [0; 5],
        }
    }

    /// Read a register by index, *not* applying the PC pipeline offset.
    /// Callers that need the "PC as operand" behaviour use [`Cpu::operand_pc`].
    #[must_use]
    pub fn raw(&self, i: usize) -> u32 {
        self.r[i]
    }

    /// Write a register by index directly, bypassing any PC formatting.
    pub fn set_raw(&mut self, i: usize, value: u32) {
        self.r[i] = value;
    }

    /// Save the outgoing mode's R8-14 (R8-12 for FIQ only) and load the
    /// incoming mode's banked registers into the visible file. R0-R7 and
    /// R15 are never banked and are left untouched.
    pub fn switch_mode(&mut self, from: Mode, to: Mode) {
        if from == to {
            return;
        }
        self.save_bank(from);
        self.load_bank(to);
    }

    fn save_bank(&mut self, mode: Mode) {
        match mode {
            Mode::Usr | Mode::Sys => {
                self.usr_bank.r13 = self.r[13];
                self.usr_bank.r14 = self.r[14];
            }
            Mode::Fiq => {
                self.fiq_bank.r8_12.copy_from_slice(&self.r[8..13]);
                self.fiq_bank.r13 = self.r[13];
                self.fiq_bank.r14 = self.r[14];
            }
            Mode::Irq => {
                self.irq_bank.r13 = self.r[13];
                self.irq_bank.r14 = self.r[14];
            }
            Mode::Svc => {
                self.svc_bank.r13 = self.r[13];
                self.svc_bank.r14 = self.r[14];
            }
            Mode::Abt => {
                self.abt_bank.r13 = self.r[13];
                self.abt_bank.r14 = self.r[14];
            }
            Mode::Und => {
                self.und_bank.r13 = self.r[13];
                self.und_bank.r14 = self.r[14];
            }
        }
        // R8-12 are only banked in FIQ; leaving FIQ always restores the
        // shared (USR) R8-12 first via `usr_r8_12`.
        if mode == Mode::Fiq {
            return;
        }
        self.usr_r8_12.copy_from_slice(&self.r[8..13]);
    }

    fn load_bank(&mut self, mode: Mode) {
        match mode {
            Mode::Usr | Mode::Sys => {
                self.r[13] = self.usr_bank.r13;
                self.r[14] = self.usr_bank.r14;
                self.r[8..13].copy_from_slice(&self.usr_r8_12);
            }
            Mode::Fiq => {
                self.r[8..13].copy_from_slice(&self.fiq_bank.r8_12);
                self.r[13] = self.fiq_bank.r13;
                self.r[14] = self.fiq_bank.r14;
            }
            Mode::Irq => {
                self.r[13] = self.irq_bank.r13;
                self.r[14] = self.irq_bank.r14;
                self.r[8..13].copy_from_slice(&self.usr_r8_12);
            }
            Mode::Svc => {
                self.r[13] = self.svc_bank.r13;
                self.r[14] = self.svc_bank.r14;
                self.r[8..13].copy_from_slice(&self.usr_r8_12);
            }
            Mode::Abt => {
                self.r[13] = self.abt_bank.r13;
                self.r[14] = self.abt_bank.r14;
                self.r[8..13].copy_from_slice(&self.usr_r8_12);
            }
            Mode::Und => {
                self.r[13] = self.und_bank.r13;
                self.r[14] = self.und_bank.r14;
                self.r[8..13].copy_from_slice(&self.usr_r8_12);
            }
        }
    }

    /// Read a register in the given mode's bank without switching to it.
    /// Used by the exception controller to write a return address into
    /// `R14_<target mode>` before the mode switch happens (§4.I step 1).
    #[must_use]
    pub fn bank_lr(&self, mode: Mode, current: Mode) -> u32 {
        if mode == current {
            return self.r[14];
        }
        match mode {
            Mode::Usr | Mode::Sys => self.usr_bank.r14,
            Mode::Fiq => self.fiq_bank.r14,
            Mode::Irq => self.irq_bank.r14,
            Mode::Svc => self.svc_bank.r14,
            Mode::Abt => self.abt_bank.r14,
            Mode::Und => self.und_bank.r14,
        }
    }

    pub fn set_bank_lr(&mut self, mode: Mode, current: Mode, value: u32) {
        if mode == current {
            self.r[14] = value;
            return;
        }
        match mode {
            Mode::Usr | Mode::Sys => self.usr_bank.r14 = value,
            Mode::Fiq => self.fiq_bank.r14 = value,
            Mode::Irq => self.irq_bank.r14 = value,
            Mode::Svc => self.svc_bank.r14 = value,
            Mode::Abt => self.abt_bank.r14 = value,
            Mode::Und => self.und_bank.r14 = value,
        }
    }

    /// Reset all registers and banks to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
