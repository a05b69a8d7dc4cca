//! Plug-in point for a Thumb-state decoder (§9 design note: "a Thumb
//! decoder should be a pluggable add-on rather than baked into the core
//! dispatch table"). No Thumb decoder ships in this crate; `Cpu` checks
//! the CPSR `T` bit and, if set, delegates fetch/decode entirely to
//! whatever implements this trait instead of running the ARM-state
//! pipeline.

use crate::decode::Instruction;

/// Translate one 16-bit Thumb instruction into the same `Instruction`
/// shape the ARM-state decoder produces, so execution doesn't need a
/// second code path. A core without Thumb support runs with no
/// implementor installed and simply never enters `T` state in practice
/// (entering it without a decoder attached is an unimplemented-instruction
/// condition, not a panic).
pub trait ThumbDecoder {
    fn decode_thumb(&mut self, halfword: u16) -> Option<Instruction>;
}
