//! The 16-slot coprocessor bus (§4.C). The MMU is installed at slot 15
//! through the same [`CoprocessorBus::attach`] call any other coprocessor
//! would use, rather than being a CPU special case.

/// A coprocessor register-transfer or data-processing operation. Each
/// variant carries the raw instruction fields a real coprocessor would
/// need; this core doesn't interpret them beyond dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoprocOp {
    pub cp_num: u32,
    pub cp_opcode: u32,
    pub crn: u32,
    pub crm: u32,
    pub cp_info: u32,
}

/// Outcome of a coprocessor register-transfer instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrcResult {
    Value(u32),
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoprocAck {
    Ok,
    Undefined,
}

/// The behaviour a slot exposes. Not every coprocessor implements every
/// operation; a slot that doesn't care about e.g. CDP can just always
/// return `Undefined` from it, same as the default handler.
pub trait Coprocessor {
    fn mrc(&mut self, op: CoprocOp) -> MrcResult {
        let _ = op;
        MrcResult::Undefined
    }
    fn mcr(&mut self, op: CoprocOp, value: u32) -> CoprocAck {
        let _ = (op, value);
        CoprocAck::Undefined
    }
    fn cdp(&mut self, op: CoprocOp) -> CoprocAck {
        let _ = op;
        CoprocAck::Undefined
    }
    /// Coprocessor data transfer (LDC/STC). `write` is `Some(value)` for a
    /// store, `None` for a load whose result is returned.
    fn data_transfer(&mut self, op: CoprocOp, write: Option<u32>) -> Result<Option<u32>, ()> {
        let _ = (op, write);
        Err(())
    }
}

/// The default handler installed in a detached slot: every operation is
/// undefined, triggering an Undefined Instruction exception (matching
/// `NoCoPro3R`/`NoCoPro4R`/`NoCoPro4W` in the original coprocessor bus).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCoprocessor;

impl Coprocessor for NoCoprocessor {}

const SLOTS: usize = 16;

/// Sixteen coprocessor slots, each either holding a concrete coprocessor
/// or the default "undefined" handler.
pub struct CoprocessorBus {
    slots: [Box<dyn Coprocessor>; SLOTS],
}

impl std::fmt::Debug for CoprocessorBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoprocessorBus").finish_non_exhaustive()
    }
}

impl Default for CoprocessorBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CoprocessorBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Box::new(NoCoprocessor) as Box<dyn Coprocessor>),
        }
    }

    /// Install a coprocessor at `slot`, replacing whatever was there
    /// (including the default handler). Mirrors `ARMul_CoProAttach`.
    pub fn attach(&mut self, slot: usize, coprocessor: Box<dyn Coprocessor>) {
        assert!(slot < SLOTS, "coprocessor slot out of range");
        self.slots[slot] = coprocessor;
    }

    /// Remove whatever coprocessor occupies `slot`, restoring the default
    /// undefined-instruction handler. Mirrors `ARMul_CoProDetach`.
    pub fn detach(&mut self, slot: usize) {
        assert!(slot < SLOTS, "coprocessor slot out of range");
        self.slots[slot] = Box::new(NoCoprocessor);
    }

    pub fn mrc(&mut self, slot: usize, op: CoprocOp) -> MrcResult {
        self.slots[slot].mrc(op)
    }

    pub fn mcr(&mut self, slot: usize, op: CoprocOp, value: u32) -> CoprocAck {
        self.slots[slot].mcr(op, value)
    }

    pub fn cdp(&mut self, slot: usize, op: CoprocOp) -> CoprocAck {
        self.slots[slot].cdp(op)
    }

    pub fn data_transfer(
        &mut self,
        slot: usize,
        op: CoprocOp,
        write: Option<u32>,
    ) -> Result<Option<u32>, ()> {
        self.slots[slot].data_transfer(op, write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl Coprocessor for Echo {
        fn mrc(&mut self, op: CoprocOp) -> MrcResult {
            MrcResult::Value(op.crn)
        }
    }

    #[test]
    fn default_slot_is_undefined() {
        let mut bus = CoprocessorBus::new();
        let op = CoprocOp {
            cp_num: 15,
            cp_opcode: 0,
            crn: 0,
            crm: 0,
            cp_info: 0,
        };
        assert_eq!(bus.mrc(15, op), MrcResult::Undefined);
    }

    #[test]
    fn attach_then_detach_restores_default() {
        let mut bus = CoprocessorBus::new();
        bus.attach(15, Box::new(Echo));
        let op = CoprocOp {
            cp_num: 15,
            cp_opcode: 0,
            crn: 7,
            crm: 0,
            cp_info: 0,
        };
        assert_eq!(bus.mrc(15, op), MrcResult::Value(7));
        bus.detach(15);
        assert_eq!(bus.mrc(15, op), MrcResult::Undefined);
    }
}
