//! Ties a core, an MMU, and the physical bank dispatcher into one
//! runnable machine, and owns reset and the run/step/stop state machine
//! (§3 "Lifecycle", §5 "Cancellation").

use std::cell::RefCell;
use std::rc::Rc;

use cpu_arm710::{Coprocessor, CoprocAck, CoprocOp, Cpu, CpuVariant, MrcResult};
use mmu_arm710::{Mmu, MMU_SLOT};

use crate::banks::Banks;
use crate::bus::{Bus, CycleCounters, SharedMmu};
use crate::io::{Framebuffer, IoCollaborator};
use crate::rom::Rom;

/// Delegates coprocessor 15 traffic to a shared MMU, letting the same
/// `Mmu` also be borrowed by the bus façade for translation (§4.C).
struct MmuCoprocessor(SharedMmu);

impl Coprocessor for MmuCoprocessor {
    fn mrc(&mut self, op: CoprocOp) -> MrcResult {
        self.0.borrow_mut().mrc(op)
    }

    fn mcr(&mut self, op: CoprocOp, value: u32) -> CoprocAck {
        self.0.borrow_mut().mcr(op, value)
    }
}

/// The outer driver's cancellation state, inspected after every retired
/// instruction (§5 "Cancellation").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emulate {
    Run,
    Once,
    Stop,
}

/// A complete ARM710-class machine: core, MMU, physical memory, and
/// collaborators, plus the cycle counters and cancellation flag the
/// runner drives.
pub struct Machine<Io, Fb> {
    pub cpu: Cpu,
    pub mmu: SharedMmu,
    pub banks: Banks<Io, Fb>,
    pub counters: CycleCounters,
    pub emulate: Emulate,
    pub stop: bool,
}

impl<Io: IoCollaborator, Fb: Framebuffer> Machine<Io, Fb> {
    /// Build a machine and run the reset lifecycle: zero registers, load
    /// `rom` into bank 0, enter SVC with interrupts masked, and set `R15`
    /// to the reset vector (§3 "Lifecycle").
    #[must_use]
    pub fn new(variant: CpuVariant, rom: Rom, io: Io, framebuffer: Fb) -> Self {
        let mmu: SharedMmu = Rc::new(RefCell::new(Mmu::new(variant)));
        let mut cpu = Cpu::new(variant);
        cpu.coprocessors_mut()
            .attach(MMU_SLOT, Box::new(MmuCoprocessor(Rc::clone(&mmu))));

        let mut machine = Self {
            cpu,
            mmu,
            banks: Banks::new(rom, io, framebuffer),
            counters: CycleCounters::default(),
            emulate: Emulate::Run,
            stop: false,
        };
        machine.reset();
        machine
    }

    /// Re-run the reset lifecycle without reloading ROM or dropping
    /// collaborators: zero the core and MMU state and return to the
    /// reset vector.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.mmu.borrow_mut().reset();
        self.counters = CycleCounters::default();
        self.stop = false;
    }

    /// Run one core `step`, priming the pipeline and retiring at most one
    /// instruction, and bump the retirement counter when one does (§3,
    /// §5).
    pub fn step(&mut self) {
        let user_mode = !self.cpu.cpsr().mode().is_privileged();
        let big_endian = self.mmu.borrow().regs.big_endian();
        let mut bus = Bus {
            mmu: Rc::clone(&self.mmu),
            mem: &mut self.banks,
            counters: &mut self.counters,
            user_mode,
            big_endian,
        };
        self.cpu.step(&mut bus);
        self.counters.retired = self.cpu.retired();
        self.counters.coprocessor = self.cpu.coprocessor_cycles();
    }

    /// Step until `stop` is raised or `emulate` demands it (§5
    /// "Cancellation"). `ONCE` runs exactly one instruction and resets
    /// itself to `STOP`; `RUN` continues until something external flips
    /// `stop`.
    pub fn run(&mut self) {
        loop {
            match self.emulate {
                Emulate::Stop => return,
                Emulate::Once => {
                    self.step();
                    self.emulate = Emulate::Stop;
                    return;
                }
                Emulate::Run => {
                    if self.stop {
                        return;
                    }
                    self.step();
                }
            }
        }
    }
}
