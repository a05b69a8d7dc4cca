//! ARM710 MMU: two-level page-table walker, 64-entry fully-associative
//! TLB, 4-way set-associative cache, and the coprocessor-15 register file
//! (§4.B). Installed into a `cpu-arm710` `CoprocessorBus` at slot 15,
//! matching the real hardware's treatment of the MMU as an ordinary
//! coprocessor rather than a CPU built-in.

pub mod bus;
pub mod cache;
pub mod control;
pub mod fault;
mod mmu;
pub mod pagetable;
pub mod permission;
pub mod tlb;

pub use bus::PhysicalMemory;
pub use control::Cp15Registers;
pub use fault::Fault;
pub use mmu::Mmu;

/// Coprocessor slot the MMU occupies (§4.C).
pub const MMU_SLOT: usize = 15;
