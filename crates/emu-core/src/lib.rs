//! Core traits and types shared across the workspace.
//!
//! `Ticks`/`MasterClock` give every component a common unit of time;
//! `Observable` gives every component a common way to be inspected without
//! disturbing emulation state. Bus and CPU shapes are not prescribed here —
//! the ARM710 core's memory hierarchy (physical banks, MMU, bus façade) has
//! its own layered traits, defined where they're used.

mod clock;
mod observable;
mod tickable;
mod ticks;

pub use clock::MasterClock;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
