// minirt/src/lib.rs

//! Runtime support for cores without an FPU, multiplier, divider or 64-bit
//! ALU: binary32 soft float, wide integer arithmetic with an optional
//! memory-mapped multiply/divide unit, and a free-list heap over a fixed
//! arena.
//!
//! Arithmetic never fails. Special values (NaN, infinities, signed zeros)
//! are ordinary results, and integer division by zero returns `(0, 0)`
//! unless a `checked_` entry point is used. Allocation failure is `None`.

pub mod bits;
mod error;
pub mod float;
pub mod heap;
pub mod hw;
pub mod runtime;
pub mod wide;


pub use error::{Error, Result};
pub use heap::{Heap, HeapArena, HeapConfig, HeapPtr, HeapReport, HEADER_SIZE};
pub use hw::{HardwareUnit, MmioBus, RegisterBus, RegisterMap, SimulatedBus};
pub use runtime::Runtime;
pub use wide::{DivMod, MulDivUnit, SoftwareUnit};
