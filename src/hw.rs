// minirt/src/hw.rs

//! Memory-mapped multiply and divide units.
//!
//! Both units share a layout: an info register that reads non-zero while the
//! unit is busy, two operand registers and two result registers. Writing
//! the second operand starts the operation.

use std::cell::Cell;
use std::ptr;

use log::trace;

use crate::wide::{self, DivMod, MulDivUnit};

pub const DEFAULT_MULT_BASE: u32 = 0x0000_0500;
pub const DEFAULT_DIV_BASE: u32 = 0x0000_0600;

pub const INFO_OFFSET: u32 = 0x00;
pub const OPERAND_A_OFFSET: u32 = 0x04;
pub const OPERAND_B_OFFSET: u32 = 0x08;
/// Product high word on the multiplier, quotient on the divider.
pub const RESULT_A_OFFSET: u32 = 0x0C;
/// Product low word on the multiplier, remainder on the divider.
pub const RESULT_B_OFFSET: u32 = 0x10;

/// 32-bit register access.
pub trait RegisterBus {
    fn read(&self, address: u32) -> u32;
    fn write(&self, address: u32, value: u32);
}

/// Volatile loads and stores straight to physical addresses.
#[derive(Debug)]
pub struct MmioBus {
    _private: (),
}

impl MmioBus {
    /// # Safety
    ///
    /// Every register address the bus is asked to touch must be a mapped,
    /// 4-byte aligned device register for as long as the bus is alive.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for MmioBus {
    fn read(&self, address: u32) -> u32 {
        // SAFETY: upheld by the contract of `MmioBus::new`.
        unsafe { ptr::read_volatile(address as usize as *const u32) }
    }

    fn write(&self, address: u32, value: u32) {
        // SAFETY: upheld by the contract of `MmioBus::new`.
        unsafe { ptr::write_volatile(address as usize as *mut u32, value) }
    }
}

/// Base addresses of the two units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    pub mult_base: u32,
    pub div_base: u32,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            mult_base: DEFAULT_MULT_BASE,
            div_base: DEFAULT_DIV_BASE,
        }
    }
}

/// [`MulDivUnit`] backed by the hardware functional units.
///
/// Polls the info register with no timeout; the units have fixed latency.
pub struct HardwareUnit<B>
where
    B: RegisterBus,
{
    bus: B,
    map: RegisterMap,
}

impl<B> HardwareUnit<B>
where
    B: RegisterBus,
{
    pub fn new(bus: B) -> Self {
        Self::with_map(bus, RegisterMap::default())
    }

    pub fn with_map(bus: B, map: RegisterMap) -> Self {
        Self { bus, map }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn register_map(&self) -> RegisterMap {
        self.map
    }

    fn run(&self, base: u32, a: u32, b: u32) -> (u32, u32) {
        self.bus.write(base + OPERAND_A_OFFSET, a);
        self.bus.write(base + OPERAND_B_OFFSET, b);

        let mut polls = 0u32;
        while self.bus.read(base + INFO_OFFSET) != 0 {
            polls = polls.wrapping_add(1);
            std::hint::spin_loop();
        }

        let result_a = self.bus.read(base + RESULT_A_OFFSET);
        let result_b = self.bus.read(base + RESULT_B_OFFSET);
        trace!(
            "unit@{:#x}: ({:#x}, {:#x}) -> ({:#x}, {:#x}) after {} polls",
            base,
            a,
            b,
            result_a,
            result_b,
            polls
        );
        (result_a, result_b)
    }
}

impl<B> MulDivUnit for HardwareUnit<B>
where
    B: RegisterBus,
{
    fn multiply(&self, a: u32, b: u32) -> u64 {
        let (high, low) = self.run(self.map.mult_base, a, b);
        ((high as u64) << 32) | low as u64
    }

    fn divide(&self, dividend: u32, divisor: u32) -> DivMod<u32> {
        // Same sentinel as the software path; the divider is never started.
        if divisor == 0 {
            return DivMod::default();
        }
        let (quotient, remainder) = self.run(self.map.div_base, dividend, divisor);
        DivMod {
            quotient,
            remainder,
        }
    }
}

/// Register-level model of both units for hosts without them.
///
/// Each started operation keeps the info register busy for `latency` polls.
/// Results are computed with the software primitives.
#[derive(Debug, Default)]
pub struct SimulatedBus {
    map: RegisterMap,
    latency: u32,
    busy: Cell<u32>,
    operations: Cell<u32>,
    mult_operands: Cell<(u32, u32)>,
    mult_result: Cell<(u32, u32)>,
    div_operands: Cell<(u32, u32)>,
    div_result: Cell<(u32, u32)>,
}

impl SimulatedBus {
    pub fn new(map: RegisterMap, latency: u32) -> Self {
        Self {
            map,
            latency,
            ..Self::default()
        }
    }

    /// Number of operations started on either unit.
    pub fn operations(&self) -> u32 {
        self.operations.get()
    }

    fn start(&self) {
        self.busy.set(self.latency);
        self.operations.set(self.operations.get() + 1);
    }
}

impl RegisterBus for SimulatedBus {
    fn read(&self, address: u32) -> u32 {
        let RegisterMap {
            mult_base,
            div_base,
        } = self.map;

        if address == mult_base + INFO_OFFSET || address == div_base + INFO_OFFSET {
            let busy = self.busy.get();
            if busy == 0 {
                return 0;
            }
            self.busy.set(busy - 1);
            return 1;
        }

        match address {
            a if a == mult_base + RESULT_A_OFFSET => self.mult_result.get().0,
            a if a == mult_base + RESULT_B_OFFSET => self.mult_result.get().1,
            a if a == div_base + RESULT_A_OFFSET => self.div_result.get().0,
            a if a == div_base + RESULT_B_OFFSET => self.div_result.get().1,
            _ => {
                trace!("read from unmapped register {:#x}", address);
                0
            }
        }
    }

    fn write(&self, address: u32, value: u32) {
        let RegisterMap {
            mult_base,
            div_base,
        } = self.map;

        match address {
            a if a == mult_base + OPERAND_A_OFFSET => {
                self.mult_operands.set((value, self.mult_operands.get().1));
            }
            a if a == mult_base + OPERAND_B_OFFSET => {
                let (a, _) = self.mult_operands.get();
                self.mult_operands.set((a, value));
                let product = wide::mul32_wide(a, value);
                self.mult_result
                    .set(((product >> 32) as u32, product as u32));
                self.start();
            }
            a if a == div_base + OPERAND_A_OFFSET => {
                self.div_operands.set((value, self.div_operands.get().1));
            }
            a if a == div_base + OPERAND_B_OFFSET => {
                let (dividend, _) = self.div_operands.get();
                self.div_operands.set((dividend, value));
                let DivMod {
                    quotient,
                    remainder,
                } = wide::udivmod32(dividend, value);
                self.div_result.set((quotient, remainder));
                self.start();
            }
            _ => trace!("write {:#x} to unmapped register {:#x}", value, address),
        }
    }
}
