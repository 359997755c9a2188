// minirt/src/runtime.rs

//! One entry point per operation and operand width.
//!
//! This is the surface generated code calls into wherever the target has no
//! native instruction. The multiply/divide backend is picked once, when the
//! runtime is built; everything else is shared software.

use crate::float;
use crate::wide::{self, DivMod, MulDivUnit, SoftwareUnit};

pub struct Runtime<U = SoftwareUnit>
where
    U: MulDivUnit,
{
    unit: U,
}

impl Runtime<SoftwareUnit> {
    pub fn software() -> Self {
        Self::new(SoftwareUnit)
    }
}

impl Default for Runtime<SoftwareUnit> {
    fn default() -> Self {
        Self::software()
    }
}

impl<U> Runtime<U>
where
    U: MulDivUnit,
{
    pub fn new(unit: U) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }

    // binary32

    pub fn add_f32(&self, a: f32, b: f32) -> f32 {
        f32::from_bits(float::add(a.to_bits(), b.to_bits()))
    }

    pub fn sub_f32(&self, a: f32, b: f32) -> f32 {
        f32::from_bits(float::sub(a.to_bits(), b.to_bits()))
    }

    pub fn mul_f32(&self, a: f32, b: f32) -> f32 {
        f32::from_bits(float::mul_with(&self.unit, a.to_bits(), b.to_bits()))
    }

    pub fn div_f32(&self, a: f32, b: f32) -> f32 {
        f32::from_bits(float::div(a.to_bits(), b.to_bits()))
    }

    pub fn neg_f32(&self, a: f32) -> f32 {
        f32::from_bits(float::neg(a.to_bits()))
    }

    /// False when either side is NaN.
    pub fn ge_f32(&self, a: f32, b: f32) -> bool {
        float::ge(a.to_bits(), b.to_bits())
    }

    /// False when either side is NaN.
    pub fn lt_f32(&self, a: f32, b: f32) -> bool {
        float::lt(a.to_bits(), b.to_bits())
    }

    pub fn i32_to_f32(&self, x: i32) -> f32 {
        f32::from_bits(float::from_i32(x))
    }

    pub fn u32_to_f32(&self, x: u32) -> f32 {
        f32::from_bits(float::from_u32(x))
    }

    pub fn f32_to_i32(&self, a: f32) -> i32 {
        float::to_i32(a.to_bits())
    }

    pub fn f32_to_u32(&self, a: f32) -> u32 {
        float::to_u32(a.to_bits())
    }

    // 32-bit integers

    pub fn mul_u32(&self, a: u32, b: u32) -> u32 {
        self.unit.multiply_low(a, b)
    }

    pub fn mul_u32_wide(&self, a: u32, b: u32) -> u64 {
        self.unit.multiply(a, b)
    }

    pub fn divmod_u32(&self, dividend: u32, divisor: u32) -> DivMod<u32> {
        self.unit.divide(dividend, divisor)
    }

    pub fn div_u32(&self, dividend: u32, divisor: u32) -> u32 {
        self.unit.divide(dividend, divisor).quotient
    }

    pub fn mod_u32(&self, dividend: u32, divisor: u32) -> u32 {
        self.unit.divide(dividend, divisor).remainder
    }

    pub fn div_i32(&self, dividend: i32, divisor: i32) -> i32 {
        wide::div_i32(&self.unit, dividend, divisor)
    }

    pub fn mod_i32(&self, dividend: i32, divisor: i32) -> i32 {
        wide::mod_i32(&self.unit, dividend, divisor)
    }

    pub fn clz_u32(&self, x: u32) -> u32 {
        wide::clz32(x)
    }

    pub fn first_set_u32(&self, x: u32) -> u32 {
        wide::first_set_bit32(x)
    }

    // 64-bit integers

    pub fn mul_u64(&self, a: u64, b: u64) -> u64 {
        wide::mul64(&self.unit, a, b)
    }

    pub fn mul_i64(&self, a: i64, b: i64) -> i64 {
        wide::mul_i64(&self.unit, a, b)
    }

    pub fn div_u64(&self, dividend: u64, divisor: u64) -> u64 {
        wide::div_u64(dividend, divisor)
    }

    pub fn mod_u64(&self, dividend: u64, divisor: u64) -> u64 {
        wide::mod_u64(dividend, divisor)
    }

    pub fn div_i64(&self, dividend: i64, divisor: i64) -> i64 {
        wide::div_i64(dividend, divisor)
    }

    pub fn mod_i64(&self, dividend: i64, divisor: i64) -> i64 {
        wide::mod_i64(dividend, divisor)
    }

    pub fn shl_u64(&self, value: u64, amount: u32) -> u64 {
        wide::shl64(value, amount)
    }

    pub fn lshr_u64(&self, value: u64, amount: u32) -> u64 {
        wide::lshr64(value, amount)
    }

    pub fn ashr_i64(&self, value: i64, amount: u32) -> i64 {
        wide::ashr64(value, amount)
    }
}
