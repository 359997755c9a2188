// minirt/src/wide.rs

use crate::error::{Error, Result};

/// Quotient and remainder of one division. A zero divisor yields the
/// sentinel `DivMod { quotient: 0, remainder: 0 }` on every path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DivMod<T> {
    pub quotient: T,
    pub remainder: T,
}

/// A 32-bit multiply/divide functional unit.
///
/// Everything wider or signed is composed on top of these two primitives, so
/// swapping the unit swaps the backend for the whole runtime.
pub trait MulDivUnit {
    /// Full 64-bit product of two 32-bit operands.
    fn multiply(&self, a: u32, b: u32) -> u64;

    /// Low word of the product.
    fn multiply_low(&self, a: u32, b: u32) -> u32 {
        self.multiply(a, b) as u32
    }

    /// Unsigned quotient and remainder. Returns `(0, 0)` when `divisor` is 0.
    fn divide(&self, dividend: u32, divisor: u32) -> DivMod<u32>;
}

impl<U> MulDivUnit for &U
where
    U: MulDivUnit + ?Sized,
{
    fn multiply(&self, a: u32, b: u32) -> u64 {
        (**self).multiply(a, b)
    }

    fn multiply_low(&self, a: u32, b: u32) -> u32 {
        (**self).multiply_low(a, b)
    }

    fn divide(&self, dividend: u32, divisor: u32) -> DivMod<u32> {
        (**self).divide(dividend, divisor)
    }
}

/// Bit-iterating multiply and divide. Needs nothing but adds and shifts.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareUnit;

impl MulDivUnit for SoftwareUnit {
    fn multiply(&self, a: u32, b: u32) -> u64 {
        mul32_wide(a, b)
    }

    fn multiply_low(&self, a: u32, b: u32) -> u32 {
        mul32(a, b)
    }

    fn divide(&self, dividend: u32, divisor: u32) -> DivMod<u32> {
        udivmod32(dividend, divisor)
    }
}

fn split(value: u64) -> (u32, u32) {
    (value as u32, (value >> 32) as u32)
}

fn join(low: u32, high: u32) -> u64 {
    ((high as u64) << 32) | low as u64
}

// Shift-and-add, low word only
pub fn mul32(mut a: u32, mut b: u32) -> u32 {
    let mut result = 0u32;
    while b != 0 {
        if b & 1 != 0 {
            result = result.wrapping_add(a);
        }
        a <<= 1;
        b >>= 1;
    }
    result
}

pub fn mul32_wide(a: u32, mut b: u32) -> u64 {
    let mut addend = a as u64;
    let mut result = 0u64;
    while b != 0 {
        if b & 1 != 0 {
            result += addend;
        }
        addend <<= 1;
        b >>= 1;
    }
    result
}

/// Restoring long division, one quotient bit per iteration from the top.
pub fn udivmod32(dividend: u32, divisor: u32) -> DivMod<u32> {
    if divisor == 0 {
        return DivMod::default();
    }

    let mut quotient = 0u32;
    // One bit wider than the divisor so the shift-in never drops a bit.
    let mut remainder = 0u64;
    for i in (0..32).rev() {
        remainder = (remainder << 1) | ((dividend >> i) & 1) as u64;
        if remainder >= divisor as u64 {
            remainder -= divisor as u64;
            quotient |= 1 << i;
        }
    }

    DivMod {
        quotient,
        remainder: remainder as u32,
    }
}

pub fn checked_udivmod32(dividend: u32, divisor: u32) -> Result<DivMod<u32>> {
    if divisor == 0 {
        return Err(Error::DivideByZero);
    }
    Ok(udivmod32(dividend, divisor))
}

/// Signed quotient truncated toward zero. `i32::MIN / -1` wraps to `i32::MIN`.
pub fn div_i32<U>(unit: &U, dividend: i32, divisor: i32) -> i32
where
    U: MulDivUnit + ?Sized,
{
    let DivMod { quotient, .. } = unit.divide(dividend.unsigned_abs(), divisor.unsigned_abs());
    if (dividend < 0) != (divisor < 0) {
        quotient.wrapping_neg() as i32
    } else {
        quotient as i32
    }
}

/// Signed remainder; its sign follows the dividend.
pub fn mod_i32<U>(unit: &U, dividend: i32, divisor: i32) -> i32
where
    U: MulDivUnit + ?Sized,
{
    let DivMod { remainder, .. } = unit.divide(dividend.unsigned_abs(), divisor.unsigned_abs());
    if dividend < 0 {
        remainder.wrapping_neg() as i32
    } else {
        remainder as i32
    }
}

/// Low 64 bits of a 64x64 product from three 32x32 products. The high
/// cross product only ever lands above bit 63, so it is skipped.
pub fn mul64<U>(unit: &U, a: u64, b: u64) -> u64
where
    U: MulDivUnit + ?Sized,
{
    let (a_low, a_high) = split(a);
    let (b_low, b_high) = split(b);
    let low = unit.multiply(a_low, b_low);
    let cross = unit
        .multiply_low(a_low, b_high)
        .wrapping_add(unit.multiply_low(a_high, b_low));
    low.wrapping_add(join(0, cross))
}

pub fn mul_i64<U>(unit: &U, a: i64, b: i64) -> i64
where
    U: MulDivUnit + ?Sized,
{
    let product = mul64(unit, a.unsigned_abs(), b.unsigned_abs());
    if (a < 0) != (b < 0) {
        product.wrapping_neg() as i64
    } else {
        product as i64
    }
}

pub fn udivmod64(dividend: u64, divisor: u64) -> DivMod<u64> {
    if divisor == 0 {
        return DivMod::default();
    }

    let mut quotient = 0u64;
    let mut remainder = dividend;
    for i in (0..64).rev() {
        // `divisor << i` cannot overflow once this holds.
        if (remainder >> i) >= divisor {
            quotient |= 1 << i;
            remainder -= divisor << i;
        }
    }

    DivMod {
        quotient,
        remainder,
    }
}

pub fn checked_udivmod64(dividend: u64, divisor: u64) -> Result<DivMod<u64>> {
    if divisor == 0 {
        return Err(Error::DivideByZero);
    }
    Ok(udivmod64(dividend, divisor))
}

pub fn div_u64(dividend: u64, divisor: u64) -> u64 {
    udivmod64(dividend, divisor).quotient
}

pub fn mod_u64(dividend: u64, divisor: u64) -> u64 {
    udivmod64(dividend, divisor).remainder
}

pub fn div_i64(dividend: i64, divisor: i64) -> i64 {
    let quotient = div_u64(dividend.unsigned_abs(), divisor.unsigned_abs());
    if (dividend < 0) != (divisor < 0) {
        quotient.wrapping_neg() as i64
    } else {
        quotient as i64
    }
}

pub fn mod_i64(dividend: i64, divisor: i64) -> i64 {
    let remainder = mod_u64(dividend.unsigned_abs(), divisor.unsigned_abs());
    if dividend < 0 {
        remainder.wrapping_neg() as i64
    } else {
        remainder as i64
    }
}

// Amounts of 64 and above shift everything out.
pub fn shl64(value: u64, amount: u32) -> u64 {
    let (low, high) = split(value);
    match amount {
        0 => value,
        1..=31 => join(low << amount, (high << amount) | (low >> (32 - amount))),
        32..=63 => join(0, low << (amount - 32)),
        _ => 0,
    }
}

pub fn lshr64(value: u64, amount: u32) -> u64 {
    let (low, high) = split(value);
    match amount {
        0 => value,
        1..=31 => join((low >> amount) | (high << (32 - amount)), high >> amount),
        32..=63 => join(high >> (amount - 32), 0),
        _ => 0,
    }
}

pub fn ashr64(value: i64, amount: u32) -> i64 {
    let (low, high) = split(value as u64);
    let high = high as i32;
    // All ones for negative values, zero otherwise.
    let fill = (high >> 31) as u32;
    let shifted = match amount {
        0 => return value,
        1..=31 => join(
            (low >> amount) | ((high as u32) << (32 - amount)),
            (high >> amount) as u32,
        ),
        32..=63 => join((high >> (amount - 32)) as u32, fill),
        _ => join(fill, fill),
    };
    shifted as i64
}

pub fn clz32(mut x: u32) -> u32 {
    if x == 0 {
        return 32;
    }
    let mut count = 0;
    while x & 0x8000_0000 == 0 {
        count += 1;
        x <<= 1;
    }
    count
}

/// 1-based position of the most significant set bit, or 0 when `x` is 0.
pub fn first_set_bit32(x: u32) -> u32 {
    32 - clz32(x)
}
