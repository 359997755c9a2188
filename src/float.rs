// minirt/src/float.rs

//! IEEE-754 binary32 arithmetic on raw bit patterns.
//!
//! Every operation rounds to nearest, ties to even. NaN operands propagate
//! unchanged (the left one wins); invalid operations produce
//! [`QUIET_NAN`](crate::bits::QUIET_NAN).

use std::cmp::Ordering;

use crate::bits::{
    self, Decoded, BIAS, IMPLICIT_BIT, MAGNITUDE_MASK, MANTISSA_MASK, MAX_EXPONENT,
    POSITIVE_ZERO, QUIET_NAN, SIGN_MASK,
};
use crate::wide::{self, DivMod, MulDivUnit, SoftwareUnit};

// Working significands keep the implicit bit at bit 30, leaving seven
// rounding bits below the 23 mantissa bits and one spare bit for carries.
const ROUND_BITS: u32 = 7;
const ROUND_MASK: u32 = (1 << ROUND_BITS) - 1;
const HALFWAY: u32 = 1 << (ROUND_BITS - 1);
const CARRY_BIT: u32 = 1 << 31;

/// Right shift that ORs everything shifted out into bit 0.
fn shift_right_sticky(value: u32, amount: u32) -> u32 {
    if amount == 0 {
        value
    } else if amount < 32 {
        (value >> amount) | ((value << (32 - amount)) != 0) as u32
    } else {
        (value != 0) as u32
    }
}

// Subnormals get exponent 1 and no implicit bit.
fn unpack(bits: u32) -> (i32, u32) {
    let Decoded {
        exponent, mantissa, ..
    } = bits::decode(bits);
    if exponent == 0 {
        (1, mantissa)
    } else {
        (exponent as i32, mantissa | IMPLICIT_BIT)
    }
}

// Nonzero finite input only. The implicit bit always ends up at bit 23; the
// exponent goes below 1 for subnormals.
fn unpack_normalized(bits: u32) -> (i32, u32) {
    let (exponent, significand) = unpack(bits);
    let shift = wide::clz32(significand) - 8;
    (exponent - shift as i32, significand << shift)
}

// Moves the leading one of a nonzero working significand up to bit 30.
fn normalize(exponent: i32, significand: u32) -> (i32, u32) {
    let shift = wide::clz32(significand) - 1;
    (exponent - shift as i32, significand << shift)
}

/// Rounds a normalized working significand and packs the result.
///
/// Exponents above the finite range give infinity; exponents below 1 shift
/// the significand down into the subnormal range before rounding.
fn round_pack(sign: u32, mut exponent: i32, mut significand: u32) -> u32 {
    if exponent >= MAX_EXPONENT as i32 {
        return bits::infinity(sign);
    }
    if exponent <= 0 {
        significand = shift_right_sticky(significand, (1 - exponent) as u32);
        exponent = 0;
    }

    let round_bits = significand & ROUND_MASK;
    let mut fraction = significand >> ROUND_BITS;
    if round_bits > HALFWAY || (round_bits == HALFWAY && fraction & 1 != 0) {
        fraction += 1;
    }

    if fraction & (IMPLICIT_BIT << 1) != 0 {
        fraction >>= 1;
        exponent += 1;
    } else if exponent == 0 && fraction & IMPLICIT_BIT != 0 {
        // Largest subnormal rounded up to the smallest normal.
        exponent = 1;
    }

    if exponent >= MAX_EXPONENT as i32 {
        return bits::infinity(sign);
    }
    bits::encode(sign, exponent as u32, fraction & MANTISSA_MASK)
}

pub fn neg(a: u32) -> u32 {
    a ^ SIGN_MASK
}

pub fn add(a: u32, b: u32) -> u32 {
    if bits::is_nan(a) {
        return a;
    }
    if bits::is_nan(b) {
        return b;
    }
    if bits::is_infinite(a) {
        if bits::is_infinite(b) && bits::sign_of(a) != bits::sign_of(b) {
            return QUIET_NAN;
        }
        return a;
    }
    if bits::is_infinite(b) {
        return b;
    }
    if bits::is_zero(a) {
        // -0 only when both are -0
        return if bits::is_zero(b) { a & b } else { b };
    }
    if bits::is_zero(b) {
        return a;
    }

    // Larger magnitude first; its sign wins when the signs differ.
    let (big, small) = if a & MAGNITUDE_MASK >= b & MAGNITUDE_MASK {
        (a, b)
    } else {
        (b, a)
    };
    let sign = bits::sign_of(big);
    let (exponent, big_significand) = unpack(big);
    let (small_exponent, small_significand) = unpack(small);

    let big_significand = big_significand << ROUND_BITS;
    let small_significand = shift_right_sticky(
        small_significand << ROUND_BITS,
        (exponent - small_exponent) as u32,
    );

    if bits::sign_of(a) == bits::sign_of(b) {
        let sum = big_significand + small_significand;
        let (exponent, significand) = if sum & CARRY_BIT != 0 {
            (exponent + 1, shift_right_sticky(sum, 1))
        } else {
            normalize(exponent, sum)
        };
        round_pack(sign, exponent, significand)
    } else {
        let difference = big_significand - small_significand;
        if difference == 0 {
            return POSITIVE_ZERO;
        }
        let (exponent, significand) = normalize(exponent, difference);
        round_pack(sign, exponent, significand)
    }
}

pub fn sub(a: u32, b: u32) -> u32 {
    add(a, neg(b))
}

pub fn mul(a: u32, b: u32) -> u32 {
    mul_with(&SoftwareUnit, a, b)
}

/// Multiply with the significand product taken from `unit`.
pub fn mul_with<U>(unit: &U, a: u32, b: u32) -> u32
where
    U: MulDivUnit + ?Sized,
{
    if bits::is_nan(a) {
        return a;
    }
    if bits::is_nan(b) {
        return b;
    }
    let sign = bits::sign_of(a) ^ bits::sign_of(b);
    if bits::is_infinite(a) || bits::is_infinite(b) {
        if bits::is_zero(a) || bits::is_zero(b) {
            return QUIET_NAN;
        }
        return bits::infinity(sign);
    }
    if bits::is_zero(a) || bits::is_zero(b) {
        return bits::zero(sign);
    }

    let (exponent_a, significand_a) = unpack_normalized(a);
    let (exponent_b, significand_b) = unpack_normalized(b);
    let mut exponent = exponent_a + exponent_b - BIAS;

    // 24x24 bits: the product lies in [2^46, 2^48).
    let product = unit.multiply(significand_a, significand_b);
    let mut significand = (product >> 16) as u32 | (product & 0xFFFF != 0) as u32;
    if significand & CARRY_BIT != 0 {
        significand = shift_right_sticky(significand, 1);
        exponent += 1;
    }
    round_pack(sign, exponent, significand)
}

pub fn div(a: u32, b: u32) -> u32 {
    if bits::is_nan(a) {
        return a;
    }
    if bits::is_nan(b) {
        return b;
    }
    let sign = bits::sign_of(a) ^ bits::sign_of(b);
    if bits::is_infinite(a) {
        if bits::is_infinite(b) {
            return QUIET_NAN;
        }
        return bits::infinity(sign);
    }
    if bits::is_infinite(b) {
        return bits::zero(sign);
    }
    if bits::is_zero(b) {
        if bits::is_zero(a) {
            return QUIET_NAN;
        }
        return bits::infinity(sign);
    }
    if bits::is_zero(a) {
        return bits::zero(sign);
    }

    let (exponent_a, significand_a) = unpack_normalized(a);
    let (exponent_b, significand_b) = unpack_normalized(b);

    // Scale the dividend so the quotient lands in [2^30, 2^31).
    let (exponent, dividend) = if significand_a < significand_b {
        (
            exponent_a - exponent_b + BIAS - 1,
            (significand_a as u64) << 31,
        )
    } else {
        (exponent_a - exponent_b + BIAS, (significand_a as u64) << 30)
    };
    let DivMod {
        quotient,
        remainder,
    } = wide::udivmod64(dividend, significand_b as u64);
    let significand = quotient as u32 | (remainder != 0) as u32;
    round_pack(sign, exponent, significand)
}

/// Ordering of two values, or `None` when either is NaN. `-0 == +0`.
pub fn compare(a: u32, b: u32) -> Option<Ordering> {
    if bits::is_nan(a) || bits::is_nan(b) {
        return None;
    }
    if bits::is_zero(a) && bits::is_zero(b) {
        return Some(Ordering::Equal);
    }
    let ordering = match (bits::sign_of(a), bits::sign_of(b)) {
        (0, 0) => a.cmp(&b),
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        // Both negative: larger magnitude is smaller.
        _ => b.cmp(&a),
    };
    Some(ordering)
}

pub fn ge(a: u32, b: u32) -> bool {
    matches!(compare(a, b), Some(Ordering::Greater | Ordering::Equal))
}

pub fn lt(a: u32, b: u32) -> bool {
    matches!(compare(a, b), Some(Ordering::Less))
}

fn from_magnitude(sign: u32, magnitude: u32) -> u32 {
    if magnitude == 0 {
        return POSITIVE_ZERO;
    }
    let shift = wide::clz32(magnitude);
    let exponent = BIAS + 31 - shift as i32;
    let significand = shift_right_sticky(magnitude << shift, 1);
    round_pack(sign, exponent, significand)
}

pub fn from_i32(x: i32) -> u32 {
    from_magnitude((x < 0) as u32, x.unsigned_abs())
}

pub fn from_u32(x: u32) -> u32 {
    from_magnitude(0, x)
}

fn truncate(exponent: u32, significand: u32) -> u32 {
    if exponent > 23 {
        significand << (exponent - 23)
    } else {
        significand >> (23 - exponent)
    }
}

/// Truncates toward zero. Out of range values saturate by sign, NaN included.
pub fn to_i32(a: u32) -> i32 {
    let Decoded {
        sign,
        exponent,
        mantissa,
    } = bits::decode(a);
    let exponent = exponent as i32 - BIAS;
    if exponent < 0 {
        return 0;
    }
    if exponent >= 31 {
        return if sign != 0 { i32::MIN } else { i32::MAX };
    }

    let magnitude = truncate(exponent as u32, mantissa | IMPLICIT_BIT) as i32;
    if sign != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Truncates toward zero. Anything negative gives 0, too large gives `u32::MAX`.
pub fn to_u32(a: u32) -> u32 {
    let Decoded {
        sign,
        exponent,
        mantissa,
    } = bits::decode(a);
    if sign != 0 {
        return 0;
    }
    let exponent = exponent as i32 - BIAS;
    if exponent < 0 {
        return 0;
    }
    if exponent >= 32 {
        return u32::MAX;
    }
    truncate(exponent as u32, mantissa | IMPLICIT_BIT)
}
