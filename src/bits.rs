// minirt/src/bits.rs

pub const SIGN_SHIFT: u32 = 31;
pub const EXPONENT_SHIFT: u32 = 23;
pub const SIGN_MASK: u32 = 1 << SIGN_SHIFT;
pub const EXPONENT_MASK: u32 = 0xFF;
pub const MANTISSA_BITS: u32 = 23;
pub const MANTISSA_MASK: u32 = (1 << MANTISSA_BITS) - 1;
pub const IMPLICIT_BIT: u32 = 1 << MANTISSA_BITS;
pub const MAGNITUDE_MASK: u32 = !SIGN_MASK;
pub const BIAS: i32 = 127;
pub const MAX_EXPONENT: u32 = 0xFF;

pub const POSITIVE_ZERO: u32 = 0x0000_0000;
pub const NEGATIVE_ZERO: u32 = 0x8000_0000;
pub const INFINITY: u32 = 0x7F80_0000;
pub const NEG_INFINITY: u32 = 0xFF80_0000;
/// The only NaN this runtime ever produces on its own.
pub const QUIET_NAN: u32 = 0x7FC0_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Zero,
    Subnormal,
    Normal,
    Infinity,
    NaN,
}

/// The three raw fields of a binary32 pattern. The exponent is still biased.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub sign: u32,
    pub exponent: u32,
    pub mantissa: u32,
}

/// Splits a bit pattern into its sign, biased exponent and mantissa fields.
pub fn decode(bits: u32) -> Decoded {
    Decoded {
        sign: bits >> SIGN_SHIFT,
        exponent: (bits >> EXPONENT_SHIFT) & EXPONENT_MASK,
        mantissa: bits & MANTISSA_MASK,
    }
}

/// Inverse of [`decode`]. No clamping: the exponent must fit 8 bits and the
/// mantissa 23 bits.
pub fn encode(sign: u32, exponent: u32, mantissa: u32) -> u32 {
    (sign << SIGN_SHIFT) | (exponent << EXPONENT_SHIFT) | mantissa
}

/// IEEE-754 category of a bit pattern.
pub fn classify(bits: u32) -> Class {
    let Decoded {
        exponent, mantissa, ..
    } = decode(bits);
    match (exponent, mantissa) {
        (0, 0) => Class::Zero,
        (0, _) => Class::Subnormal,
        (MAX_EXPONENT, 0) => Class::Infinity,
        (MAX_EXPONENT, _) => Class::NaN,
        _ => Class::Normal,
    }
}

/// True for every NaN, quiet or signalling.
pub fn is_nan(bits: u32) -> bool {
    bits & MAGNITUDE_MASK > INFINITY
}

pub fn is_infinite(bits: u32) -> bool {
    bits & MAGNITUDE_MASK == INFINITY
}

pub fn is_zero(bits: u32) -> bool {
    bits & MAGNITUDE_MASK == 0
}

/// The sign bit, 0 or 1.
pub fn sign_of(bits: u32) -> u32 {
    bits >> SIGN_SHIFT
}

pub fn infinity(sign: u32) -> u32 {
    encode(sign, MAX_EXPONENT, 0)
}

pub fn zero(sign: u32) -> u32 {
    encode(sign, 0, 0)
}
