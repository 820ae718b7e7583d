//! Fixed-width integer helpers.
//!
//! Signals store their value in an `i64`. Narrow signals (fewer than
//! [`SIGNED_WIDTH`] bits) hold an unsigned value, wider ones hold a signed
//! two's complement value, so a 16-bit bus written with `0xFFFF` reads `-1`.

/// Widths at or above this are stored signed.
pub const SIGNED_WIDTH: u32 = 16;

/// The widest signal representable in an `i64`.
pub const MAX_WIDTH: u32 = 64;

/// A mask selecting the low `width` bits.
pub fn mask(width: u32) -> i64 {
    if width >= 64 {
        -1
    } else {
        (1i64 << width) - 1
    }
}

/// Truncate to 16 bits, two's complement.
#[allow(clippy::cast_possible_truncation)]
pub fn int16(x: i64) -> i64 {
    i64::from(x as i16)
}

/// Sign-extend the low `width` bits of `x`.
pub fn sign_extend(x: i64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return x;
    }
    let shift = 64 - width;
    (x << shift) >> shift
}

/// Bring `x` into the storage form of a `width`-bit signal.
pub fn normalize(x: i64, width: u32) -> i64 {
    if width >= SIGNED_WIDTH {
        sign_extend(x, width)
    } else {
        x & mask(width)
    }
}

/// Extract bits `from..=to` of `x` as an unsigned value.
pub fn extract(x: i64, from: u32, to: u32) -> i64 {
    (x >> from) & mask(to - from + 1)
}

/// Replace bits `from..=to` of `x` with the low bits of `bits`.
pub fn deposit(x: i64, from: u32, to: u32, bits: i64) -> i64 {
    let field = mask(to - from + 1) << from;
    (x & !field) | ((bits << from) & field)
}
