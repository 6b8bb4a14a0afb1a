//! Numeric kernels shared by the tree evaluator, the bytecode VM and the pixel writers.
//!
//! Both evaluation paths call the same functions here so their results agree bit for bit.

/// IEEE 754 remainder: `x - n * y` where `n` is `x / y` rounded to the nearest integer, ties to
/// even.
///
/// Unlike `%` on `f64` (which truncates the quotient), the result lies in `[-|y|/2, |y|/2]`, so
/// `200 rem 255 == -55`. NaN when `x` is infinite or `y` is zero; `x` when `y` is infinite.
pub fn ieee_remainder(x: f64, y: f64) -> f64 {
    const TINY: f64 = 2.0 * f64::MIN_POSITIVE;
    const HALF_MAX: f64 = f64::MAX / 2.0;

    if x.is_nan() || y.is_nan() || x.is_infinite() || y == 0.0 {
        return f64::NAN;
    }
    if y.is_infinite() {
        return x;
    }

    let mut x = x;
    let mut y = y;
    let negative = x < 0.0;
    if negative {
        x = -x;
    }
    if y < 0.0 {
        y = -y;
    }
    if x == y {
        return if negative { -0.0 } else { 0.0 };
    }

    // `%` on f64 is exact; reduce into [0, 2y) first.
    if y <= HALF_MAX {
        x %= y + y;
    }
    if y < TINY {
        if x + x > y {
            x -= y;
            if x + x >= y {
                x -= y;
            }
        }
    } else {
        let half = 0.5 * y;
        if x > half {
            x -= y;
            if x >= half {
                x -= y;
            }
        }
    }

    if negative { -x } else { x }
}

/// Truncate toward zero into a signed 64-bit integer (saturating, NaN becomes 0).
pub(crate) fn trunc_i64(v: f64) -> i64 {
    v as i64
}

/// Truncate toward zero into an unsigned 64-bit integer (saturating, negatives and NaN become 0).
pub(crate) fn trunc_u64(v: f64) -> u64 {
    v as u64
}

/// `a << b` on the unsigned truncations; shifting by 64 or more clears every bit.
pub(crate) fn shl_u64(a: f64, b: f64) -> f64 {
    let by = trunc_u64(b);
    let out = u32::try_from(by)
        .ok()
        .and_then(|s| trunc_u64(a).checked_shl(s))
        .unwrap_or(0);
    out as f64
}

/// `a >> b` on the unsigned truncations; shifting by 64 or more clears every bit.
pub(crate) fn shr_u64(a: f64, b: f64) -> f64 {
    let by = trunc_u64(b);
    let out = u32::try_from(by)
        .ok()
        .and_then(|s| trunc_u64(a).checked_shr(s))
        .unwrap_or(0);
    out as f64
}

/// Saturate one channel value into a byte.
///
/// NaN and anything at or below zero map to 0, anything at or above 255 (including `+inf`) maps
/// to 255, everything else truncates toward zero.
pub fn saturate_channel(v: f64) -> u8 {
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v.trunc() as u8
    }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
