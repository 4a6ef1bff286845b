//! Signed 32.32 fixed-point arithmetic used by the RGB565 and YUV codecs.
//!
//! Products and quotients are evaluated with an `i128` intermediate, so no precision is lost
//! before the final shift.

const FRAC_BITS: u32 = 32;
const HALF: i64 = 1 << (FRAC_BITS - 1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Fixed(i64);

impl Fixed {
    pub(crate) const fn from_int(v: i32) -> Self {
        Self((v as i64) << FRAC_BITS)
    }

    /// `num / den` as fixed point, truncated toward zero. `den` must be non-zero.
    pub(crate) const fn from_fraction(num: i64, den: i64) -> Self {
        Self((((num as i128) << FRAC_BITS) / den as i128) as i64)
    }

    pub(crate) const fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i128 * rhs.0 as i128) >> FRAC_BITS) as i64)
    }

    /// Quotient truncated toward zero. `rhs` must be non-zero.
    pub(crate) const fn div(self, rhs: Self) -> Self {
        Self((((self.0 as i128) << FRAC_BITS) / rhs.0 as i128) as i64)
    }

    pub(crate) const fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }

    pub(crate) const fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }

    /// Round half-up to the nearest integer (`floor(v + 0.5)`).
    pub(crate) const fn round(self) -> i64 {
        (self.0 + HALF) >> FRAC_BITS
    }
}

/// `ceil(n / d)` for unsigned operands.
pub(crate) const fn div_round_up(n: u64, d: u64) -> u64 {
    n.div_ceil(d)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fixed.rs"]
mod tests;
