//! Tick-based numeric types for prices and quantities
//!
//! Prices are integer ticks at an externally agreed scale (e.g. one tick =
//! 0.0001 currency units). The matching path performs no floating-point
//! arithmetic; converting ticks to display prices is the caller's concern.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Price in integer ticks
///
/// Always strictly positive: a price of zero or below is rejected at the
/// validation boundary, and market orders carry no price at all
/// (`Option<Price>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Create a new Price
    ///
    /// # Panics
    /// Panics if `ticks` is not strictly positive.
    pub fn new(ticks: i64) -> Self {
        assert!(ticks > 0, "price must be positive");
        Self(ticks)
    }

    /// Try to create a Price, returning None for zero or negative ticks
    pub fn try_new(ticks: i64) -> Option<Self> {
        (ticks > 0).then_some(Self(ticks))
    }

    /// Get the tick count
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Distance in ticks to another price (`self - other`)
    pub const fn spread_to(&self, other: Price) -> i64 {
        self.0 - other.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.0)
    }
}

/// Quantity in whole units
///
/// Zero is a valid stored value (a fully consumed residual) but is rejected
/// for incoming orders at the validation boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Qty(u64);

impl Qty {
    /// Create a new Qty
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Try to create a non-zero Qty
    pub fn try_new(units: u64) -> Option<Self> {
        (units > 0).then_some(Self(units))
    }

    /// The zero quantity
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the unit count
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check for zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtraction clamped at zero
    pub const fn saturating_sub(self, rhs: Qty) -> Qty {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Qty {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Qty {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Qty {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "quantity underflow");
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Qty {
    fn sub_assign(&mut self, rhs: Self) {
        assert!(self.0 >= rhs.0, "quantity underflow");
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
