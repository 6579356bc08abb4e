use crate::analysis::option::DivisionRounding;
use rug::Integer;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Either `∞`, `-∞`, or an arbitrary precision integer
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum MathNumber {
    INF,          // Positive infinity
    Int(Integer), // Arbitrary precision integer
    NINF,         // Negative infinity
}

use MathNumber::*;

#[derive(Clone, Copy, PartialEq)]
enum Sign {
    Positive,
    Negative,
    Zero,
}

/// How a single quotient is rounded
#[derive(Clone, Copy)]
enum QuotientRounding {
    Down,
    Up,
    TowardZero,
}

impl MathNumber {
    pub fn zero() -> Self {
        Int(Integer::from(0))
    }

    pub fn one() -> Self {
        Int(Integer::from(1))
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Int(_))
    }

    pub fn is_plus_infinity(&self) -> bool {
        matches!(self, INF)
    }

    pub fn is_minus_infinity(&self) -> bool {
        matches!(self, NINF)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Int(n) if *n == 0)
    }

    fn sign(&self) -> Sign {
        match self {
            INF => Sign::Positive,
            NINF => Sign::Negative,
            Int(n) if *n > 0 => Sign::Positive,
            Int(n) if *n < 0 => Sign::Negative,
            Int(_) => Sign::Zero,
        }
    }

    /// `None` when `rhs` is zero
    fn divide(&self, rhs: &Self, rounding: QuotientRounding) -> Option<Self> {
        let sign = match (self.sign(), rhs.sign()) {
            (_, Sign::Zero) => return None,
            (Sign::Zero, _) => Sign::Zero,
            (l, r) if l == r => Sign::Positive,
            _ => Sign::Negative,
        };
        let quotient = match (self, rhs) {
            (INF, _) | (NINF, _) => match sign {
                Sign::Positive => INF,
                Sign::Negative => NINF,
                Sign::Zero => Self::zero(),
            },
            (_, INF) | (_, NINF) => Self::zero(),
            (Int(a), Int(b)) => {
                let (a, b) = (a.clone(), b.clone());
                Int(match rounding {
                    QuotientRounding::Down => a.div_rem_floor(b).0,
                    QuotientRounding::Up => a.div_rem_ceil(b).0,
                    QuotientRounding::TowardZero => a.div_rem(b).0,
                })
            }
        };
        Some(quotient)
    }
}

impl fmt::Debug for MathNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            INF => write!(f, "+Inf"),
            NINF => write!(f, "-Inf"),
            Int(n) => write!(f, "{}", n),
        }
    }
}

impl Ord for MathNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            Ordering::Equal
        } else {
            match (self, other) {
                (INF, _) | (_, NINF) => Ordering::Greater,
                (NINF, _) | (_, INF) => Ordering::Less,
                (Int(a), Int(b)) => a.cmp(b),
            }
        }
    }
}

impl PartialOrd for MathNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Integer> for MathNumber {
    fn from(n: Integer) -> Self {
        Int(n)
    }
}

impl From<i64> for MathNumber {
    fn from(n: i64) -> Self {
        Int(Integer::from(n))
    }
}

impl Add for MathNumber {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        match (self, other) {
            // `INF + NINF` is INF: callers never add opposite infinities on the same side
            (INF, _) | (_, INF) => INF,
            (NINF, _) | (_, NINF) => NINF,
            (Int(a), Int(b)) => Int(a + b),
        }
    }
}

impl Sub for MathNumber {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        match (self, other) {
            (INF, _) | (_, NINF) => INF,
            (NINF, _) | (_, INF) => NINF,
            (Int(a), Int(b)) => Int(a - b),
        }
    }
}

impl Mul for MathNumber {
    type Output = Self;

    /// `0 * ∞` is 0
    fn mul(self, rhs: Self) -> Self {
        let sign = match (self.sign(), rhs.sign()) {
            (Sign::Zero, _) | (_, Sign::Zero) => Sign::Zero,
            (l, r) if l == r => Sign::Positive,
            _ => Sign::Negative,
        };
        match (self, rhs) {
            (Int(a), Int(b)) => Int(a * b),
            _ => match sign {
                Sign::Positive => INF,
                Sign::Negative => NINF,
                Sign::Zero => Self::zero(),
            },
        }
    }
}

/// A non-empty interval `[low, high]` of extended integers
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct IntInterval {
    pub low: MathNumber,
    pub high: MathNumber,
}

impl IntInterval {
    /// `None` when the interval would be empty
    pub fn new(low: MathNumber, high: MathNumber) -> Option<Self> {
        if low > high {
            None
        } else {
            Some(IntInterval { low, high })
        }
    }

    pub fn singleton(n: Integer) -> Self {
        IntInterval {
            low: Int(n.clone()),
            high: Int(n),
        }
    }

    pub fn infinite() -> Self {
        IntInterval {
            low: NINF,
            high: INF,
        }
    }

    pub fn zero() -> Self {
        Self::singleton(Integer::from(0))
    }

    pub fn is_infinite(&self) -> bool {
        self.low.is_minus_infinity() && self.high.is_plus_infinity()
    }

    pub fn is_singleton(&self) -> bool {
        self.low.is_finite() && self.low == self.high
    }

    pub fn is_zero(&self) -> bool {
        self.low.is_zero() && self.high.is_zero()
    }

    pub fn includes(&self, other: &IntInterval) -> bool {
        self.low <= other.low && other.high <= self.high
    }

    pub fn contains(&self, n: &MathNumber) -> bool {
        &self.low <= n && n <= &self.high
    }

    /// Divides by an interval that must not contain zero; otherwise the quotient is unbounded
    pub fn div(&self, rhs: &IntInterval, rounding: DivisionRounding) -> IntInterval {
        if rhs.contains(&MathNumber::zero()) {
            return Self::infinite();
        }
        let corners = [
            (&self.low, &rhs.low),
            (&self.low, &rhs.high),
            (&self.high, &rhs.low),
            (&self.high, &rhs.high),
        ];
        let (low_rounding, high_rounding) = match rounding {
            DivisionRounding::TowardZero => {
                (QuotientRounding::TowardZero, QuotientRounding::TowardZero)
            }
            DivisionRounding::Outward => (QuotientRounding::Down, QuotientRounding::Up),
        };
        let lows = corners.iter().filter_map(|(a, b)| a.divide(b, low_rounding));
        let highs = corners.iter().filter_map(|(a, b)| a.divide(b, high_rounding));
        match (lows.min(), highs.max()) {
            (Some(low), Some(high)) => IntInterval { low, high },
            _ => Self::infinite(),
        }
    }
}

impl fmt::Debug for IntInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.low, self.high)
    }
}

impl Add for IntInterval {
    type Output = IntInterval;

    fn add(self, other: IntInterval) -> IntInterval {
        IntInterval {
            low: self.low + other.low,
            high: self.high + other.high,
        }
    }
}

impl Sub for IntInterval {
    type Output = IntInterval;

    fn sub(self, other: IntInterval) -> IntInterval {
        IntInterval {
            low: self.low - other.high,
            high: self.high - other.low,
        }
    }
}

impl Mul for IntInterval {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = self.low.clone() * rhs.low.clone();
        let b = self.low.clone() * rhs.high.clone();
        let c = self.high.clone() * rhs.low;
        let d = self.high * rhs.high;
        let low = a.clone().min(b.clone()).min(c.clone()).min(d.clone());
        let high = a.max(b).max(c).max(d);
        IntInterval { low, high }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(low: i64, high: i64) -> IntInterval {
        IntInterval::new(MathNumber::from(low), MathNumber::from(high)).unwrap()
    }

    #[test]
    fn test_integer_cmp() {
        let ninf = NINF;
        let a = MathNumber::from(-1);
        let b = MathNumber::from(0);
        let c = MathNumber::from(1);
        let inf = INF;
        assert!(ninf < a && a < b && b < c && c < inf);
    }

    #[test]
    fn infinities_propagate() {
        assert_eq!(INF + MathNumber::from(3), INF);
        assert_eq!(MathNumber::from(3) - INF, NINF);
        assert_eq!(NINF * MathNumber::from(-2), INF);
        assert_eq!(INF * MathNumber::zero(), MathNumber::zero());
    }

    #[test]
    fn empty_intervals_are_rejected() {
        assert!(IntInterval::new(MathNumber::from(2), MathNumber::from(1)).is_none());
        assert!(IntInterval::new(NINF, INF).unwrap().is_infinite());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(interval(1, 2) + interval(3, 4), interval(4, 6));
        assert_eq!(interval(1, 2) - interval(3, 4), interval(-3, -1));
        assert_eq!(interval(-2, 3) * interval(4, 5), interval(-10, 15));
        assert_eq!(interval(-2, 3) * IntInterval::infinite(), IntInterval::infinite());
    }

    #[test]
    fn division_rounding() {
        assert_eq!(
            interval(7, 7).div(&interval(2, 2), DivisionRounding::TowardZero),
            interval(3, 3)
        );
        assert_eq!(
            interval(7, 7).div(&interval(2, 2), DivisionRounding::Outward),
            interval(3, 4)
        );
        assert_eq!(
            interval(-7, 7).div(&interval(2, 2), DivisionRounding::TowardZero),
            interval(-3, 3)
        );
        assert_eq!(
            interval(-7, 7).div(&interval(2, 2), DivisionRounding::Outward),
            interval(-4, 4)
        );
        assert!(interval(1, 2)
            .div(&interval(-1, 1), DivisionRounding::TowardZero)
            .is_infinite());
    }

    #[test]
    fn division_by_unbounded_divisor() {
        let positive = IntInterval::new(MathNumber::one(), INF).unwrap();
        assert_eq!(
            interval(10, 20).div(&positive, DivisionRounding::TowardZero),
            interval(0, 20)
        );
    }
}
