use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       Cents       ---------------------------------------------------------

/// A monetary amount expressed as a whole number of cents.
///
/// All prices and totals on the event wire are integers, so `Cents` is a thin wrapper around `i64` that keeps
/// arithmetic honest and serializes as a bare number.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(i64);

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")))
        } else {
            Ok(Self(value as i64))
        }
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Cents::from(250);
        let b = Cents::from(175);
        assert_eq!(a + b, Cents::from(425));
        assert_eq!(a - b, Cents::from(75));
        let mut c = a;
        c -= b;
        assert_eq!(c, Cents::from(75));
        let total: Cents = [a, b, Cents::from_dollars(1)].into_iter().sum();
        assert_eq!(total, Cents::from(525));
    }

    #[test]
    fn display() {
        assert_eq!(Cents::from(499).to_string(), "$4.99");
        assert_eq!(Cents::from(-150).to_string(), "-$1.50");
        assert_eq!(Cents::from_dollars(12).to_string(), "$12.00");
        assert_eq!(Cents::default().to_string(), "$0.00");
    }

    #[test]
    fn serializes_as_a_bare_number() {
        let json = serde_json::to_string(&Cents::from(300)).unwrap();
        assert_eq!(json, "300");
        let value: Cents = serde_json::from_str("1250").unwrap();
        assert_eq!(value, Cents::from(1250));
    }

    #[test]
    fn conversion_bounds() {
        assert!(Cents::try_from(u64::MAX).is_err());
        assert_eq!(Cents::try_from(100u64).unwrap(), Cents::from(100));
    }
}
