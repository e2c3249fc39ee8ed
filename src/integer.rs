use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt::{self, Debug, Display};

use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum IntPriv {
    /// Fits in a machine word; encodes in one of the fixed-width classes.
    Small(i64),
    /// Outside the `i64` range; encodes as a length-prefixed `huge`.
    Huge(BigInt),
}

/// A signed integer of arbitrary magnitude.
///
/// Values inside the `i64` range are stored inline and encode in the
/// narrowest of the four fixed-width classes; anything larger is held as a
/// big integer and encodes as a length-prefixed two's-complement byte
/// sequence. Construction normalizes, so a big integer that happens to fit
/// `i64` is indistinguishable from one built from an `i64`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Integer {
    n: IntPriv,
}

impl Integer {
    /// Returns `true` if the integer can be represented as `i64`.
    #[inline]
    pub fn is_i64(&self) -> bool {
        matches!(self.n, IntPriv::Small(_))
    }

    /// Returns the integer represented as `i64` if possible, or else `None`.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self.n {
            IntPriv::Small(n) => Some(n),
            IntPriv::Huge(_) => None,
        }
    }

    /// Returns the integer represented as `f64` if possible, or else `None`.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self.n {
            IntPriv::Small(n) => Some(n as f64),
            IntPriv::Huge(ref n) => n.to_f64(),
        }
    }

    /// Returns the integer as an arbitrary-precision value.
    pub fn to_bigint(&self) -> BigInt {
        match self.n {
            IntPriv::Small(n) => BigInt::from(n),
            IntPriv::Huge(ref n) => n.clone(),
        }
    }

    /// Returns `true` if the value is negative.
    pub fn is_negative(&self) -> bool {
        match self.n {
            IntPriv::Small(n) => n < 0,
            IntPriv::Huge(ref n) => n.sign() == Sign::Minus,
        }
    }
}

pub(crate) fn get_int_internal(val: &Integer) -> &IntPriv {
    &val.n
}

impl std::default::Default for Integer {
    fn default() -> Self {
        Self {
            n: IntPriv::Small(0),
        }
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Integer) -> Ordering {
        match (&self.n, &other.n) {
            (IntPriv::Small(lhs), IntPriv::Small(rhs)) => lhs.cmp(rhs),
            (IntPriv::Huge(lhs), IntPriv::Huge(rhs)) => lhs.cmp(rhs),
            // A Huge never fits i64, so its sign settles the comparison.
            (IntPriv::Small(_), IntPriv::Huge(rhs)) => match rhs.sign() {
                Sign::Minus => Ordering::Greater,
                _ => Ordering::Less,
            },
            (IntPriv::Huge(lhs), IntPriv::Small(_)) => match lhs.sign() {
                Sign::Minus => Ordering::Less,
                _ => Ordering::Greater,
            },
        }
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Integer) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.n {
            IntPriv::Small(v) => write!(fmt, "Small({:?})", v),
            IntPriv::Huge(ref v) => write!(fmt, "Huge({:?})", v),
        }
    }
}

impl Display for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.n {
            IntPriv::Small(v) => Display::fmt(&v, fmt),
            IntPriv::Huge(ref v) => Display::fmt(v, fmt),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(n: BigInt) -> Self {
        match n.to_i64() {
            Some(v) => Integer {
                n: IntPriv::Small(v),
            },
            None => Integer { n: IntPriv::Huge(n) },
        }
    }
}

impl From<u64> for Integer {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(v) => Integer {
                n: IntPriv::Small(v),
            },
            Err(_) => Integer {
                n: IntPriv::Huge(BigInt::from(n)),
            },
        }
    }
}

impl From<u128> for Integer {
    fn from(n: u128) -> Self {
        Integer::from(BigInt::from(n))
    }
}

impl From<i128> for Integer {
    fn from(n: i128) -> Self {
        Integer::from(BigInt::from(n))
    }
}

macro_rules! impl_from_small {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                Integer {
                    n: IntPriv::Small(n as i64),
                }
            }
        }
    };
}

impl_from_small!(u8);
impl_from_small!(u16);
impl_from_small!(u32);
impl_from_small!(i8);
impl_from_small!(i16);
impl_from_small!(i32);
impl_from_small!(i64);

impl From<usize> for Integer {
    fn from(n: usize) -> Self {
        Integer::from(n as u64)
    }
}

impl From<isize> for Integer {
    fn from(n: isize) -> Self {
        Integer::from(n as i64)
    }
}

macro_rules! impl_try_from {
    ($t: ty) => {
        impl TryFrom<Integer> for $t {
            type Error = Integer;
            fn try_from(v: Integer) -> Result<Self, Self::Error> {
                match v.n {
                    IntPriv::Small(n) => TryFrom::try_from(n).map_err(|_| v),
                    IntPriv::Huge(_) => Err(v),
                }
            }
        }
    };
}

impl_try_from!(u8);
impl_try_from!(u16);
impl_try_from!(u32);
impl_try_from!(u64);
impl_try_from!(usize);
impl_try_from!(i8);
impl_try_from!(i16);
impl_try_from!(i32);
impl_try_from!(i64);
impl_try_from!(isize);
