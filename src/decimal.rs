use std::fmt;

use serde::{Deserialize, Serialize};

/// An arbitrary-precision base-10 number, stored the way it travels on the
/// wire: a sign, a digit sequence, and a base-10 exponent, or one of the
/// four special values.
///
/// The value of a finite decimal is `(-1)^sign × digits × 10^exponent`,
/// with `digits` read as a plain base-10 integer (most significant digit
/// first). Digits must each be 0-9 and there may be at most 65535 of them;
/// violating either makes the value unencodable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decimal {
    /// An ordinary finite value.
    Finite {
        /// True for negative values (including negative zero).
        negative: bool,
        /// Base-10 digits, most significant first. Each must be 0-9.
        digits: Vec<u8>,
        /// Base-10 exponent applied to the digit string.
        exponent: i16,
    },
    /// Positive or negative infinity.
    Infinity {
        /// True for negative infinity.
        negative: bool,
    },
    /// Quiet or signaling not-a-number.
    Nan {
        /// True for a signaling NaN.
        signaling: bool,
    },
}

impl Decimal {
    /// Build a finite decimal, checking the digit constraints.
    ///
    /// Returns `None` if any digit is outside 0-9 or there are more than
    /// 65535 digits.
    pub fn finite(negative: bool, digits: Vec<u8>, exponent: i16) -> Option<Decimal> {
        if digits.len() > u16::MAX as usize || digits.iter().any(|d| *d > 9) {
            return None;
        }
        Some(Decimal::Finite {
            negative,
            digits,
            exponent,
        })
    }

    /// Returns `true` for quiet and signaling NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self, Decimal::Nan { .. })
    }

    /// Returns `true` for positive and negative infinity.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Decimal::Infinity { .. })
    }

    /// Returns `true` for ordinary finite values.
    pub fn is_finite(&self) -> bool {
        matches!(self, Decimal::Finite { .. })
    }

    /// Returns `true` if the sign bit is set. NaN has no sign and reports
    /// `false`.
    pub fn is_negative(&self) -> bool {
        match self {
            Decimal::Finite { negative, .. } => *negative,
            Decimal::Infinity { negative } => *negative,
            Decimal::Nan { .. } => false,
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Decimal::Finite {
                negative,
                digits,
                exponent,
            } => {
                if *negative {
                    f.write_str("-")?;
                }
                if digits.is_empty() {
                    f.write_str("0")?;
                } else {
                    for d in digits {
                        write!(f, "{}", d)?;
                    }
                }
                if *exponent != 0 {
                    write!(f, "E{:+}", exponent)?;
                }
                Ok(())
            }
            Decimal::Infinity { negative: true } => f.write_str("-Infinity"),
            Decimal::Infinity { negative: false } => f.write_str("Infinity"),
            Decimal::Nan { signaling: true } => f.write_str("sNaN"),
            Decimal::Nan { signaling: false } => f.write_str("NaN"),
        }
    }
}
