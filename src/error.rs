//! Library error types.

use std::fmt;

use crate::schema::Schema;
use crate::value::Value;

/// A duffel Result, normally returning a duffel [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A duffel error. Encompasses any issue that can happen during encoding,
/// decoding, or schema handling.
///
/// Every error is fatal to the call that produced it; no partial value or
/// partial byte stream is ever returned.
#[derive(Clone, Debug)]
pub enum Error {
    /// A value has no wire representation (and no fallback rescued it).
    Unencodable(String),
    /// Nesting exceeded [`MAX_DEPTH`](crate::MAX_DEPTH) on encode or decode.
    DepthLimit,
    /// The decoder needed more bytes than remain in the input.
    LengthTooShort {
        /// What step of decoding was underway when the input ran out.
        step: &'static str,
        /// How many bytes were left.
        actual: usize,
        /// How many bytes the step needed.
        needed: usize,
    },
    /// An unknown type byte, or a compression envelope nested inside one.
    BadTag(u8),
    /// A structurally invalid body: malformed UTF-8, a decimal digit
    /// outside 0-9, an impossible calendar date, and the like.
    BadEncode(String),
    /// The payload is compressed but the `compress` feature isn't enabled.
    NoCompression,
    /// The LZF codec rejected the data.
    Compression(String),
    /// A message failed schema validation; carries the offending
    /// sub-message and sub-schema.
    FailValidate {
        /// The part of the message that failed to match.
        message: Box<Value>,
        /// The sub-schema it failed to match against.
        schema: Box<Schema>,
    },
    /// A schema failed its own well-formedness check at construction.
    BadSchema(Box<Schema>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Unencodable(ref err) => write!(f, "Value cannot be encoded: {}", err),
            Error::DepthLimit => write!(f, "Value nesting exceeded the depth limit"),
            Error::LengthTooShort {
                step,
                actual,
                needed,
            } => write!(
                f,
                "Expected {} more bytes but only {} remain, on step [{}]",
                needed, actual, step
            ),
            Error::BadTag(tag) => write!(f, "Unrecognized type tag 0x{:02x}", tag),
            Error::BadEncode(ref err) => write!(f, "Invalid encoded body: {}", err),
            Error::NoCompression => write!(
                f,
                "Payload is compressed, but LZF support was not compiled in"
            ),
            Error::Compression(ref err) => write!(f, "LZF codec failure: {}", err),
            Error::FailValidate {
                ref message,
                ref schema,
            } => write!(
                f,
                "Message {:?} failed to match schema {:?}",
                message, schema
            ),
            Error::BadSchema(ref schema) => write!(f, "Malformed schema: {:?}", schema),
        }
    }
}

impl std::error::Error for Error {}
