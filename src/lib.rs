//! Compact, self-describing binary serialization for a fixed set of
//! structured values, plus a schema layer that strips redundant key/tag
//! information from messages exchanged between peers that share the schema.
//!
//! The wire format is prefix-tagged: every value starts with a single type
//! byte, followed by the body. Variable-size types (byte strings, text,
//! lists, tuples, sets, maps) come in three width classes, and the encoder
//! always picks the narrowest tag that fits. All multi-byte fields are
//! big-endian. The top bit of the tag byte flags an optional whole-payload
//! LZF compression envelope.
//!
//! # Encoding values
//!
//! ```
//! use duffel::{decode, encode, Value};
//!
//! let value = Value::from(vec![Value::from(1), Value::from(2), Value::from(3)]);
//! let bytes = encode(&value)?;
//! assert_eq!(bytes, [0x10, 0x03, 0x02, 0x01, 0x02, 0x02, 0x02, 0x03]);
//! assert_eq!(decode(&bytes)?, value);
//! # Ok::<(), duffel::Error>(())
//! ```
//!
//! # Schemas
//!
//! A [`Schema`] describes the shape of a message. Binding it into a
//! [`MessageSchema`] validates the schema itself once; messages wrapped by
//! the binding can then be validated, transformed into a compact positional
//! form, and encoded. A peer holding the same schema reverses the process
//! with [`MessageSchema::decode`].
//!
//! ```
//! use duffel::{AtomType, MapKey, MessageSchema, Schema, Value};
//!
//! let schema = MessageSchema::new(Schema::map([
//!     (MapKey::from("a"), Schema::Type(AtomType::Int)),
//!     (MapKey::from("b"), Schema::Type(AtomType::Int)),
//! ]))?;
//!
//! let value = Value::map([(Value::from("a"), Value::from(1)), (Value::from("b"), Value::from(2))]);
//! let mut message = schema.message(value.clone());
//! let bytes = message.encode()?;
//! // Keys are implied by the schema, so only the two values go on the wire.
//! assert_eq!(bytes, [0x10, 0x02, 0x02, 0x01, 0x02, 0x02]);
//! assert_eq!(schema.decode(&bytes)?.value(), &value);
//! # Ok::<(), duffel::Error>(())
//! ```
//!
//! The codec is stateless; encode and decode calls may run in parallel on
//! any number of threads. Recursion on both sides is bounded to
//! [`MAX_DEPTH`] frames.

mod decimal;
mod error;
mod integer;
mod tag;
mod value;

pub mod decode;
pub mod encode;
pub mod schema;

#[cfg(feature = "compress")]
mod compress;

pub use self::decimal::Decimal;
pub use self::decode::decode;
pub use self::encode::{encode, encode_with_default};
pub use self::error::{Error, Result};
pub use self::integer::Integer;
pub use self::schema::{AtomType, MapKey, Message, MessageSchema, Schema};
pub use self::value::Value;

/// Maximum nesting depth of an encoded value.
///
/// Applies to both encoding and decoding; the compression envelope does not
/// count as a nesting frame.
pub const MAX_DEPTH: usize = 256;

/// Reports whether the optional LZF compression envelope was compiled in.
///
/// When this returns false, encoded payloads never set the compression bit,
/// and decoding a payload with the bit set fails with
/// [`Error::NoCompression`].
pub fn has_compression() -> bool {
    cfg!(feature = "compress")
}
