//! Turning bytes back into values.
//!
//! [`decode`] strips the optional compression envelope, then dispatches on
//! the tag byte, parsing bodies recursively. Every length field is checked
//! against the remaining input before anything proportional to it is
//! allocated, and any malformed body aborts the whole call.

use std::collections::{BTreeMap, BTreeSet};

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;

use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::integer::Integer;
use crate::tag::{Tag, COMPRESSED, SPECIAL_FLAG, SPECIAL_INFINITY, SPECIAL_NAN};
use crate::value::Value;
use crate::MAX_DEPTH;

/// Decode a single value from bytes. Trailing bytes after the value are
/// ignored.
pub fn decode(data: &[u8]) -> Result<Value> {
    let Some((&first, rest)) = data.split_first() else {
        return Err(Error::LengthTooShort {
            step: "read tag",
            actual: 0,
            needed: 1,
        });
    };
    if first & COMPRESSED != 0 {
        return decode_enveloped(first & !COMPRESSED, rest);
    }
    let mut data = data;
    read_value(&mut data, 0)
}

#[cfg(feature = "compress")]
fn decode_enveloped(tag: u8, mut data: &[u8]) -> Result<Value> {
    let len = read_i32(&mut data, "read envelope length")?;
    if len < 0 {
        return Err(Error::BadEncode(format!(
            "negative uncompressed length {}",
            len
        )));
    }
    let body = crate::compress::expand(data, len as usize)?;
    let mut buf = Vec::with_capacity(body.len() + 1);
    buf.push(tag);
    buf.extend_from_slice(&body);
    let mut slice = buf.as_slice();
    read_value(&mut slice, 0)
}

#[cfg(not(feature = "compress"))]
fn decode_enveloped(_tag: u8, _data: &[u8]) -> Result<Value> {
    Err(Error::NoCompression)
}

fn read_value(data: &mut &[u8], depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    let tag_byte = read_u8(data, "read tag")?;
    let tag = Tag::from_u8(tag_byte).ok_or(Error::BadTag(tag_byte))?;
    let value = match tag {
        Tag::Null => Value::Null,
        Tag::Bool => match read_u8(data, "decode bool")? {
            0 => Value::Boolean(false),
            1 => Value::Boolean(true),
            b => {
                return Err(Error::BadEncode(format!("bool body byte 0x{:02x}", b)));
            }
        },
        Tag::Int8 => Value::from(read_i8(data, "decode int8")?),
        Tag::Int16 => Value::from(read_i16(data, "decode int16")?),
        Tag::Int32 => Value::from(read_i32(data, "decode int32")?),
        Tag::Int64 => Value::from(read_i64(data, "decode int64")?),
        Tag::Huge => {
            let len = read_u32(data, "decode huge length")? as usize;
            if len == 0 {
                return Err(Error::BadEncode("huge integer with empty body".to_string()));
            }
            let bytes = take(data, len, "get huge content")?;
            Value::Integer(Integer::from(BigInt::from_signed_bytes_be(bytes)))
        }
        Tag::F64 => Value::F64(read_f64(data, "decode f64")?),
        Tag::BinShort => {
            let len = read_u8(data, "decode byte string length")? as usize;
            bin_body(data, len)?
        }
        Tag::BinMed => {
            let len = read_u16(data, "decode byte string length")? as usize;
            bin_body(data, len)?
        }
        Tag::BinLong => {
            let len = read_u32(data, "decode byte string length")? as usize;
            bin_body(data, len)?
        }
        Tag::StrShort => {
            let len = read_u8(data, "decode text length")? as usize;
            str_body(data, len)?
        }
        Tag::StrMed => {
            let len = read_u16(data, "decode text length")? as usize;
            str_body(data, len)?
        }
        Tag::StrLong => {
            let len = read_u32(data, "decode text length")? as usize;
            str_body(data, len)?
        }
        Tag::ListShort => {
            let count = read_u8(data, "decode list count")? as usize;
            Value::List(seq_body(data, count, depth)?)
        }
        Tag::ListMed => {
            let count = read_u16(data, "decode list count")? as usize;
            Value::List(seq_body(data, count, depth)?)
        }
        Tag::ListLong => {
            let count = read_u32(data, "decode list count")? as usize;
            Value::List(seq_body(data, count, depth)?)
        }
        Tag::TupleShort => {
            let count = read_u8(data, "decode tuple count")? as usize;
            Value::Tuple(seq_body(data, count, depth)?)
        }
        Tag::TupleMed => {
            let count = read_u16(data, "decode tuple count")? as usize;
            Value::Tuple(seq_body(data, count, depth)?)
        }
        Tag::TupleLong => {
            let count = read_u32(data, "decode tuple count")? as usize;
            Value::Tuple(seq_body(data, count, depth)?)
        }
        Tag::SetShort => {
            let count = read_u8(data, "decode set count")? as usize;
            Value::Set(set_body(data, count, depth)?)
        }
        Tag::SetMed => {
            let count = read_u16(data, "decode set count")? as usize;
            Value::Set(set_body(data, count, depth)?)
        }
        Tag::SetLong => {
            let count = read_u32(data, "decode set count")? as usize;
            Value::Set(set_body(data, count, depth)?)
        }
        Tag::MapShort => {
            let count = read_u8(data, "decode map count")? as usize;
            Value::Map(map_body(data, count, depth)?)
        }
        Tag::MapMed => {
            let count = read_u16(data, "decode map count")? as usize;
            Value::Map(map_body(data, count, depth)?)
        }
        Tag::MapLong => {
            let count = read_u32(data, "decode map count")? as usize;
            Value::Map(map_body(data, count, depth)?)
        }
        Tag::Date => Value::Date(date_body(data)?),
        Tag::Time => Value::Time(time_body(data)?),
        Tag::DateTime => {
            let date = date_body(data)?;
            let time = time_body(data)?;
            Value::DateTime(NaiveDateTime::new(date, time))
        }
        Tag::Timedelta => {
            let days = read_i32(data, "decode timedelta")?;
            let secs = read_i32(data, "decode timedelta")?;
            let micros = read_i32(data, "decode timedelta")?;
            let whole = i64::from(days) * 86_400
                + i64::from(secs)
                + i64::from(micros).div_euclid(1_000_000);
            let sub = i64::from(micros).rem_euclid(1_000_000);
            Value::Timedelta(Duration::seconds(whole) + Duration::microseconds(sub))
        }
        Tag::Decimal => decimal_body(data)?,
        Tag::Special => {
            let b = read_u8(data, "decode special number")?;
            match (b & 0xf0, b & 0x0f) {
                (SPECIAL_INFINITY, 0) => Value::Decimal(Decimal::Infinity { negative: false }),
                (SPECIAL_INFINITY, SPECIAL_FLAG) => {
                    Value::Decimal(Decimal::Infinity { negative: true })
                }
                (SPECIAL_NAN, 0) => Value::Decimal(Decimal::Nan { signaling: false }),
                (SPECIAL_NAN, SPECIAL_FLAG) => Value::Decimal(Decimal::Nan { signaling: true }),
                _ => {
                    return Err(Error::BadEncode(format!(
                        "special number classifier 0x{:02x}",
                        b
                    )));
                }
            }
        }
    };
    Ok(value)
}

fn bin_body(data: &mut &[u8], len: usize) -> Result<Value> {
    Ok(Value::Binary(
        take(data, len, "get byte string content")?.to_vec(),
    ))
}

fn str_body(data: &mut &[u8], len: usize) -> Result<Value> {
    let bytes = take(data, len, "get text content")?;
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(Value::String(s.to_owned())),
        Err(e) => Err(Error::BadEncode(format!("{}", e))),
    }
}

fn seq_body(data: &mut &[u8], count: usize, depth: usize) -> Result<Vec<Value>> {
    // Each element takes at least one byte; reject impossible counts
    // before reserving anything.
    if count > data.len() {
        return Err(Error::LengthTooShort {
            step: "get container elements",
            actual: data.len(),
            needed: count,
        });
    }
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(read_value(data, depth + 1)?);
    }
    Ok(out)
}

fn set_body(data: &mut &[u8], count: usize, depth: usize) -> Result<BTreeSet<Value>> {
    if count > data.len() {
        return Err(Error::LengthTooShort {
            step: "get set elements",
            actual: data.len(),
            needed: count,
        });
    }
    let mut out = BTreeSet::new();
    for _ in 0..count {
        out.insert(read_value(data, depth + 1)?);
    }
    Ok(out)
}

fn map_body(data: &mut &[u8], count: usize, depth: usize) -> Result<BTreeMap<Value, Value>> {
    if count > data.len() / 2 {
        return Err(Error::LengthTooShort {
            step: "get map entries",
            actual: data.len(),
            needed: count.saturating_mul(2),
        });
    }
    let mut out = BTreeMap::new();
    for _ in 0..count {
        let key = read_value(data, depth + 1)?;
        let value = read_value(data, depth + 1)?;
        // Duplicate keys resolve last-wins.
        out.insert(key, value);
    }
    Ok(out)
}

fn date_body(data: &mut &[u8]) -> Result<NaiveDate> {
    let year = read_u16(data, "decode date")?;
    let month = read_u8(data, "decode date")?;
    let day = read_u8(data, "decode date")?;
    NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day)).ok_or_else(|| {
        Error::BadEncode(format!("invalid date {:04}-{:02}-{:02}", year, month, day))
    })
}

fn time_body(data: &mut &[u8]) -> Result<NaiveTime> {
    let hour = read_u8(data, "decode time")?;
    let minute = read_u8(data, "decode time")?;
    let second = read_u8(data, "decode time")?;
    let micro = take(data, 3, "decode time microseconds")?;
    let micros = u32::from(micro[0]) << 16 | u32::from(micro[1]) << 8 | u32::from(micro[2]);
    if micros > 999_999 {
        return Err(Error::BadEncode(format!(
            "time microseconds {} out of range",
            micros
        )));
    }
    NaiveTime::from_hms_micro_opt(
        u32::from(hour),
        u32::from(minute),
        u32::from(second),
        micros,
    )
    .ok_or_else(|| {
        Error::BadEncode(format!(
            "invalid time {:02}:{:02}:{:02}.{:06}",
            hour, minute, second, micros
        ))
    })
}

fn decimal_body(data: &mut &[u8]) -> Result<Value> {
    let sign = read_i8(data, "decode decimal sign")?;
    let negative = match sign {
        0 => false,
        1 => true,
        _ => {
            return Err(Error::BadEncode(format!("decimal sign byte {}", sign)));
        }
    };
    let exponent = read_i16(data, "decode decimal exponent")?;
    let count = read_u16(data, "decode decimal digit count")? as usize;
    let packed = take(data, count / 2 + count % 2, "get decimal digits")?;
    let mut digits = Vec::with_capacity(count);
    for i in 0..count {
        let byte = packed[i / 2];
        let digit = if i & 1 == 0 { byte & 0x0f } else { byte >> 4 };
        if digit > 9 {
            return Err(Error::BadEncode(format!("decimal digit {}", digit)));
        }
        digits.push(digit);
    }
    Ok(Value::Decimal(Decimal::Finite {
        negative,
        digits,
        exponent,
    }))
}

fn take<'a>(data: &mut &'a [u8], len: usize, step: &'static str) -> Result<&'a [u8]> {
    if len > data.len() {
        return Err(Error::LengthTooShort {
            step,
            actual: data.len(),
            needed: len,
        });
    }
    let (head, rest) = data.split_at(len);
    *data = rest;
    Ok(head)
}

macro_rules! impl_read {
    ($name: ident, $t: ty, $method: ident, $size: expr) => {
        fn $name(data: &mut &[u8], step: &'static str) -> Result<$t> {
            data.$method::<BigEndian>()
                .map_err(|_| Error::LengthTooShort {
                    step,
                    actual: data.len(),
                    needed: $size,
                })
        }
    };
}

fn read_u8(data: &mut &[u8], step: &'static str) -> Result<u8> {
    data.read_u8().map_err(|_| Error::LengthTooShort {
        step,
        actual: data.len(),
        needed: 1,
    })
}

fn read_i8(data: &mut &[u8], step: &'static str) -> Result<i8> {
    data.read_i8().map_err(|_| Error::LengthTooShort {
        step,
        actual: data.len(),
        needed: 1,
    })
}

impl_read!(read_u16, u16, read_u16, 2);
impl_read!(read_i16, i16, read_i16, 2);
impl_read!(read_u32, u32, read_u32, 4);
impl_read!(read_i32, i32, read_i32, 4);
impl_read!(read_i64, i64, read_i64, 8);
impl_read!(read_f64, f64, read_f64, 8);
