//! Turning values into bytes.
//!
//! [`encode`] picks the narrowest tag that fits each value, emits the body
//! (recursing for containers), and — when the `compress` feature is on —
//! wraps the finished payload in an LZF envelope if that makes it smaller.
//! Only the outermost value is ever considered for compression.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};

use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::integer::{get_int_internal, IntPriv};
use crate::tag::{Tag, SPECIAL_FLAG, SPECIAL_INFINITY, SPECIAL_NAN};
use crate::value::Value;
use crate::MAX_DEPTH;

/// Fallback hook consulted for values with no wire representation. It is
/// called at most once per value; returning `None` declines.
pub type Fallback<'a> = &'a dyn Fn(&Value) -> Option<Value>;

/// Encode a value to bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    encode_inner(value, None)
}

/// Encode a value to bytes, consulting `default` for any value that has no
/// wire representation (an out-of-range date or timedelta, a decimal with
/// invalid digits, a sub-microsecond time). The replacement must itself be
/// encodable; if it isn't, the error surfaces.
pub fn encode_with_default(value: &Value, default: Fallback) -> Result<Vec<u8>> {
    encode_inner(value, Some(default))
}

fn encode_inner(value: &Value, default: Option<Fallback>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, 0, default)?;
    #[cfg(feature = "compress")]
    if let Some(wrapped) = crate::compress::envelope(&buf) {
        return Ok(wrapped);
    }
    Ok(buf)
}

/// Write one tagged value, without attempting compression. Nested values
/// from container bodies re-enter here with an incremented depth.
pub(crate) fn write_value(
    buf: &mut Vec<u8>,
    value: &Value,
    depth: usize,
    default: Option<Fallback>,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    if let Err(err) = check_encodable(value) {
        let Some(fallback) = default else {
            return Err(err);
        };
        let Some(replacement) = fallback(value) else {
            return Err(err);
        };
        check_encodable(&replacement)?;
        return write_body(buf, &replacement, depth, default);
    }
    write_body(buf, value, depth, default)
}

// Shallow encodability check for a single value; children get their own
// check when recursion reaches them.
fn check_encodable(value: &Value) -> Result<()> {
    let reason = match value {
        Value::Date(d) => {
            if date_fields(d).is_some() {
                return Ok(());
            }
            format!("date year {} does not fit in 16 bits", d.year())
        }
        Value::Time(t) => {
            if time_fields(t).is_some() {
                return Ok(());
            }
            format!("time {} has no whole-microsecond representation", t)
        }
        Value::DateTime(dt) => {
            if date_fields(&dt.date()).is_some() && time_fields(&dt.time()).is_some() {
                return Ok(());
            }
            format!("datetime {} does not fit the wire format", dt)
        }
        Value::Timedelta(td) => {
            if delta_fields(td).is_some() {
                return Ok(());
            }
            format!("timedelta of {} seconds does not fit the wire format", td.num_seconds())
        }
        Value::Decimal(Decimal::Finite { digits, .. }) => {
            if digits.len() > u16::MAX as usize {
                format!("decimal has {} digits, limit is 65535", digits.len())
            } else if digits.iter().any(|d| *d > 9) {
                "decimal digit outside 0-9".to_string()
            } else {
                return Ok(());
            }
        }
        Value::Binary(v) if v.len() > u32::MAX as usize => "byte string too long".to_string(),
        Value::String(v) if v.len() > u32::MAX as usize => "text too long".to_string(),
        Value::List(v) if v.len() > u32::MAX as usize => "list too long".to_string(),
        Value::Tuple(v) if v.len() > u32::MAX as usize => "tuple too long".to_string(),
        Value::Set(v) if v.len() > u32::MAX as usize => "set too long".to_string(),
        Value::Map(v) if v.len() > u32::MAX as usize => "map too long".to_string(),
        _ => return Ok(()),
    };
    Err(Error::Unencodable(reason))
}

fn write_body(
    buf: &mut Vec<u8>,
    value: &Value,
    depth: usize,
    default: Option<Fallback>,
) -> Result<()> {
    match value {
        Value::Null => buf.push(Tag::Null.into()),
        Value::Boolean(v) => {
            buf.push(Tag::Bool.into());
            buf.push(*v as u8);
        }
        Value::Integer(v) => match get_int_internal(v) {
            IntPriv::Small(v) => {
                let v = *v;
                if (-128..128).contains(&v) {
                    buf.push(Tag::Int8.into());
                    buf.push(v as i8 as u8);
                } else if (-32768..32768).contains(&v) {
                    buf.push(Tag::Int16.into());
                    buf.extend_from_slice(&(v as i16).to_be_bytes());
                } else if (-2_147_483_648..2_147_483_648).contains(&v) {
                    buf.push(Tag::Int32.into());
                    buf.extend_from_slice(&(v as i32).to_be_bytes());
                } else {
                    buf.push(Tag::Int64.into());
                    buf.extend_from_slice(&v.to_be_bytes());
                }
            }
            IntPriv::Huge(v) => {
                // Minimal two's complement: sign extension reproduces the
                // value exactly.
                let bytes = v.to_signed_bytes_be();
                if bytes.len() > u32::MAX as usize {
                    return Err(Error::Unencodable("huge integer too long".to_string()));
                }
                buf.push(Tag::Huge.into());
                buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                buf.extend_from_slice(&bytes);
            }
        },
        Value::F64(v) => {
            buf.push(Tag::F64.into());
            buf.extend_from_slice(&v.to_be_bytes());
        }
        Value::Binary(v) => {
            write_len_header(buf, v.len(), Tag::BinShort, Tag::BinMed, Tag::BinLong);
            buf.extend_from_slice(v);
        }
        Value::String(v) => {
            write_len_header(buf, v.len(), Tag::StrShort, Tag::StrMed, Tag::StrLong);
            buf.extend_from_slice(v.as_bytes());
        }
        Value::List(v) => {
            write_len_header(buf, v.len(), Tag::ListShort, Tag::ListMed, Tag::ListLong);
            for item in v {
                write_value(buf, item, depth + 1, default)?;
            }
        }
        Value::Tuple(v) => {
            write_len_header(buf, v.len(), Tag::TupleShort, Tag::TupleMed, Tag::TupleLong);
            for item in v {
                write_value(buf, item, depth + 1, default)?;
            }
        }
        Value::Set(v) => {
            write_len_header(buf, v.len(), Tag::SetShort, Tag::SetMed, Tag::SetLong);
            for item in v {
                write_value(buf, item, depth + 1, default)?;
            }
        }
        Value::Map(v) => {
            write_len_header(buf, v.len(), Tag::MapShort, Tag::MapMed, Tag::MapLong);
            for (key, val) in v {
                write_value(buf, key, depth + 1, default)?;
                write_value(buf, val, depth + 1, default)?;
            }
        }
        Value::Date(d) => {
            let Some(fields) = date_fields(d) else {
                return Err(Error::Unencodable("date out of range".to_string()));
            };
            buf.push(Tag::Date.into());
            write_date_fields(buf, fields);
        }
        Value::Time(t) => {
            let Some(fields) = time_fields(t) else {
                return Err(Error::Unencodable("time out of range".to_string()));
            };
            buf.push(Tag::Time.into());
            write_time_fields(buf, fields);
        }
        Value::DateTime(dt) => {
            let (Some(date), Some(time)) = (date_fields(&dt.date()), time_fields(&dt.time()))
            else {
                return Err(Error::Unencodable("datetime out of range".to_string()));
            };
            buf.push(Tag::DateTime.into());
            write_date_fields(buf, date);
            write_time_fields(buf, time);
        }
        Value::Timedelta(td) => {
            let Some((days, secs, micros)) = delta_fields(td) else {
                return Err(Error::Unencodable("timedelta out of range".to_string()));
            };
            buf.push(Tag::Timedelta.into());
            buf.extend_from_slice(&days.to_be_bytes());
            buf.extend_from_slice(&secs.to_be_bytes());
            buf.extend_from_slice(&micros.to_be_bytes());
        }
        Value::Decimal(Decimal::Finite {
            negative,
            digits,
            exponent,
        }) => {
            if digits.len() > u16::MAX as usize {
                return Err(Error::Unencodable("too many decimal digits".to_string()));
            }
            buf.push(Tag::Decimal.into());
            buf.push(*negative as u8);
            buf.extend_from_slice(&exponent.to_be_bytes());
            buf.extend_from_slice(&(digits.len() as u16).to_be_bytes());
            let mut pending = 0u8;
            for (i, digit) in digits.iter().enumerate() {
                if *digit > 9 {
                    return Err(Error::Unencodable("decimal digit outside 0-9".to_string()));
                }
                if i & 1 == 0 {
                    pending = *digit;
                } else {
                    buf.push(pending | (*digit << 4));
                }
            }
            if digits.len() & 1 == 1 {
                buf.push(pending);
            }
        }
        Value::Decimal(Decimal::Infinity { negative }) => {
            buf.push(Tag::Special.into());
            buf.push(SPECIAL_INFINITY | if *negative { SPECIAL_FLAG } else { 0 });
        }
        Value::Decimal(Decimal::Nan { signaling }) => {
            buf.push(Tag::Special.into());
            buf.push(SPECIAL_NAN | if *signaling { SPECIAL_FLAG } else { 0 });
        }
    }
    Ok(())
}

// Tag plus length prefix in the narrowest of the three width classes.
fn write_len_header(buf: &mut Vec<u8>, len: usize, short: Tag, med: Tag, long: Tag) {
    if len < 256 {
        buf.push(short.into());
        buf.push(len as u8);
    } else if len < 65536 {
        buf.push(med.into());
        buf.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        buf.push(long.into());
        buf.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

fn write_date_fields(buf: &mut Vec<u8>, (year, month, day): (u16, u8, u8)) {
    buf.extend_from_slice(&year.to_be_bytes());
    buf.push(month);
    buf.push(day);
}

fn write_time_fields(buf: &mut Vec<u8>, (hour, minute, second, micros): (u8, u8, u8, u32)) {
    buf.push(hour);
    buf.push(minute);
    buf.push(second);
    buf.extend_from_slice(&micros.to_be_bytes()[1..]);
}

pub(crate) fn date_fields(d: &NaiveDate) -> Option<(u16, u8, u8)> {
    let year = u16::try_from(d.year()).ok()?;
    Some((year, d.month() as u8, d.day() as u8))
}

pub(crate) fn time_fields(t: &NaiveTime) -> Option<(u8, u8, u8, u32)> {
    let nanos = t.nanosecond();
    // A leap second (microseconds folded past one million) has no wire
    // representation, and neither does sub-microsecond precision.
    if nanos >= 1_000_000_000 || nanos % 1_000 != 0 {
        return None;
    }
    Some((
        t.hour() as u8,
        t.minute() as u8,
        t.second() as u8,
        nanos / 1_000,
    ))
}

// Normalize to microseconds in 0..10^6 and seconds in 0..86400, with days
// carrying the sign.
pub(crate) fn delta_fields(td: &Duration) -> Option<(i32, i32, i32)> {
    let mut secs = td.num_seconds();
    // Sub-second remainder; always under a second, so never overflows.
    let mut nanos = (*td - Duration::seconds(secs)).num_nanoseconds().unwrap_or(0);
    if nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    if nanos % 1_000 != 0 {
        return None;
    }
    let days = i32::try_from(secs.div_euclid(86_400)).ok()?;
    Some((days, secs.rem_euclid(86_400) as i32, (nanos / 1_000) as i32))
}
