use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;
use crate::integer::Integer;

/// Any value the wire format can carry.
///
/// Containers are ordered: sets and maps use the total order on `Value`
/// (see below), so their iteration order — and therefore their encoded
/// form — is deterministic for a given value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(Integer),
    F64(f64),
    Binary(#[serde(with = "serde_bytes")] Vec<u8>),
    String(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(BTreeSet<Value>),
    Map(BTreeMap<Value, Value>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timedelta(#[serde(with = "timedelta_serde")] Duration),
    Decimal(Decimal),
}

impl Value {
    /// Build a map value from key/value pairs. Later duplicates win.
    pub fn map<I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::Map(entries.into_iter().collect())
    }

    /// Build a set value from elements, deduplicating.
    pub fn set<I>(elems: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Set(elems.into_iter().collect())
    }

    /// Build a tuple value.
    pub fn tuple<I>(elems: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Tuple(elems.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        self.as_bool().is_some()
    }

    pub fn is_int(&self) -> bool {
        self.as_int().is_some()
    }

    pub fn is_f64(&self) -> bool {
        self.as_f64().is_some()
    }

    pub fn is_str(&self) -> bool {
        self.as_str().is_some()
    }

    pub fn is_bin(&self) -> bool {
        self.as_bytes().is_some()
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<&Integer> {
        if let Value::Integer(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Shortcut through [`as_int`](Self::as_int) for machine-word values.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(Integer::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        if let Value::F64(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(ref v) = *self {
            Some(v.as_str())
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Binary(ref v) = *self {
            Some(v.as_slice())
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(ref v) = *self {
            Some(v.as_slice())
        } else {
            None
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        if let Value::Tuple(ref v) = *self {
            Some(v.as_slice())
        } else {
            None
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        if let Value::Set(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        if let Value::Map(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        if let Value::Date(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        if let Value::Time(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        if let Value::DateTime(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_timedelta(&self) -> Option<Duration> {
        if let Value::Timedelta(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        if let Value::Decimal(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Whether this is one of the container variants.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::Map(_)
        )
    }

    // Rank used to order values of different variants against each other.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::F64(_) => 3,
            Value::Binary(_) => 4,
            Value::String(_) => 5,
            Value::List(_) => 6,
            Value::Tuple(_) => 7,
            Value::Set(_) => 8,
            Value::Map(_) => 9,
            Value::Date(_) => 10,
            Value::Time(_) => 11,
            Value::DateTime(_) => 12,
            Value::Timedelta(_) => 13,
            Value::Decimal(_) => 14,
        }
    }
}

/// Total order over all values: variants are ranked, values within a
/// variant compare naturally, and floats use the IEEE total order (so NaN
/// is equal to itself and maps and sets can hold any value).
impl Ord for Value {
    fn cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::F64(a), Value::F64(b)) => a.total_cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Timedelta(a), Value::Timedelta(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Boolean(v)
    }
}

impl From<Integer> for Value {
    fn from(v: Integer) -> Value {
        Value::Integer(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Value {
        Value::Integer(Integer::from(v))
    }
}

macro_rules! impl_value_from_int {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value::Integer(Integer::from(v))
            }
        }
    };
}

impl_value_from_int!(u8);
impl_value_from_int!(u16);
impl_value_from_int!(u32);
impl_value_from_int!(u64);
impl_value_from_int!(usize);
impl_value_from_int!(i8);
impl_value_from_int!(i16);
impl_value_from_int!(i32);
impl_value_from_int!(i64);
impl_value_from_int!(isize);

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Binary(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Value {
        Value::Binary(v.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::List(v)
    }
}

impl From<BTreeSet<Value>> for Value {
    fn from(v: BTreeSet<Value>) -> Value {
        Value::Set(v)
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(v: BTreeMap<Value, Value>) -> Value {
        Value::Map(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Value {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Value {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Value {
        Value::DateTime(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Value {
        Value::Timedelta(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Value {
        Value::Decimal(v)
    }
}

// chrono's Duration doesn't carry serde impls; a (seconds, nanoseconds)
// pair is the lossless stand-in.
mod timedelta_serde {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(td: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let mut secs = td.num_seconds();
        let mut nanos = (*td - Duration::seconds(secs)).num_nanoseconds().unwrap_or(0);
        if nanos < 0 {
            secs -= 1;
            nanos += 1_000_000_000;
        }
        (secs, nanos).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let (secs, nanos) = <(i64, i64)>::deserialize(d)?;
        if !(0..1_000_000_000).contains(&nanos) {
            return Err(serde::de::Error::custom("nanoseconds out of range"));
        }
        // Duration is bounded to i64 milliseconds; reject instead of
        // letting the constructor panic.
        if secs.checked_mul(1_000).and_then(|ms| ms.checked_add(1_000)).is_none() {
            return Err(serde::de::Error::custom("timedelta out of range"));
        }
        Ok(Duration::seconds(secs) + Duration::nanoseconds(nanos))
    }
}
