//! Schema-checked messages.
//!
//! A [`Schema`] describes the shape of a message: atomic types, concrete
//! values, tuples with optional tails, homogeneous lists, maps with exact,
//! optional, and wildcard keys, unions, and arbitrary predicates. Binding a
//! schema into a [`MessageSchema`] checks the schema itself once; messages
//! can then be validated against it, *transformed* into a compact
//! positional form that omits everything the schema already implies, and
//! encoded. The receiving side, holding the same schema, decodes and
//! *untransforms* to recover the original message.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::Value;

mod message;
mod transform;
mod validate;

pub use self::message::{Message, MessageSchema};

/// The atomic types a schema can match by type rather than by value.
///
/// Matching is exact on the [`Value`] variant: `Int` does not match a
/// boolean, and `Date` does not match a datetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AtomType {
    Bool,
    Int,
    Float,
    Bytes,
    Text,
    Date,
    Time,
    DateTime,
    Timedelta,
    Decimal,
}

impl AtomType {
    /// The atomic type of a value, or `None` for null and containers.
    pub fn of(value: &Value) -> Option<AtomType> {
        match value {
            Value::Boolean(_) => Some(AtomType::Bool),
            Value::Integer(_) => Some(AtomType::Int),
            Value::F64(_) => Some(AtomType::Float),
            Value::Binary(_) => Some(AtomType::Bytes),
            Value::String(_) => Some(AtomType::Text),
            Value::Date(_) => Some(AtomType::Date),
            Value::Time(_) => Some(AtomType::Time),
            Value::DateTime(_) => Some(AtomType::DateTime),
            Value::Timedelta(_) => Some(AtomType::Timedelta),
            Value::Decimal(_) => Some(AtomType::Decimal),
            Value::Null
            | Value::List(_)
            | Value::Tuple(_)
            | Value::Set(_)
            | Value::Map(_) => None,
        }
    }

    pub(crate) fn matches(self, value: &Value) -> bool {
        AtomType::of(value) == Some(self)
    }
}

/// A key position in a map schema.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
    /// This exact key must be present.
    Instance(Value),
    /// Wildcard: permits (and requires at least one) message key of the
    /// given atomic type.
    Type(AtomType),
    /// This exact key may be present.
    Optional(Value),
}

impl From<&str> for MapKey {
    fn from(key: &str) -> MapKey {
        MapKey::Instance(Value::from(key))
    }
}

impl From<Value> for MapKey {
    fn from(key: Value) -> MapKey {
        MapKey::Instance(key)
    }
}

impl From<AtomType> for MapKey {
    fn from(key: AtomType) -> MapKey {
        MapKey::Type(key)
    }
}

/// An opaque validation predicate usable as a schema.
#[derive(Clone)]
pub struct Rule(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Rule {
    pub(crate) fn check(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Rule(..)")
    }
}

/// A message schema.
///
/// Schemas nest arbitrarily. `Optional` is only meaningful in specific
/// positions — a tuple entry, the single element schema of a list — and is
/// rejected elsewhere when the schema is bound. Map keys carry their own
/// optionality through [`MapKey`].
#[derive(Clone, Debug)]
pub enum Schema {
    /// Matches anything.
    Any,
    /// Matches when the predicate returns true.
    Rule(Rule),
    /// Matches any value of one atomic type.
    Type(AtomType),
    /// Matches one concrete atomic value.
    Value(Value),
    /// Marks a tuple entry or list element schema as optional.
    Optional(Box<Schema>),
    /// Matches a tuple whose items match entry-wise; optional entries may
    /// be absent from the tail.
    Tuple(Vec<Schema>),
    /// Matches a homogeneous list. Holds zero schemas (matches only the
    /// empty list) or one; wrapping the one in `Optional` permits empty.
    List(Vec<Schema>),
    /// Matches a map; see [`MapKey`] for the key forms.
    Map(BTreeMap<MapKey, Schema>),
    /// Matches if any sub-schema matches.
    Union(Vec<Schema>),
}

impl Schema {
    /// Wrap a sub-schema as optional.
    pub fn optional(schema: Schema) -> Schema {
        Schema::Optional(Box::new(schema))
    }

    /// A schema matching one concrete value.
    pub fn instance(value: impl Into<Value>) -> Schema {
        Schema::Value(value.into())
    }

    /// A tuple schema from entry schemas.
    pub fn tuple<I>(entries: I) -> Schema
    where
        I: IntoIterator<Item = Schema>,
    {
        Schema::Tuple(entries.into_iter().collect())
    }

    /// A list schema whose elements all match `item`.
    pub fn list(item: Schema) -> Schema {
        Schema::List(vec![item])
    }

    /// A list schema matching only the empty list.
    pub fn empty_list() -> Schema {
        Schema::List(Vec::new())
    }

    /// A map schema from key/schema pairs.
    pub fn map<I, K>(entries: I) -> Schema
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<MapKey>,
    {
        Schema::Map(entries.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    /// A union over sub-schemas.
    pub fn union<I>(options: I) -> Schema
    where
        I: IntoIterator<Item = Schema>,
    {
        Schema::Union(options.into_iter().collect())
    }

    /// A predicate schema.
    pub fn rule(pred: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Schema {
        Schema::Rule(Rule(Arc::new(pred)))
    }

    /// Check that the schema itself is well formed. Performed once when a
    /// [`MessageSchema`] is built.
    pub(crate) fn check_well_formed(&self) -> Result<()> {
        well_formed(self, false)
    }
}

fn bad(schema: &Schema) -> Error {
    Error::BadSchema(Box::new(schema.clone()))
}

// A value usable where a concrete-instance match is meant: anything but
// null and containers.
fn atomic_instance(value: &Value) -> bool {
    AtomType::of(value).is_some()
}

fn well_formed(schema: &Schema, optional_ok: bool) -> Result<()> {
    match schema {
        Schema::Any | Schema::Rule(_) | Schema::Type(_) => Ok(()),
        Schema::Value(v) => {
            if atomic_instance(v) {
                Ok(())
            } else {
                Err(bad(schema))
            }
        }
        Schema::Optional(inner) => {
            if !optional_ok || matches!(**inner, Schema::Optional(_)) {
                return Err(bad(schema));
            }
            well_formed(inner, false)
        }
        Schema::Tuple(entries) => {
            let mut seen_optional = false;
            for entry in entries {
                match entry {
                    Schema::Optional(_) => seen_optional = true,
                    _ if seen_optional => return Err(bad(schema)),
                    _ => {}
                }
                well_formed(entry, true)?;
            }
            Ok(())
        }
        Schema::List(entries) => {
            if entries.len() > 1 {
                return Err(bad(schema));
            }
            for entry in entries {
                well_formed(entry, true)?;
            }
            Ok(())
        }
        Schema::Map(entries) => {
            for (key, value) in entries {
                match key {
                    MapKey::Instance(k) | MapKey::Optional(k) => {
                        if !atomic_instance(k) {
                            return Err(bad(schema));
                        }
                    }
                    MapKey::Type(_) => {}
                }
                well_formed(value, false)?;
            }
            Ok(())
        }
        Schema::Union(options) => {
            for option in options {
                well_formed(option, false)?;
            }
            Ok(())
        }
    }
}
