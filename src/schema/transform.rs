//! Schema-driven message shortening.
//!
//! A transformed map becomes a positional list: required keys contribute
//! their values in key order, optional keys contribute a value or a null
//! placeholder in key order, and wildcard-matched entries trail as
//! `key, value` pairs. Positions whose schema pins a concrete value
//! collapse to null — the receiver reconstructs them from the schema.
//! Untransform inverts all of this under the same key partition, so both
//! sides must hold the same schema.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::value::Value;

use super::validate::{fail, required_entries, unwrap_optional};
use super::{AtomType, MapKey, Schema};

pub(super) fn transform(schema: &Schema, message: &Value) -> Result<Value> {
    match schema {
        Schema::Value(_) => Ok(Value::Null),
        Schema::Optional(inner) => transform(inner, message),
        Schema::Tuple(entries) => {
            let Some(items) = message.as_tuple() else {
                return Err(fail(schema, message));
            };
            let out = entries
                .iter()
                .zip(items)
                .map(|(entry, item)| transform(unwrap_optional(entry), item))
                .collect::<Result<_>>()?;
            Ok(Value::Tuple(out))
        }
        Schema::List(entries) => {
            let Some(items) = message.as_list() else {
                return Err(fail(schema, message));
            };
            let Some(entry) = entries.first() else {
                return Ok(Value::List(Vec::new()));
            };
            let entry = unwrap_optional(entry);
            let out = items
                .iter()
                .map(|item| transform(entry, item))
                .collect::<Result<_>>()?;
            Ok(Value::List(out))
        }
        Schema::Map(entries) => {
            let Some(items) = message.as_map() else {
                return Err(fail(schema, message));
            };
            let mut out = Vec::new();
            for (key, sub) in entries {
                match key {
                    MapKey::Instance(k) => {
                        let value = items.get(k).ok_or_else(|| fail(schema, message))?;
                        out.push(transform(sub, value)?);
                    }
                    MapKey::Optional(k) => match items.get(k) {
                        // No collapse here: in this position null already
                        // means "absent".
                        Some(value) => match sub {
                            Schema::Value(_) => out.push(value.clone()),
                            _ => out.push(transform(sub, value)?),
                        },
                        None => out.push(Value::Null),
                    },
                    MapKey::Type(_) => {}
                }
            }
            for (key, value) in items {
                if entries.contains_key(&MapKey::Instance(key.clone()))
                    || entries.contains_key(&MapKey::Optional(key.clone()))
                {
                    continue;
                }
                let sub = AtomType::of(key)
                    .and_then(|t| entries.get(&MapKey::Type(t)))
                    .ok_or_else(|| fail(schema, message))?;
                out.push(key.clone());
                out.push(transform(sub, value)?);
            }
            Ok(Value::List(out))
        }
        _ => Ok(message.clone()),
    }
}

pub(super) fn untransform(schema: &Schema, message: &Value) -> Result<Value> {
    match schema {
        Schema::Value(v) => Ok(v.clone()),
        Schema::Optional(inner) => untransform(inner, message),
        Schema::Tuple(entries) => {
            let Some(items) = message.as_tuple() else {
                return Err(fail(schema, message));
            };
            if items.len() > entries.len() || items.len() < required_entries(entries) {
                return Err(fail(schema, message));
            }
            let out = entries
                .iter()
                .zip(items)
                .map(|(entry, item)| untransform(unwrap_optional(entry), item))
                .collect::<Result<_>>()?;
            Ok(Value::Tuple(out))
        }
        Schema::List(entries) => {
            let Some(items) = message.as_list() else {
                return Err(fail(schema, message));
            };
            let Some(entry) = entries.first() else {
                return if items.is_empty() {
                    Ok(Value::List(Vec::new()))
                } else {
                    Err(fail(schema, message))
                };
            };
            let entry = unwrap_optional(entry);
            let out = items
                .iter()
                .map(|item| untransform(entry, item))
                .collect::<Result<_>>()?;
            Ok(Value::List(out))
        }
        Schema::Map(schema_entries) => {
            let Some(items) = message.as_list() else {
                return Err(fail(schema, message));
            };
            let mut items = items.iter();
            let mut out = BTreeMap::new();
            for (key, sub) in schema_entries {
                match key {
                    MapKey::Instance(k) => {
                        let value = items.next().ok_or_else(|| fail(schema, message))?;
                        out.insert(k.clone(), untransform(sub, value)?);
                    }
                    MapKey::Optional(k) => {
                        // A missing tail or a null placeholder both mean
                        // the key is absent.
                        match items.next() {
                            Some(Value::Null) | None => {}
                            Some(value) => {
                                out.insert(k.clone(), untransform(sub, value)?);
                            }
                        }
                    }
                    MapKey::Type(_) => {}
                }
            }
            while let Some(key) = items.next() {
                let value = items.next().ok_or_else(|| fail(schema, message))?;
                let sub = AtomType::of(key)
                    .and_then(|t| schema_entries.get(&MapKey::Type(t)))
                    .ok_or_else(|| fail(schema, message))?;
                out.insert(key.clone(), untransform(sub, value)?);
            }
            Ok(Value::Map(out))
        }
        _ => Ok(message.clone()),
    }
}
