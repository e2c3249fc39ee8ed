//! Structural validation of messages against schemas.
//!
//! The recursion walks schema and message in lockstep and reports the
//! first mismatch as the offending `(sub-message, sub-schema)` pair.

use crate::error::{Error, Result};
use crate::value::Value;

use super::{AtomType, MapKey, Schema};

pub(super) fn fail(schema: &Schema, message: &Value) -> Error {
    Error::FailValidate {
        message: Box::new(message.clone()),
        schema: Box::new(schema.clone()),
    }
}

pub(super) fn unwrap_optional(schema: &Schema) -> &Schema {
    match schema {
        Schema::Optional(inner) => inner,
        other => other,
    }
}

// Number of leading non-optional entries in a tuple schema.
pub(super) fn required_entries(entries: &[Schema]) -> usize {
    entries
        .iter()
        .take_while(|e| !matches!(e, Schema::Optional(_)))
        .count()
}

pub(super) fn validate(schema: &Schema, message: &Value) -> Result<()> {
    match schema {
        Schema::Any => Ok(()),
        Schema::Rule(rule) => {
            if rule.check(message) {
                Ok(())
            } else {
                Err(fail(schema, message))
            }
        }
        Schema::Type(t) => {
            if t.matches(message) {
                Ok(())
            } else {
                Err(fail(schema, message))
            }
        }
        Schema::Value(v) => {
            if v == message {
                Ok(())
            } else {
                Err(fail(schema, message))
            }
        }
        Schema::Optional(inner) => validate(inner, message),
        Schema::Tuple(entries) => {
            let Some(items) = message.as_tuple() else {
                return Err(fail(schema, message));
            };
            if items.len() > entries.len() || items.len() < required_entries(entries) {
                return Err(fail(schema, message));
            }
            for (entry, item) in entries.iter().zip(items) {
                validate(unwrap_optional(entry), item)?;
            }
            Ok(())
        }
        Schema::List(entries) => {
            let Some(items) = message.as_list() else {
                return Err(fail(schema, message));
            };
            let Some(entry) = entries.first() else {
                // An empty list schema matches only the empty list.
                return if items.is_empty() {
                    Ok(())
                } else {
                    Err(fail(schema, message))
                };
            };
            if items.is_empty() {
                return if matches!(entry, Schema::Optional(_)) {
                    Ok(())
                } else {
                    Err(fail(schema, message))
                };
            }
            let entry = unwrap_optional(entry);
            for item in items {
                validate(entry, item)?;
            }
            Ok(())
        }
        Schema::Map(entries) => {
            let Some(items) = message.as_map() else {
                return Err(fail(schema, message));
            };
            for (key, sub) in entries {
                match key {
                    MapKey::Instance(k) => {
                        let Some(value) = items.get(k) else {
                            return Err(fail(schema, message));
                        };
                        validate(sub, value)?;
                    }
                    MapKey::Optional(k) => {
                        if let Some(value) = items.get(k) {
                            validate(sub, value)?;
                        }
                    }
                    MapKey::Type(t) => {
                        // A wildcard key is itself required: some message
                        // key of its type must exist.
                        if !items.keys().any(|k| t.matches(k)) {
                            return Err(fail(schema, message));
                        }
                    }
                }
            }
            // Keys not named by the schema must fall under a wildcard.
            for (key, value) in items {
                if entries.contains_key(&MapKey::Instance(key.clone()))
                    || entries.contains_key(&MapKey::Optional(key.clone()))
                {
                    continue;
                }
                let sub = AtomType::of(key)
                    .and_then(|t| entries.get(&MapKey::Type(t)))
                    .ok_or_else(|| fail(schema, message))?;
                validate(sub, value)?;
            }
            Ok(())
        }
        Schema::Union(options) => {
            if options.iter().any(|o| validate(o, message).is_ok()) {
                Ok(())
            } else {
                Err(fail(schema, message))
            }
        }
    }
}
