//! Binding a schema to messages.

use crate::decode::decode;
use crate::encode::encode;
use crate::error::Result;
use crate::value::Value;

use super::transform::{transform, untransform};
use super::validate::validate;
use super::Schema;

/// A schema that has passed its own well-formedness check and can vet,
/// shorten, and restore messages.
///
/// Build one with [`MessageSchema::new`]; construction fails with
/// [`BadSchema`](crate::Error::BadSchema) if the schema is malformed.
/// Once built it is immutable and freely shareable across threads.
#[derive(Clone, Debug)]
pub struct MessageSchema {
    schema: Schema,
}

impl MessageSchema {
    /// Validate a schema and bind it.
    pub fn new(schema: Schema) -> Result<MessageSchema> {
        schema.check_well_formed()?;
        Ok(MessageSchema { schema })
    }

    /// The underlying schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Check a message against the schema. On mismatch the error carries
    /// the offending sub-message and sub-schema.
    pub fn validate(&self, message: &Value) -> Result<()> {
        validate(&self.schema, message)
    }

    /// Validate and shorten a message into its positional form.
    pub fn transform(&self, message: &Value) -> Result<Value> {
        self.validate(message)?;
        transform(&self.schema, message)
    }

    /// Restore a transformed message to its original shape. Must be the
    /// same schema the sender transformed under.
    pub fn untransform(&self, transformed: &Value) -> Result<Value> {
        untransform(&self.schema, transformed)
    }

    /// Wrap a message value for validation and encoding.
    pub fn message(&self, value: Value) -> Message {
        Message {
            schema: self,
            value,
            validation: None,
            transformation: None,
        }
    }

    /// Decode an encoded, transformed payload and restore the original
    /// message.
    pub fn decode(&self, data: &[u8]) -> Result<Message> {
        let transformed = decode(data)?;
        let value = self.untransform(&transformed)?;
        Ok(self.message(value))
    }
}

/// One message bound to a [`MessageSchema`].
///
/// Validation and transformation results are cached in the wrapper, so a
/// `Message` is cheap to encode after validating. The cache makes this
/// type single-writer; share the [`MessageSchema`] instead.
#[derive(Clone, Debug)]
pub struct Message<'a> {
    schema: &'a MessageSchema,
    value: Value,
    validation: Option<Result<()>>,
    transformation: Option<Value>,
}

impl Message<'_> {
    /// The wrapped message value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Unwrap the message value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Check the message against the schema, caching the outcome.
    pub fn validate(&mut self) -> Result<()> {
        if self.validation.is_none() {
            self.validation = Some(self.schema.validate(&self.value));
        }
        self.validation.clone().unwrap_or(Ok(()))
    }

    /// Validate and shorten, caching the transformed form.
    pub fn transform(&mut self) -> Result<&Value> {
        self.validate()?;
        if self.transformation.is_none() {
            self.transformation = Some(transform(&self.schema.schema, &self.value)?);
        }
        Ok(self.transformation.as_ref().unwrap_or(&self.value))
    }

    /// Validate, shorten, and encode the message.
    pub fn encode(&mut self) -> Result<Vec<u8>> {
        self.transform()?;
        let transformed = self.transformation.as_ref().unwrap_or(&self.value);
        encode(transformed)
    }
}
