//! The serializer boundary.
//!
//! Request bodies are turned into text and response bodies back into typed
//! values through a [`Serializer`] handed to the builder and the transport
//! client. The crate never inspects serializer errors beyond wrapping them.

use crate::BoxError;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Converts values to wire text and wire text back to typed values.
pub trait Serializer: Send + Sync {
    /// Serializes `value` into its wire representation.
    fn serialize<T>(&self, value: &T) -> Result<String, BoxError>
    where
        T: Serialize + ?Sized;

    /// Parses `text` into a `T`.
    fn deserialize<T>(&self, text: &str) -> Result<T, BoxError>
    where
        T: DeserializeOwned;
}

/// A [`Serializer`] backed by `serde_json`.
///
/// ```
/// use httpwrap::{JsonSerializer, Serializer};
///
/// let text = JsonSerializer.serialize(&vec![1, 2, 3]).unwrap();
/// assert_eq!(text, "[1,2,3]");
///
/// let back: Vec<u8> = JsonSerializer.deserialize(&text).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T>(&self, value: &T) -> Result<String, BoxError>
    where
        T: Serialize + ?Sized,
    {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize<T>(&self, text: &str) -> Result<T, BoxError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_str(text)?)
    }
}

impl<S: Serializer> Serializer for Arc<S> {
    fn serialize<T>(&self, value: &T) -> Result<String, BoxError>
    where
        T: Serialize + ?Sized,
    {
        (**self).serialize(value)
    }

    fn deserialize<T>(&self, text: &str) -> Result<T, BoxError>
    where
        T: DeserializeOwned,
    {
        (**self).deserialize(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_deserialize_reports_malformed_input() {
        let result = JsonSerializer.deserialize::<u32>("{not json");
        assert!(result.is_err());
    }

    #[test]
    fn shared_serializer_delegates() {
        let shared = Arc::new(JsonSerializer);
        assert_eq!(shared.serialize("x").unwrap(), "\"x\"");
    }
}
