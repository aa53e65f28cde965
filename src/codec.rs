//! Body encoding and decoding.

use serde_json::Value;

use crate::error::CodecError;

/// Converts between structured values and wire bytes.
pub trait Codec {
    /// Media type announced on encoded request bodies.
    fn content_type(&self) -> &'static str;

    /// Decode a response body.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;

    /// Encode a request body. `None` encodes to no body.
    fn encode(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>, CodecError>;
}

/// JSON codec. An empty (or whitespace-only) body decodes to `Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>, CodecError> {
        value
            .map(|v| serde_json::to_vec(v).map_err(CodecError::from))
            .transpose()
    }
}
