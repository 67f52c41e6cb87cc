//! Remote lookup transport for uniqueness rules.

use crate::error::LookupError;
use async_trait::async_trait;
use serde_json::Value;

/// Transport issuing a uniqueness lookup.
///
/// Implementations return the matches reported by the endpoint: a non-empty
/// collection means the value is already taken.
#[async_trait]
pub trait LookupTransport: Send + Sync {
    async fn lookup(&self, endpoint: &str, param: &str, value: &str)
        -> Result<Vec<Value>, LookupError>;
}

/// HTTP transport: `GET {endpoint}?{param}={value}`, answered with a JSON array.
#[derive(Debug, Clone, Default)]
pub struct HttpLookup {
    client: reqwest::Client,
}

impl HttpLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, TLS roots, default headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Decode a lookup response body. Anything but a JSON array is a protocol
/// violation, never "no matches".
pub fn decode_matches(body: &[u8]) -> Result<Vec<Value>, LookupError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Err(LookupError::MalformedResponse("object")),
        Value::String(_) => Err(LookupError::MalformedResponse("string")),
        Value::Number(_) => Err(LookupError::MalformedResponse("number")),
        Value::Bool(_) => Err(LookupError::MalformedResponse("boolean")),
        Value::Null => Err(LookupError::MalformedResponse("null")),
    }
}

#[async_trait]
impl LookupTransport for HttpLookup {
    async fn lookup(
        &self,
        endpoint: &str,
        param: &str,
        value: &str,
    ) -> Result<Vec<Value>, LookupError> {
        let response = self
            .client
            .get(endpoint)
            .query(&[(param, value)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        decode_matches(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_array() {
        assert_eq!(decode_matches(b"[]").unwrap().len(), 0);
        assert_eq!(decode_matches(br#"["taken"]"#).unwrap().len(), 1);
    }

    #[test]
    fn decode_rejects_non_arrays() {
        assert!(matches!(
            decode_matches(br#"{"taken": true}"#),
            Err(LookupError::MalformedResponse("object"))
        ));
        assert!(matches!(
            decode_matches(b"null"),
            Err(LookupError::MalformedResponse("null"))
        ));
        assert!(matches!(
            decode_matches(b"not json"),
            Err(LookupError::Decode(_))
        ));
    }
}
