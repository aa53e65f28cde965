//! Error types for relation discovery and request dispatch.

use thiserror::Error;

use crate::types::Method;

/// Errors raised by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[cfg(feature = "remote")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    /// Failure reported by a custom transport.
    #[error("{0}")]
    Other(String),
}

/// Errors raised by a [`Codec`](crate::Codec) implementation.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by [`Agent`](crate::Agent) operations.
#[derive(Debug, Error)]
pub enum AgentError {
    // IO errors (exit code 3)
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: TransportError,
    },

    // Document errors (exit code 2)
    #[error("cannot decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: CodecError,
    },

    #[error("cannot encode request body: {source}")]
    Encode {
        #[source]
        source: CodecError,
    },

    #[error("invalid schema {href}: {message}")]
    SchemaParse { href: String, message: String },

    #[error("invalid root document at {url}: {message}")]
    InvalidRoot { url: String, message: String },

    #[error("relation '{name}' has no schema reference")]
    MissingSchema { name: String },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("no value for parameter '{name}' in {href}")]
    MissingParameter { name: String, href: String },

    // Lookup errors (exit code 4)
    #[error("relation not found: {name}")]
    NotFound { name: String },
}

impl AgentError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentError::Transport { .. } => 3,
            AgentError::NotFound { .. } => 4,
            _ => 2,
        }
    }
}

/// Single document shape violation with path context.
#[derive(Debug, Clone)]
pub struct DocumentError {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_error_exit_codes() {
        let err = AgentError::Transport {
            method: Method::Get,
            url: "http://api.test/".into(),
            source: TransportError::Other("connection refused".into()),
        };
        assert_eq!(err.exit_code(), 3);

        let err = AgentError::NotFound {
            name: "users".into(),
        };
        assert_eq!(err.exit_code(), 4);

        let err = AgentError::SchemaParse {
            href: "/schemata/users".into(),
            message: "missing default relation 'all'".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = AgentError::InvalidUrl {
            url: "api.test".into(),
            message: "relative URL without a base".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn transport_error_display_includes_method() {
        let err = AgentError::Transport {
            method: Method::Post,
            url: "http://api.test/users".into(),
            source: TransportError::Other("timed out".into()),
        };
        assert_eq!(
            err.to_string(),
            "post http://api.test/users failed: timed out"
        );
    }

    #[test]
    fn document_error_display() {
        let err = DocumentError {
            path: "/links/0".into(),
            message: "\"method\" is a required property".into(),
        };
        assert_eq!(
            err.to_string(),
            "/links/0: \"method\" is a required property"
        );

        let err = DocumentError {
            path: String::new(),
            message: "expected an object".into(),
        };
        assert_eq!(err.to_string(), "expected an object");
    }
}
