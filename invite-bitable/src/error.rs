//! Error types for invite-bitable.

use thiserror::Error;

/// Application codes meaning the bearer token is missing, invalid or expired.
const TOKEN_REJECTED_CODES: &[i64] = &[99991661, 99991663, 99991664, 99991668, 99991677];

/// All errors that can arise from calls to the remote table service.
#[derive(Debug, Error)]
pub enum BitableError {
    /// Transport failure: connect error, timeout, broken body.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The service answered 2xx but with a non-zero application code.
    #[error("{endpoint} returned code {code}: {msg}")]
    Api {
        endpoint: String,
        code: i64,
        msg: String,
    },

    /// The response body was not the JSON shape we expect.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Exchanging the app credentials for a tenant token failed.
    #[error("tenant token exchange failed: {0}")]
    Auth(#[source] Box<BitableError>),
}

impl BitableError {
    /// True when the request timed out before a response arrived.
    pub fn is_timeout(&self) -> bool {
        match self {
            BitableError::Http { source, .. } => source.is_timeout(),
            BitableError::Auth(inner) => inner.is_timeout(),
            _ => false,
        }
    }

    /// True when the service refused the bearer token itself, either as a
    /// 2xx envelope or inside a non-2xx body.
    pub fn is_token_rejected(&self) -> bool {
        match self {
            BitableError::Api { code, .. } => TOKEN_REJECTED_CODES.contains(code),
            BitableError::Status { status, body, .. } => {
                *status == 401
                    || serde_json::from_str::<serde_json::Value>(body)
                        .ok()
                        .and_then(|v| v.get("code").and_then(serde_json::Value::as_i64))
                        .is_some_and(|code| TOKEN_REJECTED_CODES.contains(&code))
            }
            _ => false,
        }
    }
}

/// Convenience constructor for [`BitableError::Http`].
pub(crate) fn http_err(endpoint: impl Into<String>, source: reqwest::Error) -> BitableError {
    BitableError::Http {
        endpoint: endpoint.into(),
        source,
    }
}
