use serde_json::json;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Row not found")]
    NotFound,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    /// Transport-level failure; never produced by the store itself
    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound => json!({
                "message": "row not found",
                "type": "not-found",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::Network(msg) => json!({
                "message": msg,
                "type": "network",
            }),
        })
        .expect("serializing error contents")
    }

    /// Best-effort decoding of a store error body; anything unrecognized
    /// degrades to `Unknown` so a misbehaving backend cannot take the client
    /// down with it
    pub fn parse(body: &[u8]) -> Error {
        let data: serde_json::Value = match serde_json::from_slice(body) {
            Ok(data) => data,
            Err(_) => return Error::Unknown(String::from_utf8_lossy(body).into_owned()),
        };
        let message = || {
            String::from(
                data.get("message")
                    .and_then(|msg| msg.as_str())
                    .unwrap_or(""),
            )
        };
        match data.get("type").and_then(|t| t.as_str()) {
            Some("permission-denied") => Error::PermissionDenied,
            Some("not-found") => Error::NotFound,
            Some("null-byte") => Error::NullByteInString(String::from(
                data.get("string").and_then(|s| s.as_str()).unwrap_or(""),
            )),
            Some("network") => Error::Network(message()),
            _ => Error::Unknown(message()),
        }
    }
}
