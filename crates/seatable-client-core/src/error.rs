use serde::Deserialize;

/// Error body returned by SeaTable endpoints.
///
/// The web server answers with `error_msg`, the dtable server with
/// `error_message` or `error_type`, and DRF-style views with `detail`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiErrorResponse {
    /// Extract the most informative error message from the response.
    pub fn error_message(&self) -> String {
        self.error_msg
            .as_deref()
            .or(self.error_message.as_deref())
            .or(self.detail.as_deref())
            .or(self.error_type.as_deref())
            .unwrap_or("Unknown error")
            .to_string()
    }
}

/// Decode an error message from a response body (JSON first, then plain text).
pub fn parse_error_message(body: &[u8]) -> String {
    if let Ok(api_err) = serde_json::from_slice::<ApiErrorResponse>(body) {
        return api_err.error_message();
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "Unknown error".to_string()
    } else {
        text
    }
}

/// Every error a SeaTable operation can return.
#[derive(Debug, thiserror::Error)]
pub enum SeaTableError {
    /// HTTP transport error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token exchange was rejected or returned an unreadable body.
    #[error("Auth error ({status}): {message}")]
    Auth { status: u16, message: String },

    /// SeaTable answered a request with a non-2xx status.
    #[error("SeaTable API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// An operation was attempted before `auth`.
    #[error("Not authenticated: call auth() before issuing requests")]
    NotAuthenticated,

    /// The configured credential cannot perform this operation.
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// Local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid configuration (missing URL or token, bad header value).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A 2xx response whose body lacks a field the operation needs.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Coarse classification of [`SeaTableError`] for callers that only care
/// about which side failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad, expired or insufficient credential, or no auth performed yet.
    Auth,
    /// Transport failure, non-2xx status or unreadable body.
    Request,
    /// Local file unreadable.
    Io,
    /// Client-side misconfiguration.
    Config,
}

impl SeaTableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } | Self::NotAuthenticated | Self::MissingCapability(_) => {
                ErrorKind::Auth
            }
            Self::Http(_)
            | Self::Api { .. }
            | Self::Serialization(_)
            | Self::MalformedResponse(_) => ErrorKind::Request,
            Self::Io(_) => ErrorKind::Io,
            Self::UrlParse(_) | Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// HTTP status attached to the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

/// Result alias using SeaTableError.
pub type SeaTableResult<T> = Result<T, SeaTableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_api() {
        let err = SeaTableError::Api {
            status: 404,
            message: "table not found".into(),
        };
        assert_eq!(err.to_string(), "SeaTable API error (404): table not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn error_kinds() {
        let auth = SeaTableError::Auth {
            status: 403,
            message: "Permission denied.".into(),
        };
        assert_eq!(auth.kind(), ErrorKind::Auth);
        assert_eq!(SeaTableError::NotAuthenticated.kind(), ErrorKind::Auth);
        assert_eq!(
            SeaTableError::MissingCapability("upload".into()).kind(),
            ErrorKind::Auth
        );

        let api = SeaTableError::Api {
            status: 400,
            message: "bad".into(),
        };
        assert_eq!(api.kind(), ErrorKind::Request);
        assert_eq!(SeaTableError::malformed("no _id").kind(), ErrorKind::Request);

        let io = SeaTableError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(io.status(), None);

        assert_eq!(SeaTableError::invalid_config("x").kind(), ErrorKind::Config);
    }

    #[test]
    fn api_error_response_priority() {
        let json = r#"{"error_msg":"Token is invalid","detail":"other"}"#;
        let resp: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.error_message(), "Token is invalid");

        let json = r#"{"error_type":"table_not_exist","error_message":"table Table9 not found"}"#;
        let resp: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.error_message(), "table Table9 not found");

        let json = r#"{"detail":"Authentication credentials were not provided."}"#;
        let resp: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.error_message(),
            "Authentication credentials were not provided."
        );

        let resp: ApiErrorResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.error_message(), "Unknown error");
    }

    #[test]
    fn parse_error_message_fallbacks() {
        assert_eq!(parse_error_message(br#"{"error_msg":"nope"}"#), "nope");
        assert_eq!(parse_error_message(b"row not found\n"), "row not found");
        assert_eq!(parse_error_message(b""), "Unknown error");
    }
}
