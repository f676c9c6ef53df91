use std::time::Duration;

use crate::error::SeaTableError;

/// Environment variable holding the server URL read by [`BaseConfig::from_env`].
pub const ENV_SERVER_URL: &str = "SEATABLE_SERVER_URL";
/// Environment variable holding the base's API token.
pub const ENV_API_TOKEN: &str = "SEATABLE_API_TOKEN";
/// Optional request timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "SEATABLE_TIMEOUT_SECS";

/// Which kind of credential a [`BaseConfig`] carries.
///
/// Row and metadata endpoints accept both. The upload/download link
/// endpoints only accept an API token generated for the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// API token generated for the base (long-lived).
    #[default]
    Api,
    /// Short-lived token handed out by the web UI or a script runner.
    Temporary,
}

impl TokenKind {
    /// Whether this credential may request file upload/download links.
    pub fn can_access_files(&self) -> bool {
        matches!(self, TokenKind::Api)
    }
}

/// Configuration for connecting to one SeaTable base.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// Server URL (e.g. "https://cloud.seatable.io"). Trailing slashes are ignored.
    pub server_url: String,
    /// Token identifying the base, exchanged for an access token by `auth`.
    pub api_token: String,
    pub token_kind: TokenKind,
    /// Per-request timeout. `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl BaseConfig {
    /// Create a config with an API token and no timeout.
    pub fn new(server_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            token_kind: TokenKind::Api,
            timeout: None,
            user_agent: format!("seatable-client-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Build a config from `SEATABLE_SERVER_URL`, `SEATABLE_API_TOKEN` and the
    /// optional `SEATABLE_TIMEOUT_SECS`.
    ///
    /// Missing or empty variables and an unparsable timeout are
    /// [`SeaTableError::InvalidConfig`].
    pub fn from_env() -> Result<Self, SeaTableError> {
        let url = std::env::var(ENV_SERVER_URL)
            .map_err(|_| SeaTableError::invalid_config(format!("{} is not set", ENV_SERVER_URL)))?;
        let token = std::env::var(ENV_API_TOKEN)
            .map_err(|_| SeaTableError::invalid_config(format!("{} is not set", ENV_API_TOKEN)))?;

        let mut config = Self::new(url, token);
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SeaTableError::invalid_config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the credential kind.
    pub fn token_kind(mut self, kind: TokenKind) -> Self {
        self.token_kind = kind;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the User-Agent header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Check that both the URL and the token are usable.
    pub fn validate(&self) -> Result<(), SeaTableError> {
        if self.server_url.is_empty() {
            return Err(SeaTableError::invalid_config("server_url is required"));
        }
        if self.api_token.trim().is_empty() {
            return Err(SeaTableError::invalid_config("api_token is required"));
        }
        url::Url::parse(&self.server_url)?;
        Ok(())
    }
}
