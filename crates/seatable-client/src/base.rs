use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use seatable_client_core::{parse_error_message, BaseConfig, SeaTableError, SeaTableResult};

use crate::types::AuthInfo;

/// How long an access token handed out by `app-access-token` stays valid.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Client for one SeaTable base.
///
/// Construct with [`Base::new`], call [`Base::auth`] once, then issue
/// row, table, SQL and file requests. Every request carries the access
/// token obtained by `auth`.
///
/// # Example
/// ```ignore
/// use seatable_client::{row, Base};
///
/// let mut base = Base::new("your-api-token", "https://cloud.seatable.io")?;
/// base.auth(false).await?;
/// let row = base.append_row("Table3", row![("Name", "name1"), ("age", 20)]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Base {
    http: reqwest::Client,
    config: BaseConfig,
    server_url: Url,
    session: Option<Session>,
    table_ids: HashMap<String, String>,
}

/// State established by a successful `auth`.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) info: AuthInfo,
    pub(crate) dtable_server: Url,
    pub(crate) authenticated_at: Instant,
}

impl Base {
    /// Create a client for the base identified by `api_token`.
    ///
    /// No request is made and the token is not checked until [`Base::auth`].
    pub fn new(api_token: &str, server_url: &str) -> SeaTableResult<Self> {
        Self::from_config(BaseConfig::new(server_url, api_token))
    }

    /// Create a client from a full configuration.
    pub fn from_config(config: BaseConfig) -> SeaTableResult<Self> {
        let server_url = Url::parse(&config.server_url)?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(SeaTableError::Http)?;

        Ok(Self {
            http,
            config,
            server_url,
            session: None,
            table_ids: HashMap::new(),
        })
    }

    /// The server URL this client talks to.
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// The configuration the client was built from.
    pub fn config(&self) -> &BaseConfig {
        &self.config
    }

    /// Whether [`Base::auth`] has succeeded on this client.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Details returned by the last successful `auth`.
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.session.as_ref().map(|s| &s.info)
    }

    /// The current access token, if authenticated.
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.info.access_token.as_str())
    }

    /// UUID of the base, if authenticated.
    pub fn dtable_uuid(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.info.dtable_uuid.as_str())
    }

    /// Table id for `table_name`, populated when `auth(true)` was used.
    pub fn table_id(&self, table_name: &str) -> Option<&str> {
        self.table_ids.get(table_name).map(|s| s.as_str())
    }

    /// True when not authenticated or when the access token has outlived
    /// [`ACCESS_TOKEN_LIFETIME`]. Callers re-run [`Base::auth`] themselves.
    pub fn needs_reauth(&self) -> bool {
        match &self.session {
            Some(session) => session.authenticated_at.elapsed() >= ACCESS_TOKEN_LIFETIME,
            None => true,
        }
    }

    // ─── Auth ────────────────────────────────────────────────────

    /// Exchange the API token for an access token and the base's endpoints.
    ///
    /// When `with_table_id` is true the metadata is read once more and the
    /// table-name to table-id map is cached (see [`Base::table_id`]).
    ///
    /// On any failure, including the metadata read, the client keeps the
    /// state it had before the call.
    ///
    /// # Errors
    /// * [`SeaTableError::Auth`] if the server rejects the token or the reply
    ///   cannot be decoded.
    /// * [`SeaTableError::Http`] on network failure.
    pub async fn auth(&mut self, with_table_id: bool) -> SeaTableResult<()> {
        let url = self.server_endpoint("/api/v2.1/dtable/app-access-token/");
        debug!(server = %self.server_url, "Requesting access token");

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, token_header(&self.config.api_token)?)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let success = resp.status().is_success();
        let body = resp.bytes().await?;
        if !success {
            let message = parse_error_message(&body);
            warn!(status, message = %message, "Access token request rejected");
            return Err(SeaTableError::Auth { status, message });
        }

        let info: AuthInfo = serde_json::from_slice(&body).map_err(|e| SeaTableError::Auth {
            status,
            message: format!("malformed auth response: {}", e),
        })?;
        if info.access_token.is_empty() {
            return Err(SeaTableError::Auth {
                status,
                message: "auth response carried an empty access token".into(),
            });
        }
        let dtable_server = Url::parse(&info.dtable_server).map_err(|e| SeaTableError::Auth {
            status,
            message: format!("invalid dtable_server '{}': {}", info.dtable_server, e),
        })?;

        debug!(dtable_uuid = %info.dtable_uuid, dtable_server = %dtable_server, "Authenticated");
        let previous = self.session.replace(Session {
            info,
            dtable_server,
            authenticated_at: Instant::now(),
        });

        let table_ids = if with_table_id {
            match self.get_metadata().await {
                Ok(metadata) => metadata
                    .tables
                    .into_iter()
                    .map(|t| (t.name, t.id))
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "Metadata read during auth failed");
                    self.session = previous;
                    return Err(e);
                }
            }
        } else {
            HashMap::new()
        };
        self.table_ids = table_ids;
        Ok(())
    }

    // ─── Internal Helpers ────────────────────────────────────────

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn session(&self) -> SeaTableResult<&Session> {
        self.session.as_ref().ok_or(SeaTableError::NotAuthenticated)
    }

    /// `Authorization` header carrying the access token.
    pub(crate) fn access_header(&self) -> SeaTableResult<HeaderValue> {
        token_header(&self.session()?.info.access_token)
    }

    /// `Authorization` header carrying the API token itself.
    #[cfg(feature = "files")]
    pub(crate) fn api_token_header(&self) -> SeaTableResult<HeaderValue> {
        token_header(&self.config.api_token)
    }

    /// URL on the main web server, e.g. `/api/v2.1/dtable/app-upload-link/`.
    pub(crate) fn server_endpoint(&self, path: &str) -> Url {
        join_path(&self.server_url, path)
    }

    /// URL under `{dtable_server}/api/v1/dtables/{uuid}/`.
    pub(crate) fn dtable_endpoint(&self, path: &str) -> SeaTableResult<Url> {
        let session = self.session()?;
        let full = format!(
            "/api/v1/dtables/{}/{}",
            session.info.dtable_uuid,
            path.trim_start_matches('/')
        );
        Ok(join_path(&session.dtable_server, &full))
    }

    /// URL under `{dtable_db}/api/v1/`, for SQL queries.
    pub(crate) fn dtable_db_endpoint(&self, path: &str) -> SeaTableResult<Url> {
        let session = self.session()?;
        let db = session.info.dtable_db.as_deref().ok_or_else(|| {
            SeaTableError::malformed("auth response did not include dtable_db; SQL is unavailable")
        })?;
        let db_url = Url::parse(db)?;
        Ok(join_path(
            &db_url,
            &format!("/api/v1/{}", path.trim_start_matches('/')),
        ))
    }

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> SeaTableResult<T> {
        let status = resp.status().as_u16();
        let success = resp.status().is_success();
        let body = resp.bytes().await?;
        if !success {
            let message = parse_error_message(&body);
            debug!(status, message = %message, "SeaTable request failed");
            return Err(SeaTableError::Api { status, message });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn handle_empty_response(
        &self,
        resp: reqwest::Response,
    ) -> SeaTableResult<()> {
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.bytes().await?;
            let message = parse_error_message(&body);
            debug!(status, message = %message, "SeaTable request failed");
            return Err(SeaTableError::Api { status, message });
        }
        Ok(())
    }
}

fn token_header(token: &str) -> SeaTableResult<HeaderValue> {
    HeaderValue::from_str(&format!("Token {}", token))
        .map_err(|e| SeaTableError::invalid_config(format!("Invalid token header: {}", e)))
}

/// Append `path` to whatever path `base` already has.
fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let current = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}/{}", current, path.trim_start_matches('/')));
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthInfo;

    fn authenticated(base: &mut Base, dtable_server: &str, dtable_db: Option<&str>) {
        base.session = Some(Session {
            info: AuthInfo {
                app_name: None,
                access_token: "access".into(),
                dtable_uuid: "uuid-1".into(),
                dtable_server: dtable_server.into(),
                dtable_socket: None,
                dtable_db: dtable_db.map(String::from),
                workspace_id: Some(7),
                dtable_name: None,
            },
            dtable_server: Url::parse(dtable_server).unwrap(),
            authenticated_at: Instant::now(),
        });
    }

    #[test]
    fn base_new_ok() {
        let base = Base::new("token", "https://cloud.seatable.io").unwrap();
        assert!(!base.is_authenticated());
        assert!(base.needs_reauth());
        assert!(base.access_token().is_none());
    }

    #[test]
    fn base_new_rejects_bad_url() {
        assert!(matches!(
            Base::new("token", "cloud seatable"),
            Err(SeaTableError::UrlParse(_))
        ));
    }

    #[test]
    fn server_endpoint_building() {
        let base = Base::new("token", "https://cloud.seatable.io/").unwrap();
        let url = base.server_endpoint("/api/v2.1/dtable/app-access-token/");
        assert_eq!(
            url.as_str(),
            "https://cloud.seatable.io/api/v2.1/dtable/app-access-token/"
        );
    }

    #[test]
    fn server_endpoint_keeps_subpath() {
        let base = Base::new("token", "https://example.com/seatable").unwrap();
        let url = base.server_endpoint("/api/v2.1/dtable/app-upload-link/");
        assert_eq!(url.path(), "/seatable/api/v2.1/dtable/app-upload-link/");
    }

    #[test]
    fn dtable_endpoint_requires_auth() {
        let base = Base::new("token", "https://cloud.seatable.io").unwrap();
        assert!(matches!(
            base.dtable_endpoint("rows/"),
            Err(SeaTableError::NotAuthenticated)
        ));
    }

    #[test]
    fn dtable_endpoint_building() {
        let mut base = Base::new("token", "https://cloud.seatable.io").unwrap();
        authenticated(&mut base, "https://cloud.seatable.io/dtable-server/", None);
        let url = base.dtable_endpoint("rows/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.seatable.io/dtable-server/api/v1/dtables/uuid-1/rows/"
        );
        assert!(!base.needs_reauth());
        assert_eq!(base.access_token(), Some("access"));
    }

    #[test]
    fn needs_reauth_after_token_lifetime() {
        let mut base = Base::new("token", "https://cloud.seatable.io").unwrap();
        authenticated(&mut base, "https://cloud.seatable.io/dtable-server/", None);
        // Instants before boot are not representable on every platform.
        let Some(expired) = Instant::now().checked_sub(ACCESS_TOKEN_LIFETIME) else {
            return;
        };
        if let Some(session) = base.session.as_mut() {
            session.authenticated_at = expired;
        }
        assert!(base.is_authenticated());
        assert!(base.needs_reauth());
    }

    #[test]
    fn dtable_db_endpoint_building() {
        let mut base = Base::new("token", "https://cloud.seatable.io").unwrap();
        authenticated(
            &mut base,
            "https://cloud.seatable.io/dtable-server/",
            Some("https://cloud.seatable.io/dtable-db/"),
        );
        let url = base.dtable_db_endpoint("query/uuid-1/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.seatable.io/dtable-db/api/v1/query/uuid-1/"
        );
    }

    #[test]
    fn dtable_db_endpoint_missing() {
        let mut base = Base::new("token", "https://cloud.seatable.io").unwrap();
        authenticated(&mut base, "https://cloud.seatable.io/dtable-server/", None);
        assert!(matches!(
            base.dtable_db_endpoint("query/uuid-1/"),
            Err(SeaTableError::MalformedResponse(_))
        ));
    }

    #[test]
    fn token_header_format() {
        let header = token_header("abc").unwrap();
        assert_eq!(header.to_str().unwrap(), "Token abc");
        assert!(token_header("bad\ntoken").is_err());
    }
}
