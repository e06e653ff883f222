//! Per-account protocol session.
//!
//! The session is the single choke point for command execution: it
//! owns the negotiated protocol version, the device identity and the
//! current policy key, builds the command URL and headers, and runs
//! the one automatic provision-and-retry cycle when the server signals
//! authorization expiry.

use crate::config::AccountConfig;
use crate::error::{EasError, EasResult};
use crate::store::StateStore;
use crate::transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use easync_protocol::{negotiate, Command, ProtocolVersion};
use easync_wbxml::Element;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Content type of WBXML command bodies.
pub const WBXML_CONTENT_TYPE: &str = "application/vnd.ms-sync.wbxml";

/// Per-call execution options.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExecuteOptions {
    /// Do not attach the policy key header (provisioning round-trips).
    pub skip_policy_key: bool,
    /// Do not run the provision-and-retry cycle on HTTP 449.
    pub no_reprovision: bool,
    /// Override the command timeout.
    pub timeout: Option<Duration>,
    /// Extra query parameters appended to the command URL.
    pub extra_query: Vec<(String, String)>,
    /// Override the request content type.
    pub content_type: Option<&'static str>,
}

struct SessionState {
    version: ProtocolVersion,
    version_negotiated: bool,
    policy_key: Option<String>,
}

/// A per-account protocol session.
///
/// Shared state (policy key, negotiated version) is mutated only
/// behind the internal lock, so a session can be shared across tasks;
/// the cursor discipline for collections lives in the sync engine.
pub struct Session<C: HttpClient, S: StateStore> {
    config: AccountConfig,
    client: Arc<C>,
    store: Arc<S>,
    device_id: String,
    state: RwLock<SessionState>,
}

impl<C: HttpClient, S: StateStore> Session<C, S> {
    /// Creates a session, reading the committed policy key from the
    /// store.
    pub fn new(config: AccountConfig, client: Arc<C>, store: Arc<S>) -> EasResult<Self> {
        let policy_key = store.policy_key()?;
        let device_id = config.device_id();
        Ok(Self {
            config,
            client,
            store,
            device_id,
            state: RwLock::new(SessionState {
                version: ProtocolVersion::OLDEST,
                version_negotiated: false,
                policy_key,
            }),
        })
    }

    /// The account configuration.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// The state store collaborator.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The stable device identifier.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// The current policy key, if provisioned.
    pub fn policy_key(&self) -> Option<String> {
        self.state.read().policy_key.clone()
    }

    pub(crate) fn commit_policy_key(&self, key: &str) -> EasResult<()> {
        self.store.set_policy_key(Some(key))?;
        self.state.write().policy_key = Some(key.to_string());
        Ok(())
    }

    pub(crate) fn restore_policy_key(&self, key: Option<&str>) -> EasResult<()> {
        self.store.set_policy_key(key)?;
        self.state.write().policy_key = key.map(str::to_string);
        Ok(())
    }

    /// Clears the policy key after an authorization-expired signal.
    pub fn invalidate_policy_key(&self) -> EasResult<()> {
        self.restore_policy_key(None)
    }

    /// Discover and cache the protocol version.
    ///
    /// Issues an OPTIONS request and intersects the advertised
    /// `MS-ASProtocolVersions` list with the versions the engine
    /// supports. Detection never fails a session: any transport or
    /// header problem falls back to the oldest supported version.
    pub async fn detect_version(&self) -> ProtocolVersion {
        {
            let state = self.state.read();
            if state.version_negotiated {
                return state.version;
            }
        }

        let request = HttpRequest {
            method: HttpMethod::Options,
            url: format!("{}/Microsoft-Server-ActiveSync", self.config.server_url),
            headers: self.base_headers(),
            body: Vec::new(),
            timeout: self.config.timeouts.command,
        };

        let version = match self.client.execute(request).await {
            Ok(response) if response.is_success() => {
                match response.header("MS-ASProtocolVersions") {
                    Some(advertised) => {
                        let version = negotiate(advertised);
                        info!(%version, advertised, "negotiated protocol version");
                        version
                    }
                    None => {
                        warn!("discovery response lacks MS-ASProtocolVersions, using fallback");
                        ProtocolVersion::OLDEST
                    }
                }
            }
            Ok(response) => {
                warn!(status = response.status, "version discovery failed, using fallback");
                ProtocolVersion::OLDEST
            }
            Err(message) => {
                warn!(%message, "version discovery unreachable, using fallback");
                ProtocolVersion::OLDEST
            }
        };

        let mut state = self.state.write();
        state.version = version;
        state.version_negotiated = true;
        version
    }

    /// Executes a command with a WBXML document body.
    ///
    /// Returns `Ok(None)` for the legitimately empty response bodies
    /// some commands produce (folder deletion, ping timeout).
    pub async fn execute(&self, command: Command, document: &Element) -> EasResult<Option<Element>> {
        self.execute_with(command, document, &ExecuteOptions::default())
            .await
    }

    pub(crate) async fn execute_with(
        &self,
        command: Command,
        document: &Element,
        options: &ExecuteOptions,
    ) -> EasResult<Option<Element>> {
        let body = easync_wbxml::encode(document)?;
        let response = self.request(command, &body, options).await?;
        if response.body.is_empty() {
            return Ok(None);
        }
        Ok(Some(easync_wbxml::decode(&response.body)?))
    }

    /// Executes a command, returning the raw response for callers that
    /// expect non-WBXML bodies (legacy attachment download, raw MIME
    /// send).
    // Boxed return: provisioning itself executes commands through this
    // method, so the future is mutually recursive with `provision`.
    // Erasing it behind a `dyn Future + Send` at this boundary is what
    // lets the compiler resolve `Send` for the recursive cycle.
    pub(crate) fn request<'a>(
        &'a self,
        command: Command,
        body: &'a [u8],
        options: &'a ExecuteOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = EasResult<HttpResponse>> + Send + 'a>>
    {
        Box::pin(async move {
            let response = self.send(command, body, options).await?;

            match response.status {
                status if (200..300).contains(&status) => Ok(response),
                401 => Err(EasError::Authorization { http_status: 401 }),
                449 if options.no_reprovision => Err(EasError::Authorization { http_status: 449 }),
                449 => {
                    info!(command = command.name(), "authorization expired, re-provisioning");
                    self.invalidate_policy_key()?;
                    if let Err(error) = self.provision().await {
                        warn!(%error, "re-provisioning failed");
                        return Err(EasError::Authorization { http_status: 449 });
                    }

                    let retry = self.send(command, body, options).await?;
                    match retry.status {
                        status if (200..300).contains(&status) => Ok(retry),
                        // A second expiry is terminal for this call; the
                        // original signal is surfaced, not a generic error.
                        449 => Err(EasError::Authorization { http_status: 449 }),
                        401 => Err(EasError::Authorization { http_status: 401 }),
                        status => Err(http_status_error(status)),
                    }
                }
                status => Err(http_status_error(status)),
            }
        })
    }

    async fn send(
        &self,
        command: Command,
        body: &[u8],
        options: &ExecuteOptions,
    ) -> EasResult<HttpResponse> {
        let version = self.detect_version().await;
        let url = self.command_url(command, &options.extra_query)?;

        let mut headers = self.base_headers();
        headers.push(("MS-ASProtocolVersion".to_string(), version.as_str().to_string()));
        headers.push((
            "Content-Type".to_string(),
            options.content_type.unwrap_or(WBXML_CONTENT_TYPE).to_string(),
        ));
        if !options.skip_policy_key {
            if let Some(key) = self.policy_key() {
                headers.push(("X-MS-PolicyKey".to_string(), key));
            }
        }

        debug!(command = command.name(), bytes = body.len(), "executing command");

        let request = HttpRequest {
            method: HttpMethod::Post,
            url,
            headers,
            body: body.to_vec(),
            timeout: options.timeout.unwrap_or(self.config.timeouts.command),
        };

        self.client
            .execute(request)
            .await
            .map_err(EasError::transport_retryable)
    }

    fn base_headers(&self) -> Vec<(String, String)> {
        let token = BASE64.encode(format!(
            "{}:{}",
            self.config.auth_user(),
            self.config.credentials.password
        ));
        vec![
            ("Authorization".to_string(), format!("Basic {token}")),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
        ]
    }

    fn command_url(&self, command: Command, extra: &[(String, String)]) -> EasResult<String> {
        let mut url = Url::parse(&format!(
            "{}/Microsoft-Server-ActiveSync",
            self.config.server_url
        ))
        .map_err(|e| EasError::transport_fatal(format!("invalid server URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("Cmd", command.name())
            .append_pair("User", &self.config.auth_user())
            .append_pair("DeviceId", &self.device_id)
            .append_pair("DeviceType", &self.config.device_type);
        for (name, value) in extra {
            url.query_pairs_mut().append_pair(name, value);
        }
        Ok(url.into())
    }
}

fn http_status_error(status: u16) -> EasError {
    EasError::Transport {
        message: format!("HTTP status {status}"),
        retryable: status >= 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::transport::MockHttpClient;
    use easync_ntlm::Credentials;
    use easync_wbxml::Codepage;

    fn session_with(mock: Arc<MockHttpClient>) -> Session<MockHttpClient, MemoryStore> {
        let config = AccountConfig::new(
            "https://mail.example.com",
            Credentials::new("kim", "secret", "CORP"),
        );
        Session::new(config, mock, Arc::new(MemoryStore::new())).unwrap()
    }

    fn options_response(versions: &str) -> HttpResponse {
        HttpResponse::status(200).with_header("MS-ASProtocolVersions", versions)
    }

    #[tokio::test]
    async fn version_negotiation_scenario() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("2.5,12.0,12.1"));
        let session = session_with(Arc::clone(&mock));

        assert_eq!(session.detect_version().await, ProtocolVersion::V12_1);
        // Negotiation is cached; no second OPTIONS goes out.
        assert_eq!(session.detect_version().await, ProtocolVersion::V12_1);
        assert_eq!(mock.request_count(), 1);
        assert_eq!(mock.requests()[0].method, HttpMethod::Options);
    }

    #[tokio::test]
    async fn version_detection_never_hard_fails() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_error("connection refused");
        let session = session_with(Arc::clone(&mock));
        assert_eq!(session.detect_version().await, ProtocolVersion::OLDEST);

        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(HttpResponse::status(500));
        let session = session_with(Arc::clone(&mock));
        assert_eq!(session.detect_version().await, ProtocolVersion::OLDEST);

        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(HttpResponse::status(200));
        let session = session_with(Arc::clone(&mock));
        assert_eq!(session.detect_version().await, ProtocolVersion::OLDEST);
    }

    #[tokio::test]
    async fn command_url_and_headers() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("14.1"));
        mock.push_response(HttpResponse::ok(Vec::new()));
        let session = session_with(Arc::clone(&mock));

        let doc = Element::new(Codepage::FolderHierarchy, "FolderSync");
        let result = session.execute(Command::FolderSync, &doc).await.unwrap();
        assert!(result.is_none(), "empty body is a handled case");

        let requests = mock.requests();
        let post = &requests[1];
        assert!(post.url.contains("/Microsoft-Server-ActiveSync?"));
        assert!(post.url.contains("Cmd=FolderSync"));
        assert!(post.url.contains("DeviceType=Android"));
        // domain\user is percent-encoded into the User parameter.
        assert!(post.url.contains("User=CORP%5Ckim"));
        assert_eq!(post.header("MS-ASProtocolVersion"), Some("14.1"));
        assert_eq!(post.header("Content-Type"), Some(WBXML_CONTENT_TYPE));
        assert!(post.header("Authorization").unwrap().starts_with("Basic "));
        // Unprovisioned sessions send no policy key.
        assert_eq!(post.header("X-MS-PolicyKey"), None);
    }

    #[tokio::test]
    async fn policy_key_attached_once_committed() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("14.1"));
        mock.push_response(HttpResponse::ok(Vec::new()));
        let session = session_with(Arc::clone(&mock));
        session.commit_policy_key("314159").unwrap();

        let doc = Element::new(Codepage::FolderHierarchy, "FolderSync");
        session.execute(Command::FolderSync, &doc).await.unwrap();
        assert_eq!(mock.requests()[1].header("X-MS-PolicyKey"), Some("314159"));
    }

    #[tokio::test]
    async fn skip_policy_key_option() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("14.1"));
        mock.push_response(HttpResponse::ok(Vec::new()));
        let session = session_with(Arc::clone(&mock));
        session.commit_policy_key("314159").unwrap();

        let doc = Element::new(Codepage::Provision, "Provision");
        let options = ExecuteOptions {
            skip_policy_key: true,
            no_reprovision: true,
            ..ExecuteOptions::default()
        };
        session
            .execute_with(Command::Provision, &doc, &options)
            .await
            .unwrap();
        assert_eq!(mock.requests()[1].header("X-MS-PolicyKey"), None);
    }

    #[tokio::test]
    async fn http_401_maps_to_authorization() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("14.1"));
        mock.push_response(HttpResponse::status(401));
        let session = session_with(Arc::clone(&mock));

        let doc = Element::new(Codepage::FolderHierarchy, "FolderSync");
        let err = session.execute(Command::FolderSync, &doc).await.unwrap_err();
        assert!(matches!(err, EasError::Authorization { http_status: 401 }));
    }

    #[tokio::test]
    async fn http_5xx_is_retryable_transport() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("14.1"));
        mock.push_response(HttpResponse::status(503));
        let session = session_with(Arc::clone(&mock));

        let doc = Element::new(Codepage::FolderHierarchy, "FolderSync");
        let err = session.execute(Command::FolderSync, &doc).await.unwrap_err();
        assert!(err.is_retryable());

        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(options_response("14.1"));
        mock.push_response(HttpResponse::status(404));
        let session = session_with(Arc::clone(&mock));
        let err = session.execute(Command::FolderSync, &doc).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
