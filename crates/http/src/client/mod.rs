//! Expense tracker HTTP client
//!
//! [`TrackerClient`] wraps a `reqwest` client with the session handling
//! every resource call shares:
//!
//! - the current access token is attached as a bearer credential at send
//!   time, so a replayed request always carries the newest token;
//! - an unauthorized response starts (or joins) a single token refresh and
//!   the request is retried once afterwards;
//! - a refresh that fails clears the token and publishes
//!   [`SessionEvent::Expired`].
//!
//! Resource operations live in the submodules as `impl TrackerClient`
//! blocks, one per API area.

pub mod accounts;
pub mod auth;
pub mod budgets;
pub mod config;
pub mod error;
pub mod expenses;
pub mod goals;
pub mod records;
pub mod refresh;
pub mod reports;
pub mod session;
pub mod statements;
pub mod subscriptions;
pub mod token;

use error::{ClientError, error_message};
use refresh::{Joined, RefreshCoordinator, RefreshOutcome};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, ClientBuilder, Request, RequestBuilder, Response, StatusCode};
use session::{SessionEvent, SessionEvents};
use std::sync::Arc;
use std::time::Duration;
use token::{MemoryTokenStore, TokenStore};
use tracker_core::validation::validators;

pub use config::ClientConfig;

struct ClientInner {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    refresh: RefreshCoordinator,
    events: SessionEvents,
}

/// Expense tracker API client
///
/// Cheap to clone; clones share the token slot, the refresh state and the
/// cookie jar holding the refresh credential.
#[derive(Clone)]
pub struct TrackerClient {
    inner: Arc<ClientInner>,
}

impl TrackerClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> TrackerClientBuilder {
        TrackerClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Current access token, if logged in
    pub fn access_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.inner.tokens.get()?)
    }

    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.access_token()?.is_some())
    }

    /// Observe session changes (login, refresh, expiry, logout)
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a token refresh is currently outstanding
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Create a request builder for a path on the API
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        let request = self.inner.client.request(method, url);

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request
    }

    /// Execute a request through the session handling and decode JSON
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.dispatch(replayable(request)?).await?;
        Ok(response.json().await?)
    }

    /// Execute a request whose response body carries nothing of interest
    pub async fn execute_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.dispatch(replayable(request)?).await?;
        Ok(())
    }

    /// Execute a request returning a binary payload
    pub async fn execute_bytes(&self, request: RequestBuilder) -> Result<bytes::Bytes, ClientError> {
        let response = self.dispatch(replayable(request)?).await?;
        Ok(response.bytes().await?)
    }

    /// Execute a request that neither carries nor renews the session
    pub(crate) async fn execute_public<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Attach the current access token, if any, as a bearer credential
    fn authorize(&self, request: &mut Request) -> Result<Option<String>, ClientError> {
        let headers = request.headers_mut();
        headers.remove(AUTHORIZATION);

        let Some(token) = self.inner.tokens.get()? else {
            return Ok(None);
        };
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                Ok(Some(token))
            }
            Err(_) => {
                warn!("Stored access token is not a valid header value, sending unauthenticated");
                Ok(None)
            }
        }
    }

    /// Send once with the current token, returning the token that was used
    async fn send(&self, mut request: Request) -> Result<(Response, Option<String>), ClientError> {
        let token = self.authorize(&mut request)?;
        debug!(
            method = %request.method(),
            path = request.url().path(),
            authenticated = token.is_some(),
            "Sending request"
        );
        let response = self.inner.client.execute(request).await?;
        Ok((response, token))
    }

    /// Send through the unauthorized-response handler.
    ///
    /// `make` produces a fresh copy of the request for the first attempt and
    /// for the single post-refresh retry.
    pub(crate) async fn dispatch<F>(&self, mut make: F) -> Result<Response, ClientError>
    where
        F: FnMut() -> Result<Request, ClientError>,
    {
        let (response, sent_with) = self.send(make()?).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!(path = response.url().path(), "Request unauthorized");
        if !self.renew_session(sent_with.as_deref()).await? {
            return Err(ClientError::SessionExpired);
        }

        // Post-refresh retry: a second 401 is final
        let (response, _) = self.send(make()?).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(
                path = response.url().path(),
                "Request still unauthorized after token refresh"
            );
            self.expire_session()?;
            return Err(ClientError::SessionExpired);
        }
        check_status(response).await
    }

    /// Make sure a token newer than `stale` is in place.
    ///
    /// Returns `false` when the session could not be renewed.
    async fn renew_session(&self, stale: Option<&str>) -> Result<bool, ClientError> {
        let guard = match self.inner.refresh.join().await {
            Joined::Settled(outcome) => return Ok(outcome == RefreshOutcome::Refreshed),
            Joined::Leader(guard) => guard,
        };

        // Checked while leading: a refresh that settled between our 401 and
        // here has already stored its token
        match (self.inner.tokens.get()?, stale) {
            (Some(current), _) if Some(current.as_str()) != stale => {
                debug!("Access token changed while request was in flight");
                guard.settle(RefreshOutcome::Refreshed);
                Ok(true)
            }
            (None, Some(_)) => {
                debug!("Session ended while request was in flight");
                guard.settle(RefreshOutcome::Failed);
                Ok(false)
            }
            _ => self.lead_refresh(guard).await,
        }
    }

    /// Lead or join the single in-flight refresh
    async fn refresh_cycle(&self) -> Result<bool, ClientError> {
        match self.inner.refresh.join().await {
            Joined::Settled(outcome) => Ok(outcome == RefreshOutcome::Refreshed),
            Joined::Leader(guard) => self.lead_refresh(guard).await,
        }
    }

    /// Run the refresh call and hand its outcome to every waiter
    async fn lead_refresh(&self, guard: refresh::RefreshGuard<'_>) -> Result<bool, ClientError> {
        let refreshed = match self.refresh_access_token().await {
            Ok(token) => self.inner.tokens.set(&token).map_err(ClientError::from),
            Err(e) => Err(e),
        };

        match refreshed {
            Ok(()) => {
                guard.settle(RefreshOutcome::Refreshed);
                info!("Access token refreshed");
                self.inner.events.publish(SessionEvent::Refreshed);
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, ending session");
                // Cleared before settling so a late 401 sees the session gone
                // instead of leading another refresh with the stale token
                let cleared = self.inner.tokens.clear();
                guard.settle(RefreshOutcome::Failed);
                self.inner.events.publish(SessionEvent::Expired);
                cleared?;
                Ok(false)
            }
        }
    }

    /// Exchange the refresh cookie for a new access token
    async fn refresh_access_token(&self) -> Result<String, ClientError> {
        let request = self.request(reqwest::Method::POST, "/auth/refresh");
        let response: crate::types::TokenResponse = self.execute_public(request).await?;
        Ok(response.access_token)
    }

    /// Drop the session after a post-refresh 401, announcing it once per
    /// stored token
    fn expire_session(&self) -> Result<(), ClientError> {
        if self.inner.tokens.clear()?.is_some() {
            self.inner.events.publish(SessionEvent::Expired);
        }
        Ok(())
    }
}

/// Turn a builder into a factory that can reproduce the request
fn replayable(
    request: RequestBuilder,
) -> Result<impl FnMut() -> Result<Request, ClientError>, ClientError> {
    let template = request.build()?;
    Ok(move || {
        template
            .try_clone()
            .ok_or_else(|| ClientError::Configuration("request body cannot be replayed".into()))
    })
}

/// Map non-success statuses onto [`ClientError`]
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(
        status,
        error_message(&body, &status.to_string()),
    ))
}

/// Builder for TrackerClient
#[derive(Default)]
pub struct TrackerClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
    access_token: Option<String>,
}

impl TrackerClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Keep the access token in the given store instead of memory
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Start out with a known access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Apply every setting from a [`ClientConfig`]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.base_url = Some(config.base_url.clone());
        self.timeout = config.timeout_secs.map(Duration::from_secs);
        self.user_agent = Some(config.user_agent.clone());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<TrackerClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        validators::validate_url(&base_url, "base_url")
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        {
            // The refresh credential arrives as a cookie
            client_builder = client_builder.cookie_store(true);
            if let Some(timeout) = self.timeout {
                client_builder = client_builder.timeout(timeout);
            }
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| ClientConfig::default().user_agent),
        );

        let client = client_builder.build()?;

        let tokens = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        if let Some(token) = self.access_token {
            tokens.set(&token)?;
        }

        Ok(TrackerClient {
            inner: Arc::new(ClientInner {
                client,
                base_url,
                tokens,
                refresh: RefreshCoordinator::new(),
                events: SessionEvents::new(),
            }),
        })
    }
}
