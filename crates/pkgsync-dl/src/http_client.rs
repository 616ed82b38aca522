use std::{
    sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard},
    time::Duration,
};

use ureq::{
    http::{self, HeaderMap, Uri},
    typestate::{WithBody, WithoutBody},
    Agent, RequestBuilder,
};

pub const DEFAULT_USER_AGENT: &str = concat!("pkgsync/", env!("CARGO_PKG_VERSION"));

/// Settings for the process-wide HTTP agent.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(DEFAULT_USER_AGENT.into()),
            headers: None,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl ClientConfig {
    /// Builds a `ureq` agent from this configuration.
    ///
    /// Non-2xx statuses are returned as responses rather than errors so that callers can
    /// tell a missing package page (404) apart from bad credentials (401/403).
    pub fn build(&self) -> Agent {
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

struct SharedClient {
    agent: Agent,
    config: ClientConfig,
}

static SHARED_CLIENT_STATE: LazyLock<Arc<RwLock<SharedClient>>> = LazyLock::new(|| {
    let config = ClientConfig::default();
    let agent = config.build();

    Arc::new(RwLock::new(SharedClient {
        agent,
        config,
    }))
});

fn shared_state() -> RwLockReadGuard<'static, SharedClient> {
    SHARED_CLIENT_STATE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the process-wide agent configured through [`configure_http_client`].
#[derive(Clone, Default)]
pub struct SharedAgent;

impl SharedAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn get<T>(&self, uri: T) -> RequestBuilder<WithoutBody>
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<http::Error>,
    {
        let state = shared_state();
        let req = state.agent.get(uri);
        apply_headers(req, &state.config.headers)
    }

    pub fn post<T>(&self, uri: T) -> RequestBuilder<WithBody>
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<http::Error>,
    {
        let state = shared_state();
        let req = state.agent.post(uri);
        apply_headers(req, &state.config.headers)
    }

    /// Timeout applied by the agent, reused by the raw upload connection.
    pub fn timeout(&self) -> Option<Duration> {
        shared_state().config.timeout
    }

    pub fn user_agent(&self) -> Option<String> {
        shared_state().config.user_agent.clone()
    }
}

fn apply_headers<B>(mut req: RequestBuilder<B>, headers: &Option<HeaderMap>) -> RequestBuilder<B> {
    if let Some(headers) = headers {
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
    }
    req
}

pub static SHARED_AGENT: LazyLock<SharedAgent> = LazyLock::new(SharedAgent::new);

/// Rebuilds the shared agent after applying `updater` to its configuration.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use pkgsync_dl::http_client::configure_http_client;
///
/// configure_http_client(|cfg| {
///     cfg.timeout = Some(Duration::from_secs(30));
/// });
/// ```
pub fn configure_http_client<F>(updater: F)
where
    F: FnOnce(&mut ClientConfig),
{
    let mut state = SHARED_CLIENT_STATE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let mut new_config = state.config.clone();
    updater(&mut new_config);
    let new_agent = new_config.build();
    state.agent = new_agent;
    state.config = new_config;
}
