use reqwest::header::COOKIE;

use crate::{
    error::GateError,
    models::{SessionReply, SessionUser},
    session::WatchSessionProvider,
};

/// RemoteSessionClient
///
/// Client-side session lookup against the auth service's `get-session` endpoint.
/// The stored session cookie is forwarded as-is; the server decides whether it is valid.
#[derive(Debug, Clone)]
pub struct RemoteSessionClient {
    http: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
}

impl RemoteSessionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie: None,
        }
    }

    /// Sets the raw `Cookie` header value sent with every lookup
    /// (e.g. `better-auth.session_token=abc`).
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// fetch
    ///
    /// Asks the auth service for the current session. `Ok(None)` is an authoritative
    /// "signed out"; transport and decode failures are errors, never "signed out".
    pub async fn fetch(&self) -> Result<Option<SessionUser>, GateError> {
        let mut request = self
            .http
            .get(format!("{}/api/auth/get-session", self.base_url));
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let session = request
            .send()
            .await?
            .error_for_status()?
            .json::<Option<SessionReply>>()
            .await?;

        Ok(session.map(|reply| reply.user))
    }

    /// refresh
    ///
    /// Runs one lookup cycle on `provider`: pending while the request is in flight,
    /// then resolved with the answer. On failure the provider stays pending; retrying
    /// is up to the caller.
    pub async fn refresh(&self, provider: &WatchSessionProvider) -> Result<(), GateError> {
        provider.begin_revalidation();

        match self.fetch().await {
            Ok(user) => {
                tracing::debug!(signed_in = user.is_some(), "session resolved");
                provider.resolve(user);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed, staying in loading state");
                Err(e)
            }
        }
    }
}
