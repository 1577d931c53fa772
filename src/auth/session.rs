use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    StatusCode,
};

use super::{request_token, Credential, TokenResponse};
use crate::debug;

/// Refresh a bit before the server-side expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// HTTP session authenticated with the credential's access token
///
/// The token is refreshed when it is known to be expired, and once more when
/// the server rejects it.
pub struct Session {
    http: Client,
    credential: Credential,
    expires_at: Option<SystemTime>,
}

impl Session {
    pub fn new(credential: Credential, expires_in: Option<u64>) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            credential,
            expires_at: expires_in.map(expiry_from_now),
        })
    }

    /// Session whose client ignores the system proxy, for loopback servers
    #[cfg(test)]
    pub fn local(credential: Credential, expires_in: Option<u64>) -> Self {
        Self {
            http: Client::builder().no_proxy().build().unwrap(),
            credential,
            expires_at: expires_in.map(expiry_from_now),
        }
    }

    /// Send a request, built by the provided function so it can be replayed after a refresh
    pub fn send(&mut self, build: impl Fn(&Client) -> RequestBuilder) -> Result<Response> {
        if self.needs_refresh() {
            self.refresh()?;
        }

        let res = self.send_once(&build)?;

        if res.status() != StatusCode::UNAUTHORIZED {
            return Ok(res);
        }

        debug!("Access token was rejected, refreshing it");

        self.refresh()?;
        self.send_once(&build)
    }

    fn send_once(&self, build: &impl Fn(&Client) -> RequestBuilder) -> Result<Response> {
        let mut req = build(&self.http);

        if let Some(token) = &self.credential.token {
            req = req.bearer_auth(token);
        }

        req.send().context("Failed to send request to the server")
    }

    fn needs_refresh(&self) -> bool {
        self.credential.token.is_none()
            || self
                .expires_at
                .is_some_and(|expires_at| SystemTime::now() >= expires_at)
    }

    fn refresh(&mut self) -> Result<()> {
        let Credential {
            refresh_token,
            client_id,
            client_secret,
            ..
        } = &self.credential;

        let refresh_token = refresh_token
            .as_deref()
            .context("No refresh token available, authorization must be run again")?;

        let TokenResponse {
            access_token,
            expires_in,
            refresh_token: _,
            id_token,
            scope: _,
        } = request_token(
            &self.http,
            self.credential.token_uri(),
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id.as_deref().unwrap_or_default()),
                ("client_secret", client_secret.as_deref().unwrap_or_default()),
            ],
        )
        .context(
            "Failed to refresh the access token (you likely need to delete the token file and authorize again)",
        )?;

        debug!("Access token refreshed");

        self.credential.token = Some(access_token);
        self.expires_at = expires_in.map(expiry_from_now);

        if id_token.is_some() {
            self.credential.id_token = id_token;
        }

        Ok(())
    }
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("Failed to build the HTTP client")
}

fn expiry_from_now(expires_in: u64) -> SystemTime {
    SystemTime::now() + Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN)
}
