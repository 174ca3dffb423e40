use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;
use crate::store::{self, KeyValueStore, keys};

use super::callback::ImplicitGrant;

/// Tokens are treated as expired this long before the service says so.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// Body of the authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub code: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl TokenRequest {
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("grant_type", "authorization_code"),
            ("code", self.code.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Swaps an authorization code for tokens.
pub trait TokenExchange {
    fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, AuthError>;
}

pub struct HttpTokenExchange {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTokenExchange {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl TokenExchange for HttpTokenExchange {
    fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, AuthError> {
        let mut req = self.client.post(&self.endpoint).form(&request.form());
        if let Some(secret) = request.client_secret.as_deref() {
            req = req.basic_auth(&request.client_id, Some(secret));
        }

        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }
        let token = resp.json::<TokenResponse>()?;
        debug!(token_type = %token.token_type, expires_in = token.expires_in, "token exchanged");
        Ok(token)
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

/// Credentials kept between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Unix seconds.
    pub expires_at: u64,
}

impl Session {
    pub fn from_token_response(resp: TokenResponse, now: SystemTime) -> Self {
        Self {
            access_token: resp.access_token,
            token_type: resp.token_type,
            refresh_token: resp.refresh_token,
            scope: resp.scope,
            expires_at: unix_secs(now).saturating_add(resp.expires_in),
        }
    }

    pub fn from_implicit(grant: ImplicitGrant, now: SystemTime) -> Self {
        Self {
            access_token: grant.access_token,
            token_type: grant.token_type,
            refresh_token: None,
            scope: None,
            expires_at: unix_secs(now).saturating_add(grant.expires_in.as_secs()),
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        unix_secs(now).saturating_add(EXPIRY_LEEWAY.as_secs()) >= self.expires_at
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Self>, AuthError> {
        Ok(store::get_json(store, keys::SESSION)?)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), AuthError> {
        Ok(store::set_json(store, keys::SESSION, self)?)
    }
}
