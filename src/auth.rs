//! Music-service authorization: building the authorize url, parsing the
//! redirect, exchanging codes and persisting the resulting session.

mod callback;
mod token;

pub use callback::{AuthorizationCode, Callback, ImplicitGrant, parse_callback};
pub use token::{HttpTokenExchange, Session, TokenExchange, TokenRequest, TokenResponse};

use std::time::SystemTime;

use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{info, warn};
use url::Url;

use crate::config::{AuthFlow, MusicServiceSettings};
use crate::error::AuthError;
use crate::store::{KeyValueStore, keys};

const STATE_LEN: usize = 16;

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// Authorization url for `flow`, carrying `state` back through the redirect.
pub fn authorize_url(settings: &MusicServiceSettings, state: &str) -> Result<Url, AuthError> {
    if settings.client_id.trim().is_empty() {
        return Err(AuthError::NotConfigured("client_id"));
    }
    let response_type = match settings.flow {
        AuthFlow::Code => "code",
        AuthFlow::Implicit => "token",
    };
    let scope = settings.scopes.join(" ");

    let mut params = vec![
        ("client_id", settings.client_id.as_str()),
        ("response_type", response_type),
        ("redirect_uri", settings.redirect_uri.as_str()),
        ("state", state),
    ];
    if !scope.is_empty() {
        params.push(("scope", scope.as_str()));
    }

    Ok(Url::parse_with_params(&settings.authorize_endpoint, &params)?)
}

/// Start a flow: remember a fresh `state` and return the url to open.
pub fn begin<S: KeyValueStore + ?Sized>(
    settings: &MusicServiceSettings,
    store: &mut S,
) -> Result<Url, AuthError> {
    let state = generate_state();
    let url = authorize_url(settings, &state)?;
    store.set(keys::AUTH_STATE, &state)?;
    Ok(url)
}

/// Finish a flow from the redirect url, store the session and forget the
/// pending state.
pub fn complete<S, E>(
    callback_url: &str,
    settings: &MusicServiceSettings,
    store: &mut S,
    exchange: &E,
    now: SystemTime,
) -> Result<Session, AuthError>
where
    S: KeyValueStore + ?Sized,
    E: TokenExchange + ?Sized,
{
    let expected = store.get(keys::AUTH_STATE)?;
    if expected.is_none() {
        warn!("no pending authorization request; accepting callback without state check");
    }

    let session = match parse_callback(callback_url, expected.as_deref())? {
        Callback::Code(code) => {
            let request = TokenRequest {
                code: code.code,
                redirect_uri: settings.redirect_uri.clone(),
                client_id: settings.client_id.clone(),
                client_secret: Some(settings.client_secret.clone()).filter(|s| !s.is_empty()),
            };
            Session::from_token_response(exchange.exchange(&request)?, now)
        }
        Callback::Token(grant) => Session::from_implicit(grant, now),
    };

    session.save(store)?;
    store.remove(&[keys::AUTH_STATE])?;
    info!(expires_at = session.expires_at, "music service session stored");
    Ok(session)
}

/// Forget the session and any pending request.
pub fn logout<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), AuthError> {
    store.remove(&[keys::SESSION, keys::AUTH_STATE])?;
    Ok(())
}
