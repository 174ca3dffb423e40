//! Parsing of the redirect the music service sends back after authorization.
//!
//! The authorization-code flow puts `code`/`state`/`error` in the query
//! string. The implicit grant puts `access_token`/`token_type`/`expires_in`/
//! `state`/`error` in the fragment.

use std::collections::HashMap;
use std::time::Duration;

use url::{Url, form_urlencoded};

use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitGrant {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Duration,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Code(AuthorizationCode),
    Token(ImplicitGrant),
}

fn params(encoded: &str) -> HashMap<String, String> {
    form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect()
}

fn check_state(got: Option<&String>, expected: Option<&str>) -> Result<(), AuthError> {
    match expected {
        Some(want) if got.map(String::as_str) != Some(want) => Err(AuthError::StateMismatch),
        _ => Ok(()),
    }
}

fn denied(p: &HashMap<String, String>) -> Option<AuthError> {
    let error = p.get("error")?;
    Some(AuthError::Denied(match p.get("error_description") {
        Some(desc) => format!("{error}: {desc}"),
        None => error.clone(),
    }))
}

/// Parse a redirect url. When `expected_state` is given, the callback's
/// `state` must match it exactly.
pub fn parse_callback(raw: &str, expected_state: Option<&str>) -> Result<Callback, AuthError> {
    let url = Url::parse(raw.trim())?;

    let fragment = url.fragment().map(params).unwrap_or_default();
    if fragment.contains_key("access_token") || fragment.contains_key("error") {
        return parse_implicit(&fragment, expected_state).map(Callback::Token);
    }

    let query = params(url.query().unwrap_or_default());
    parse_code(&query, expected_state).map(Callback::Code)
}

fn parse_code(
    p: &HashMap<String, String>,
    expected_state: Option<&str>,
) -> Result<AuthorizationCode, AuthError> {
    if let Some(e) = denied(p) {
        return Err(e);
    }
    check_state(p.get("state"), expected_state)?;

    let code = p
        .get("code")
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingParam("code"))?;

    Ok(AuthorizationCode {
        code: code.clone(),
        state: p.get("state").cloned(),
    })
}

fn parse_implicit(
    p: &HashMap<String, String>,
    expected_state: Option<&str>,
) -> Result<ImplicitGrant, AuthError> {
    if let Some(e) = denied(p) {
        return Err(e);
    }
    check_state(p.get("state"), expected_state)?;

    let access_token = p
        .get("access_token")
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingParam("access_token"))?;
    let token_type = p
        .get("token_type")
        .ok_or(AuthError::MissingParam("token_type"))?;
    let raw_expiry = p
        .get("expires_in")
        .ok_or(AuthError::MissingParam("expires_in"))?;
    let expires_in = raw_expiry
        .trim()
        .parse::<u64>()
        .map_err(|_| AuthError::InvalidExpiry(raw_expiry.clone()))?;

    Ok(ImplicitGrant {
        access_token: access_token.clone(),
        token_type: token_type.clone(),
        expires_in: Duration::from_secs(expires_in),
        state: p.get("state").cloned(),
    })
}
