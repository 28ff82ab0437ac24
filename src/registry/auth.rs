//! Bearer challenge parsing and token exchange for registry HTTP access.
//!
//! Ported from the WWW-Authenticate parsing style used throughout the registry
//! client this crate's registry layer is modeled on, generalized to the
//! `RegistryConfig` auth fields (`spec.md` §6: basic username/password or a
//! pre-supplied bearer token).

use crate::error::{ReplicatorError, Result};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AuthChallenge {
    realm: String,
    service: String,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Credentials configured for one registry side (source or destination).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
}

/// Parse a `WWW-Authenticate: Bearer realm="...",service="...",scope="..."` header.
fn parse_bearer_challenge(header: &str) -> Result<AuthChallenge> {
    let params = header.strip_prefix("Bearer ").ok_or_else(|| {
        ReplicatorError::Registry("WWW-Authenticate header is not a Bearer challenge".to_string())
    })?;

    let mut realm = String::new();
    let mut service = String::new();
    let mut scope = None;

    for param in params.split(',') {
        let param = param.trim();
        if let Some(eq_pos) = param.find('=') {
            let key = param[..eq_pos].trim();
            let value = param[eq_pos + 1..].trim().trim_matches('"');
            match key {
                "realm" => realm = value.to_string(),
                "service" => service = value.to_string(),
                "scope" => scope = Some(value.to_string()),
                _ => {}
            }
        }
    }

    if realm.is_empty() || service.is_empty() {
        return Err(ReplicatorError::Registry(
            "Bearer challenge missing realm or service".to_string(),
        ));
    }

    Ok(AuthChallenge { realm, service, scope })
}

/// Exchange basic credentials for a bearer token against the challenge's realm,
/// scoped to `repository` with pull access (this crate never pushes manifests
/// itself — that's the external copy capability's job).
pub async fn exchange_for_bearer_token(
    client: &Client,
    www_authenticate: &str,
    repository: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<String> {
    let challenge = parse_bearer_challenge(www_authenticate)?;
    let scope = format!("repository:{}:pull", repository);
    let mut token_url = format!(
        "{}?service={}&scope={}",
        challenge.realm, challenge.service, scope
    );
    if let Some(extra_scope) = &challenge.scope {
        if extra_scope != &scope {
            token_url.push_str(&format!("&scope={}", extra_scope));
        }
    }

    let mut request = client.get(&token_url);
    if let (Some(user), Some(pass)) = (username, password) {
        request = request.basic_auth(user, Some(pass));
    }

    let response = request
        .send()
        .await
        .map_err(|e| ReplicatorError::Registry(format!("token request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(ReplicatorError::Registry(format!(
            "token request returned HTTP {}",
            response.status()
        )));
    }

    let parsed: TokenResponse = response
        .json()
        .await
        .map_err(|e| ReplicatorError::Registry(format!("failed to parse token response: {}", e)))?;

    parsed
        .token
        .or(parsed.access_token)
        .ok_or_else(|| ReplicatorError::Registry("token response carried no token".to_string()))
}
