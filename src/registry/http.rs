//! Default HTTP-backed [`RegistryCapability`]: `GetManifest`/`GetConfigBlob` (plus
//! tag listing) over `reqwest`, with the Accept-header and bearer-retry
//! conventions the registry client this crate is modeled on uses. `CopyCapability`
//! has no implementation here — the byte-level layer copy stays external.

use crate::error::{ReplicatorError, Result};
use crate::logging::Logger;
use crate::registry::auth::{exchange_for_bearer_token, Credentials};
use crate::registry::{FetchedManifest, RegistryCapability, RemoteOptions, Repository};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use tokio::sync::RwLock;

const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

#[derive(Debug)]
struct HttpRepository {
    name: String,
    credentials: Credentials,
    insecure: bool,
}

#[async_trait]
impl Repository for HttpRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn remote_options(&self) -> Result<RemoteOptions> {
        Ok(RemoteOptions {
            username: self.credentials.username.clone(),
            password: self.credentials.password.clone(),
            bearer_token: self.credentials.bearer_token.clone(),
            insecure: self.insecure,
        })
    }
}

/// An HTTP client bound to one registry's base URL, with a lazily-obtained bearer
/// token cached across calls.
pub struct HttpRegistry {
    client: Client,
    registry_url: String,
    credentials: Credentials,
    cached_token: RwLock<Option<String>>,
    logger: Logger,
}

impl fmt::Debug for HttpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRegistry").field("registry_url", &self.registry_url).finish()
    }
}

impl HttpRegistry {
    pub fn new(registry_url: impl Into<String>, credentials: Credentials, insecure: bool) -> Result<Self> {
        let client = if insecure {
            Client::builder().danger_accept_invalid_certs(true).build()
        } else {
            Client::builder().build()
        }
        .map_err(|e| ReplicatorError::Registry(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            registry_url: registry_url.into(),
            credentials,
            cached_token: RwLock::new(None),
            logger: Logger::new(false),
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    async fn token(&self) -> Option<String> {
        if let Some(bearer) = &self.credentials.bearer_token {
            return Some(bearer.clone());
        }
        self.cached_token.read().await.clone()
    }

    async fn refresh_token_from_challenge(&self, challenge: &str, repository: &str) -> Result<String> {
        let token = exchange_for_bearer_token(
            &self.client,
            challenge,
            repository,
            self.credentials.username.as_deref(),
            self.credentials.password.as_deref(),
        )
        .await?;
        *self.cached_token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn authed_get(&self, url: &str, accept: Option<&str>, repository: &str) -> Result<reqwest::Response> {
        let send = |token: Option<String>| {
            let mut req = self.client.get(url);
            if let Some(accept) = accept {
                req = req.header("Accept", accept);
            }
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }
            req
        };

        let token = self.token().await;
        let response = send(token).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            if let Some(challenge) = response
                .headers()
                .get("www-authenticate")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
            {
                self.logger.detail("received 401, refreshing bearer token");
                let token = self.refresh_token_from_challenge(&challenge, repository).await?;
                return Ok(send(Some(token)).send().await?);
            }
        }

        Ok(response)
    }
}

#[async_trait]
impl RegistryCapability for HttpRegistry {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let url = format!("{}/v2/{}/tags/list", self.registry_url, repository);
        let response = self.authed_get(&url, None, repository).await?;
        if !response.status().is_success() {
            return Err(ReplicatorError::Registry(format!(
                "tag listing for {} failed: HTTP {}",
                repository,
                response.status()
            )));
        }
        #[derive(serde::Deserialize)]
        struct TagsList {
            tags: Vec<String>,
        }
        let parsed: TagsList = response.json().await?;
        Ok(parsed.tags)
    }

    async fn get_manifest(&self, repository: &str, reference: &str) -> Result<FetchedManifest> {
        let url = format!("{}/v2/{}/manifests/{}", self.registry_url, repository, reference);
        let response = self.authed_get(&url, Some(MANIFEST_ACCEPT), repository).await?;

        if !response.status().is_success() {
            return Err(ReplicatorError::ManifestFetch {
                repository: repository.to_string(),
                reference: reference.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let media_type = response
            .headers()
            .get("Content-Type")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedManifest { bytes, media_type })
    }

    async fn get_config_blob(&self, repository: &str, digest: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v2/{}/blobs/{}", self.registry_url, repository, digest);
        let response = self.authed_get(&url, None, repository).await?;

        if !response.status().is_success() {
            return Err(ReplicatorError::ManifestFetch {
                repository: repository.to_string(),
                reference: digest.to_string(),
                message: format!("config blob fetch HTTP {}", response.status()),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn get_repository(&self, name: &str) -> Result<Box<dyn Repository>> {
        Ok(Box::new(HttpRepository {
            name: name.to_string(),
            credentials: self.credentials.clone(),
            insecure: false,
        }))
    }

    fn registry_url(&self) -> &str {
        &self.registry_url
    }
}
