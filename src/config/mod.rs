//! Replication specification: the YAML schema consumed from disk, its validation
//! rules, and registry-type auto-detection.

use crate::error::{ReplicatorError, Result};
use regex::Regex;
use semver::VersionReq;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryType {
    Docker,
    Ecr,
    Gcr,
    Acr,
    Ghcr,
    Quay,
    Generic,
}

/// Detect a registry's type from its host, following the fixed precedence order:
/// docker.io, then gcr, then ghcr, then ecr, then acr, then quay, then generic.
pub fn detect_registry_type(registry: &str) -> RegistryType {
    let host = registry
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or(registry);

    if host == "docker.io" || host == "registry-1.docker.io" {
        return RegistryType::Docker;
    }
    if host == "gcr.io" {
        return RegistryType::Gcr;
    }
    if let Some(sub) = host.strip_suffix(".gcr.io") {
        if matches!(sub, "us" | "eu" | "asia") {
            return RegistryType::Gcr;
        }
    }
    if host == "ghcr.io" {
        return RegistryType::Ghcr;
    }
    if host.contains(".dkr.ecr.") || host.starts_with("public.ecr.aws") {
        return RegistryType::Ecr;
    }
    if host.ends_with(".azurecr.io") {
        return RegistryType::Acr;
    }
    if host == "quay.io" || host.ends_with(".quay.io") {
        return RegistryType::Quay;
    }
    RegistryType::Generic
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    pub docker_config: Option<bool>,
    pub aws_profile: Option<String>,
    pub gcp_credentials_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub registry: String,
    #[serde(rename = "type")]
    pub registry_type: Option<RegistryType>,
    pub region: Option<String>,
    pub project: Option<String>,
    pub account: Option<String>,
    #[serde(default)]
    pub insecure: bool,
    pub auth: Option<AuthConfig>,
}

impl RegistryConfig {
    pub fn resolved_type(&self) -> RegistryType {
        self.registry_type.unwrap_or_else(|| detect_registry_type(&self.registry))
    }

    fn validate(&self, which: &str) -> Result<()> {
        if self.registry.trim().is_empty() {
            return Err(ReplicatorError::ConfigInvalid(format!("{which}.registry must not be empty")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignVerification {
    pub keyless: Option<bool>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSync {
    pub repository: String,
    pub tags: Option<Vec<String>>,
    pub tag_regex: Option<String>,
    pub semver_constraint: Option<String>,
    pub all_tags: Option<bool>,
    pub latest_n: Option<usize>,
    pub destination_repository: Option<String>,
    pub destination_prefix: Option<String>,
    pub destination_suffix: Option<String>,
    pub limit: Option<usize>,
    pub architectures: Option<Vec<String>>,
    pub sign_verification: Option<SignVerification>,
    #[serde(default)]
    pub skip_layers: bool,
}

impl ImageSync {
    /// Build the single selection criterion named by this entry. Validation
    /// elsewhere guarantees exactly one of the five fields is set.
    pub fn criterion(&self) -> Result<crate::filter::Criterion> {
        use crate::filter::Criterion;

        if let Some(tags) = &self.tags {
            return Ok(Criterion::explicit(tags.iter().cloned()));
        }
        if let Some(pattern) = &self.tag_regex {
            return Ok(Criterion::regex(pattern)?);
        }
        if let Some(constraint) = &self.semver_constraint {
            return Ok(Criterion::semver_constraint(constraint)?);
        }
        if self.all_tags.unwrap_or(false) {
            return Ok(Criterion::AllTags);
        }
        if let Some(n) = self.latest_n {
            return Ok(Criterion::LatestN(n));
        }
        Err(ReplicatorError::ConfigInvalid(format!(
            "image {} has no selection criterion",
            self.repository
        )))
    }

    fn criteria_count(&self) -> usize {
        [
            self.tags.is_some(),
            self.tag_regex.is_some(),
            self.semver_constraint.is_some(),
            self.all_tags.unwrap_or(false),
            self.latest_n.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    fn validate(&self) -> Result<()> {
        if self.repository.trim().is_empty() {
            return Err(ReplicatorError::ConfigInvalid("image repository must not be empty".to_string()));
        }
        match self.criteria_count() {
            1 => {}
            0 => {
                return Err(ReplicatorError::ConfigInvalid(format!(
                    "image {} must specify exactly one selection criterion",
                    self.repository
                )))
            }
            _ => {
                return Err(ReplicatorError::ConfigInvalid(format!(
                    "image {} specifies more than one selection criterion",
                    self.repository
                )))
            }
        }
        if let Some(pattern) = &self.tag_regex {
            Regex::new(pattern).map_err(|e| {
                ReplicatorError::ConfigInvalid(format!("invalid tagRegex for {}: {e}", self.repository))
            })?;
        }
        if let Some(constraint) = &self.semver_constraint {
            VersionReq::parse(constraint).map_err(|e| {
                ReplicatorError::ConfigInvalid(format!("invalid semverConstraint for {}: {e}", self.repository))
            })?;
        }
        Ok(())
    }
}

fn default_parallel() -> usize {
    3
}
fn default_batch_size() -> usize {
    10
}
fn default_min_batch_size() -> usize {
    1
}
fn default_max_batch_size() -> usize {
    50
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_backoff_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSpec {
    pub source: RegistryConfig,
    pub destination: RegistryConfig,
    pub images: Vec<ImageSync>,
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub enable_adaptive_batching: bool,
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff: u64,
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default)]
    pub skip_existing: bool,
    #[serde(default)]
    pub enable_deduplication: bool,
    #[serde(default)]
    pub enable_http3: bool,
}

impl ReplicationSpec {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let spec: ReplicationSpec = serde_yaml::from_str(&text)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load_from_str(text: &str) -> Result<Self> {
        let spec: ReplicationSpec = serde_yaml::from_str(text)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        self.source.validate("source")?;
        self.destination.validate("destination")?;
        if self.images.is_empty() {
            return Err(ReplicatorError::ConfigInvalid("images must not be empty".to_string()));
        }
        for image in &self.images {
            image.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_docker_hub() {
        assert_eq!(detect_registry_type("docker.io"), RegistryType::Docker);
        assert_eq!(detect_registry_type("registry-1.docker.io"), RegistryType::Docker);
    }

    #[test]
    fn detects_gcr_subdomains() {
        assert_eq!(detect_registry_type("gcr.io"), RegistryType::Gcr);
        assert_eq!(detect_registry_type("us.gcr.io"), RegistryType::Gcr);
        assert_eq!(detect_registry_type("eu.gcr.io"), RegistryType::Gcr);
    }

    #[test]
    fn detects_ecr_by_substring_or_prefix() {
        assert_eq!(
            detect_registry_type("123456789012.dkr.ecr.us-east-1.amazonaws.com"),
            RegistryType::Ecr
        );
        assert_eq!(detect_registry_type("public.ecr.aws/foo"), RegistryType::Ecr);
    }

    #[test]
    fn detects_acr_ghcr_and_quay() {
        assert_eq!(detect_registry_type("myorg.azurecr.io"), RegistryType::Acr);
        assert_eq!(detect_registry_type("ghcr.io"), RegistryType::Ghcr);
        assert_eq!(detect_registry_type("quay.io"), RegistryType::Quay);
        assert_eq!(detect_registry_type("mirror.quay.io"), RegistryType::Quay);
    }

    #[test]
    fn unrecognized_host_is_generic() {
        assert_eq!(detect_registry_type("registry.example.com"), RegistryType::Generic);
    }

    #[test]
    fn rejects_image_with_zero_or_multiple_criteria() {
        let none = ImageSync { repository: "r".to_string(), ..Default::default() };
        assert!(none.validate().is_err());

        let both = ImageSync {
            repository: "r".to_string(),
            tags: Some(vec!["latest".to_string()]),
            all_tags: Some(true),
            ..Default::default()
        };
        assert!(both.validate().is_err());
    }

    #[test]
    fn rejects_empty_image_list() {
        let spec = ReplicationSpec {
            source: RegistryConfig {
                registry: "docker.io".to_string(),
                registry_type: None,
                region: None,
                project: None,
                account: None,
                insecure: false,
                auth: None,
            },
            destination: RegistryConfig {
                registry: "ghcr.io".to_string(),
                registry_type: None,
                region: None,
                project: None,
                account: None,
                insecure: false,
                auth: None,
            },
            images: vec![],
            parallel: 3,
            batch_size: 10,
            enable_adaptive_batching: false,
            min_batch_size: 1,
            max_batch_size: 50,
            timeout: 300,
            retry_attempts: 3,
            retry_backoff: 5,
            continue_on_error: false,
            skip_existing: false,
            enable_deduplication: false,
            enable_http3: false,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn parses_minimal_yaml_spec_with_defaults() {
        let yaml = r#"
source:
  registry: docker.io
destination:
  registry: ghcr.io/myorg
images:
  - repository: library/nginx
    allTags: true
"#;
        let spec = ReplicationSpec::load_from_str(yaml).unwrap();
        assert_eq!(spec.parallel, 3);
        assert_eq!(spec.batch_size, 10);
        assert_eq!(spec.min_batch_size, 1);
        assert_eq!(spec.max_batch_size, 50);
        assert_eq!(spec.timeout, 300);
        assert_eq!(spec.retry_attempts, 3);
        assert_eq!(spec.retry_backoff, 5);
        assert_eq!(spec.source.resolved_type(), RegistryType::Docker);
    }
}
