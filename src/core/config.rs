//! VS-005: Stack configuration — defaults, YAML file, environment overrides.
//!
//! Layering, last wins:
//! 1. Built-in defaults (the values the stack has always shipped with)
//! 2. `vpcsynth.yaml`, if given
//! 3. `AWS_REGION`, `VPC_CIDR`, `PUBLIC_CIDR`, `PRIVATE_CIDR`, `VPC_AZ` from the environment
//!
//! Values here become parameter *defaults* in the synthesized document; the
//! engine may still override them at apply time. CIDR and AZ syntax are not
//! checked here. Unknown keys are a parse error.

use super::error::{Result, SynthError};
use super::stack::validate_identifier;
use super::types::BackendDescriptor;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_VPC_CIDR: &str = "VPC_CIDR";
pub const ENV_PUBLIC_CIDR: &str = "PUBLIC_CIDR";
pub const ENV_PRIVATE_CIDR: &str = "PRIVATE_CIDR";
pub const ENV_VPC_AZ: &str = "VPC_AZ";

/// Root configuration for one synthesized stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Schema version (must be "1.0")
    #[serde(default = "default_version")]
    pub version: String,

    /// Stack name; also the directory under `stacks/`
    #[serde(default = "default_stack")]
    pub stack: String,

    /// Parameter defaults
    #[serde(default)]
    pub params: StackParams,

    /// Tags applied to every resource
    #[serde(default = "default_tags")]
    pub tags: IndexMap<String, String>,

    /// Provider requirements
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Remote state; `null` synthesizes without a backend
    #[serde(default = "default_backend")]
    pub backend: Option<BackendSettings>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            stack: default_stack(),
            params: StackParams::default(),
            tags: default_tags(),
            provider: ProviderSettings::default(),
            backend: default_backend(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_stack() -> String {
    "VPC".to_string()
}

fn default_tags() -> IndexMap<String, String> {
    IndexMap::from([
        ("Project".to_string(), "cdktf".to_string()),
        ("Environment".to_string(), "dev".to_string()),
        ("Name".to_string(), "cdktf-resources".to_string()),
    ])
}

fn default_backend() -> Option<BackendSettings> {
    Some(BackendSettings::default())
}

/// The five stack parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StackParams {
    #[serde(rename = "AWS_REGION", default = "default_region")]
    pub aws_region: String,

    #[serde(rename = "VPC_CIDR", default = "default_vpc_cidr")]
    pub vpc_cidr: String,

    #[serde(rename = "PUBLIC_CIDR", default = "default_public_cidr")]
    pub public_cidr: String,

    #[serde(rename = "PRIVATE_CIDR", default = "default_private_cidr")]
    pub private_cidr: String,

    #[serde(rename = "VPC_AZ", default = "default_az")]
    pub vpc_az: String,
}

impl Default for StackParams {
    fn default() -> Self {
        Self {
            aws_region: default_region(),
            vpc_cidr: default_vpc_cidr(),
            public_cidr: default_public_cidr(),
            private_cidr: default_private_cidr(),
            vpc_az: default_az(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_vpc_cidr() -> String {
    "10.0.0.0/16".to_string()
}

fn default_public_cidr() -> String {
    "10.0.1.0/24".to_string()
}

fn default_private_cidr() -> String {
    "10.0.2.0/24".to_string()
}

fn default_az() -> String {
    "us-east-1a".to_string()
}

impl StackParams {
    /// (name, value) pairs in declaration order.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            (ENV_AWS_REGION, self.aws_region.as_str()),
            (ENV_VPC_CIDR, self.vpc_cidr.as_str()),
            (ENV_PUBLIC_CIDR, self.public_cidr.as_str()),
            (ENV_PRIVATE_CIDR, self.private_cidr.as_str()),
            (ENV_VPC_AZ, self.vpc_az.as_str()),
        ]
    }

    fn slot(&mut self, name: &str) -> Option<&mut String> {
        match name {
            ENV_AWS_REGION => Some(&mut self.aws_region),
            ENV_VPC_CIDR => Some(&mut self.vpc_cidr),
            ENV_PUBLIC_CIDR => Some(&mut self.public_cidr),
            ENV_PRIVATE_CIDR => Some(&mut self.private_cidr),
            ENV_VPC_AZ => Some(&mut self.vpc_az),
            _ => None,
        }
    }
}

/// Provider source and version constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_source")]
    pub source: String,

    #[serde(default = "default_provider_version")]
    pub version: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            source: default_provider_source(),
            version: default_provider_version(),
        }
    }
}

fn default_provider_source() -> String {
    "aws".to_string()
}

fn default_provider_version() -> String {
    "~> 4.0".to_string()
}

/// S3 remote-state settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BackendSettings {
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_state_key")]
    pub key: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_true")]
    pub encrypt: bool,

    #[serde(default = "default_kms_key")]
    pub kms_key_id: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            key: default_state_key(),
            region: default_region(),
            encrypt: true,
            kms_key_id: default_kms_key(),
        }
    }
}

impl BackendSettings {
    pub fn to_descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            region: self.region.clone(),
            encrypt: self.encrypt,
            kms_key_id: self.kms_key_id.clone(),
        }
    }
}

fn default_bucket() -> String {
    "s3-remote-state-20221018154517921000000001".to_string()
}

fn default_state_key() -> String {
    "cdktf-state/terraform.tfstate".to_string()
}

fn default_true() -> bool {
    true
}

fn default_kms_key() -> Option<String> {
    Some("alias/terraform-bucket-key".to_string())
}

impl StackConfig {
    /// Apply environment overrides; returns the names that were applied.
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();
        for name in [
            ENV_AWS_REGION,
            ENV_VPC_CIDR,
            ENV_PUBLIC_CIDR,
            ENV_PRIVATE_CIDR,
            ENV_VPC_AZ,
        ] {
            let Some(value) = lookup(name) else {
                continue;
            };
            if let Some(slot) = self.params.slot(name) {
                debug!(variable = name, value = %value, "environment override");
                *slot = value;
                applied.push(name);
            }
        }
        applied
    }

    /// Render as YAML with a short header, for `vpcsynth init`.
    pub fn to_template(&self) -> Result<String> {
        let body = serde_yaml_ng::to_string(self)?;
        Ok(format!(
            "# vpcsynth stack configuration\n\
             # Environment variables AWS_REGION, VPC_CIDR, PUBLIC_CIDR, PRIVATE_CIDR\n\
             # and VPC_AZ override the params below.\n{}",
            body
        ))
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a config file from disk.
pub fn parse_config_file(path: &Path) -> Result<StackConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
    parse_config(&content)
}

/// Parse a config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<StackConfig> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Defaults, then the file (if any), then the process environment.
pub fn load_config(path: Option<&Path>) -> Result<StackConfig> {
    let mut config = match path {
        Some(p) => parse_config_file(p)?,
        None => StackConfig::default(),
    };
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

/// Validate a config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &StackConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", config.version),
        });
    }

    if config.stack.is_empty() {
        errors.push(ValidationError {
            message: "stack name must not be empty".to_string(),
        });
    } else if let Err(e) = validate_identifier(&config.stack) {
        errors.push(ValidationError {
            message: format!("stack name: {}", e),
        });
    }

    for (name, value) in config.params.entries() {
        if value.trim().is_empty() {
            errors.push(ValidationError {
                message: format!("param {} must not be empty", name),
            });
        }
    }

    for key in config.tags.keys() {
        if key.trim().is_empty() {
            errors.push(ValidationError {
                message: "tag keys must not be empty".to_string(),
            });
        }
    }

    if config.provider.source.is_empty() {
        errors.push(ValidationError {
            message: "provider source must not be empty".to_string(),
        });
    }

    if let Some(backend) = &config.backend {
        for (field, value) in [
            ("bucket", &backend.bucket),
            ("key", &backend.key),
            ("region", &backend.region),
        ] {
            if value.is_empty() {
                errors.push(ValidationError {
                    message: format!("backend {} must not be empty", field),
                });
            }
        }
    }

    errors
}
