//! VS-001: Declaration types — parameters, tags, resources, outputs, backend.
//!
//! Everything here describes desired infrastructure. Nothing holds a live
//! handle to a cloud object: cross-declaration links are [`Expression`]s
//! that the provisioning engine resolves at plan time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Expressions
// ============================================================================

/// A value in the handoff document — a literal or an engine-resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Literal string, emitted verbatim
    Literal(String),

    /// `${var.NAME}`
    Variable(String),

    /// `${<resource_type>.<logical_id>.<attribute>}`
    Attribute {
        resource_type: String,
        logical_id: String,
        attribute: String,
    },
}

impl Expression {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Name of the variable this expression reads, if any.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{}", s),
            Self::Variable(name) => write!(f, "${{var.{}}}", name),
            Self::Attribute {
                resource_type,
                logical_id,
                attribute,
            } => write!(f, "${{{}.{}.{}}}", resource_type, logical_id, attribute),
        }
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Engine variable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// A named, typed, defaulted stack input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    pub default: serde_json::Value,

    pub description: String,

    /// `None` leaves the engine default in place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
}

/// Shared resource tags, insertion-ordered.
pub type TagSet = IndexMap<String, String>;

// ============================================================================
// Resources
// ============================================================================

/// Engine resource type for networks.
pub const NETWORK_TYPE: &str = "aws_vpc";

/// Engine resource type for subnets.
pub const SUBNET_TYPE: &str = "aws_subnet";

/// One resource declaration inside a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    pub logical_id: String,
    pub tags: TagSet,
    pub kind: ResourceKind,
}

impl ResourceDeclaration {
    pub fn resource_type(&self) -> &'static str {
        self.kind.resource_type()
    }

    /// Reference to an attribute of this declaration.
    pub fn attribute(&self, attribute: &str) -> Expression {
        Expression::Attribute {
            resource_type: self.resource_type().to_string(),
            logical_id: self.logical_id.clone(),
            attribute: attribute.to_string(),
        }
    }

    pub fn as_network(&self) -> Option<&Network> {
        match &self.kind {
            ResourceKind::Network(n) => Some(n),
            ResourceKind::Subnet(_) => None,
        }
    }

    pub fn as_subnet(&self) -> Option<&Subnet> {
        match &self.kind {
            ResourceKind::Subnet(s) => Some(s),
            ResourceKind::Network(_) => None,
        }
    }
}

/// Resource variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    Network(Network),
    Subnet(Subnet),
}

impl ResourceKind {
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Network(_) => NETWORK_TYPE,
            Self::Subnet(_) => SUBNET_TYPE,
        }
    }
}

/// Virtual network (VPC) fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Network {
    pub cidr_block: Expression,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
}

/// Subnet fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subnet {
    pub availability_zone: Expression,
    pub cidr_block: Expression,

    /// Undeclared means the engine default (`false`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_public_ip_on_launch: Option<bool>,

    /// Logical id of the owning network declaration
    #[serde(skip)]
    pub network_ref: String,

    /// `${aws_vpc.<network_ref>.id}`
    pub vpc_id: Expression,
}

impl Subnet {
    pub fn effective_map_public_ip_on_launch(&self) -> bool {
        self.map_public_ip_on_launch.unwrap_or(false)
    }
}

// ============================================================================
// Outputs, provider, backend
// ============================================================================

/// Exposes one declaration attribute to the stack's consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputBinding {
    #[serde(skip)]
    pub name: String,
    pub value: Expression,
}

/// Cloud provider configuration (one per stack).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub logical_id: String,
    pub region: Expression,
    pub source: String,
    pub version: String,
}

/// Where the engine persists applied state (S3 remote state).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendDescriptor {
    pub bucket: String,
    pub key: String,
    pub region: String,
    pub encrypt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

impl BackendDescriptor {
    pub fn kind(&self) -> &'static str {
        "s3"
    }
}

// ============================================================================
// Tests
// ============================================================================
