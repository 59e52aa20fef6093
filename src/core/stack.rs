//! VS-003: Stack — the aggregate that owns parameters, declarations,
//! outputs, provider and backend.
//!
//! Handles returned by the stack carry the stack's identity. Passing a
//! handle minted by one stack to another is a [`ConfigurationError`].

use super::error::{ConfigurationError, Result};
use super::types::*;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_STACK_ID: AtomicU64 = AtomicU64::new(1);

/// Check a name against the engine's identifier rules: `[A-Za-z_][A-Za-z0-9_-]*`.
pub fn validate_identifier(name: &str) -> std::result::Result<(), ConfigurationError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidIdentifier(name.to_string()))
    }
}

/// Process-unique stack identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackId(u64);

/// Reference to a parameter defined in a specific stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterHandle {
    stack: StackId,
    name: String,
}

impl ParameterHandle {
    pub fn stack_id(&self) -> StackId {
        self.stack
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine reference to the parameter — never the literal default.
    pub fn value(&self) -> Expression {
        Expression::Variable(self.name.clone())
    }
}

/// Reference to a network declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    stack: StackId,
    logical_id: String,
}

impl NetworkHandle {
    pub fn stack_id(&self) -> StackId {
        self.stack
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn id(&self) -> Expression {
        self.attribute("id")
    }

    pub fn arn(&self) -> Expression {
        self.attribute("arn")
    }

    pub fn cidr_block(&self) -> Expression {
        self.attribute("cidr_block")
    }

    fn attribute(&self, attribute: &str) -> Expression {
        Expression::Attribute {
            resource_type: NETWORK_TYPE.to_string(),
            logical_id: self.logical_id.clone(),
            attribute: attribute.to_string(),
        }
    }
}

/// Reference to a subnet declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetHandle {
    stack: StackId,
    logical_id: String,
}

impl SubnetHandle {
    pub fn stack_id(&self) -> StackId {
        self.stack
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn id(&self) -> Expression {
        Expression::Attribute {
            resource_type: SUBNET_TYPE.to_string(),
            logical_id: self.logical_id.clone(),
            attribute: "id".to_string(),
        }
    }
}

/// A named unit of declared infrastructure.
#[derive(Debug)]
pub struct Stack {
    id: StackId,
    name: String,
    tags: TagSet,
    parameters: IndexMap<String, Parameter>,
    resources: Vec<ResourceDeclaration>,
    outputs: IndexMap<String, OutputBinding>,
    provider: Option<ProviderConfig>,
    backend: Option<BackendDescriptor>,
    logical_ids: FxHashSet<String>,
}

impl Stack {
    /// Create an empty stack. The name must be a valid identifier.
    pub fn new(name: &str) -> Result<Self> {
        validate_identifier(name)?;
        let id = StackId(NEXT_STACK_ID.fetch_add(1, Ordering::Relaxed));
        debug!(stack = name, "stack created");
        Ok(Self {
            id,
            name: name.to_string(),
            tags: TagSet::new(),
            parameters: IndexMap::new(),
            resources: Vec::new(),
            outputs: IndexMap::new(),
            provider: None,
            backend: None,
            logical_ids: FxHashSet::default(),
        })
    }

    pub fn id(&self) -> StackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: TagSet) {
        self.tags = tags;
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn resources(&self) -> &[ResourceDeclaration] {
        &self.resources
    }

    pub fn resource(&self, logical_id: &str) -> Option<&ResourceDeclaration> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &OutputBinding> {
        self.outputs.values()
    }

    pub fn output(&self, name: &str) -> Option<&OutputBinding> {
        self.outputs.get(name)
    }

    pub fn provider(&self) -> Option<&ProviderConfig> {
        self.provider.as_ref()
    }

    pub fn backend(&self) -> Option<&BackendDescriptor> {
        self.backend.as_ref()
    }

    // ------------------------------------------------------------------------
    // Parameter set
    // ------------------------------------------------------------------------

    /// Register a parameter. Names are unique per stack.
    pub fn define_parameter(
        &mut self,
        name: &str,
        param_type: ParamType,
        default: serde_json::Value,
        description: &str,
        sensitive: Option<bool>,
        nullable: Option<bool>,
    ) -> Result<ParameterHandle> {
        validate_identifier(name)?;
        if self.parameters.contains_key(name) {
            return Err(ConfigurationError::DuplicateParameter(name.to_string()).into());
        }
        self.parameters.insert(
            name.to_string(),
            Parameter {
                name: name.to_string(),
                param_type,
                default,
                description: description.to_string(),
                nullable,
                sensitive,
            },
        );
        debug!(stack = %self.name, parameter = name, "parameter defined");
        Ok(ParameterHandle {
            stack: self.id,
            name: name.to_string(),
        })
    }

    /// Resolve a handle to a parameter of this stack with the expected type.
    pub fn require_parameter(
        &self,
        handle: &ParameterHandle,
        expected: ParamType,
    ) -> Result<&Parameter> {
        if handle.stack != self.id {
            return Err(self.foreign("parameter", &handle.name).into());
        }
        let param = self
            .parameters
            .get(&handle.name)
            .ok_or_else(|| self.foreign("parameter", &handle.name))?;
        if param.param_type != expected {
            return Err(ConfigurationError::ParameterType {
                name: handle.name.clone(),
                expected: expected.to_string(),
                actual: param.param_type.to_string(),
            }
            .into());
        }
        Ok(param)
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    /// Resolve a network handle to its declaration in this stack.
    pub fn require_network(&self, handle: &NetworkHandle) -> Result<&ResourceDeclaration> {
        if handle.stack != self.id {
            return Err(self.foreign("network", &handle.logical_id).into());
        }
        self.resource(&handle.logical_id)
            .filter(|r| r.as_network().is_some())
            .ok_or_else(|| self.foreign("network", &handle.logical_id).into())
    }

    pub(crate) fn push_network(&mut self, decl: ResourceDeclaration) -> Result<NetworkHandle> {
        let logical_id = self.push_resource(decl)?;
        Ok(NetworkHandle {
            stack: self.id,
            logical_id,
        })
    }

    pub(crate) fn push_subnet(&mut self, decl: ResourceDeclaration) -> Result<SubnetHandle> {
        let logical_id = self.push_resource(decl)?;
        Ok(SubnetHandle {
            stack: self.id,
            logical_id,
        })
    }

    fn push_resource(&mut self, decl: ResourceDeclaration) -> Result<String> {
        validate_identifier(&decl.logical_id)?;
        if !self.logical_ids.insert(decl.logical_id.clone()) {
            return Err(ConfigurationError::DuplicateLogicalId(decl.logical_id).into());
        }
        debug!(
            stack = %self.name,
            resource = %decl.logical_id,
            resource_type = decl.resource_type(),
            "resource declared"
        );
        let logical_id = decl.logical_id.clone();
        self.resources.push(decl);
        Ok(logical_id)
    }

    // ------------------------------------------------------------------------
    // Provider, outputs, backend
    // ------------------------------------------------------------------------

    /// Attach the provider configuration. At most one per stack.
    pub fn set_provider(&mut self, provider: ProviderConfig) -> Result<()> {
        if self.provider.is_some() {
            return Err(ConfigurationError::DuplicateProvider(self.name.clone()).into());
        }
        validate_identifier(&provider.logical_id)?;
        self.provider = Some(provider);
        Ok(())
    }

    /// Expose a declaration attribute under a unique output name.
    pub fn add_output(&mut self, name: &str, value: Expression) -> Result<()> {
        validate_identifier(name)?;
        if self.outputs.contains_key(name) {
            return Err(ConfigurationError::DuplicateOutput(name.to_string()).into());
        }
        debug!(stack = %self.name, output = name, value = %value, "output registered");
        self.outputs.insert(
            name.to_string(),
            OutputBinding {
                name: name.to_string(),
                value,
            },
        );
        Ok(())
    }

    /// Attach the remote-state backend. At most one per stack.
    pub fn register_backend(&mut self, backend: BackendDescriptor) -> Result<()> {
        if self.backend.is_some() {
            return Err(ConfigurationError::DuplicateBackend(self.name.clone()).into());
        }
        debug!(stack = %self.name, bucket = %backend.bucket, key = %backend.key, "backend registered");
        self.backend = Some(backend);
        Ok(())
    }

    fn foreign(&self, kind: &'static str, name: &str) -> ConfigurationError {
        ConfigurationError::ForeignHandle {
            kind,
            name: name.to_string(),
            stack: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SynthError;
    use serde_json::json;

    fn string_param(stack: &mut Stack, name: &str) -> Result<ParameterHandle> {
        stack.define_parameter(name, ParamType::String, json!("x"), "test", None, None)
    }

    fn backend() -> BackendDescriptor {
        BackendDescriptor {
            bucket: "bucket".into(),
            key: "cdktf-state/terraform.tfstate".into(),
            region: "us-east-1".into(),
            encrypt: true,
            kms_key_id: Some("alias/key".into()),
        }
    }

    #[test]
    fn test_vs003_identifier_rules() {
        assert!(validate_identifier("AWS_REGION").is_ok());
        assert!(validate_identifier("private_subnet").is_ok());
        assert!(validate_identifier("my-stack").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("x").is_ok());
        assert!(validate_identifier("-lead").is_err());
        assert!(validate_identifier("a.b").is_err());
        assert!(validate_identifier("café").is_err());
    }

    #[test]
    fn test_vs003_stack_ids_unique() {
        let a = Stack::new("A").unwrap();
        let b = Stack::new("A").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_vs003_same_name_stacks_reject_each_others_handles() {
        let mut first = Stack::new("VPC").unwrap();
        let mut second = Stack::new("VPC").unwrap();
        let h = string_param(&mut first, "CIDR").unwrap();
        string_param(&mut second, "CIDR").unwrap();
        assert_eq!(h.stack_id(), first.id());
        let err = second.require_parameter(&h, ParamType::String).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Configuration(ConfigurationError::ForeignHandle { .. })
        ));
    }

    #[test]
    fn test_vs003_invalid_stack_name() {
        let err = Stack::new("bad name").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_vs003_distinct_parameters_retrievable() {
        let mut stack = Stack::new("S").unwrap();
        let a = string_param(&mut stack, "A").unwrap();
        let b = string_param(&mut stack, "B").unwrap();
        assert_eq!(a.name(), "A");
        assert_eq!(b.value().to_string(), "${var.B}");
        assert!(stack.parameter("A").is_some());
        assert!(stack.parameter("B").is_some());
        assert_eq!(stack.parameters().count(), 2);
    }

    #[test]
    fn test_vs003_duplicate_parameter() {
        let mut stack = Stack::new("S").unwrap();
        string_param(&mut stack, "VPC_CIDR").unwrap();
        let err = string_param(&mut stack, "VPC_CIDR").unwrap_err();
        assert!(matches!(
            err,
            SynthError::Configuration(ConfigurationError::DuplicateParameter(ref n)) if n == "VPC_CIDR"
        ));
        assert_eq!(stack.parameters().count(), 1);
    }

    #[test]
    fn test_vs003_parameter_order_preserved() {
        let mut stack = Stack::new("S").unwrap();
        for name in ["Z", "A", "M"] {
            string_param(&mut stack, name).unwrap();
        }
        let names: Vec<_> = stack.parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_vs003_require_parameter_foreign() {
        let mut a = Stack::new("A").unwrap();
        let mut b = Stack::new("B").unwrap();
        let ha = string_param(&mut a, "CIDR").unwrap();
        string_param(&mut b, "CIDR").unwrap();
        assert!(a.require_parameter(&ha, ParamType::String).is_ok());
        let err = b.require_parameter(&ha, ParamType::String).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Configuration(ConfigurationError::ForeignHandle { kind: "parameter", .. })
        ));
    }

    #[test]
    fn test_vs003_require_parameter_type() {
        let mut stack = Stack::new("S").unwrap();
        let h = stack
            .define_parameter("COUNT", ParamType::Number, json!(2), "n", None, None)
            .unwrap();
        let err = stack.require_parameter(&h, ParamType::String).unwrap_err();
        assert!(err.to_string().contains("has type number, expected string"));
    }

    #[test]
    fn test_vs003_backend_once() {
        let mut stack = Stack::new("S").unwrap();
        assert!(stack.backend().is_none());
        stack.register_backend(backend()).unwrap();
        let err = stack.register_backend(backend()).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Configuration(ConfigurationError::DuplicateBackend(_))
        ));
        assert_eq!(stack.backend().unwrap().bucket, "bucket");
    }

    #[test]
    fn test_vs003_duplicate_output() {
        let mut stack = Stack::new("S").unwrap();
        stack.add_output("vpc_id", Expression::literal("a")).unwrap();
        let err = stack
            .add_output("vpc_id", Expression::literal("b"))
            .unwrap_err();
        assert!(err.to_string().contains("output 'vpc_id'"));
        assert_eq!(stack.output("vpc_id").unwrap().value.to_string(), "a");
    }

    #[test]
    fn test_vs003_provider_once() {
        let mut stack = Stack::new("S").unwrap();
        let provider = ProviderConfig {
            logical_id: "AWS".into(),
            region: Expression::Variable("AWS_REGION".into()),
            source: "aws".into(),
            version: "4.35.0".into(),
        };
        stack.set_provider(provider.clone()).unwrap();
        assert!(stack.set_provider(provider).is_err());
    }

    #[test]
    fn test_vs003_network_handle_expressions() {
        let h = NetworkHandle {
            stack: StackId(0),
            logical_id: "vpc".into(),
        };
        assert_eq!(h.id().to_string(), "${aws_vpc.vpc.id}");
        assert_eq!(h.arn().to_string(), "${aws_vpc.vpc.arn}");
        assert_eq!(h.cidr_block().to_string(), "${aws_vpc.vpc.cidr_block}");
    }
}
