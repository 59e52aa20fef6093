//! VS-006: Stack composition — the VPC stack, wired in one pass.
//!
//! Order: parameters, tags, provider, network, subnets, outputs. The backend
//! is attached separately by the caller (see [`register_backend`]).
//!
//! The subnet wiring keeps its historical shape: the private-subnet builder
//! receives `PUBLIC_CIDR` and the public-subnet builder receives
//! `PRIVATE_CIDR`, and the `*_subnet_id` outputs follow the CIDRs rather than
//! the logical ids. The resource addresses `aws_subnet.private_subnet` and
//! `aws_subnet.public_subnet` must not change.

use super::builder;
use super::config::{self, StackConfig};
use super::error::Result;
use super::stack::Stack;
use super::types::*;
use serde_json::json;
use tracing::info;

pub const PROVIDER_ID: &str = "AWS";

/// Build the VPC stack from a config. No I/O.
pub fn compose(scope_id: &str, config: &StackConfig) -> Result<Stack> {
    let mut stack = Stack::new(scope_id)?;
    let params = &config.params;

    let region = stack.define_parameter(
        config::ENV_AWS_REGION,
        ParamType::String,
        json!(params.aws_region),
        "Choose which AWS region to use",
        Some(false),
        Some(false),
    )?;
    let vpc_cidr = stack.define_parameter(
        config::ENV_VPC_CIDR,
        ParamType::String,
        json!(params.vpc_cidr),
        "The CIDR block for the VPC",
        None,
        None,
    )?;
    let public_cidr = stack.define_parameter(
        config::ENV_PUBLIC_CIDR,
        ParamType::String,
        json!(params.public_cidr),
        "The CIDR block for the public subnet",
        None,
        None,
    )?;
    let private_cidr = stack.define_parameter(
        config::ENV_PRIVATE_CIDR,
        ParamType::String,
        json!(params.private_cidr),
        "The CIDR block for the private subnet",
        None,
        None,
    )?;
    let az = stack.define_parameter(
        config::ENV_VPC_AZ,
        ParamType::String,
        json!(params.vpc_az),
        "The availability zone for the VPC",
        None,
        None,
    )?;

    stack.set_tags(config.tags.clone());
    let tags = stack.tags().clone();

    stack.set_provider(ProviderConfig {
        logical_id: PROVIDER_ID.to_string(),
        region: region.value(),
        source: config.provider.source.clone(),
        version: config.provider.version.clone(),
    })?;

    let vpc = builder::build_network(&mut stack, &tags, &vpc_cidr)?;
    let public_subnet = builder::build_private_subnet(&mut stack, &tags, &public_cidr, &az, &vpc)?;
    let private_subnet =
        builder::build_public_subnet(&mut stack, &tags, &private_cidr, &az, &vpc)?;

    stack.add_output("vpc_id", vpc.id())?;
    stack.add_output("vpc_arn", vpc.arn())?;
    stack.add_output("vpc_cidr", vpc.cidr_block())?;
    stack.add_output("private_subnet_id", private_subnet.id())?;
    stack.add_output("public_subnet_id", public_subnet.id())?;

    info!(
        stack = scope_id,
        resources = stack.resources().len(),
        "stack composed"
    );
    Ok(stack)
}

/// Attach the configured backend, if any.
pub fn register_backend(stack: &mut Stack, config: &StackConfig) -> Result<()> {
    match &config.backend {
        Some(settings) => stack.register_backend(settings.to_descriptor()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::{NETWORK_ID, PRIVATE_SUBNET_ID, PUBLIC_SUBNET_ID};
    use crate::core::error::{ConfigurationError, SynthError};
    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    fn default_stack() -> Stack {
        compose("VPC", &StackConfig::default()).unwrap()
    }

    /// Resolve a `${var.X}` expression against the stack's parameter defaults.
    fn resolved(stack: &Stack, expr: &Expression) -> String {
        let name = expr.variable_name().expect("variable reference");
        stack.parameter(name).unwrap().default.as_str().unwrap().to_string()
    }

    #[test]
    fn test_vs006_one_network_two_subnets() {
        let stack = default_stack();
        let networks: Vec<_> = stack
            .resources()
            .iter()
            .filter_map(|r| r.as_network())
            .collect();
        let subnets: Vec<_> = stack
            .resources()
            .iter()
            .filter_map(|r| r.as_subnet())
            .collect();
        assert_eq!(networks.len(), 1);
        assert_eq!(subnets.len(), 2);
        for s in subnets {
            assert_eq!(s.network_ref, NETWORK_ID);
        }
    }

    #[test]
    fn test_vs006_declaration_order() {
        let stack = default_stack();
        let ids: Vec<_> = stack
            .resources()
            .iter()
            .map(|r| r.logical_id.as_str())
            .collect();
        assert_eq!(ids, vec![NETWORK_ID, PRIVATE_SUBNET_ID, PUBLIC_SUBNET_ID]);
    }

    #[test]
    fn test_vs006_default_end_to_end() {
        let stack = default_stack();

        let vpc = stack.resource("vpc").unwrap().as_network().unwrap();
        assert_eq!(resolved(&stack, &vpc.cidr_block), "10.0.0.0/16");
        assert!(vpc.enable_dns_support);
        assert!(vpc.enable_dns_hostnames);
        assert_eq!(vpc.instance_tenancy, "default");

        let private = stack
            .resource("private_subnet")
            .unwrap()
            .as_subnet()
            .unwrap();
        assert_eq!(resolved(&stack, &private.cidr_block), "10.0.1.0/24");
        assert!(!private.effective_map_public_ip_on_launch());
        assert_eq!(private.map_public_ip_on_launch, None);

        let public = stack
            .resource("public_subnet")
            .unwrap()
            .as_subnet()
            .unwrap();
        assert_eq!(resolved(&stack, &public.cidr_block), "10.0.2.0/24");
        assert_eq!(public.map_public_ip_on_launch, Some(false));
        assert_eq!(resolved(&stack, &public.availability_zone), "us-east-1a");
    }

    #[test]
    fn test_vs006_outputs() {
        let stack = default_stack();
        let outputs: Vec<_> = stack
            .outputs()
            .map(|o| (o.name.as_str(), o.value.to_string()))
            .collect();
        assert_eq!(
            outputs,
            vec![
                ("vpc_id", "${aws_vpc.vpc.id}".to_string()),
                ("vpc_arn", "${aws_vpc.vpc.arn}".to_string()),
                ("vpc_cidr", "${aws_vpc.vpc.cidr_block}".to_string()),
                (
                    "private_subnet_id",
                    "${aws_subnet.public_subnet.id}".to_string()
                ),
                (
                    "public_subnet_id",
                    "${aws_subnet.private_subnet.id}".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_vs006_tags_on_every_resource() {
        let stack = default_stack();
        for r in stack.resources() {
            assert_eq!(&r.tags, stack.tags());
            assert_eq!(r.tags["Name"], "cdktf-resources");
        }
    }

    #[test]
    fn test_vs006_provider_region_is_reference() {
        let stack = default_stack();
        let p = stack.provider().unwrap();
        assert_eq!(p.logical_id, "AWS");
        assert_eq!(p.region.to_string(), "${var.AWS_REGION}");
        let region = stack.parameter("AWS_REGION").unwrap();
        assert_eq!(region.nullable, Some(false));
        assert_eq!(region.sensitive, Some(false));
        assert_eq!(stack.parameter("VPC_AZ").unwrap().nullable, None);
    }

    #[test]
    fn test_vs006_no_backend_until_registered() {
        let mut stack = default_stack();
        assert!(stack.backend().is_none());
        register_backend(&mut stack, &StackConfig::default()).unwrap();
        assert!(stack.backend().is_some());
        let err = register_backend(&mut stack, &StackConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Configuration(ConfigurationError::DuplicateBackend(_))
        ));
    }

    #[test]
    fn test_vs006_backend_disabled() {
        let mut stack = default_stack();
        let config = StackConfig {
            backend: None,
            ..StackConfig::default()
        };
        register_backend(&mut stack, &config).unwrap();
        assert!(stack.backend().is_none());
    }

    #[test]
    fn test_vs006_invalid_scope_id() {
        assert!(compose("not valid", &StackConfig::default()).is_err());
    }

    proptest! {
        #[test]
        fn prop_vs006_shape_independent_of_params(
            region in "[a-z]{2}-[a-z]{4,9}-[1-3]",
            vpc in "[0-9./]{1,18}",
            public in "[0-9./]{1,18}",
            private in "[0-9./]{1,18}",
            az in "[a-z0-9-]{1,14}",
        ) {
            let mut config = StackConfig::default();
            config.params.aws_region = region;
            config.params.vpc_cidr = vpc.clone();
            config.params.public_cidr = public.clone();
            config.params.private_cidr = private.clone();
            config.params.vpc_az = az;
            let stack = compose("VPC", &config).unwrap();

            let networks = stack.resources().iter().filter(|r| r.as_network().is_some()).count();
            let subnets: Vec<_> = stack.resources().iter().filter_map(|r| r.as_subnet()).collect();
            prop_assert_eq!(networks, 1);
            prop_assert_eq!(subnets.len(), 2);
            prop_assert!(subnets.iter().all(|s| s.network_ref == NETWORK_ID));

            let names: FxHashSet<_> = stack.outputs().map(|o| o.name.clone()).collect();
            prop_assert_eq!(stack.outputs().count(), 5);
            prop_assert_eq!(names.len(), 5);

            let vpc_decl = stack.resource("vpc").unwrap().as_network().unwrap();
            prop_assert_eq!(resolved(&stack, &vpc_decl.cidr_block), vpc);
            let p = stack.resource("private_subnet").unwrap().as_subnet().unwrap();
            prop_assert_eq!(resolved(&stack, &p.cidr_block), public);
            let q = stack.resource("public_subnet").unwrap().as_subnet().unwrap();
            prop_assert_eq!(resolved(&stack, &q.cidr_block), private);
        }
    }
}
