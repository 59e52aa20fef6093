//! VS-004: Resource declaration builders — network and subnets.
//!
//! Each builder appends exactly one declaration to the stack and returns a
//! handle to it. Subnets take a [`NetworkHandle`], so a network must be built
//! before anything can reference it.

use super::error::Result;
use super::stack::{NetworkHandle, ParameterHandle, Stack, SubnetHandle};
use super::types::*;

pub const NETWORK_ID: &str = "vpc";
pub const PRIVATE_SUBNET_ID: &str = "private_subnet";
pub const PUBLIC_SUBNET_ID: &str = "public_subnet";

/// Declare the VPC: DNS support and hostnames on, default tenancy.
pub fn build_network(
    stack: &mut Stack,
    tags: &TagSet,
    cidr: &ParameterHandle,
) -> Result<NetworkHandle> {
    stack.require_parameter(cidr, ParamType::String)?;
    stack.push_network(ResourceDeclaration {
        logical_id: NETWORK_ID.to_string(),
        tags: tags.clone(),
        kind: ResourceKind::Network(Network {
            cidr_block: cidr.value(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: "default".to_string(),
        }),
    })
}

/// Declare `private_subnet`. The public-IP flag is left to the engine default.
pub fn build_private_subnet(
    stack: &mut Stack,
    tags: &TagSet,
    cidr: &ParameterHandle,
    az: &ParameterHandle,
    network: &NetworkHandle,
) -> Result<SubnetHandle> {
    build_subnet(stack, PRIVATE_SUBNET_ID, tags, cidr, az, network, None)
}

/// Declare `public_subnet` with `map_public_ip_on_launch = false`.
pub fn build_public_subnet(
    stack: &mut Stack,
    tags: &TagSet,
    cidr: &ParameterHandle,
    az: &ParameterHandle,
    network: &NetworkHandle,
) -> Result<SubnetHandle> {
    build_subnet(stack, PUBLIC_SUBNET_ID, tags, cidr, az, network, Some(false))
}

fn build_subnet(
    stack: &mut Stack,
    logical_id: &str,
    tags: &TagSet,
    cidr: &ParameterHandle,
    az: &ParameterHandle,
    network: &NetworkHandle,
    map_public_ip_on_launch: Option<bool>,
) -> Result<SubnetHandle> {
    stack.require_network(network)?;
    stack.require_parameter(cidr, ParamType::String)?;
    stack.require_parameter(az, ParamType::String)?;
    stack.push_subnet(ResourceDeclaration {
        logical_id: logical_id.to_string(),
        tags: tags.clone(),
        kind: ResourceKind::Subnet(Subnet {
            availability_zone: az.value(),
            cidr_block: cidr.value(),
            map_public_ip_on_launch,
            network_ref: network.logical_id().to_string(),
            vpc_id: network.id(),
        }),
    })
}
