//! vpcsynth — Rust-native stack synthesis.
//!
//! Declares one VPC with a public and a private subnet, and emits the
//! Terraform JSON document plus manifest that the provisioning engine
//! plans and applies. No cloud API calls are made here.

pub mod cli;
pub mod core;
pub mod tripwire;
