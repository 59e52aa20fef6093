//! VS-007: Terraform JSON rendering.
//!
//! Produces the document the provisioning engine reads (`cdk.tf.json`).
//! Top-level key order is fixed; fields inside a resource body are sorted,
//! so identical stacks always render byte-identical output.

use super::error::Result;
use super::stack::Stack;
use super::types::{ResourceDeclaration, ResourceKind};
use crate::tripwire::hasher;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// A stack rendered to its handoff form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStack {
    pub name: String,
    pub json: String,
    pub hash: String,
}

/// Generator string recorded in document metadata.
pub fn generator() -> String {
    format!("vpcsynth {}", env!("CARGO_PKG_VERSION"))
}

/// Render a stack to a JSON value.
pub fn render_stack(stack: &Stack) -> Result<Value> {
    let mut doc = Map::new();
    doc.insert("//".into(), render_metadata(stack));

    let terraform = render_terraform_block(stack)?;
    if !terraform.is_empty() {
        doc.insert("terraform".into(), Value::Object(terraform));
    }

    if let Some(provider) = stack.provider() {
        doc.insert(
            "provider".into(),
            json!({ provider_name(&provider.source): [{ "region": provider.region }] }),
        );
    }

    let mut variables = Map::new();
    for param in stack.parameters() {
        variables.insert(param.name.clone(), serde_json::to_value(param)?);
    }
    if !variables.is_empty() {
        doc.insert("variable".into(), Value::Object(variables));
    }

    let mut resources: Map<String, Value> = Map::new();
    for decl in stack.resources() {
        let body = render_resource(stack, decl)?;
        let by_type = resources
            .entry(decl.resource_type())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(m) = by_type {
            m.insert(decl.logical_id.clone(), body);
        }
    }
    if !resources.is_empty() {
        doc.insert("resource".into(), Value::Object(resources));
    }

    let mut outputs = Map::new();
    for output in stack.outputs() {
        outputs.insert(output.name.clone(), serde_json::to_value(output)?);
    }
    if !outputs.is_empty() {
        doc.insert("output".into(), Value::Object(outputs));
    }

    Ok(Value::Object(doc))
}

/// Render to pretty JSON text with its BLAKE3 hash.
pub fn render_document(stack: &Stack) -> Result<RenderedStack> {
    let value = render_stack(stack)?;
    let mut json = serde_json::to_string_pretty(&value)?;
    json.push('\n');
    let hash = hasher::hash_string(&json);
    Ok(RenderedStack {
        name: stack.name().to_string(),
        json,
        hash,
    })
}

fn render_metadata(stack: &Stack) -> Value {
    let backend = stack.backend().map(|b| b.kind()).unwrap_or("local");
    let outputs: Map<String, Value> = stack
        .outputs()
        .map(|o| (o.name.clone(), Value::String(o.name.clone())))
        .collect();
    json!({
        "metadata": {
            "backend": backend,
            "stackName": stack.name(),
            "version": generator(),
        },
        "outputs": { stack.name(): outputs },
    })
}

fn render_terraform_block(stack: &Stack) -> Result<Map<String, Value>> {
    let mut block = Map::new();
    if let Some(backend) = stack.backend() {
        block.insert(
            "backend".into(),
            json!({ backend.kind(): serde_json::to_value(backend)? }),
        );
    }
    if let Some(provider) = stack.provider() {
        block.insert(
            "required_providers".into(),
            json!({
                provider_name(&provider.source): {
                    "source": provider.source,
                    "version": provider.version,
                }
            }),
        );
    }
    Ok(block)
}

fn render_resource(stack: &Stack, decl: &ResourceDeclaration) -> Result<Value> {
    let fields = match &decl.kind {
        ResourceKind::Network(n) => serde_json::to_value(n)?,
        ResourceKind::Subnet(s) => serde_json::to_value(s)?,
    };
    let mut sorted: BTreeMap<String, Value> = match fields {
        Value::Object(m) => m.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    if !decl.tags.is_empty() {
        sorted.insert("tags".into(), serde_json::to_value(&decl.tags)?);
    }

    let mut body = Map::new();
    body.insert(
        "//".into(),
        json!({
            "metadata": {
                "path": format!("{}/{}", stack.name(), decl.logical_id),
                "uniqueId": decl.logical_id,
            }
        }),
    );
    body.extend(sorted);
    Ok(Value::Object(body))
}

/// `hashicorp/aws` and `aws` both name the `aws` provider block.
fn provider_name(source: &str) -> &str {
    source.rsplit('/').next().unwrap_or(source)
}
