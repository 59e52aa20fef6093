//! VS-008: App — the explicit synthesis context.
//!
//! Lifecycle: `App::new` → `add_stack` → `synth` (consumes the app). Every
//! stack is rendered before anything is written, so a stack that fails to
//! render leaves the output directory untouched. Files are replaced one at a
//! time and the manifest goes last: an I/O failure part way through leaves the
//! previous manifest (or none), which `check` reports as drift.

use super::error::{ConfigurationError, Result, SynthError};
use super::render::{self, RenderedStack};
use super::stack::Stack;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_OUTDIR: &str = "cdktf.out";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const STACK_FILE: &str = "cdk.tf.json";

/// Index of synthesized stacks, written next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub stacks: IndexMap<String, ManifestEntry>,
}

/// One stack in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub construct_path: String,
    pub working_directory: String,
    pub synthesized_stack_path: String,
    pub hash: String,
}

/// What `synth` wrote.
#[derive(Debug, Clone)]
pub struct SynthSummary {
    pub outdir: PathBuf,
    pub manifest: Manifest,
}

/// Owns the stacks of one synthesis run.
#[derive(Debug)]
pub struct App {
    outdir: PathBuf,
    stacks: IndexMap<String, Stack>,
}

impl App {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            stacks: IndexMap::new(),
        }
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Register a fully built stack. Stack names are unique per app.
    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stacks.contains_key(stack.name()) {
            return Err(ConfigurationError::DuplicateStack(stack.name().to_string()).into());
        }
        self.stacks.insert(stack.name().to_string(), stack);
        Ok(())
    }

    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Render every stack without touching the filesystem.
    pub fn render(&self) -> Result<Vec<RenderedStack>> {
        self.stacks.values().map(render::render_document).collect()
    }

    /// Write `stacks/<name>/cdk.tf.json` per stack plus `manifest.json`.
    pub fn synth(self) -> Result<SynthSummary> {
        let rendered = self.render()?;
        let manifest = build_manifest(&rendered);

        for r in &rendered {
            let path = stack_file_path(&self.outdir, &r.name);
            write_atomic(&path, &r.json)?;
            info!(stack = %r.name, path = %path.display(), hash = %r.hash, "stack synthesized");
        }

        let mut manifest_json = serde_json::to_string_pretty(&manifest)?;
        manifest_json.push('\n');
        write_atomic(&self.outdir.join(MANIFEST_FILE), &manifest_json)?;

        Ok(SynthSummary {
            outdir: self.outdir,
            manifest,
        })
    }
}

/// Manifest for a set of rendered stacks.
pub fn build_manifest(rendered: &[RenderedStack]) -> Manifest {
    let stacks = rendered
        .iter()
        .map(|r| {
            let working_directory = format!("stacks/{}", r.name);
            (
                r.name.clone(),
                ManifestEntry {
                    name: r.name.clone(),
                    construct_path: r.name.clone(),
                    synthesized_stack_path: format!("{}/{}", working_directory, STACK_FILE),
                    working_directory,
                    hash: r.hash.clone(),
                },
            )
        })
        .collect();
    Manifest {
        version: env!("CARGO_PKG_VERSION").to_string(),
        stacks,
    }
}

/// `<outdir>/stacks/<name>/cdk.tf.json`
pub fn stack_file_path(outdir: &Path, stack: &str) -> PathBuf {
    outdir.join("stacks").join(stack).join(STACK_FILE)
}

/// Load the manifest. Returns None if it doesn't exist.
pub fn load_manifest(outdir: &Path) -> Result<Option<Manifest>> {
    let path = outdir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| SynthError::io(&path, e))?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Atomic write: temp file + rename.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SynthError::io(parent, e))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, contents).map_err(|e| SynthError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| SynthError::io(path, e))?;
    Ok(())
}
