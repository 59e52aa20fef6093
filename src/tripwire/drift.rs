//! VS-010: Stale-output detection — compare synthesized files on disk to a
//! fresh in-memory synthesis.
//!
//! A finding means the committed `cdktf.out/` no longer matches what the
//! current config would produce (hand edits, or a config change without a
//! re-synth).

use crate::core::app::{self, Manifest};
use crate::core::render::RenderedStack;
use crate::tripwire::hasher;
use std::path::Path;
use tracing::warn;

/// A single drift finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftFinding {
    pub stack: String,
    pub expected_hash: String,
    pub actual_hash: String,
    pub detail: String,
}

/// Check one stack's synthesized file against its expected hash.
pub fn check_stack_file(outdir: &Path, expected: &RenderedStack) -> Option<DriftFinding> {
    let path = app::stack_file_path(outdir, &expected.name);
    if !path.exists() {
        return Some(DriftFinding {
            stack: expected.name.clone(),
            expected_hash: expected.hash.clone(),
            actual_hash: "MISSING".to_string(),
            detail: format!("{} does not exist", path.display()),
        });
    }

    let actual = hasher::hash_file(&path).unwrap_or_else(|e| format!("ERROR:{}", e));
    if actual != expected.hash {
        Some(DriftFinding {
            stack: expected.name.clone(),
            expected_hash: expected.hash.clone(),
            actual_hash: actual,
            detail: format!("{} is stale", path.display()),
        })
    } else {
        None
    }
}

/// Check every expected stack plus the manifest in `outdir`.
pub fn check_synth_drift(outdir: &Path, expected: &[RenderedStack]) -> Vec<DriftFinding> {
    let mut findings: Vec<DriftFinding> = expected
        .iter()
        .filter_map(|r| check_stack_file(outdir, r))
        .collect();

    match app::load_manifest(outdir) {
        Ok(Some(manifest)) => findings.extend(check_manifest(&manifest, expected)),
        Ok(None) => findings.push(DriftFinding {
            stack: "*".to_string(),
            expected_hash: "-".to_string(),
            actual_hash: "MISSING".to_string(),
            detail: format!("{} does not exist", outdir.join(app::MANIFEST_FILE).display()),
        }),
        Err(e) => findings.push(DriftFinding {
            stack: "*".to_string(),
            expected_hash: "-".to_string(),
            actual_hash: format!("ERROR:{}", e),
            detail: "manifest unreadable".to_string(),
        }),
    }

    for f in &findings {
        warn!(stack = %f.stack, detail = %f.detail, "synthesized output drifted");
    }
    findings
}

fn check_manifest(manifest: &Manifest, expected: &[RenderedStack]) -> Vec<DriftFinding> {
    let mut findings = Vec::new();

    for r in expected {
        match manifest.stacks.get(&r.name) {
            None => findings.push(DriftFinding {
                stack: r.name.clone(),
                expected_hash: r.hash.clone(),
                actual_hash: "MISSING".to_string(),
                detail: "not listed in manifest".to_string(),
            }),
            Some(entry) if entry.hash != r.hash => findings.push(DriftFinding {
                stack: r.name.clone(),
                expected_hash: r.hash.clone(),
                actual_hash: entry.hash.clone(),
                detail: "manifest hash out of date".to_string(),
            }),
            Some(_) => {}
        }
    }

    for (name, entry) in &manifest.stacks {
        if !expected.iter().any(|r| &r.name == name) {
            findings.push(DriftFinding {
                stack: name.clone(),
                expected_hash: "-".to_string(),
                actual_hash: entry.hash.clone(),
                detail: "stack is no longer declared".to_string(),
            });
        }
    }

    findings
}
