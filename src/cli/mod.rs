//! VS-011: CLI subcommands — init, validate, synth, check, schema.

use crate::core::{app, composer, config};
use crate::tripwire::drift;
use clap::Subcommand;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "vpcsynth.yaml";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter vpcsynth.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate the stack config and build the declaration graph
    Validate {
        /// Path to vpcsynth.yaml (built-in defaults when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Synthesize Terraform JSON into the output directory
    Synth {
        /// Path to vpcsynth.yaml (built-in defaults when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = app::DEFAULT_OUTDIR)]
        outdir: PathBuf,

        /// Skip the remote-state backend even if configured
        #[arg(long)]
        no_backend: bool,
    },

    /// Fail if the synthesized output is stale
    Check {
        /// Path to vpcsynth.yaml (built-in defaults when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = app::DEFAULT_OUTDIR)]
        outdir: PathBuf,

        /// Skip the remote-state backend even if configured
        #[arg(long)]
        no_backend: bool,
    },

    /// Print the JSON schema of vpcsynth.yaml
    Schema,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(file.as_deref()),
        Commands::Synth {
            file,
            outdir,
            no_backend,
        } => cmd_synth(file.as_deref(), &outdir, no_backend),
        Commands::Check {
            file,
            outdir,
            no_backend,
        } => cmd_check(file.as_deref(), &outdir, no_backend),
        Commands::Schema => cmd_schema(),
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }
    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;

    let template = config::StackConfig::default()
        .to_template()
        .map_err(|e| e.to_string())?;
    std::fs::write(&config_path, template)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized vpcsynth project at {}", path.display());
    println!("  Created: {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: Option<&Path>) -> Result<(), String> {
    let config = load_and_validate(file)?;
    let stack = composer::compose(&config.stack, &config).map_err(|e| e.to_string())?;
    println!(
        "OK: {} ({} parameters, {} resources, {} outputs)",
        stack.name(),
        stack.parameters().count(),
        stack.resources().len(),
        stack.outputs().count()
    );
    Ok(())
}

/// Load config (file + environment) and reject it if validation fails.
fn load_and_validate(file: Option<&Path>) -> Result<config::StackConfig, String> {
    let config = config::load_config(file).map_err(|e| e.to_string())?;
    let errors = config::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

/// Compose the configured stack into a fresh app.
fn build_app(file: Option<&Path>, outdir: &Path, no_backend: bool) -> Result<app::App, String> {
    let config = load_and_validate(file)?;
    let mut stack = composer::compose(&config.stack, &config).map_err(|e| e.to_string())?;
    if !no_backend {
        composer::register_backend(&mut stack, &config).map_err(|e| e.to_string())?;
    }
    let mut app = app::App::new(outdir);
    app.add_stack(stack).map_err(|e| e.to_string())?;
    Ok(app)
}

fn cmd_synth(file: Option<&Path>, outdir: &Path, no_backend: bool) -> Result<(), String> {
    let app = build_app(file, outdir, no_backend)?;
    let summary = app.synth().map_err(|e| e.to_string())?;

    for entry in summary.manifest.stacks.values() {
        println!(
            "Synthesized {} → {}",
            entry.name,
            summary.outdir.join(&entry.synthesized_stack_path).display()
        );
        println!("  {}", entry.hash);
    }
    Ok(())
}

fn cmd_check(file: Option<&Path>, outdir: &Path, no_backend: bool) -> Result<(), String> {
    let app = build_app(file, outdir, no_backend)?;
    let rendered = app.render().map_err(|e| e.to_string())?;
    let findings = drift::check_synth_drift(outdir, &rendered);

    if findings.is_empty() {
        println!("Synthesized output is up to date.");
        return Ok(());
    }
    for f in &findings {
        println!("  DRIFTED: {} ({})", f.stack, f.detail);
        println!("    Expected: {}", f.expected_hash);
        println!("    Actual:   {}", f.actual_hash);
    }
    Err(format!(
        "{} drift finding(s); run `vpcsynth synth`",
        findings.len()
    ))
}

fn cmd_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(config::StackConfig);
    let json = serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
