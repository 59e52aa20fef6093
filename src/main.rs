//! vpcsynth CLI — declare a VPC stack, synthesize Terraform JSON.

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "vpcsynth",
    version,
    about = "Rust-native stack synthesis — declare a VPC with public/private subnets, emit Terraform JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: vpcsynth::cli::Commands,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = vpcsynth::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
