use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use placement_check::commands::{check_command, list_resolvers_command, CheckOptions};
use placement_check::init_tracing;
use tracing::debug;

/// Memory-placement hazard checker for RP2040/FreeRTOS firmware.
///
/// This CLI is a thin wrapper around `placement-core` (exposed in code as
/// `placement_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "placement-check",
    version,
    about = "Detect memory-placement hazards for a firmware variable",
    long_about = None
)]
struct Cli {
    /// Path to the linked ELF image.
    #[arg(required_unless_present = "list_resolvers")]
    elf_file: Option<String>,

    /// Name of the variable to analyze.
    #[arg(required_unless_present = "list_resolvers")]
    variable: Option<String>,

    /// Emit JSON instead of human-readable text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Symbol resolver backend (see --list-resolvers).
    #[arg(long)]
    resolver: Option<String>,

    /// Target description file (YAML or JSON) replacing the built-in RP2040 map.
    #[arg(long)]
    target: Option<PathBuf>,

    /// List the available symbol resolvers and exit.
    #[arg(long, default_value_t = false)]
    list_resolvers: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "parsed arguments");

    if cli.list_resolvers {
        return list_resolvers_command(cli.json);
    }

    // clap enforces both positionals unless --list-resolvers was given.
    let (Some(elf_file), Some(variable)) = (cli.elf_file, cli.variable) else {
        anyhow::bail!("Usage: placement-check <ELF_FILE> <VARIABLE>");
    };
    let opts = CheckOptions { resolver: cli.resolver, target: cli.target, json: cli.json };
    check_command(&elf_file, &variable, &opts)
}
