//! # HWI Probe Binary
//!
//! Reports the CPU capabilities relevant to the access surface and samples
//! every supported instruction through a [`Surface`].
//!
//! # Usage
//!
//! ```bash
//! # Probe the running CPU with per-instruction default policies
//! hwi_probe
//!
//! # Sample 16 values per instruction, settings from a config file
//! hwi_probe --config hwi.toml --samples 16
//!
//! # Exercise the simulated source with verbose JSON logs
//! hwi_probe --source simulation -v --json
//! ```

use clap::Parser;
use hwi_common::config::{ConfigLoader, HwiConfig, LogLevel};
use hwi_common::instr::{Instruction, InstructionSource};
use hwi_common::policy::RetryPolicy;
use hwi_core::{SourceRegistry, Surface};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// HWI Probe - sample RDTSC, RDRAND and RDSEED through the access surface
#[derive(Parser, Debug)]
#[command(name = "hwi_probe")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Probe hardware timestamp and random-number instructions")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file (hwi.toml). Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Instruction source to probe (overrides probe.source)
    #[arg(long)]
    source: Option<String>,

    /// Samples per instruction (overrides probe.samples)
    #[arg(short = 'n', long)]
    samples: Option<u32>,

    /// Bounded retry with this many attempts (overrides [retry])
    #[arg(short, long, conflicts_with = "unbounded")]
    attempts: Option<u32>,

    /// Retry until the hardware succeeds, without bound
    #[arg(long)]
    unbounded: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Probe failed: {}", e);
        eprintln!("hwi_probe: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HwiConfig::load(path)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => HwiConfig::default(),
    };
    apply_overrides(&mut config, &args);

    setup_tracing(&args, config.shared.log_level);

    info!(
        service = %config.shared.service_name,
        "HWI probe v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    config.validate()?;
    let policy = resolve_policy(&config, &args)?;

    let registry = SourceRegistry::with_builtin_sources();
    let source = registry.create_source(&config.probe.source)?;
    let surface = match policy {
        Some(policy) => Surface::new(source, policy),
        None => Surface::with_default_policies(source),
    };

    probe(&surface, config.probe.samples)?;

    info!("HWI probe complete");
    Ok(())
}

fn apply_overrides(config: &mut HwiConfig, args: &Args) {
    if let Some(source) = &args.source {
        config.probe.source = source.clone();
    }
    if let Some(samples) = args.samples {
        config.probe.samples = samples;
    }
}

/// Policy override from flags or `[retry]`; `None` keeps per-instruction defaults.
fn resolve_policy(
    config: &HwiConfig,
    args: &Args,
) -> Result<Option<RetryPolicy>, Box<dyn std::error::Error>> {
    if args.unbounded {
        warn!("Unbounded retry: a failing instruction will block forever");
        return Ok(Some(RetryPolicy::Unbounded));
    }
    if let Some(n) = args.attempts {
        return RetryPolicy::attempts(n)
            .map(Some)
            .ok_or_else(|| "--attempts must be > 0".into());
    }
    Ok(config.retry.policy()?)
}

fn probe<S: InstructionSource>(
    surface: &Surface<S>,
    samples: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let caps = surface.source().capabilities();
    println!("source:       {}", surface.source().name());
    println!("capabilities: {caps}");

    for instruction in Instruction::ALL {
        if instruction.is_fallible() && !caps.supports(instruction) {
            println!("{:<9} unsupported", instruction.mnemonic());
            continue;
        }
        let values = (0..samples)
            .map(|_| surface.sample(instruction))
            .collect::<Result<Vec<_>, _>>()?;
        let hex_width = (instruction.width_bits() / 4) as usize;
        let rendered: Vec<String> = values
            .iter()
            .map(|v| format!("{v:0hex_width$x}"))
            .collect();
        println!(
            "{:<9} {}  [{}]",
            instruction.mnemonic(),
            rendered.join(" "),
            surface.policy_for(instruction)
        );
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        configured.into()
    };

    let filter = env_filter(level, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// `RUST_LOG` directives when present, otherwise `level`.
fn env_filter(level: tracing::Level, env: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(env.unwrap_or_default())
}
