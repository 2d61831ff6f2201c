//! Proto Generation CLI
//!
//! Loads declaration manifests, resolves every message and writes one
//! proto3 file per output unit. Settings come from `protogen.toml` (and the
//! other config locations); command-line flags override them.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use struct_proto::config::{GeneratorConfig, MergeTarget, WellKnownImports};
use struct_proto::{codegen, loader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proto-gen")]
#[command(about = "Generate proto3 schemas from struct declarations")]
struct Cli {
    /// Declaration manifests or directories of manifests
    #[arg(short = 'i', long = "in", num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output directory for generated schemas
    #[arg(short, long = "out")]
    out: Option<PathBuf>,

    /// Base directory / import path; its last component is the package name
    #[arg(short, long)]
    base: Option<String>,

    /// Extra config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    /// Struct tag key carrying wire names (default: first key in the tag)
    #[arg(long)]
    tag_key: Option<String>,

    /// Only import well-known types that are used
    #[arg(long)]
    used_imports_only: bool,

    /// Name merged files after the largest file name in a cycle
    #[arg(long)]
    merge_largest: bool,

    /// Write the effective configuration (file layers plus flags) to PATH and exit
    #[arg(long, value_name = "PATH")]
    save_config: Option<String>,

    /// Render and report, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "struct_proto=debug" } else { "struct_proto=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    apply_overrides(&mut config, &cli);

    if let Some(path) = &cli.save_config {
        config.save(path).with_context(|| format!("writing {}", path))?;
        println!("✅ Saved configuration to {}", path);
        return Ok(());
    }

    if config.input.paths.is_empty() {
        bail!("no input given; pass --in <PATH> or set [input].paths");
    }

    let load_config = loader::LoadConfig::with_extension(config.input.extension.clone());
    let sources = loader::load_sources(&config.input.paths, &load_config).context("loading declarations")?;
    let output = codegen::generate(&sources, &config)?;

    println!("📦 Proto Generation");
    println!("  Manifests: {}", sources.len());
    println!("  Messages:  {}", output.message_count);
    println!("  Files:     {}", output.files.len());
    for (file, into) in output.merge_map.iter() {
        println!("  ⚠️  {} merged into {} (import cycle)", file, into);
    }

    if cli.dry_run {
        println!();
        println!("🔍 Dry run - not writing files");
        for file in &output.files {
            println!("    - {} ({} messages)", file.path.display(), file.message_count);
        }
        return Ok(());
    }

    let written = codegen::write_output(&output, &config.output.dir)?;
    println!("✅ Wrote {} files to {:?}", written.len(), config.output.dir);
    Ok(())
}

fn apply_overrides(config: &mut GeneratorConfig, cli: &Cli) {
    if !cli.inputs.is_empty() {
        config.input.paths = cli.inputs.clone();
    }
    if let Some(out) = &cli.out {
        config.output.dir = out.clone();
    }
    if let Some(base) = &cli.base {
        config.output.base_dir = base.clone();
    }
    if let Some(key) = &cli.tag_key {
        config.naming.tag_key = Some(key.clone());
    }
    if cli.used_imports_only {
        config.output.well_known_imports = WellKnownImports::Used;
    }
    if cli.merge_largest {
        config.merge.target = MergeTarget::Largest;
    }
}
