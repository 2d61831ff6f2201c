use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use struct_proto::config::GeneratorConfig;
use struct_proto::{codegen, loader, DependencyGraph};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proto-graph-export")]
#[command(about = "Export the file import graph of struct declarations to DOT format")]
struct Cli {
    /// Declaration manifests or directories of manifests
    #[arg(short = 'i', long = "in", num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,

    /// Export the graph after import cycles are merged
    #[arg(short, long)]
    merged: bool,

    /// Output file (defaults to files.dot)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GeneratorConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let load_config = loader::LoadConfig::with_extension(config.input.extension.clone());
    let sources = loader::load_sources(&cli.inputs, &load_config).context("loading declarations")?;

    let (ctx, plan) = codegen::plan(&sources, &config)?;
    let graph = if cli.merged {
        DependencyGraph::from_units(&plan.units)
    } else {
        ctx.dependency_graph()
    };

    println!("Graph loaded: {} files, {} edges", graph.file_count(), graph.edge_count());

    let output_path = cli.output.unwrap_or_else(|| PathBuf::from("files.dot"));
    std::fs::write(&output_path, graph.to_dot())
        .with_context(|| format!("writing {}", output_path.display()))?;
    println!("✅ Exported DOT to: {:?}", output_path);

    Ok(())
}
