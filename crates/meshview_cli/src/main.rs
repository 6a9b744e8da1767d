//! Meshview CLI: loads an analyzer output folder and prints what a UI
//! session would visualize: per-chip grid and graph summaries plus the
//! cluster topology.

#![warn(missing_docs)]

use std::path::PathBuf;
use std::process;

use clap::Parser;
use meshview_chip::GraphOnChip;
use meshview_cluster::Cluster;
use meshview_config::MeshviewConfig;
use meshview_loader::LoadedDataset;

/// Meshview, accelerator mesh inspection.
#[derive(Parser, Debug)]
#[command(name = "meshview", version, about = "Accelerator mesh inspection")]
struct Cli {
    /// Analyzer output folder to load.
    folder: PathBuf,

    /// Path to a `meshview.toml` configuration file.
    #[arg(long, default_value = "meshview.toml")]
    config: PathBuf,

    /// Load (chip, epoch) pairs in parallel.
    #[arg(long)]
    parallel: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match meshview_config::load_config(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            log::error!("{error}");
            process::exit(1);
        }
    };

    let dataset = match meshview_loader::load_all(&cli.folder, cli.parallel) {
        Ok(dataset) => dataset,
        Err(error) => {
            log::error!("failed to load {}: {error}", cli.folder.display());
            process::exit(1);
        }
    };

    report(&dataset, &config);
    if dataset.chips.is_empty() {
        process::exit(1);
    }
}

fn report(dataset: &LoadedDataset, config: &MeshviewConfig) {
    println!(
        "loaded {} chip aggregate(s) from {} pair(s)",
        dataset.chips.len(),
        dataset.chips.len() + dataset.failures.len()
    );
    println!(
        "assumed bandwidth (GB/s): dram {}, eth {}, pcie {}; aiclk {} MHz",
        config.bandwidth.dram_gbs,
        config.bandwidth.eth_gbs,
        config.bandwidth.pcie_gbs,
        config.clock.aiclk_mhz
    );

    for chip in &dataset.chips {
        println!();
        println!("chip {} epoch {}", chip.key.chip, chip.key.epoch);
        print_chip(&chip.graph);
    }

    for failure in &dataset.failures {
        log::error!("{failure}");
    }

    if let Some(cluster) = &dataset.cluster {
        println!();
        print_cluster(cluster);
    }
}

fn print_chip(graph: &GraphOnChip) {
    println!(
        "  {:?} grid {}x{} ({} nodes)",
        graph.architecture(),
        graph.total_cols(),
        graph.total_rows(),
        graph.nodes().count()
    );
    println!(
        "  {} operations, {} queues, {} pipes, {} dram channels",
        graph.operations().count(),
        graph.queues().count(),
        graph.pipes().count(),
        graph.dram_channels().len()
    );
    println!(
        "  total op cycles {} (slowest {}, bw limited {}), max bw limited factor {:.2}",
        graph.total_op_cycles(),
        graph.slowest_op_cycles(),
        graph.bw_limited_op_cycles(),
        graph.max_bw_limited_factor()
    );
    for error in graph.integrity().errors() {
        println!("  integrity: {}", error.message);
    }
}

fn print_cluster(cluster: &Cluster) {
    println!(
        "cluster: {} chips, {}x{} grid",
        cluster.len(),
        cluster.total_cols(),
        cluster.total_rows()
    );
    for chip in cluster.chips() {
        let coords = chip.coordinates;
        println!(
            "  chip {} at ({}, {}) rack {} shelf {}{}: {} eth connection(s)",
            chip.id,
            coords.x,
            coords.y,
            coords.rack,
            coords.shelf,
            if chip.mmio { " [mmio]" } else { "" },
            chip.connected_chips().len()
        );
    }
}
