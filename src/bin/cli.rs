// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use polyframe_csg::geometry::analyze_solid;
use polyframe_csg::{load_tree, EvalConfig, Kernel};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "polyframe-csg")]
#[command(about = "Polyframe CSG core - evaluate JSON node trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./polyframe-csg.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a tree exactly and print statistics
    Render {
        /// JSON tree file
        tree: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the textual tree dump
    Dump {
        /// JSON tree file
        tree: PathBuf,
    },

    /// Build preview terms and print their structure
    Preview {
        /// JSON tree file
        tree: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => EvalConfig::from_file(path)?,
        None => EvalConfig::load()?,
    };

    match &cli.command {
        Commands::Render { tree, json } => render_command(tree, config, *json, cli.verbose)?,
        Commands::Dump { tree } => dump_command(tree)?,
        Commands::Preview { tree } => preview_command(tree, config)?,
        Commands::Version => println!("Polyframe CSG v{}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}

fn print_diagnostics(diagnostics: &[String]) {
    for message in diagnostics {
        if message.starts_with("ERROR") {
            println!("{}", message.red());
        } else {
            println!("{}", message.yellow());
        }
    }
}

fn render_command(path: &Path, config: EvalConfig, json: bool, verbose: bool) -> Result<()> {
    let mut kernel = Kernel::new(config);
    kernel.set_tree(load_tree(path)?);

    let start = std::time::Instant::now();
    let result = kernel.render();
    let elapsed = start.elapsed();

    let stats = analyze_solid(&result.solid);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        stats.print();
    }
    print_diagnostics(&result.diagnostics);

    if verbose {
        let cache = kernel.cache_stats();
        println!(
            "{} {:.2?}, {} cached results, weight {}/{}",
            "Rendered in".bright_black(),
            elapsed,
            cache.entries.to_string().cyan(),
            cache.total_weight,
            cache.capacity
        );
    }

    Ok(())
}

fn dump_command(path: &Path) -> Result<()> {
    let tree = load_tree(path)?;
    print!("{}", polyframe_csg::dump(&tree));
    Ok(())
}

fn preview_command(path: &Path, config: EvalConfig) -> Result<()> {
    let mut kernel = Kernel::new(config);
    kernel.set_tree(load_tree(path)?);
    let result = kernel.preview();

    match &result.root {
        Some(root) => {
            println!("{} {}", "Term:".bold(), root.describe());
            println!("  {} {}", "Leaves:".bright_black(), root.leaf_count().to_string().cyan());
        }
        None => println!("{}", "Nothing to preview".bright_black()),
    }
    println!(
        "  {} {}",
        "Highlighted:".bright_black(),
        result.highlights.len().to_string().cyan()
    );
    println!(
        "  {} {}",
        "Background:".bright_black(),
        result.background.len().to_string().cyan()
    );
    print_diagnostics(&result.diagnostics);

    Ok(())
}
