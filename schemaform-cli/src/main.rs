//! schemaform command line.
//!
//! Usage:
//!   schemaform validate --nodes nodes.json --schema Server --data server.json
//!   schemaform render --nodes nodes.json --schema Server --data server.json --edit
//!   schemaform kinds --nodes nodes.json

use anyhow::Result;
use clap::{Parser, Subcommand};
use schemaform_cli::{build_runtime, kinds, load_data, load_nodes, render, validate};
use schemaform_dispatch::Capability;
use schemaform_runtime::SchemaformConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "schemaform")]
#[command(about = "Validate and render schemaform node maps")]
struct Args {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = "schemaform.toml")]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a JSON document against a named schema
    Validate {
        #[arg(long)]
        nodes: PathBuf,
        #[arg(long)]
        schema: String,
        #[arg(long)]
        data: PathBuf,
    },
    /// Print the render tree for a JSON document
    Render {
        #[arg(long)]
        nodes: PathBuf,
        #[arg(long)]
        schema: String,
        #[arg(long)]
        data: PathBuf,
        /// Render for editing instead of viewing
        #[arg(long)]
        edit: bool,
    },
    /// List the composed node map with owning plugins
    Kinds {
        #[arg(long)]
        nodes: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = SchemaformConfig::load_from(&args.config);

    match args.command {
        Command::Validate {
            nodes,
            schema,
            data,
        } => {
            let ui = build_runtime(load_nodes(&nodes)?, config)?;
            let result = validate(&ui, &schema, &load_data(&data)?)?;
            print_json(&result)?;
            if !result.valid {
                warn!(errors = result.errors.len(), "Validation failed");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Render {
            nodes,
            schema,
            data,
            edit,
        } => {
            let ui = build_runtime(load_nodes(&nodes)?, config)?;
            let capability = if edit { Capability::Edit } else { Capability::View };
            print_json(&render(&ui, &schema, &load_data(&data)?, capability)?)?;
        }
        Command::Kinds { nodes } => {
            let ui = build_runtime(load_nodes(&nodes)?, config)?;
            print_json(&kinds(&ui))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
