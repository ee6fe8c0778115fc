use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tether",
    about = "Tether -- map object graphs to RDF triple stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Mapper configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a sample mapping session and dump the resulting store
    Demo(DemoArgs),
    /// Print the effective mapper configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DemoArgs {
    /// Number of people in the sample graph
    #[arg(short = 'n', long, default_value = "3")]
    pub people: usize,
    /// Write the N-Triples dump here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Synthesize Uris instead of using anonymous nodes
    #[arg(long)]
    pub no_blank_nodes: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the built-in defaults, ignoring --config
    #[arg(long)]
    pub defaults: bool,
}
