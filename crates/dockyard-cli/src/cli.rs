use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dockyard",
    about = "Content-addressed blob store for image registries",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Registry configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store data on disk under this directory, overriding the configured storage
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file (or stdin) as a blob and print its digest
    Put(PutArgs),
    /// Check whether a blob is stored; exits 1 when it is not
    Exists(ExistsArgs),
    /// Write a stored blob to stdout
    Cat(CatArgs),
    /// Resolve a tag or digest in a repository to its manifest
    Resolve(ResolveArgs),
    /// Compute the digest of a file (or stdin) without storing it
    Digest(DigestArgs),
}

#[derive(Args)]
pub struct PutArgs {
    /// Input file; stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExistsArgs {
    pub digest: String,
}

#[derive(Args)]
pub struct CatArgs {
    pub digest: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Repository name, e.g. `library/alpine`
    pub repo: String,
    /// Tag or `<alg>:<hex>` digest
    pub reference: String,
}

#[derive(Args)]
pub struct DigestArgs {
    /// Input file; stdin when omitted
    pub file: Option<PathBuf>,
}
