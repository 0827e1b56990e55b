use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tierds",
    about = "Tiered content-addressed datastore: remote block store first, local flatfs second",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Datastore config file (TOML)
    #[arg(short, long, global = true, default_value = "tierds.toml")]
    pub config: PathBuf,

    /// Directory relative store paths are resolved against
    /// (defaults to the config file's directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Give up on a request after this many seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a block's bytes
    Get(GetArgs),
    /// Check whether a block exists
    Has(KeyArgs),
    /// Print a block's size in bytes
    Size(KeyArgs),
    /// Store a file as a block in the local tier
    Put(PutArgs),
    /// Print the on-disk spec of the configured store
    DiskSpec,
    /// Serve a flatfs directory over the HTTP block API
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct KeyArgs {
    /// Datastore key (`/CIQ...`) or CID
    pub key: String,
}

#[derive(Args)]
pub struct GetArgs {
    /// Datastore key (`/CIQ...`) or CID
    pub key: String,
    /// Write the block to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PutArgs {
    /// File to store
    pub file: PathBuf,
    /// Store under this key instead of the content's SHA2-256 block key
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Flatfs directory to serve
    pub store: PathBuf,
    #[arg(short, long, default_value = "127.0.0.1:5080")]
    pub bind: SocketAddr,
    #[arg(long, default_value = "/repo/flatfs/shard/v1/next-to-last/2")]
    pub shard_func: String,
    /// Do not fsync writes
    #[arg(long)]
    pub no_sync: bool,
}
