use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Copies files to or from a remote host over the SCP protocol
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Remote host name or address
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Remote SSH port
    #[arg(short, long, default_value = "22")]
    pub port: u16,

    /// Username for password authentication
    #[arg(short, long)]
    pub username: String,

    /// Password for password authentication
    #[arg(long)]
    pub password: String,

    /// Expected server key fingerprint, e.g. `SHA256:...`
    #[arg(long)]
    pub host_key_fingerprint: Option<String>,

    /// Seconds without traffic before the connection is dropped
    #[arg(long, default_value = "60")]
    pub inactivity_timeout: u64,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one local file to a remote location
    Push {
        local_file: PathBuf,
        remote_location: String,
    },
    /// Fetch a remote file into a local directory
    Pull {
        remote_path: String,
        local_dir: PathBuf,
    },
}
