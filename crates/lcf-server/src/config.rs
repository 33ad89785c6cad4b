//! Server configuration from the command line and environment.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Life Canvas Flow diagram API server
#[derive(Parser, Debug, Clone)]
#[command(name = "lcf-server")]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LCF_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// JSON snapshot file; diagrams are loaded from it at startup and
    /// written back after every change. In-memory only when unset.
    #[arg(long, env = "LCF_DATA_FILE")]
    pub data_file: Option<PathBuf>,
}
