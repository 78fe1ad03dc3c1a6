//! Command-line flags.
//!
//! Every flag is optional; anything left out falls back to the environment
//! and then to the built-in defaults (see [`crate::config::ServerConfig`]).

use std::path::PathBuf;

use clap::Parser;

/// inventory-server - device inventory over HTTP
#[derive(Debug, Parser)]
#[command(name = "inventory-server")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Host name or address to listen on
    #[arg(short = 'h', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory for the inventory file and uploaded photos
    #[arg(short, long, value_name = "DIR")]
    pub cache: Option<PathBuf>,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    pub help: Option<bool>,
}
