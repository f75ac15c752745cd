//! CLI argument definitions for the Parley binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parley chat demo
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Parley: chat between peers over a replicated key-value store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a local network of peers for the chat demo
    Testnet(TestnetArgs),
    /// Open the terminal chat client
    Chat(ChatArgs),
}

/// Arguments for the testnet command
#[derive(clap::Args, Debug)]
pub struct TestnetArgs {
    /// Number of peers to start
    #[arg(short = 'n', long, default_value_t = 2, env = "PARLEY_PEERS")]
    pub peers: usize,

    /// Directed link FROM:TO; peer FROM dials peer TO. May be repeated.
    #[arg(long = "link", value_parser = parse_link, default_values_t = vec![Link { from: 0, to: 1 }])]
    pub links: Vec<Link>,

    /// Bind address for every peer
    #[arg(long, default_value = parley::constants::DEFAULT_PEER_HOST, env = "PARLEY_HOST")]
    pub host: String,

    /// Port of peer 0; peer N listens on PORT_BASE + N
    #[arg(long, default_value_t = parley::constants::DEFAULT_PORT_BASE, env = "PARLEY_PORT_BASE")]
    pub port_base: u16,
}

/// Arguments for the chat command
#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    /// Page-style URL whose `peer=<digit>` query picks the peer to dial,
    /// e.g. "http://localhost:1234/?peer=0"
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Peer to dial (overrides URL)
    #[arg(short, long, env = "PARLEY_PEER")]
    pub peer: Option<String>,

    /// Host the test network peers listen on
    #[arg(long, default_value = parley::constants::DEFAULT_PEER_HOST, env = "PARLEY_HOST")]
    pub host: String,

    /// Port of test network peer 0
    #[arg(long, default_value_t = parley::constants::DEFAULT_PORT_BASE, env = "PARLEY_PORT_BASE")]
    pub port_base: u16,

    /// Persist the local store to this JSON file
    #[arg(short = 'D', long, env = "PARLEY_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Write debug logs to this file (the terminal is taken by the UI)
    #[arg(long, env = "PARLEY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// A directed edge in the test network topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub from: usize,
    pub to: usize,
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

fn parse_link(s: &str) -> Result<Link, String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{s}'"))?;
    let from = from
        .trim()
        .parse()
        .map_err(|e| format!("invalid FROM in '{s}': {e}"))?;
    let to = to
        .trim()
        .parse()
        .map_err(|e| format!("invalid TO in '{s}': {e}"))?;
    Ok(Link { from, to })
}
