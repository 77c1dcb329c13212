//! Server configuration, sourced from CLI flags (component J).

use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "sorng-ftpd",
    about = "Single-process FTP server exposing a local filesystem subtree"
)]
pub struct Cli {
    /// Address to bind the control-channel listener on.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: Ipv4Addr,

    /// Port to bind the control-channel listener on.
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Listen backlog for the control-channel socket.
    #[arg(long, default_value_t = 5)]
    pub backlog: u32,

    /// Directory exposed as the server's filesystem root ("/").
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Passive-mode port range, e.g. "5001-9999". Omit to let the OS
    /// assign an ephemeral port per PASV.
    #[arg(long, value_parser = parse_port_range)]
    pub pasv_port_range: Option<PortRange>,
}

#[derive(Debug, Clone, Copy)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

fn parse_port_range(s: &str) -> Result<PortRange, String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| "expected START-END, e.g. 5001-9999".to_string())?;
    let start: u16 = start.trim().parse().map_err(|_| "invalid start port".to_string())?;
    let end: u16 = end.trim().parse().map_err(|_| "invalid end port".to_string())?;
    if start > end {
        return Err("start port must be <= end port".to_string());
    }
    Ok(PortRange { start, end })
}

/// Server-wide settings derived from parsed CLI arguments. Kept separate
/// from `Cli` so the session engine depends on plain data, not on `clap`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: Ipv4Addr,
    pub port: u16,
    pub backlog: u32,
    pub root: PathBuf,
    pub pasv_port_range: Option<PortRange>,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            bind: cli.bind,
            port: cli.port,
            backlog: cli.backlog,
            root: cli.root,
            pasv_port_range: cli.pasv_port_range,
        }
    }
}
