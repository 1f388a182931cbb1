//! Command-line interface.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;

use crate::error::ProxyError;
use crate::proxy::ProxyConfig;

/// A validated `HOST:PORT` pair.
#[derive(Debug, Clone)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// clap value parser for `HOST:PORT` arguments. An empty host defaults to
/// `localhost`.
pub fn parse_host_port(value: &str) -> Result<HostPort, String> {
    let bad = || ProxyError::Address(value.to_string()).to_string();
    let (host, port_str) = value.rsplit_once(':').ok_or_else(bad)?;
    let port: u16 = port_str.parse().map_err(|_| bad())?;
    if port == 0 {
        return Err(bad());
    }
    let host = if host.is_empty() {
        "localhost".to_string()
    } else {
        host.to_string()
    };
    Ok(HostPort { host, port })
}

/// GDB Remote Serial Protocol proxy with packet dissection
#[derive(Parser, Debug)]
#[command(
    name = "gdbproxy",
    about = "GDB Remote Serial Protocol proxy with packet dissection",
    after_help = "Examples:\n  \
        gdbproxy -s localhost:1234\n  \
        gdbproxy -l 0.0.0.0:2345 -s 192.168.1.100:1234\n  \
        gdbproxy -s localhost:1234 -d ./logs -v\n  \
        gdbproxy -s localhost:1234 -- qemu-system-x86_64 -s -S disk.img"
)]
pub struct Cli {
    /// Listen address
    #[arg(
        short = 'l',
        long = "listen",
        value_name = "HOST:PORT",
        default_value = "localhost:1234",
        value_parser = parse_host_port
    )]
    pub listen: HostPort,

    /// GDB server address to forward to
    #[arg(
        short = 's',
        long = "server",
        value_name = "HOST:PORT",
        value_parser = parse_host_port
    )]
    pub server: HostPort,

    /// Directory for session log files
    #[arg(
        short = 'd',
        long = "log-dir",
        value_name = "DIR",
        default_value = "gdbproxy_logs"
    )]
    pub log_dir: PathBuf,

    /// Show raw packet bytes
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Command to run alongside the proxy; the proxy exits with its code
    #[arg(last = true, value_name = "CMD")]
    pub command: Vec<String>,
}

impl Cli {
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            listen_host: self.listen.host.clone(),
            listen_port: self.listen.port,
            server_host: self.server.host.clone(),
            server_port: self.server.port,
            verbose: self.verbose,
            use_color: !self.no_color,
            log_dir: Some(self.log_dir.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        let parsed = parse_host_port("localhost:1234").unwrap();
        assert_eq!(parsed.host, "localhost");
        assert_eq!(parsed.port, 1234);

        let parsed = parse_host_port("192.168.1.100:9999").unwrap();
        assert_eq!(parsed.host, "192.168.1.100");
        assert_eq!(parsed.port, 9999);
    }

    #[test]
    fn test_empty_host_defaults_to_localhost() {
        let parsed = parse_host_port(":2000").unwrap();
        assert_eq!(parsed.host, "localhost");
        assert_eq!(parsed.port, 2000);
    }

    #[test]
    fn test_invalid_host_port() {
        assert!(parse_host_port("no-port-here").is_err());
        assert!(parse_host_port("host:notaport").is_err());
        assert!(parse_host_port("host:0").is_err());
        assert!(parse_host_port("host:70000").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["gdbproxy", "-s", "localhost:5555", "-v", "--no-color"]);
        assert_eq!(cli.server.port, 5555);
        assert_eq!(cli.listen.port, 1234);
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert!(cli.command.is_empty());

        let config = cli.proxy_config();
        assert!(!config.use_color);
        assert_eq!(config.server_port, 5555);
        assert_eq!(config.log_dir, Some(PathBuf::from("gdbproxy_logs")));
    }

    #[test]
    fn test_cli_trailing_command() {
        let cli = Cli::parse_from([
            "gdbproxy",
            "-s",
            "localhost:5555",
            "--",
            "qemu-system-x86_64",
            "-s",
            "-S",
        ]);
        assert_eq!(cli.command, vec!["qemu-system-x86_64", "-s", "-S"]);
    }

    #[test]
    fn test_server_is_required() {
        assert!(Cli::try_parse_from(["gdbproxy"]).is_err());
    }
}
