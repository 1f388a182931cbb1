use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gdbproxy::cli::Cli;
use gdbproxy::proxy::{run_child, ProxyServer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics go to stderr; packet output owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let use_color = !cli.no_color;
    let server = ProxyServer::new(cli.proxy_config());

    let code = if cli.command.is_empty() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                0
            }
            result = server.run() => fail(result.map(|_| 0)),
        }
    } else {
        // Child form: the proxy runs until the child exits and adopts its
        // exit code.
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                0
            }
            result = run_child(&cli.command, use_color) => fail(result),
            result = server.run() => fail(result.map(|_| 0)),
        }
    };

    ExitCode::from(code.clamp(0, 255) as u8)
}

fn fail(result: gdbproxy::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}
