//! TCP proxy shell: accept loop, per-session forwarding tasks, console
//! output, log files, and optional child-process supervision.

pub mod child;
pub mod console;
pub mod session;

// Re-export commonly used items
pub use child::run_child;
pub use console::Console;
pub use session::Session;

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::net::TcpListener;

use crate::error::Result;

/// Runtime settings for the proxy, assembled from the CLI.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen_host: String,
    pub listen_port: u16,
    pub server_host: String,
    pub server_port: u16,
    pub verbose: bool,
    pub use_color: bool,
    /// Session log files land here; `None` disables file logging
    pub log_dir: Option<PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_host: "localhost".to_string(),
            listen_port: 1234,
            server_host: "localhost".to_string(),
            server_port: 1234,
            verbose: false,
            use_color: true,
            log_dir: None,
        }
    }
}

/// GDB RSP proxy server: accepts debugger connections and spawns a
/// [`Session`] task per connection.
pub struct ProxyServer {
    config: ProxyConfig,
}

impl ProxyServer {
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }

    /// Bind the listen address and serve until the task is cancelled.
    ///
    /// Session errors never propagate here; only bind/accept failures do.
    pub async fn run(&self) -> Result<()> {
        let listener =
            TcpListener::bind((self.config.listen_host.as_str(), self.config.listen_port)).await?;
        let local_addr = listener.local_addr()?;
        println!("GDB proxy listening on {local_addr}");
        println!(
            "Forwarding to {}:{}",
            self.config.server_host, self.config.server_port
        );
        println!();

        let mut session_counter: u64 = 0;
        loop {
            let (socket, peer) = listener.accept().await?;
            session_counter += 1;
            let session_id = session_counter;
            tracing::debug!(session = session_id, client = %peer, "accepted connection");

            let log_file = match self.open_log_file(session_id) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(session = session_id, "cannot open session log: {e}");
                    None
                }
            };
            let console = Arc::new(Console::new(
                session_id,
                self.config.verbose,
                self.config.use_color,
                log_file,
            ));
            let server_addr = format!("{}:{}", self.config.server_host, self.config.server_port);

            tokio::spawn(Session::new(session_id, socket, server_addr, console).run());
        }
    }

    /// Create `<log_dir>/session_<id>_<timestamp>.log`, making the
    /// directory (with a catch-all `.gitignore`) on first use.
    fn open_log_file(&self, session_id: u64) -> Result<Option<File>> {
        let Some(dir) = self.config.log_dir.as_ref() else {
            return Ok(None);
        };
        fs::create_dir_all(dir)?;

        let gitignore = dir.join(".gitignore");
        if !gitignore.exists() {
            fs::write(&gitignore, "*\n")?;
        }

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("session_{session_id}_{stamp}.log"));
        Ok(Some(File::create(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.listen_host, "localhost");
        assert_eq!(config.listen_port, 1234);
        assert!(config.use_color);
        assert!(config.log_dir.is_none());
    }
}
