//! A single proxied debugger connection.

use std::io::ErrorKind;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::Result;
use crate::protocol::PacketParser;
use crate::proxy::console::Console;

/// Bounded read size per socket read. Writes are flushed before the next
/// read, so a slow peer pushes back on the originating endpoint.
const READ_CHUNK: usize = 4096;

/// Manages one proxy session between a debugger client and the upstream
/// GDB server: connects upstream, then runs one forwarding task per
/// direction until either side closes.
pub struct Session {
    id: u64,
    client: TcpStream,
    server_addr: String,
    console: Arc<Console>,
}

impl Session {
    pub fn new(id: u64, client: TcpStream, server_addr: String, console: Arc<Console>) -> Self {
        Self {
            id,
            client,
            server_addr,
            console,
        }
    }

    /// Run the session to completion. Transport errors are logged and end
    /// the session; they never reach the accept loop.
    pub async fn run(self) {
        let Session {
            id,
            client,
            server_addr,
            console,
        } = self;

        let client_addr = client
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let server = match TcpStream::connect(&server_addr).await {
            Ok(server) => server,
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                console.log_error(&format!("Connection refused to {server_addr}"));
                console.session_ended();
                return;
            }
            Err(e) => {
                console.log_error(&format!("Session error: {e}"));
                console.session_ended();
                return;
            }
        };

        console.session_started(&client_addr, &server_addr);
        tracing::debug!(session = id, client = %client_addr, "session connected");

        let (client_rx, client_tx) = client.into_split();
        let (server_rx, server_tx) = server.into_split();

        // Either direction finishing (EOF or error) tears the session down;
        // select! drops the sibling, which closes both socket halves.
        tokio::select! {
            result = forward(client_rx, server_tx, Arc::clone(&console), true) => {
                report(&console, "Client->Server", result);
            }
            result = forward(server_rx, client_tx, Arc::clone(&console), false) => {
                report(&console, "Server->Client", result);
            }
        }

        tracing::debug!(session = id, "session closed");
        console.session_ended();
    }
}

/// Forward one direction: read a chunk, parse and log the frames it
/// completes, then write the same bytes verbatim to the other side.
///
/// Generic over the stream halves so tests can drive it with in-memory
/// pipes.
pub async fn forward<R, W>(
    mut rx: R,
    mut tx: W,
    console: Arc<Console>,
    from_client: bool,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut parser = PacketParser::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = rx.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        for frame in parser.feed(&buf[..n]) {
            if !frame.valid_checksum {
                tracing::warn!(from_client, "frame with invalid checksum");
            }
            console.log_frame(&frame, from_client);
        }
        tx.write_all(&buf[..n]).await?;
        tx.flush().await?;
    }
}

fn report(console: &Console, direction: &str, result: Result<()>) {
    if let Err(e) = result {
        console.log_error(&format!("{direction} error: {e}"));
    }
}
