//! Supervision of the optional child process (`-- CMD ARGS...` form).

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::Result;
use crate::proxy::console::color;

/// Spawn the child command with piped stdio, forward its output
/// line-by-line to the console, and return its exit code.
pub async fn run_child(command: &[String], use_color: bool) -> Result<i32> {
    let (magenta, reset) = prefix_colors(use_color);
    println!("{magenta}[cmd]{reset} Starting: {}", command.join(" "));
    println!();

    let mut child = Command::new(&command[0])
        .args(&command[1..])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let out_task = tokio::spawn(forward_lines(child.stdout.take(), "out", use_color));
    let err_task = tokio::spawn(forward_lines(child.stderr.take(), "err", use_color));

    let status = child.wait().await?;
    let _ = out_task.await;
    let _ = err_task.await;

    tracing::debug!(code = ?status.code(), "child process exited");
    // No code means the child died on a signal
    Ok(status.code().unwrap_or(1))
}

async fn forward_lines<R>(stream: Option<R>, prefix: &'static str, use_color: bool)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let (magenta, reset) = prefix_colors(use_color);
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        println!("{magenta}[{prefix}]{reset} {line}");
    }
}

fn prefix_colors(use_color: bool) -> (&'static str, &'static str) {
    if use_color {
        (color::MAGENTA, color::RESET)
    } else {
        ("", "")
    }
}
