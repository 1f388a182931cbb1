//! Per-session console and log-file output.

use std::fs::File;
use std::io::Write;
use std::sync::{LazyLock, Mutex};

use chrono::Local;
use regex::Regex;

use crate::dissect::Dissector;
use crate::protocol::{Frame, FrameKind};

/// ANSI color codes used for console output
pub(crate) mod color {
    pub const RESET: &str = "\x1b[0m";
    /// Client-to-server traffic
    pub const CYAN: &str = "\x1b[36m";
    /// Server-to-client traffic
    pub const YELLOW: &str = "\x1b[33m";
    /// Session lifecycle lines
    pub const GREEN: &str = "\x1b[32m";
    /// Error lines
    pub const RED: &str = "\x1b[31m";
    /// Dissection and raw-bytes lines
    pub const DIM: &str = "\x1b[2m";
    /// Child-process output prefixes
    pub const MAGENTA: &str = "\x1b[35m";
}

static ANSI_CODES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// Maximum hex chars shown on a verbose `Raw:` line before truncation
const RAW_EXCERPT_LIMIT: usize = 64;

/// Writes timestamped packet lines to stdout and, ANSI-stripped, to the
/// session's log file.
///
/// The console owns the session's dissector: both forwarding directions log
/// through the same instance, so a response is labeled against whichever
/// side's command was seen most recently. Each line is written atomically
/// (one `println!` per line), so cross-session interleaving stays readable.
pub struct Console {
    session_id: u64,
    verbose: bool,
    use_color: bool,
    inner: Mutex<ConsoleInner>,
}

struct ConsoleInner {
    dissector: Dissector,
    log_file: Option<File>,
}

impl Console {
    pub fn new(session_id: u64, verbose: bool, use_color: bool, log_file: Option<File>) -> Self {
        Self {
            session_id,
            verbose,
            use_color,
            inner: Mutex::new(ConsoleInner {
                dissector: Dissector::new(),
                log_file,
            }),
        }
    }

    fn paint(&self, code: &'static str) -> &'static str {
        if self.use_color {
            code
        } else {
            ""
        }
    }

    fn timestamp() -> String {
        Local::now().format("[%H:%M:%S%.3f]").to_string()
    }

    fn write_line(inner: &mut ConsoleInner, line: &str) {
        println!("{line}");
        if let Some(file) = inner.log_file.as_mut() {
            let _ = writeln!(file, "{}", strip_ansi(line));
            let _ = file.flush();
        }
    }

    pub fn session_started(&self, client_addr: &str, server_addr: &str) {
        let ts = Self::timestamp();
        let info = self.paint(color::GREEN);
        let reset = self.paint(color::RESET);
        let mut inner = self.inner.lock().unwrap();
        Self::write_line(
            &mut inner,
            &format!(
                "{ts} {info}Session {} started{reset}: server({server_addr}) <-> client({client_addr})",
                self.session_id
            ),
        );
    }

    pub fn session_ended(&self) {
        let ts = Self::timestamp();
        let info = self.paint(color::GREEN);
        let reset = self.paint(color::RESET);
        let mut inner = self.inner.lock().unwrap();
        Self::write_line(
            &mut inner,
            &format!("{ts} {info}Session {} ended{reset}", self.session_id),
        );
    }

    /// Log one parsed frame: raw wire form, then its dissection, then a
    /// verbose hex excerpt for packet frames.
    pub fn log_frame(&self, frame: &Frame, from_client: bool) {
        let ts = Self::timestamp();
        let reset = self.paint(color::RESET);
        let dim = self.paint(color::DIM);
        let (direction, dir_color) = if from_client {
            ("<--", self.paint(color::CYAN))
        } else {
            ("-->", self.paint(color::YELLOW))
        };

        let mut inner = self.inner.lock().unwrap();

        let mut dissection = inner.dissector.dissect(frame, !from_client);
        if !frame.valid_checksum {
            dissection.push_str(" [bad checksum]");
        }

        Self::write_line(
            &mut inner,
            &format!("{ts}   {dir_color}{direction}{reset} {}", frame.raw_text()),
        );
        Self::write_line(&mut inner, &format!("           {dim}{dissection}{reset}"));

        if self.verbose && frame.kind == FrameKind::Packet {
            let mut hex: String = frame.payload.iter().map(|b| format!("{b:02x}")).collect();
            if hex.len() > RAW_EXCERPT_LIMIT {
                hex.truncate(RAW_EXCERPT_LIMIT);
                hex.push_str("...");
            }
            Self::write_line(&mut inner, &format!("           {dim}Raw: {hex}{reset}"));
        }
    }

    pub fn log_error(&self, message: &str) {
        let ts = Self::timestamp();
        let error = self.paint(color::RED);
        let reset = self.paint(color::RESET);
        let mut inner = self.inner.lock().unwrap();
        Self::write_line(&mut inner, &format!("{ts} {error}Error:{reset} {message}"));
    }
}

/// Remove ANSI color sequences, for the plain-text log file.
pub(crate) fn strip_ansi(line: &str) -> String {
    ANSI_CODES.replace_all(line, "").into_owned()
}
