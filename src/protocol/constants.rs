//! Protocol vocabulary for the GDB Remote Serial Protocol.

/// Special bytes on the wire
pub mod framing {
    /// Opens a regular packet
    pub const PACKET_START: u8 = b'$';

    /// Opens an asynchronous notification
    pub const NOTIFICATION_START: u8 = b'%';

    /// Ends the payload; followed by two hex checksum chars
    pub const PACKET_END: u8 = b'#';

    /// Standalone acknowledgement
    pub const ACK: u8 = b'+';

    /// Standalone negative acknowledgement
    pub const NACK: u8 = b'-';

    /// Standalone interrupt (Ctrl-C) byte
    pub const INTERRUPT: u8 = 0x03;

    /// Escape prefix; the following byte represents itself XOR 0x20
    pub const ESCAPE: u8 = b'}';

    /// XOR mask applied to escaped bytes
    pub const ESCAPE_XOR: u8 = 0x20;
}

/// POSIX signal names, indexed by signal number 1..=31.
const SIGNAL_NAMES: [&str; 31] = [
    "SIGHUP", "SIGINT", "SIGQUIT", "SIGILL", "SIGTRAP", "SIGABRT", "SIGBUS", "SIGFPE", "SIGKILL",
    "SIGUSR1", "SIGSEGV", "SIGUSR2", "SIGPIPE", "SIGALRM", "SIGTERM", "SIGSTKFLT", "SIGCHLD",
    "SIGCONT", "SIGSTOP", "SIGTSTP", "SIGTTIN", "SIGTTOU", "SIGURG", "SIGXCPU", "SIGXFSZ",
    "SIGVTALRM", "SIGPROF", "SIGWINCH", "SIGIO", "SIGPWR", "SIGSYS",
];

/// Name of a POSIX signal, if it has one.
pub fn signal_name(signal: u8) -> Option<&'static str> {
    SIGNAL_NAMES.get(signal.wrapping_sub(1) as usize).copied()
}

/// Signal name, or `signal <n>` for numbers outside the named range.
pub fn describe_signal(signal: u8) -> String {
    match signal_name(signal) {
        Some(name) => name.to_string(),
        None => format!("signal {signal}"),
    }
}

/// Breakpoint/watchpoint kinds used by the Z/z commands.
pub fn breakpoint_kind(kind: u8) -> Option<&'static str> {
    match kind {
        0 => Some("software breakpoint"),
        1 => Some("hardware breakpoint"),
        2 => Some("write watchpoint"),
        3 => Some("read watchpoint"),
        4 => Some("access watchpoint"),
        _ => None,
    }
}

/// vCont action names.
pub fn vcont_action(op: char) -> Option<&'static str> {
    match op {
        'c' => Some("continue"),
        'C' => Some("continue with signal"),
        's' => Some("step"),
        'S' => Some("step with signal"),
        't' => Some("stop"),
        'r' => Some("range step"),
        _ => None,
    }
}
