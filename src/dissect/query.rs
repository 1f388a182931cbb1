//! Dissection of `q` (query) and `Q` (set) packets.

use std::sync::LazyLock;

use regex::Regex;

use crate::dissect::{hex_decode_bytes, hex_decode_text, skip_chars};

static XFER_READ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^qXfer:([^:]+):read:([^:]*):([0-9a-fA-F]+),([0-9a-fA-F]+)").unwrap()
});
static XFER_WRITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^qXfer:([^:]+):write:([^:]*):([0-9a-fA-F]+):").unwrap());

/// Dissect a `q` query by longest-prefix match against the query-name set.
pub(super) fn dissect_query(data: &str) -> String {
    if data.starts_with("qSupported") {
        qsupported(data)
    } else if data.starts_with("qXfer") {
        qxfer(data)
    } else if data.starts_with("qRcmd") {
        qrcmd(data)
    } else if data.starts_with("qC") {
        "Query current thread ID".to_string()
    } else if data.starts_with("qAttached") {
        let pid = skip_chars(data, 10);
        if pid.is_empty() {
            "Query if attached to existing process".to_string()
        } else {
            format!("Query if attached to process {pid}")
        }
    } else if data.starts_with("qOffsets") {
        "Query section offsets".to_string()
    } else if data.starts_with("qfThreadInfo") {
        "Query first thread info".to_string()
    } else if data.starts_with("qsThreadInfo") {
        "Query next thread info".to_string()
    } else if data.starts_with("qSymbol") {
        if data == "qSymbol::" {
            "Symbol lookup ready".to_string()
        } else {
            format!("Symbol query: {}", skip_chars(data, 8))
        }
    } else if data.starts_with("qTStatus") {
        "Query trace status".to_string()
    } else if data.starts_with("qRegisterInfo") {
        format!("Query register {} info", skip_chars(data, 13))
    } else if data.starts_with("qHostInfo") {
        "Query host info".to_string()
    } else if data.starts_with("qProcessInfo") {
        "Query process info".to_string()
    } else if data.starts_with("qMemoryRegionInfo") {
        format!("Query memory region at 0x{}", skip_chars(data, 18))
    } else if data.starts_with("qL") {
        "Query thread list".to_string()
    } else {
        format!("Query: {data}")
    }
}

/// Dissect a `Q` set packet.
pub(super) fn dissect_set(data: &str) -> String {
    if data.starts_with("QStartNoAckMode") {
        "Enable no-ack mode".to_string()
    } else if data.starts_with("QNonStop") {
        let value = skip_chars(data, 9);
        format!("Set non-stop mode: {}", enabled_disabled(value))
    } else if data.starts_with("QPassSignals") {
        let signals = skip_chars(data, 13);
        if signals.is_empty() {
            "Clear pass signals".to_string()
        } else {
            format!("Pass signals to program: {signals}")
        }
    } else if data.starts_with("QProgramSignals") {
        let signals = skip_chars(data, 16);
        if signals.is_empty() {
            "Clear program signals".to_string()
        } else {
            format!("Program signals: {signals}")
        }
    } else if data.starts_with("QThreadEvents") {
        let value = skip_chars(data, 14);
        format!("Thread events: {}", enabled_disabled(value))
    } else if data.starts_with("QCatchSyscalls") {
        let value = skip_chars(data, 15);
        if value == "0" {
            "Disable syscall catching".to_string()
        } else {
            format!("Catch syscalls: {value}")
        }
    } else if data.starts_with("QSetWorkingDir") {
        let dir_hex = skip_chars(data, 15);
        match (!dir_hex.is_empty()).then(|| hex_decode_text(dir_hex)).flatten() {
            Some(dirname) => format!("Set working directory: {dirname}"),
            None => "Clear working directory".to_string(),
        }
    } else if data.starts_with("QEnvironmentHexEncoded") {
        let env_hex = skip_chars(data, 23);
        match hex_decode_text(env_hex) {
            Some(env) => format!("Set environment: {env}"),
            None => format!("Set environment (hex): {env_hex}"),
        }
    } else if data.starts_with("QEnvironmentReset") {
        "Reset environment".to_string()
    } else if data.starts_with("QDisableRandomization") {
        let value = skip_chars(data, 22);
        let state = match value {
            "1" => "disabled",
            "0" => "enabled",
            other => other,
        };
        format!("ASLR: {state}")
    } else {
        format!("Set: {data}")
    }
}

fn enabled_disabled(value: &str) -> &str {
    match value {
        "1" => "enabled",
        "0" => "disabled",
        other => other,
    }
}

fn qsupported(data: &str) -> String {
    let features = skip_chars(data, 11);
    if features.is_empty() {
        return "Query supported features".to_string();
    }
    let list: Vec<&str> = features.split(';').collect();
    format!("Query supported features: {}", list.join(", "))
}

fn qxfer(data: &str) -> String {
    if let Some(captures) = XFER_READ.captures(data) {
        let object = xfer_object_label(&captures[1]);
        let annex = &captures[2];
        let (offset, length) = (&captures[3], &captures[4]);
        return if annex.is_empty() {
            format!("Read {object} (offset=0x{offset}, len=0x{length})")
        } else {
            format!("Read {object}:{annex} (offset=0x{offset}, len=0x{length})")
        };
    }
    if let Some(captures) = XFER_WRITE.captures(data) {
        return format!(
            "Write {}:{} at offset 0x{}",
            &captures[1], &captures[2], &captures[3]
        );
    }
    format!("Transfer: {}", skip_chars(data, 6))
}

/// Friendly names for well-known qXfer objects.
fn xfer_object_label(object: &str) -> &str {
    match object {
        "features" => "target features",
        "libraries" => "loaded libraries",
        "memory-map" => "memory map",
        "threads" => "thread info",
        "auxv" => "auxiliary vector",
        "exec-file" => "executable filename",
        "osdata" => "OS data",
        "siginfo" => "signal info",
        "spu" => "SPU data",
        "traceframe-info" => "traceframe info",
        other => other,
    }
}

fn qrcmd(data: &str) -> String {
    let command_hex = skip_chars(data, 6);
    match hex_decode_bytes(command_hex) {
        Some(bytes) if bytes.is_ascii() => {
            format!("Remote command: {}", String::from_utf8_lossy(&bytes))
        }
        _ => format!("Remote command (hex): {command_hex}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qsupported() {
        assert_eq!(dissect_query("qSupported"), "Query supported features");
        assert_eq!(
            dissect_query("qSupported:multiprocess+;swbreak+"),
            "Query supported features: multiprocess+, swbreak+"
        );
    }

    #[test]
    fn test_qxfer() {
        assert_eq!(
            dissect_query("qXfer:features:read:target.xml:0,fff"),
            "Read target features:target.xml (offset=0x0, len=0xfff)"
        );
        assert_eq!(
            dissect_query("qXfer:memory-map:read::0,400"),
            "Read memory map (offset=0x0, len=0x400)"
        );
        assert_eq!(
            dissect_query("qXfer:siginfo:write::0:abcd"),
            "Write siginfo: at offset 0x0"
        );
        assert_eq!(dissect_query("qXfer:junk"), "Transfer: junk");
    }

    #[test]
    fn test_qrcmd() {
        // "reset" hex-encoded
        assert_eq!(
            dissect_query("qRcmd,7265736574"),
            "Remote command: reset"
        );
        assert_eq!(
            dissect_query("qRcmd,zz"),
            "Remote command (hex): zz"
        );
    }

    #[test]
    fn test_thread_queries() {
        assert_eq!(dissect_query("qC"), "Query current thread ID");
        assert_eq!(dissect_query("qfThreadInfo"), "Query first thread info");
        assert_eq!(dissect_query("qsThreadInfo"), "Query next thread info");
        assert_eq!(dissect_query("qL1200"), "Query thread list");
    }

    #[test]
    fn test_misc_queries() {
        assert_eq!(
            dissect_query("qAttached"),
            "Query if attached to existing process"
        );
        assert_eq!(
            dissect_query("qAttached:a1"),
            "Query if attached to process a1"
        );
        assert_eq!(dissect_query("qOffsets"), "Query section offsets");
        assert_eq!(dissect_query("qSymbol::"), "Symbol lookup ready");
        assert_eq!(dissect_query("qSymbol:6d61696e"), "Symbol query: 6d61696e");
        assert_eq!(dissect_query("qTStatus"), "Query trace status");
        assert_eq!(dissect_query("qHostInfo"), "Query host info");
        assert_eq!(
            dissect_query("qMemoryRegionInfo:1000"),
            "Query memory region at 0x1000"
        );
        assert_eq!(dissect_query("qWeird"), "Query: qWeird");
    }

    #[test]
    fn test_set_packets() {
        assert_eq!(dissect_set("QStartNoAckMode"), "Enable no-ack mode");
        assert_eq!(dissect_set("QNonStop:1"), "Set non-stop mode: enabled");
        assert_eq!(dissect_set("QNonStop:0"), "Set non-stop mode: disabled");
        assert_eq!(dissect_set("QThreadEvents:1"), "Thread events: enabled");
        assert_eq!(dissect_set("QCatchSyscalls:0"), "Disable syscall catching");
        assert_eq!(dissect_set("QCatchSyscalls:1;5;6"), "Catch syscalls: 1;5;6");
        assert_eq!(
            dissect_set("QPassSignals:0e;0f"),
            "Pass signals to program: 0e;0f"
        );
        assert_eq!(dissect_set("QPassSignals:"), "Clear pass signals");
        assert_eq!(dissect_set("QEnvironmentReset"), "Reset environment");
        assert_eq!(dissect_set("QDisableRandomization:1"), "ASLR: disabled");
        assert_eq!(dissect_set("QWeird"), "Set: QWeird");
    }

    #[test]
    fn test_working_dir_and_environment() {
        // "/tmp" hex-encoded
        assert_eq!(
            dissect_set("QSetWorkingDir:2f746d70"),
            "Set working directory: /tmp"
        );
        assert_eq!(dissect_set("QSetWorkingDir:"), "Clear working directory");
        // "A=1" hex-encoded
        assert_eq!(
            dissect_set("QEnvironmentHexEncoded:413d31"),
            "Set environment: A=1"
        );
    }
}
