//! Dissection of stop replies (`S`/`T` responses).

use crate::dissect::{hex_decode_text, skip_chars};
use crate::protocol::constants::describe_signal;

/// Dissect an `S<sig>` or `T<sig>{key:value;}*` stop reply.
pub(super) fn dissect(data: &str) -> String {
    let signal = data
        .get(1..3)
        .and_then(|sig| u8::from_str_radix(sig, 16).ok());
    let Some(signal) = signal else {
        return format!("Stop reply: {data}");
    };

    if data.starts_with('S') {
        return format!("Stopped: {}", describe_signal(signal));
    }

    let extra = skip_chars(data, 3);
    if !extra.is_empty() {
        let details = parse_details(extra);
        if !details.is_empty() {
            return format!("Stopped: {} ({details})", describe_signal(signal));
        }
    }
    format!("Stopped: {}", describe_signal(signal))
}

/// Parse the `key:value;` pairs of a T stop reply into a summary, assembled
/// as stop reason, thread, then extras.
fn parse_details(extra: &str) -> String {
    let mut extras = Vec::new();
    let mut thread_id = None;
    let mut stop_reason: Option<String> = None;

    for item in extra.trim_end_matches(';').split(';') {
        if item.is_empty() {
            continue;
        }
        let Some((key, value)) = item.split_once(':') else {
            extras.push(item.to_string());
            continue;
        };
        let key_lower = key.to_lowercase();
        match key_lower.as_str() {
            "thread" => thread_id = Some(value.to_string()),
            "watch" => stop_reason = Some(format!("write watchpoint at 0x{value}")),
            "rwatch" => stop_reason = Some(format!("read watchpoint at 0x{value}")),
            "awatch" => stop_reason = Some(format!("access watchpoint at 0x{value}")),
            "swbreak" => stop_reason = Some("software breakpoint".to_string()),
            "hwbreak" => stop_reason = Some("hardware breakpoint".to_string()),
            "library" => stop_reason = Some("library event".to_string()),
            "fork" => stop_reason = Some(format!("fork (child={value})")),
            "vfork" => stop_reason = Some(format!("vfork (child={value})")),
            "vforkdone" => stop_reason = Some("vfork done".to_string()),
            "exec" => {
                let name = hex_decode_text(value).unwrap_or_else(|| value.to_string());
                stop_reason = Some(format!("exec ({name})"));
            }
            "create" => stop_reason = Some("thread created".to_string()),
            "core" => extras.push(format!("core {value}")),
            key if is_register_key(key) => {
                // Raw register values are too noisy for a summary line
            }
            _ => extras.push(format!("{key}={value}")),
        }
    }

    let mut parts = Vec::new();
    if let Some(reason) = stop_reason {
        parts.push(reason);
    }
    if let Some(thread) = thread_id {
        parts.push(format!("thread {thread}"));
    }
    parts.extend(extras);
    parts.join(", ")
}

/// Register-number keys are 1-2 lowercase hex digits.
fn is_register_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 2
        && key
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_signal_stop() {
        assert_eq!(dissect("S05"), "Stopped: SIGTRAP");
        assert_eq!(dissect("S0b"), "Stopped: SIGSEGV");
        assert_eq!(dissect("T05"), "Stopped: SIGTRAP");
    }

    #[test]
    fn test_thread_and_registers() {
        // Register values are suppressed; the thread id survives
        assert_eq!(
            dissect("T05thread:p01.01;06:0000000000000000;"),
            "Stopped: SIGTRAP (thread p01.01)"
        );
    }

    #[test]
    fn test_watchpoints_and_breakpoints() {
        assert_eq!(
            dissect("T05watch:7fff0000;thread:1;"),
            "Stopped: SIGTRAP (write watchpoint at 0x7fff0000, thread 1)"
        );
        assert_eq!(
            dissect("T05rwatch:1000;"),
            "Stopped: SIGTRAP (read watchpoint at 0x1000)"
        );
        assert_eq!(
            dissect("T05swbreak:;"),
            "Stopped: SIGTRAP (software breakpoint)"
        );
        assert_eq!(
            dissect("T05hwbreak:;thread:2"),
            "Stopped: SIGTRAP (hardware breakpoint, thread 2)"
        );
    }

    #[test]
    fn test_process_events() {
        assert_eq!(
            dissect("T05fork:p2.1;"),
            "Stopped: SIGTRAP (fork (child=p2.1))"
        );
        assert_eq!(dissect("T05vforkdone:;"), "Stopped: SIGTRAP (vfork done)");
        // "/bin/ls" hex-encoded
        assert_eq!(
            dissect("T05exec:2f62696e2f6c73;"),
            "Stopped: SIGTRAP (exec (/bin/ls))"
        );
        assert_eq!(
            dissect("T05create:;"),
            "Stopped: SIGTRAP (thread created)"
        );
    }

    #[test]
    fn test_core_and_unknown_keys() {
        assert_eq!(
            dissect("T05thread:1;core:2;"),
            "Stopped: SIGTRAP (thread 1, core 2)"
        );
        assert_eq!(
            dissect("T05custom:abc;"),
            "Stopped: SIGTRAP (custom=abc)"
        );
    }

    #[test]
    fn test_malformed_signal_falls_back() {
        assert_eq!(dissect("Txy"), "Stop reply: Txy");
        assert_eq!(dissect("T"), "Stop reply: T");
    }

    #[test]
    fn test_register_key_detection() {
        assert!(is_register_key("06"));
        assert!(is_register_key("a"));
        assert!(is_register_key("1f"));
        assert!(!is_register_key("thread"));
        assert!(!is_register_key("0x2"));
        assert!(!is_register_key(""));
    }
}
