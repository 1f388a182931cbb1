//! Dissection of command packets (client to server).

use std::sync::LazyLock;

use regex::Regex;

use crate::dissect::{extended, query, skip_chars};
use crate::protocol::constants::{breakpoint_kind, describe_signal};

static READ_MEMORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^m([0-9a-fA-F]+),([0-9a-fA-F]+)").unwrap());
static WRITE_MEMORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^M([0-9a-fA-F]+),([0-9a-fA-F]+):").unwrap());
static READ_MEMORY_BINARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^x([0-9a-fA-F]+),([0-9a-fA-F]+)").unwrap());
static WRITE_MEMORY_BINARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^X([0-9a-fA-F]+),([0-9a-fA-F]+):").unwrap());
static WRITE_REGISTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^P([0-9a-fA-F]+)=([0-9a-fA-F]+)").unwrap());
static RESUME_SIGNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[CS]([0-9a-fA-F]{2})(?:;([0-9a-fA-F]+))?").unwrap());
static BREAKPOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Zz]([0-4]),([0-9a-fA-F]+),([0-9a-fA-F]+)").unwrap());

/// Dissect a command packet, dispatching on the command letter.
pub(super) fn dissect(data: &str) -> String {
    let Some(cmd) = data.chars().next() else {
        return "Empty command".to_string();
    };

    match cmd {
        'm' => read_memory(data),
        'M' => write_memory(data),
        'x' => read_memory_binary(data),
        'X' => write_memory_binary(data),
        'g' => "Read all registers".to_string(),
        'G' => format!("Write all registers ({} hex chars)", data.chars().count() - 1),
        'p' => read_register(data),
        'P' => write_register(data),
        'c' => resume(data, "Continue"),
        'C' => resume_signal(data, "Continue"),
        's' => resume(data, "Single step"),
        'S' => resume_signal(data, "Step"),
        'Z' => breakpoint(data, "Insert"),
        'z' => breakpoint(data, "Remove"),
        '?' => "Query halt reason".to_string(),
        'k' => "Kill target".to_string(),
        'D' => detach(data),
        '!' => "Enable extended mode".to_string(),
        'H' => set_thread(data),
        'T' => format!("Check if thread {} is alive", skip_chars(data, 1)),
        'R' => "Restart program".to_string(),
        'v' => extended::dissect(data),
        'q' => query::dissect_query(data),
        'Q' => query::dissect_set(data),
        _ => format!("Unknown command: {data}"),
    }
}

fn read_memory(data: &str) -> String {
    match parse_addr_length(&READ_MEMORY, data) {
        Some((addr, length)) => format!("Read {length} bytes from 0x{addr}"),
        None => format!("Read memory: {data}"),
    }
}

fn write_memory(data: &str) -> String {
    match parse_addr_length(&WRITE_MEMORY, data) {
        Some((addr, length)) => format!("Write {length} bytes to 0x{addr}"),
        None => format!("Write memory: {data}"),
    }
}

fn read_memory_binary(data: &str) -> String {
    match parse_addr_length(&READ_MEMORY_BINARY, data) {
        Some((addr, length)) => format!("Read {length} bytes (binary) from 0x{addr}"),
        None => format!("Read memory (binary): {data}"),
    }
}

fn write_memory_binary(data: &str) -> String {
    match parse_addr_length(&WRITE_MEMORY_BINARY, data) {
        Some((addr, length)) => format!("Write {length} bytes (binary) to 0x{addr}"),
        None => format!("Write memory (binary): {data}"),
    }
}

/// Capture `(address, decimal length)` from an `<addr>,<length>` command.
fn parse_addr_length<'a>(pattern: &Regex, data: &'a str) -> Option<(&'a str, u64)> {
    let captures = pattern.captures(data)?;
    let length = u64::from_str_radix(captures.get(2)?.as_str(), 16).ok()?;
    Some((captures.get(1)?.as_str(), length))
}

fn read_register(data: &str) -> String {
    let reg = skip_chars(data, 1);
    match u64::from_str_radix(reg, 16) {
        Ok(num) => format!("Read register {num}"),
        Err(_) => format!("Read register: {reg}"),
    }
}

fn write_register(data: &str) -> String {
    let parsed = WRITE_REGISTER
        .captures(data)
        .and_then(|c| Some((u64::from_str_radix(&c[1], 16).ok()?, c.get(2)?.as_str().to_string())));
    match parsed {
        Some((reg, value)) => format!("Write register {reg} = 0x{value}"),
        None => format!("Write register: {data}"),
    }
}

fn resume(data: &str, verb: &str) -> String {
    let addr = skip_chars(data, 1);
    if addr.is_empty() {
        verb.to_string()
    } else {
        format!("{verb} at 0x{addr}")
    }
}

fn resume_signal(data: &str, verb: &str) -> String {
    let parsed = RESUME_SIGNAL
        .captures(data)
        .and_then(|c| Some((u8::from_str_radix(&c[1], 16).ok()?, c.get(2))));
    match parsed {
        Some((signal, Some(addr))) => {
            format!("{verb} with {} at 0x{}", describe_signal(signal), addr.as_str())
        }
        Some((signal, None)) => format!("{verb} with {}", describe_signal(signal)),
        None => format!("{verb} with signal: {data}"),
    }
}

fn breakpoint(data: &str, verb: &str) -> String {
    match BREAKPOINT.captures(data) {
        Some(captures) => {
            let kind = captures[1].parse::<u8>().ok().and_then(breakpoint_kind);
            let name = match kind {
                Some(name) => name.to_string(),
                None => format!("type {}", &captures[1]),
            };
            format!("{verb} {name} at 0x{}", &captures[2])
        }
        None => format!("{verb} breakpoint: {data}"),
    }
}

fn detach(data: &str) -> String {
    let pid = skip_chars(data, 1);
    if pid.is_empty() {
        return "Detach".to_string();
    }
    let pid = pid.strip_prefix(';').unwrap_or(pid);
    format!("Detach from process {pid}")
}

fn set_thread(data: &str) -> String {
    let Some(op) = data.chars().nth(1) else {
        return format!("Set thread: {data}");
    };
    let op_name = match op {
        'g' => "general ops".to_string(),
        'c' => "continue ops".to_string(),
        other => other.to_string(),
    };
    let thread = skip_chars(data, 2);
    if thread == "-1" || thread == "0" {
        format!("Set thread for {op_name}: all threads")
    } else {
        format!("Set thread for {op_name}: {thread}")
    }
}
