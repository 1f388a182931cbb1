//! Dissection of `v` packets (vCont, vFile, vFlash, ...).

use std::sync::LazyLock;

use regex::Regex;

use crate::dissect::{hex_decode_text, skip_chars};
use crate::protocol::constants::vcont_action;

static FLASH_ERASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vFlashErase:([0-9a-fA-F]+),([0-9a-fA-F]+)").unwrap());
static FLASH_WRITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vFlashWrite:([0-9a-fA-F]+):").unwrap());

/// Dissect a `v` packet by longest-prefix match.
pub(super) fn dissect(data: &str) -> String {
    if data == "vCont?" {
        "Query vCont support".to_string()
    } else if data.starts_with("vCont") {
        vcont(data)
    } else if data.starts_with("vKill") {
        let pid = skip_chars(data, 6);
        if pid.is_empty() {
            "Kill process".to_string()
        } else {
            format!("Kill process {pid}")
        }
    } else if data.starts_with("vRun") {
        format!("Run program: {}", skip_chars(data, 5))
    } else if data.starts_with("vAttach") {
        format!("Attach to process {}", skip_chars(data, 8))
    } else if data.starts_with("vStopped") {
        "Acknowledge stop notification".to_string()
    } else if data.starts_with("vMustReplyEmpty") {
        "Must reply empty (probe)".to_string()
    } else if data.starts_with("vFile:") {
        vfile(data)
    } else if data.starts_with("vFlashErase") {
        flash_erase(data)
    } else if data.starts_with("vFlashWrite") {
        flash_write(data)
    } else if data.starts_with("vFlashDone") {
        "Flash write complete".to_string()
    } else {
        format!("Extended command: {data}")
    }
}

fn vcont(data: &str) -> String {
    let actions = skip_chars(data, 6);
    if actions.is_empty() {
        return "vCont (no actions)".to_string();
    }
    let mut parts = Vec::new();
    for action in actions.split(';') {
        let (act, thread) = match action.split_once(':') {
            Some((act, thread)) => (act, Some(thread)),
            None => (action, None),
        };
        let name = match act.chars().next().and_then(vcont_action) {
            Some(name) => name.to_string(),
            None => act.to_string(),
        };
        match thread {
            Some(thread) if !thread.is_empty() => parts.push(format!("{name} thread {thread}")),
            _ => parts.push(name),
        }
    }
    format!("vCont: {}", parts.join(", "))
}

fn vfile(data: &str) -> String {
    let mut parts = data.splitn(3, ':');
    parts.next(); // "vFile"
    let Some(op) = parts.next() else {
        return format!("File operation: {data}");
    };
    let args = parts.next().unwrap_or("");

    match op {
        "setfs" => {
            let pid = if args.is_empty() { "0" } else { args };
            format!("Set file system to pid {pid}")
        }
        "open" => {
            // open:filename,flags,mode with a hex-encoded filename
            let mut open_parts = args.split(',');
            let filename_hex = open_parts.next().unwrap_or("");
            let filename =
                hex_decode_text(filename_hex).unwrap_or_else(|| filename_hex.to_string());
            let flags = open_parts.next().unwrap_or("?");
            let mode = open_parts.next().unwrap_or("?");
            format!("Open file: {filename} (flags=0x{flags}, mode=0o{mode})")
        }
        "close" => format!("Close file descriptor {args}"),
        "pread" => {
            // pread:fd,count,offset
            let pread_parts: Vec<&str> = args.split(',').collect();
            let parsed = (pread_parts.len() >= 3)
                .then(|| {
                    Some((
                        u64::from_str_radix(pread_parts[1], 16).ok()?,
                        u64::from_str_radix(pread_parts[2], 16).ok()?,
                    ))
                })
                .flatten();
            match parsed {
                Some((count, offset)) => {
                    format!(
                        "Read {count} bytes from fd {} at offset {offset}",
                        pread_parts[0]
                    )
                }
                None => format!("Read from file: {args}"),
            }
        }
        "pwrite" => {
            // pwrite:fd,offset,data; the data tail may itself contain commas
            let pwrite_parts: Vec<&str> = args.splitn(3, ',').collect();
            if pwrite_parts.len() >= 2 {
                format!(
                    "Write to fd {} at offset {}",
                    pwrite_parts[0], pwrite_parts[1]
                )
            } else {
                format!("Write to file: {args}")
            }
        }
        "fstat" => format!("Get file status for fd {args}"),
        "stat" => format!("Get file status: {}", hex_or_raw(args)),
        "unlink" => format!("Delete file: {}", hex_or_raw(args)),
        "readlink" => format!("Read symlink: {}", hex_or_raw(args)),
        "mkdir" => {
            let dirname = args.split(',').next().unwrap_or("");
            format!("Create directory: {}", hex_or_raw(dirname))
        }
        _ => format!("File operation {op}: {args}"),
    }
}

fn hex_or_raw(value: &str) -> String {
    hex_decode_text(value).unwrap_or_else(|| value.to_string())
}

fn flash_erase(data: &str) -> String {
    let parsed = FLASH_ERASE
        .captures(data)
        .and_then(|c| Some((u64::from_str_radix(&c[2], 16).ok()?, c.get(1)?.as_str().to_string())));
    match parsed {
        Some((length, addr)) => format!("Flash erase {length} bytes at 0x{addr}"),
        None => format!("Flash erase: {}", skip_chars(data, 12)),
    }
}

fn flash_write(data: &str) -> String {
    match FLASH_WRITE.captures(data) {
        Some(captures) => format!("Flash write at 0x{}", &captures[1]),
        None => format!("Flash write: {}", skip_chars(data, 12)),
    }
}
