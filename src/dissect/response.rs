//! Dissection of response packets (server to client), dispatching on the
//! payload shape and the remembered command.

use std::sync::LazyLock;

use regex::Regex;

use crate::dissect::{hex_decode_text, skip_chars, stop};
use crate::protocol::constants::describe_signal;

/// One thread id (`p1.1` / `1a`), or a comma-separated list of them, as
/// produced by qfThreadInfo `m` replies.
static THREAD_ID_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^p?[0-9a-fA-F]+(\.[0-9a-fA-F]+)?(,p?[0-9a-fA-F]+(\.[0-9a-fA-F]+)?)*$").unwrap()
});
static XML_ROOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(\w+)[\s>]").unwrap());
static KEY_VALUE_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+[:=]").unwrap());

/// Dissect a response; ordered checks, first match wins.
pub(super) fn dissect(data: &str, last_command: Option<&str>) -> String {
    if data == "OK" {
        return "OK".to_string();
    }
    if data == "l" {
        return "End of list".to_string();
    }
    if let Some(rest) = data.strip_prefix('l') {
        // qXfer final chunk: l<data>
        return qxfer_chunk(rest, true);
    }
    if let Some(rest) = data.strip_prefix('m') {
        if !rest.is_empty() {
            // Either a thread-id list or a qXfer partial chunk
            if THREAD_ID_LIST.is_match(rest) {
                return thread_ids(rest);
            }
            return qxfer_chunk(rest, false);
        }
    }
    if data.starts_with('E') {
        return error_reply(data);
    }
    if data.starts_with('S') || data.starts_with('T') {
        return stop::dissect(data);
    }
    if data.starts_with('W') {
        return exit_reply(data);
    }
    if data.starts_with('X') {
        return terminate_reply(data);
    }
    if data.starts_with('O') {
        return console_output(data);
    }
    if data.starts_with('F') {
        return file_io_reply(data);
    }
    if data.starts_with('b') {
        return binary_memory(data);
    }
    if let Some(thread) = data.strip_prefix("QC") {
        return format!("Current thread: {thread}");
    }
    if data.starts_with("vCont") {
        return vcont_actions(data);
    }
    if data.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex_data(data, last_command);
    }
    if is_rle_hex(data) {
        return rle_hex_data(data, last_command);
    }
    if is_key_value(data) {
        return key_value(data);
    }
    format!("Response: {data}")
}

/// First `n` chars of `data` (the whole string when shorter).
fn take_chars(data: &str, n: usize) -> &str {
    match data.char_indices().nth(n) {
        Some((i, _)) => &data[..i],
        None => data,
    }
}

fn error_reply(data: &str) -> String {
    let code = take_chars(skip_chars(data, 1), 2);
    match u8::from_str_radix(code, 16) {
        Ok(num) => format!("Error {num}"),
        Err(_) => format!("Error: {data}"),
    }
}

fn exit_reply(data: &str) -> String {
    match u32::from_str_radix(skip_chars(data, 1), 16) {
        Ok(code) => format!("Process exited with code {code}"),
        Err(_) => format!("Process exited: {data}"),
    }
}

fn terminate_reply(data: &str) -> String {
    let sig = take_chars(skip_chars(data, 1), 2);
    match u8::from_str_radix(sig, 16) {
        Ok(num) => format!("Process terminated by {}", describe_signal(num)),
        Err(_) => format!("Process terminated: {data}"),
    }
}

fn console_output(data: &str) -> String {
    let output_hex = skip_chars(data, 1);
    match hex_decode_text(output_hex) {
        Some(output) => format!("Console: {output}"),
        None => format!("Console output (hex): {output_hex}"),
    }
}

/// `F<result>[,errno][;data]`; `F-1,<errno>` is the error form.
fn file_io_reply(data: &str) -> String {
    if data.starts_with("F-1") {
        let rest = skip_chars(data, 1);
        let mut parts = rest.split(',');
        parts.next(); // "-1"
        return match parts.next() {
            Some(errno_part) => {
                let errno = errno_part.split(';').next().unwrap_or(errno_part);
                format!("File error: errno {errno}")
            }
            None => "File error".to_string(),
        };
    }

    let rest = skip_chars(data, 1);
    let (result_part, file_data) = match rest.split_once(';') {
        Some((result, file_data)) => (result, Some(file_data)),
        None => (rest, None),
    };
    let result = result_part.split(',').next().unwrap_or("?");
    match i64::from_str_radix(result, 16) {
        Ok(num) => match file_data {
            Some(file_data) => format!("File result: {num}{}", describe_file_data(file_data, num)),
            None => format!("File result: {num}"),
        },
        Err(_) => format!("File result: {result}"),
    }
}

fn describe_file_data(file_data: &str, byte_count: i64) -> String {
    if file_data.is_empty() {
        return String::new();
    }
    if file_data.starts_with("MZ") {
        return " (PE header)".to_string();
    }
    if file_data.starts_with("\u{7f}ELF") {
        return " (ELF header)".to_string();
    }
    if byte_count > 0 {
        return format!(" ({byte_count} bytes)");
    }
    String::new()
}

/// Binary memory read response: `b` followed by escaped binary data.
fn binary_memory(data: &str) -> String {
    let body: Vec<char> = skip_chars(data, 1).chars().collect();
    let mut byte_count = 0usize;
    let mut i = 0;
    while i < body.len() {
        // An escape pair transports one byte
        if body[i] == '}' && i + 1 < body.len() {
            byte_count += 1;
            i += 2;
        } else {
            byte_count += 1;
            i += 1;
        }
    }
    format!("Binary data: {byte_count} bytes")
}

/// vCont? response listing supported actions.
fn vcont_actions(data: &str) -> String {
    if data == "vCont" {
        return "vCont supported (no actions listed)".to_string();
    }
    let actions = match data.strip_prefix("vCont;") {
        Some(rest) => rest,
        None => skip_chars(data, 5),
    };
    let mut descriptions = Vec::new();
    if !actions.is_empty() {
        for action in actions.split(';') {
            let name = match action {
                "c" => "continue",
                "C" => "continue with signal",
                "s" => "step",
                "S" => "step with signal",
                "t" => "stop",
                "r" => "range step",
                other => other,
            };
            descriptions.push(name.to_string());
        }
    }
    format!("vCont supported: {}", descriptions.join(", "))
}

fn qxfer_chunk(data: &str, final_chunk: bool) -> String {
    let status = if final_chunk { "final" } else { "partial" };
    let char_count = data.chars().count();
    let trimmed = data.trim_start();
    if trimmed.starts_with("<?xml") || trimmed.starts_with('<') {
        if let Some(captures) = XML_ROOT.captures(data) {
            return format!("XML data ({status}): <{}> ({char_count} bytes)", &captures[1]);
        }
        return format!("XML data ({status}): {char_count} bytes");
    }
    format!("Transfer data ({status}): {char_count} bytes")
}

fn thread_ids(data: &str) -> String {
    if data.contains(',') {
        let threads: Vec<&str> = data.split(',').collect();
        format!("Threads: {}", threads.join(", "))
    } else {
        format!("Thread: {data}")
    }
}

/// Plain hex blob, labeled from the remembered command.
fn hex_data(data: &str, last_command: Option<&str>) -> String {
    let label = context_label(last_command);
    let byte_count = data.len() / 2;
    if byte_count <= 16 {
        let spaced: Vec<&str> = data
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or(""))
            .collect();
        return format!("{label}: {}", spaced.join(" "));
    }
    format!("{label}: {byte_count} bytes")
}

fn context_label(last_command: Option<&str>) -> &'static str {
    match last_command.and_then(|command| command.chars().next()) {
        Some('g') => "Registers",
        Some('m') | Some('x') => "Memory",
        Some('p') => "Register value",
        _ => "Data",
    }
}

/// RLE-encoded hex: hex digits interleaved with `*<c>` repeats where `c`
/// is printable ASCII (32..=126).
fn is_rle_hex(data: &str) -> bool {
    if !data.contains('*') {
        return false;
    }
    let chars: Vec<char> = data.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_hexdigit() {
            i += 1;
        } else if chars[i] == '*' && i + 1 < chars.len() {
            if (' '..='~').contains(&chars[i + 1]) {
                i += 2;
            } else {
                return false;
            }
        } else {
            return false;
        }
    }
    true
}

/// Approximate decoded size of RLE hex data: a data char followed by `*<c>`
/// expands to `c - 29` chars; byte count is half the expanded length.
fn rle_hex_data(data: &str, last_command: Option<&str>) -> String {
    let chars: Vec<char> = data.chars().collect();
    let mut decoded_len = 0usize;
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() && chars[i + 1] == '*' {
            if i + 2 < chars.len() {
                decoded_len += (chars[i + 2] as usize).saturating_sub(29);
                i += 3;
            } else {
                decoded_len += 1;
                i += 1;
            }
        } else if chars[i] == '*' {
            i += 2;
        } else {
            decoded_len += 1;
            i += 1;
        }
    }
    let byte_count = decoded_len / 2;
    format!("{}: {byte_count} bytes", context_label(last_command))
}

fn is_key_value(data: &str) -> bool {
    if !data.contains(':') && !data.contains(';') {
        return false;
    }
    // RLE data also carries ';'-free '*' runs; never treat it as key/value
    if data.contains('*') {
        return false;
    }
    KEY_VALUE_SHAPE.is_match(data)
}

fn key_value(data: &str) -> String {
    let mut pairs = Vec::new();
    for item in data.split([';', ',']) {
        match item.split_once(':') {
            Some((key, value)) => pairs.push(format!("{key}={value}")),
            None => pairs.push(item.to_string()),
        }
    }
    format!("Features: {}", pairs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_replies() {
        assert_eq!(dissect("OK", None), "OK");
        assert_eq!(dissect("l", None), "End of list");
    }

    #[test]
    fn test_error_replies() {
        assert_eq!(dissect("E01", None), "Error 1");
        assert_eq!(dissect("Eff", None), "Error 255");
        assert_eq!(dissect("E1", None), "Error 1");
        assert_eq!(dissect("Ezz", None), "Error: Ezz");
    }

    #[test]
    fn test_process_exit_replies() {
        assert_eq!(dissect("W00", None), "Process exited with code 0");
        assert_eq!(dissect("W2a", None), "Process exited with code 42");
        assert_eq!(dissect("X09", None), "Process terminated by SIGKILL");
        assert_eq!(dissect("X0b", None), "Process terminated by SIGSEGV");
    }

    #[test]
    fn test_console_output() {
        // "hi\n" hex-encoded
        assert_eq!(dissect("O68690a", None), "Console: hi\n");
        assert_eq!(dissect("Ozz", None), "Console output (hex): zz");
    }

    #[test]
    fn test_file_io_replies() {
        assert_eq!(dissect("F-1,2", None), "File error: errno 2");
        assert_eq!(dissect("F0", None), "File result: 0");
        assert_eq!(dissect("F10;xxxx", None), "File result: 16 (16 bytes)");
        assert_eq!(dissect("F2;MZxxx", None), "File result: 2 (PE header)");
        assert_eq!(dissect("F4;\u{7f}ELF", None), "File result: 4 (ELF header)");
    }

    #[test]
    fn test_binary_memory() {
        assert_eq!(dissect("babcd", None), "Binary data: 4 bytes");
        // }X counts as one transported byte
        assert_eq!(dissect("bab}Xcd", None), "Binary data: 5 bytes");
    }

    #[test]
    fn test_current_thread() {
        assert_eq!(dissect("QCp1.1", None), "Current thread: p1.1");
    }

    #[test]
    fn test_vcont_actions() {
        assert_eq!(
            dissect("vCont;c;C;s;S", None),
            "vCont supported: continue, continue with signal, step, step with signal"
        );
        assert_eq!(
            dissect("vCont", None),
            "vCont supported (no actions listed)"
        );
    }

    #[test]
    fn test_hex_data_with_context() {
        assert_eq!(dissect("0011aabb", None), "Data: 00 11 aa bb");
        assert_eq!(dissect("0011aabb", Some("g")), "Registers: 00 11 aa bb");
        assert_eq!(dissect("0011aabb", Some("m1000,4")), "Memory: 00 11 aa bb");
        assert_eq!(
            dissect("0011aabb", Some("p10")),
            "Register value: 00 11 aa bb"
        );
        let long = "00".repeat(24);
        assert_eq!(dissect(&long, Some("g")), "Registers: 24 bytes");
    }

    #[test]
    fn test_rle_hex_data() {
        // 8 literal chars + run of 5 + 8 literal chars = 20 chars = 10 bytes
        assert_eq!(
            dissect("00000000*\"00000000", Some("g")),
            "Registers: 10 bytes"
        );
        assert_eq!(dissect("ff*!00", None), "Data: 3 bytes");
    }

    #[test]
    fn test_key_value_features() {
        assert_eq!(
            dissect("PacketSize=1000;qXfer:features:read+", None),
            "Features: PacketSize=1000, qXfer=features:read+"
        );
    }

    #[test]
    fn test_qxfer_chunks() {
        assert_eq!(
            dissect("l<target><xi:include href=\"i386.xml\"/></target>", None),
            "XML data (final): <target> (46 bytes)"
        );
        assert_eq!(dissect("mAAAABBBB~~~~", None), "Transfer data (partial): 12 bytes");
        assert_eq!(dissect("labcdef", None), "Transfer data (final): 6 bytes");
    }

    #[test]
    fn test_thread_id_lists() {
        assert_eq!(dissect("mp01.01", None), "Thread: p01.01");
        assert_eq!(dissect("m1a", None), "Thread: 1a");
        assert_eq!(
            dissect("mp01.01,p01.02", None),
            "Threads: p01.01, p01.02"
        );
    }

    #[test]
    fn test_fallback() {
        assert_eq!(dissect("!!weird!!", None), "Response: !!weird!!");
    }
}
