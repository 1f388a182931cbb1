//! Human-readable dissection of RSP frames.
//!
//! [`Dissector`] translates frame payloads into one-line descriptions,
//! dispatching on command letter, query name, and response shape. It keeps
//! a one-slot memory of the last command so register/memory response blobs
//! can be labeled in context.

mod command;
mod extended;
mod query;
mod response;
mod stop;

use crate::protocol::{Frame, FrameKind};

/// Dissects RSP frames into human-readable descriptions.
///
/// Total over every input: any payload yields a non-empty string, falling
/// back to generic labels for unrecognized patterns.
#[derive(Debug, Default)]
pub struct Dissector {
    /// Payload of the most recent command, used to label response blobs.
    /// Updated only on commands, never on responses.
    last_command: Option<String>,
}

impl Dissector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe one frame. `is_response` marks server-to-client packets,
    /// which are interpreted against the remembered command.
    pub fn dissect(&mut self, frame: &Frame, is_response: bool) -> String {
        match frame.kind {
            FrameKind::Ack => "ACK".to_string(),
            FrameKind::Nack => "NACK (request retransmission)".to_string(),
            FrameKind::Interrupt => "Interrupt (Ctrl-C)".to_string(),
            FrameKind::Notification => dissect_notification(&frame.payload_text()),
            FrameKind::Packet => {
                let data = frame.payload_text();
                if data.is_empty() {
                    if is_response {
                        "Empty response (command not supported)".to_string()
                    } else {
                        "Empty packet".to_string()
                    }
                } else if is_response {
                    response::dissect(&data, self.last_command.as_deref())
                } else {
                    let description = command::dissect(&data);
                    self.last_command = Some(data);
                    description
                }
            }
        }
    }
}

fn dissect_notification(data: &str) -> String {
    match data.strip_prefix("Stop:") {
        Some(rest) => format!("Async stop notification: {rest}"),
        None => format!("Notification: {data}"),
    }
}

/// Substring after the first `n` chars, `""` when the input is shorter.
///
/// Payload strings come from a Latin-1 byte mapping, so bytes above 0x7F
/// occupy more than one byte in the String; slicing must go by chars.
pub(crate) fn skip_chars(data: &str, n: usize) -> &str {
    data.char_indices().nth(n).map_or("", |(i, _)| &data[i..])
}

/// Decode a hex string into bytes; `None` on odd length or non-hex chars.
pub(crate) fn hex_decode_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        bytes.push(u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?);
    }
    Some(bytes)
}

/// Hex-decode to text, replacing invalid UTF-8 sequences.
pub(crate) fn hex_decode_text(hex: &str) -> Option<String> {
    hex_decode_bytes(hex).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::compute_checksum;
    use bytes::Bytes;

    fn packet(payload: &str) -> Frame {
        let payload = Bytes::copy_from_slice(payload.as_bytes());
        let checksum = compute_checksum(&payload);
        Frame {
            kind: FrameKind::Packet,
            raw: Bytes::new(),
            checksum,
            valid_checksum: true,
            payload,
        }
    }

    #[test]
    fn test_control_frames() {
        let mut dissector = Dissector::new();
        assert_eq!(
            dissector.dissect(&Frame::control(FrameKind::Ack, b'+'), false),
            "ACK"
        );
        assert_eq!(
            dissector.dissect(&Frame::control(FrameKind::Nack, b'-'), false),
            "NACK (request retransmission)"
        );
        assert_eq!(
            dissector.dissect(&Frame::control(FrameKind::Interrupt, 0x03), false),
            "Interrupt (Ctrl-C)"
        );
    }

    #[test]
    fn test_notification_frames() {
        let mut dissector = Dissector::new();
        let mut frame = packet("Stop:T05");
        frame.kind = FrameKind::Notification;
        assert_eq!(
            dissector.dissect(&frame, false),
            "Async stop notification: T05"
        );

        let mut frame = packet("something");
        frame.kind = FrameKind::Notification;
        assert_eq!(dissector.dissect(&frame, false), "Notification: something");
    }

    #[test]
    fn test_empty_payloads() {
        let mut dissector = Dissector::new();
        assert_eq!(dissector.dissect(&packet(""), false), "Empty packet");
        assert_eq!(
            dissector.dissect(&packet(""), true),
            "Empty response (command not supported)"
        );
    }

    #[test]
    fn test_command_memory_labels_responses() {
        let mut dissector = Dissector::new();
        dissector.dissect(&packet("g"), false);

        let hex = "00".repeat(20);
        assert_eq!(
            dissector.dissect(&packet(&hex), true),
            "Registers: 20 bytes"
        );
        // Memory survives the intervening response
        assert_eq!(
            dissector.dissect(&packet(&hex), true),
            "Registers: 20 bytes"
        );

        dissector.dissect(&packet("m1000,14"), false);
        assert_eq!(dissector.dissect(&packet(&hex), true), "Memory: 20 bytes");
    }

    #[test]
    fn test_skip_chars_multibyte() {
        assert_eq!(skip_chars("abc", 1), "bc");
        assert_eq!(skip_chars("abc", 3), "");
        assert_eq!(skip_chars("abc", 10), "");
        // Latin-1 byte 0xFF maps to a two-byte char in the String
        let text: String = [b'T', 0xFF_u8, b'x'].iter().map(|&b| b as char).collect();
        assert_eq!(skip_chars(&text, 2), "x");
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(hex_decode_bytes("4142"), Some(vec![0x41, 0x42]));
        assert_eq!(hex_decode_bytes(""), Some(vec![]));
        assert_eq!(hex_decode_bytes("4"), None);
        assert_eq!(hex_decode_bytes("zz"), None);
        assert_eq!(hex_decode_text("68656c6c6f").as_deref(), Some("hello"));
    }
}
