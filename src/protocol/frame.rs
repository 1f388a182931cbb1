use bytes::Bytes;

use crate::protocol::constants::framing::{ESCAPE, ESCAPE_XOR};

/// Kind of a parsed RSP frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `+`, an acknowledgement
    Ack,
    /// `-`, a request for retransmission
    Nack,
    /// The 0x03 interrupt byte (Ctrl-C)
    Interrupt,
    /// `$payload#cs`, a regular packet
    Packet,
    /// `%payload#cs`, an asynchronous notification
    Notification,
}

/// One logical unit extracted from the wire.
///
/// `payload` holds the body exactly as received, escape sequences intact;
/// the transmitted checksum covers these on-wire bytes. `raw` is the full
/// byte sequence including framing, for faithful display and forwarding
/// accounting.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Bytes,
    pub checksum: u8,
    pub raw: Bytes,
    pub valid_checksum: bool,
}

impl Frame {
    /// Single-byte control frame (Ack, Nack, Interrupt).
    pub(crate) fn control(kind: FrameKind, byte: u8) -> Self {
        Self {
            kind,
            payload: Bytes::new(),
            checksum: 0,
            raw: Bytes::copy_from_slice(&[byte]),
            valid_checksum: true,
        }
    }

    /// Latin-1 view of the payload: every byte maps to the char with the
    /// same code point, so binary payloads still yield a usable string.
    pub fn payload_text(&self) -> String {
        latin1(&self.payload)
    }

    /// Latin-1 view of the raw on-wire bytes, framing included.
    pub fn raw_text(&self) -> String {
        latin1(&self.raw)
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// RSP checksum: sum of the on-wire payload bytes mod 256.
pub fn compute_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Undo RSP escaping: `}` followed by `b` stands for `b XOR 0x20`.
///
/// A trailing `}` with no byte after it is kept as-is.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    while let Some(&byte) = iter.next() {
        if byte == ESCAPE {
            match iter.next() {
                Some(&escaped) => out.push(escaped ^ ESCAPE_XOR),
                None => out.push(byte),
            }
        } else {
            out.push(byte);
        }
    }
    out
}
