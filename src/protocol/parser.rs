use bytes::{BufMut, BytesMut};

use crate::protocol::constants::framing::{
    ACK, INTERRUPT, NACK, NOTIFICATION_START, PACKET_END, PACKET_START,
};
use crate::protocol::frame::{compute_checksum, Frame, FrameKind};

/// Parser position within the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Between frames, waiting for `$`, `%`, or a standalone control byte
    Idle,

    /// Inside a packet body, accumulating payload bytes until `#`
    InPacket,

    /// Expecting the first checksum hex char
    Checksum1,

    /// Expecting the second checksum hex char
    Checksum2,
}

/// Streaming parser extracting RSP frames from a TCP byte stream.
///
/// The parser accepts arbitrary chunk boundaries: a single frame may be
/// split across any number of `feed` calls and one call may carry any
/// number of frames plus a partial tail. Every input byte is consumed;
/// bytes between frames that are not a recognized control are discarded.
///
/// Frames with a bad checksum are still delivered, with `valid_checksum`
/// cleared: the proxy forwards the bytes either way and the far endpoint
/// answers with a Nack.
///
/// # Example
///
/// ```
/// use gdbproxy::protocol::{FrameKind, PacketParser};
///
/// let mut parser = PacketParser::new();
/// let frames: Vec<_> = parser.feed(b"+$g#67").collect();
///
/// assert_eq!(frames.len(), 2);
/// assert_eq!(frames[0].kind, FrameKind::Ack);
/// assert_eq!(frames[1].payload.as_ref(), b"g");
/// assert!(frames[1].valid_checksum);
/// ```
#[derive(Debug)]
pub struct PacketParser {
    state: ParserState,
    payload: BytesMut,
    raw: BytesMut,
    checksum_chars: [u8; 2],
    is_notification: bool,
}

impl PacketParser {
    /// Create a new parser in the initial state
    pub fn new() -> Self {
        Self {
            state: ParserState::Idle,
            payload: BytesMut::with_capacity(64),
            raw: BytesMut::with_capacity(64),
            checksum_chars: [0; 2],
            is_notification: false,
        }
    }

    /// Feed a chunk of bytes, returning a lazy iterator of completed frames.
    ///
    /// The iterator borrows the parser; state left over at the end of the
    /// chunk (a partial frame) carries into the next `feed` call.
    pub fn feed<'a>(&'a mut self, input: &'a [u8]) -> Feed<'a> {
        Feed {
            parser: self,
            input: input.iter(),
        }
    }

    /// Feed one byte; the stepping primitive behind [`feed`](Self::feed).
    ///
    /// Returns a frame when this byte completes one.
    pub fn feed_byte(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            ParserState::Idle => self.handle_idle(byte),
            ParserState::InPacket => {
                self.handle_in_packet(byte);
                None
            }
            ParserState::Checksum1 => {
                self.raw.put_u8(byte);
                self.checksum_chars[0] = byte;
                self.state = ParserState::Checksum2;
                None
            }
            ParserState::Checksum2 => Some(self.finish_packet(byte)),
        }
    }

    /// Reset to the initial state, discarding any partial frame.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.payload.clear();
        self.raw.clear();
        self.is_notification = false;
    }

    fn handle_idle(&mut self, byte: u8) -> Option<Frame> {
        match byte {
            ACK => Some(Frame::control(FrameKind::Ack, byte)),
            NACK => Some(Frame::control(FrameKind::Nack, byte)),
            INTERRUPT => Some(Frame::control(FrameKind::Interrupt, byte)),
            PACKET_START | NOTIFICATION_START => {
                self.state = ParserState::InPacket;
                self.payload.clear();
                self.raw.clear();
                self.raw.put_u8(byte);
                self.is_notification = byte == NOTIFICATION_START;
                None
            }
            // Stray byte between frames, discarded
            _ => None,
        }
    }

    fn handle_in_packet(&mut self, byte: u8) {
        self.raw.put_u8(byte);
        // `#` ends the payload unconditionally: delimiters are never escaped
        // on the wire, so a preceding ESCAPE byte does not shield it. An
        // in-packet `$` is an ordinary payload byte; a lost `#` therefore
        // costs one malformed frame and the stream resynchronizes at the
        // next delimiter.
        if byte == PACKET_END {
            self.state = ParserState::Checksum1;
        } else {
            self.payload.put_u8(byte);
        }
    }

    fn finish_packet(&mut self, byte: u8) -> Frame {
        self.raw.put_u8(byte);
        self.checksum_chars[1] = byte;
        self.state = ParserState::Idle;

        // Invalid hex in the checksum chars reads as 0, which almost
        // certainly mismatches and flags the frame.
        let checksum = std::str::from_utf8(&self.checksum_chars)
            .ok()
            .and_then(|chars| u8::from_str_radix(chars, 16).ok())
            .unwrap_or(0);

        let payload = self.payload.split().freeze();
        let raw = self.raw.split().freeze();
        let valid_checksum = compute_checksum(&payload) == checksum;

        Frame {
            kind: if self.is_notification {
                FrameKind::Notification
            } else {
                FrameKind::Packet
            },
            payload,
            checksum,
            raw,
            valid_checksum,
        }
    }
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy frame iterator returned by [`PacketParser::feed`].
pub struct Feed<'a> {
    parser: &'a mut PacketParser,
    input: std::slice::Iter<'a, u8>,
}

impl Iterator for Feed<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        for &byte in self.input.by_ref() {
            if let Some(frame) = self.parser.feed_byte(byte) {
                return Some(frame);
            }
        }
        None
    }
}
