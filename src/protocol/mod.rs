//! RSP wire protocol: framing vocabulary, frame type, and the streaming
//! packet parser.
//!
//! Pure state machines with no I/O; the proxy layer feeds socket bytes in
//! and forwards them untouched.

pub mod constants;
pub mod frame;
pub mod parser;

// Re-export commonly used items
pub use frame::{compute_checksum, unescape, Frame, FrameKind};
pub use parser::{Feed, PacketParser};
