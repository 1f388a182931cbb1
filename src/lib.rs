//! Transparent TCP proxy for the GDB Remote Serial Protocol.
//!
//! Sits between a debugger and a remote stub (gdbserver, QEMU, OpenOCD),
//! forwarding bytes verbatim in both directions while extracting,
//! validating, and dissecting every RSP frame that crosses the wire.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! - **Protocol** (`protocol`): pure state machines, no I/O. A byte-fed
//!   parser extracts frames from arbitrarily chunked input and validates
//!   checksums.
//!
//! - **Dissection** (`dissect`): translates frame payloads into one-line
//!   human-readable descriptions, keeping a one-packet memory of the last
//!   command so responses can be labeled in context.
//!
//! - **Proxy** (`proxy`): TCP accept loop, per-session forwarding tasks,
//!   colored console output with per-session log files, and optional
//!   child-process supervision.
//!
//! # Example
//!
//! ```
//! use gdbproxy::{Dissector, PacketParser};
//!
//! let mut parser = PacketParser::new();
//! let mut dissector = Dissector::new();
//!
//! for frame in parser.feed(b"+$m1000,4#8e") {
//!     let description = dissector.dissect(&frame, false);
//!     println!("{description}");
//! }
//! ```

// Module declarations
pub mod cli;
pub mod dissect;
pub mod error;
pub mod protocol;
pub mod proxy;

// Public API exports
pub use dissect::Dissector;
pub use error::{ProxyError, Result};
pub use protocol::{Frame, FrameKind, PacketParser};
