//! Wire formats spoken by the controller
//!
//! - **packet**: binary frames on the raw TCP socket
//! - **ack**: acknowledgement lines read back on that socket
//! - **command**: JSON and legacy command strings for the control plane
//! - **row**: decoding of control-plane replies
//!
//! Everything here is pure; the transports own the I/O.

pub mod ack;
pub mod command;
pub mod packet;
pub mod row;

pub use ack::{AckDecoder, AckLine};
pub use row::{BoardInfo, ControllerFamily, FileEntry, PortRow};

/// Incremental decoder for a byte stream
///
/// Calls `on_frame` for each complete frame detected.
/// May buffer partial data internally.
pub trait Codec {
    type Frame;

    fn decode(&mut self, data: &[u8], on_frame: impl FnMut(Self::Frame));
}
