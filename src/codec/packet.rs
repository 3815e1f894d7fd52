//! Binary TCP packets
//!
//! Every packet opens with the 18-byte magic preamble and a 4-byte command
//! field `[cmd, 0x5a, 0xa5, 0x00]`. File-transfer and time packets continue
//! with three 16-bit words and a payload, packed without padding:
//!
//! ```text
//! magic[18] cmd[4] total_size:u16 struct_type:u16 data_size:u16 data[..580]
//! ```
//!
//! `total_size` counts the header and the bytes actually sent after it.
//! Multi-byte words are little-endian, the controller's native order.

use crate::constants::{COMMAND_SIGNATURE, FRAME_PAYLOAD_SIZE, PACKET_MAGIC, REMOTE_NAME_FIELD};
use crate::error::{Result, UploadError};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Magic plus command field
pub const COMMAND_SIZE: usize = PACKET_MAGIC.len() + 4;

/// Bytes before the payload of a data packet
pub const HEADER_SIZE: usize = COMMAND_SIZE + 6;

/// Close record: NUL-padded name followed by the packed timestamp
pub const CLOSE_RECORD_SIZE: usize = REMOTE_NAME_FIELD + 4;

/// Longest remote file name (one byte is kept for the terminator)
pub const MAX_REMOTE_NAME: usize = REMOTE_NAME_FIELD - 1;

/// Command byte for file transfer
pub const CMD_FILE: u8 = b'F';

/// Command byte for setting the clock
pub const CMD_TIME: u8 = b'D';

/// Meaning of a data packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructType {
    /// Truncate/create the temp file and write the first chunk
    Open,
    /// Append a chunk
    Append,
    /// Rename the temp file and stamp it
    Close,
}

impl StructType {
    pub fn code(self) -> u16 {
        match self {
            Self::Open => 0,
            Self::Append => 1,
            Self::Close => 2,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::Append),
            2 => Some(Self::Close),
            _ => None,
        }
    }
}

/// Decoded fixed part of a data packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub command: u8,
    pub total_size: u16,
    pub struct_type: u16,
    pub data_size: u16,
}

impl FrameHeader {
    /// Parse the fixed header, `None` when the magic or signature is wrong
    pub fn parse(frame: &[u8]) -> Option<Self> {
        if frame.len() < HEADER_SIZE || &frame[..PACKET_MAGIC.len()] != PACKET_MAGIC {
            return None;
        }
        let cmd = &frame[PACKET_MAGIC.len()..COMMAND_SIZE];
        if cmd[1..] != COMMAND_SIGNATURE {
            return None;
        }
        let word = |at: usize| u16::from_le_bytes([frame[at], frame[at + 1]]);
        Some(Self {
            command: cmd[0],
            total_size: word(COMMAND_SIZE),
            struct_type: word(COMMAND_SIZE + 2),
            data_size: word(COMMAND_SIZE + 4),
        })
    }
}

fn put_command(buf: &mut BytesMut, command: u8) {
    buf.put_slice(PACKET_MAGIC);
    buf.put_u8(command);
    buf.put_slice(&COMMAND_SIGNATURE);
}

/// Bare command packet (mode changes, directory listing)
pub fn command_packet(command: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(COMMAND_SIZE);
    put_command(&mut buf, command);
    buf.freeze()
}

/// Data packet carrying up to one payload's worth of bytes
///
/// Payloads longer than the frame capacity are truncated to it.
pub fn data_frame(command: u8, struct_type: StructType, payload: &[u8]) -> Bytes {
    let payload = &payload[..payload.len().min(FRAME_PAYLOAD_SIZE)];
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    put_command(&mut buf, command);
    buf.put_u16_le((HEADER_SIZE + payload.len()) as u16);
    buf.put_u16_le(struct_type.code());
    buf.put_u16_le(payload.len() as u16);
    buf.put_slice(payload);
    buf.freeze()
}

/// Closing frame for a file transfer
///
/// `data_size` stays zero; the close record sits where the payload would.
pub fn close_frame(remote_name: &str, timestamp: u32) -> Result<Bytes> {
    let name = remote_name.as_bytes();
    if name.len() > MAX_REMOTE_NAME {
        return Err(UploadError::FileNameTooLong {
            name: remote_name.to_string(),
            max: MAX_REMOTE_NAME,
        });
    }
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + CLOSE_RECORD_SIZE);
    put_command(&mut buf, CMD_FILE);
    buf.put_u16_le((HEADER_SIZE + CLOSE_RECORD_SIZE) as u16);
    buf.put_u16_le(StructType::Close.code());
    buf.put_u16_le(0);
    buf.put_slice(name);
    buf.put_bytes(0, REMOTE_NAME_FIELD - name.len());
    buf.put_u32_le(timestamp);
    Ok(buf.freeze())
}

/// Clock packet: hour, minute, second, weekday (0 = Sunday)
pub fn time_frame(time: &NaiveDateTime) -> Bytes {
    let payload = [
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        time.weekday().num_days_from_sunday() as u8,
    ];
    data_frame(CMD_TIME, StructType::Open, &payload)
}

/// FAT-style packed date/time with 2-second resolution
pub fn fat_timestamp(year: u32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> u32 {
    let date = (year.saturating_sub(1980) * 512) | (month * 32) | day;
    let time = (hour * 2048) | (minute * 32) | (second / 2);
    ((date << 16) & 0xffff_0000) | (time & 0xffff)
}

/// Packed timestamp of a local date/time
pub fn fat_timestamp_of(time: &NaiveDateTime) -> u32 {
    fat_timestamp(
        time.year().max(0) as u32,
        time.month(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
    )
}
