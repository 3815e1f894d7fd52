//! Application-wide constants
//!
//! Controller geometry, batch limits, endpoints and wire magic.

use std::time::Duration;

// =============================================================================
// Board geometry
// =============================================================================

/// Pixel ports on one expansion board
pub const PORTS_PER_BOARD: usize = 16;

/// Expansion board slots (PRO 80 uses all five)
pub const EXPANSION_SLOTS: usize = 5;

/// Sub-ports feeding one smart-remote bank
pub const PORTS_PER_BANK: usize = 4;

/// Smart-remote banks on one expansion board
pub const BANKS_PER_BOARD: usize = PORTS_PER_BOARD / PORTS_PER_BANK;

/// Highest smart-remote id (1-based) a bank can address
pub const MAX_SMART_REMOTES: u32 = 16;

/// Pixel ports on the EasyLights Pix16
pub const EASYLIGHTS_PORTS: usize = 16;

// =============================================================================
// Channels
// =============================================================================

/// Hardware floor for a DMX/serial span
pub const MIN_SERIAL_CHANNELS: u32 = 16;

/// `sourcePort` value marking a remap entry that feeds the serial port
pub const SERIAL_REMAP_PORT: u32 = 100;

// =============================================================================
// Batching
// =============================================================================

/// Input universes per control-plane write
pub const UNIVERSES_PER_BLOCK: usize = 6;

/// Remap entries per write (one 256-byte EEPROM block)
pub const UNPACK_ENTRIES_PER_BLOCK: usize = 16;

// =============================================================================
// Firmware
// =============================================================================

/// Oldest HinksPix main CPU firmware that accepts uploads
pub const MIN_HINKSPIX_FIRMWARE: u32 = 101;

/// First V3 (PRO 80) firmware with file upload and unpack support
pub const V3_UPLOAD_FIRMWARE: u32 = 129;

/// First V1/V2 firmware with file upload and unpack support
pub const V2_UPLOAD_FIRMWARE: u32 = 151;

// =============================================================================
// Control-plane endpoints
// =============================================================================

/// Row-addressed data (EasyLights command protocol)
pub const ROW_DATA_URL: &str = "/GetInfo.cgi";

/// Board information (JSON)
pub const JSON_INFO_URL: &str = "/XLights_BoardInfo.cgi";

/// Configuration writes (JSON)
pub const JSON_POST_URL: &str = "/XLights_Data.cgi";

/// Input mode and serial state (JSON)
pub const JSON_MODE_URL: &str = "/XLights_GetMode.cgi";

/// Per-board port configuration (JSON)
pub const JSON_PORT_URL: &str = "/XLights_GetPortInfo.cgi";

/// Unpack table writes (JSON)
pub const JSON_UNPACK_URL: &str = "/XLights_UnPack.cgi";

// =============================================================================
// Binary protocol
// =============================================================================

/// Fake HTTP preamble the controller firmware keys on (exactly 18 bytes)
pub const PACKET_MAGIC: &[u8; 18] = b"HINK TCP_CMD  \r\n\r\n";

/// Trailing bytes of every 4-byte command field
pub const COMMAND_SIGNATURE: [u8; 3] = [0x5a, 0xa5, 0x00];

/// Payload bytes carried by one file-transfer frame
pub const FRAME_PAYLOAD_SIZE: usize = 580;

/// Bytes in a close frame's file-name field (NUL terminated)
pub const REMOTE_NAME_FIELD: usize = 30;

/// Sentinel that opens every acknowledgement
pub const ACK_SENTINEL: u8 = b'|';

/// Substring that marks a positive acknowledgement
pub const ACK_OK: &str = "|FOK";

/// Reply body marking success on the row-addressed protocol
pub const ROW_DONE: &str = "done";

/// Reply token marking success on the JSON control plane
pub const JSON_OK: &str = "\"OK\"";

// =============================================================================
// Timing
// =============================================================================

/// Control-plane request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Wait window for one binary-protocol acknowledgement
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle time after the sentinel that ends an acknowledgement
pub const ACK_IDLE_GRACE: Duration = Duration::from_millis(50);

/// Board-info probe attempts
pub const INFO_PROBE_ATTEMPTS: u32 = 3;

/// Default port for both the web server and the binary protocol
pub const DEFAULT_CONTROLLER_PORT: u16 = 80;
