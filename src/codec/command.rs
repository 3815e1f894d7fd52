//! Control-plane command strings
//!
//! Two dialects share the same positional fields:
//! - JSON records (`{"V":"a,b,c"}`) wrapped in `{"CMD":...,"LIST":[...]}`
//!   envelopes, posted to the `XLights_*.cgi` endpoints
//! - legacy comma rows for EasyLights, posted to numbered rows
//!
//! Builders return the header value only; the transport adds the `DATA:`
//! or `ROW:` header name. Field order and quoting are fixed by firmware,
//! so everything is formatted by hand instead of going through serde.

use crate::layout::OutputKind;
use crate::model::{InputUniverse, PixelOutput, SerialOutput, SmartRemote};
use crate::unpack::RemapEntry;

/// Reboot into normal Ethernet operation
pub const REBOOT: &str = r#"{"CMD":"OP_MODE","MODE":"ETHERNET"}"#;

/// Clears the controller's remap table
pub const UNPACK_EMPTY: &str = r#"{"BLK":"0","NUM":"0","LEFT":"0","LIST":[]}"#;

/// Input table row past the controller's universe count
pub const UNIVERSE_UNUSED: &str = r#"{"V":"0,0,0,0,0,0"}"#;

/// Legacy input table row past the controller's universe count
pub const UNIVERSE_UNUSED_LEGACY: &str = "0,0,0,0,0,0";

// ============================================================================
// Pixel outputs
// ============================================================================

fn port_fields(port: &PixelOutput) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{}",
        port.port,
        port.protocol,
        port.controller_start(),
        port.pixels,
        port.controller_end(),
        port.direction.code(),
        port.color_order,
        port.null_pixels,
        port.brightness,
        port.gamma
    )
}

/// `{"V":"port,protocol,start,pixels,end,dir,order,nulls,brightness,gamma"}`
pub fn port_record(port: &PixelOutput) -> String {
    format!(r#"{{"V":"{}"}}"#, port_fields(port))
}

/// Same fields as [`port_record`], pipe-terminated
pub fn port_record_legacy(port: &PixelOutput) -> String {
    format!("{}|", port_fields(port))
}

/// PCONFIG envelope for one expansion board (0-based)
pub fn pixel_config(board: usize, ports: &[PixelOutput]) -> String {
    let list: Vec<String> = ports.iter().map(port_record).collect();
    format!(
        r#"{{"CMD":"PCONFIG","BOARD":"{}","LIST":[{}]}}"#,
        board,
        list.join(",")
    )
}

/// Concatenated legacy port rows followed by the `||` terminator
pub fn pixel_config_legacy(ports: &[PixelOutput]) -> String {
    let mut out: String = ports.iter().map(port_record_legacy).collect();
    out.push_str("||");
    out
}

// ============================================================================
// Smart remotes
// ============================================================================

/// `{"V":"id,kind,start0,start1,start2,start3"}`
pub fn smart_record(remote: &SmartRemote) -> String {
    format!(
        r#"{{"V":"{},{},{},{},{},{}"}}"#,
        remote.id,
        remote.kind.code(),
        remote.start_pixels[0],
        remote.start_pixels[1],
        remote.start_pixels[2],
        remote.start_pixels[3]
    )
}

/// SCONFIG envelope for one (board, bank) pair, both 0-based
pub fn smart_config(board: usize, bank: usize, remotes: &[SmartRemote]) -> String {
    let list: Vec<String> = remotes.iter().map(smart_record).collect();
    format!(
        r#"{{"CMD":"SCONFIG","BOARD":"{}","Port4":"{}","LIST":[{}]}}"#,
        board,
        bank,
        list.join(",")
    )
}

// ============================================================================
// Input universes
// ============================================================================

fn universe_fields(universe: &InputUniverse) -> String {
    format!(
        "{},{},{},1,{},{}",
        universe.index,
        universe.universe,
        universe.channels,
        universe.controller_start,
        universe.controller_end()
    )
}

/// `{"V":"index,universe,channels,1,start,end"}`
pub fn universe_record(universe: &InputUniverse) -> String {
    format!(r#"{{"V":"{}"}}"#, universe_fields(universe))
}

pub fn universe_record_legacy(universe: &InputUniverse) -> String {
    universe_fields(universe)
}

/// Row for an index the layout does not use
pub fn universe_placeholder(index: u32) -> String {
    format!(r#"{{"V":"{},{},0,1,0,0"}}"#, index, index)
}

pub fn universe_placeholder_legacy(index: u32) -> String {
    format!("{},{},0,1,0,0", index, index)
}

/// E131 envelope carrying one block of input table rows
pub fn universe_block(block: usize, records: &[String]) -> String {
    format!(
        r#"{{"CMD":"E131","BLK":"{}","LIST":[{}]}}"#,
        block,
        records.join(",")
    )
}

/// Legacy block prefix plus comma-joined rows
pub fn universe_block_legacy(block: usize, records: &[String]) -> String {
    format!("ROWCNT=16:ROW={}:{}", block, records.join(","))
}

/// Number of universes actually bound
pub fn universe_count(count: u32) -> String {
    format!(r#"{{"CMD":"BD_INFO","NumU":"{}"}}"#, count)
}

/// DATA_MODE command selecting the input transport
pub fn input_mode(kind: OutputKind, ddp_start: u32, ddp_channels: u32) -> String {
    match kind {
        OutputKind::E131 => r#"{"CMD":"DATA_MODE","MODE":"E131"}"#.to_string(),
        OutputKind::ArtNet => r#"{"CMD":"DATA_MODE","MODE":"ARTNET"}"#.to_string(),
        OutputKind::Ddp => format!(
            r#"{{"CMD":"DATA_MODE","MODE":"DDP","DDP_START":{},"DDP_CHAN_COUNT":{}}}"#,
            ddp_start, ddp_channels
        ),
    }
}

/// Legacy input mode: `A,multicast,B,type,C,max,D,count,E,ddpStart`
pub fn input_mode_legacy(
    multicast: bool,
    kind: OutputKind,
    max_universes: u32,
    bound: u32,
    ddp_start: u32,
) -> String {
    format!(
        "A,{},B,{},C,{},D,{},E,{}",
        u32::from(multicast),
        kind.mode_code(),
        max_universes,
        bound,
        ddp_start
    )
}

// ============================================================================
// Serial
// ============================================================================

pub fn serial_config(serial: &SerialOutput) -> String {
    format!(
        r#"{{"CMD":"DATA_MODE","DMX_ACTIVE":{},"DMX_UNIV":{},"DMX_START":{},"DMX_CHAN_CNT":{},"DDP_DMX_ACTIVE":{},"DDP_DMX_START":{},"DDP_DMX_CHAN_CNT":{}}}"#,
        u32::from(serial.e131_enabled),
        serial.e131_universe,
        serial.e131_start_channel,
        serial.e131_channels,
        u32::from(serial.ddp_enabled),
        serial.ddp_start_channel,
        serial.ddp_channels
    )
}

pub fn serial_config_legacy(serial: &SerialOutput, kind: OutputKind) -> String {
    format!(
        "A,{},B,{},C,{},D,{},E,{},F,{},G,{},H,{}",
        kind.mode_code(),
        u32::from(serial.e131_enabled),
        u32::from(serial.ddp_enabled),
        serial.e131_universe,
        serial.e131_start_channel,
        serial.e131_channels,
        serial.ddp_start_channel,
        serial.ddp_channels
    )
}

// ============================================================================
// Unpack
// ============================================================================

/// One batch of remap entries
///
/// Entries are written back to back as `{old,new,count}` with no separator;
/// firmware splits on the braces.
pub fn unpack_block(block: usize, entries: &[RemapEntry], left: usize) -> String {
    let list: String = entries
        .iter()
        .map(|e| format!("{{{},{},{}}}", e.old_start, e.new_start, e.channels))
        .collect();
    format!(
        r#"{{"BLK":"{}","NUM":"{}","LEFT":"{}","LIST":[{}]}}"#,
        block,
        entries.len(),
        left,
        list
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, SmartRemoteKind};

    fn sample_port() -> PixelOutput {
        let mut port = PixelOutput::new(3, 100);
        port.protocol = 1;
        port.pixels = 50;
        port.direction = Direction::Reverse;
        port.color_order = 2;
        port.null_pixels = 1;
        port.brightness = 90;
        port.gamma = 2;
        port.set_controller_channels(151);
        port
    }

    #[test]
    fn test_port_record() {
        assert_eq!(
            port_record(&sample_port()),
            r#"{"V":"3,1,151,50,300,1,2,1,90,2"}"#
        );
        assert_eq!(port_record_legacy(&sample_port()), "3,1,151,50,300,1,2,1,90,2|");
    }

    #[test]
    fn test_pixel_config_envelope() {
        let ports = vec![sample_port(), PixelOutput::new(4, 100)];
        let cmd = pixel_config(1, &ports);
        assert!(cmd.starts_with(r#"{"CMD":"PCONFIG","BOARD":"1","LIST":[{"V":"3,"#));
        assert!(cmd.ends_with(r#"{"V":"4,0,0,0,0,0,0,0,100,1"}]}"#));
        assert!(serde_json::from_str::<serde_json::Value>(&cmd).is_ok());
    }

    #[test]
    fn test_legacy_rows_terminator() {
        let rows = pixel_config_legacy(&[sample_port(), sample_port()]);
        assert!(rows.ends_with("|||"));
        assert_eq!(rows.matches('|').count(), 4);
    }

    #[test]
    fn test_smart_config() {
        let mut remote = SmartRemote::new(1);
        remote.kind = SmartRemoteKind::Sixteen;
        remote.start_pixels = [51, 51, 51, 51];
        let cmd = smart_config(0, 2, &[SmartRemote::new(0), remote]);
        assert_eq!(
            cmd,
            r#"{"CMD":"SCONFIG","BOARD":"0","Port4":"2","LIST":[{"V":"0,0,0,0,0,0"},{"V":"1,1,51,51,51,51"}]}"#
        );
    }

    #[test]
    fn test_universe_rows() {
        let mut uni = InputUniverse::new(7, 510);
        uni.index = 2;
        uni.controller_start = 511;
        assert_eq!(universe_record(&uni), r#"{"V":"2,7,510,1,511,1020"}"#);
        assert_eq!(universe_record_legacy(&uni), "2,7,510,1,511,1020");
        assert_eq!(universe_placeholder(5), r#"{"V":"5,5,0,1,0,0"}"#);
    }

    #[test]
    fn test_universe_block_is_valid_json() {
        let rows = vec![universe_placeholder(1), UNIVERSE_UNUSED.to_string()];
        let cmd = universe_block(3, &rows);
        assert_eq!(
            cmd,
            r#"{"CMD":"E131","BLK":"3","LIST":[{"V":"1,1,0,1,0,0"},{"V":"0,0,0,0,0,0"}]}"#
        );
        assert!(serde_json::from_str::<serde_json::Value>(&cmd).is_ok());
        assert_eq!(
            universe_block_legacy(0, &["1,1,0,1,0,0".into()]),
            "ROWCNT=16:ROW=0:1,1,0,1,0,0"
        );
    }

    #[test]
    fn test_input_mode() {
        assert_eq!(
            input_mode(OutputKind::ArtNet, 0, 0),
            r#"{"CMD":"DATA_MODE","MODE":"ARTNET"}"#
        );
        assert_eq!(
            input_mode(OutputKind::Ddp, 1, 3000),
            r#"{"CMD":"DATA_MODE","MODE":"DDP","DDP_START":1,"DDP_CHAN_COUNT":3000}"#
        );
        assert_eq!(
            input_mode_legacy(true, OutputKind::Ddp, 65, 0, 1),
            "A,1,B,1,C,65,D,0,E,1"
        );
    }

    #[test]
    fn test_serial_config() {
        let serial = SerialOutput {
            e131_enabled: true,
            e131_universe: 12,
            e131_start_channel: 1,
            e131_channels: 16,
            ..Default::default()
        };
        assert_eq!(
            serial_config(&serial),
            r#"{"CMD":"DATA_MODE","DMX_ACTIVE":1,"DMX_UNIV":12,"DMX_START":1,"DMX_CHAN_CNT":16,"DDP_DMX_ACTIVE":0,"DDP_DMX_START":0,"DDP_DMX_CHAN_CNT":0}"#
        );
        assert_eq!(
            serial_config_legacy(&serial, OutputKind::E131),
            "A,0,B,1,C,0,D,12,E,1,F,16,G,0,H,0"
        );
    }

    #[test]
    fn test_unpack_block() {
        let entries = vec![
            RemapEntry::new(1, 0, 0, 150),
            RemapEntry::new(2, 300, 150, 60),
        ];
        assert_eq!(
            unpack_block(0, &entries, 3),
            r#"{"BLK":"0","NUM":"2","LEFT":"3","LIST":[{0,0,150}{300,150,60}]}"#
        );
    }
}
