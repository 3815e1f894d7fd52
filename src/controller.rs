//! HinksPix / EasyLights controller driver
//!
//! Owns the control-plane connection for one controller and knows which
//! endpoint and dialect each artifact goes to. HinksPix boards take JSON
//! envelopes on the `XLights_*.cgi` endpoints; the EasyLights Pix16 takes
//! legacy comma rows on numbered rows of `GetInfo.cgi`.

use crate::codec::command::{self, REBOOT, UNIVERSE_UNUSED, UNIVERSE_UNUSED_LEGACY};
use crate::codec::row::{list_rows, parse_key_values, parse_serial_state};
use crate::codec::{BoardInfo, ControllerFamily, PortRow};
use crate::constants::{
    BANKS_PER_BOARD, EASYLIGHTS_PORTS, EXPANSION_SLOTS, JSON_INFO_URL, JSON_MODE_URL, JSON_OK,
    JSON_PORT_URL, JSON_POST_URL, JSON_UNPACK_URL, MIN_HINKSPIX_FIRMWARE, PORTS_PER_BOARD,
    ROW_DATA_URL, ROW_DONE, UNIVERSES_PER_BLOCK, V2_UPLOAD_FIRMWARE, V3_UPLOAD_FIRMWARE,
};
use crate::error::{Result, UploadError};
use crate::layout::{Layout, OutputKind};
use crate::model::universe::by_index;
use crate::model::{ExpansionType, InputUniverse, PixelOutput, SerialOutput, SmartRemoteTable};
use crate::transport::ControlPlane;
use crate::unpack::UnpackTable;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// =============================================================================
// Legacy rows (EasyLights)
// =============================================================================

/// Universe limits as `K,V` pairs; `C` is the maximum
const ROW_UNIVERSE_LIMITS: u32 = 902;
const ROW_UNIVERSE_BLOCK: u32 = 2001;
const ROW_PIXEL_OUTPUTS: u32 = 3041;
const ROW_INPUT_MODE: u32 = 4902;
const ROW_SERIAL: u32 = 4908;
const ROW_REBOOT: u32 = 1111;

/// Controller models a layout can name
pub const MODEL_PRO_V2: &str = "PRO V1/V2";
pub const MODEL_PRO_V3: &str = "PRO V3";

/// Driver for one connected controller
pub struct HinksPix<C: ControlPlane> {
    plane: C,
    info: BoardInfo,
}

impl<C: ControlPlane> HinksPix<C> {
    /// Probe the board-info endpoint, up to `attempts` times
    ///
    /// Transport failures and empty replies are retried; a reply that is
    /// present but not valid board info is not.
    pub fn connect(mut plane: C, attempts: u32) -> Result<Self> {
        let mut last_error = None;
        for attempt in 1..=attempts.max(1) {
            match plane.request(JSON_INFO_URL, &[]) {
                Ok(body) if !body.trim().is_empty() => {
                    let info = BoardInfo::from_json(&parse_json(&body)?)?;
                    info!(
                        "Connected to {} ({})",
                        info.model_name(),
                        info.version_string()
                    );
                    return Ok(Self { plane, info });
                }
                Ok(_) => {
                    warn!("Empty board info reply (attempt {})", attempt);
                    last_error = Some(UploadError::protocol("empty board info reply"));
                }
                Err(e) => {
                    warn!("Board info request failed (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| UploadError::protocol("no board info")))
    }

    pub fn info(&self) -> &BoardInfo {
        &self.info
    }

    pub fn is_easylights(&self) -> bool {
        self.info.family == ControllerFamily::EasyLights
    }

    /// Physical pixel ports the hardware exposes
    pub fn port_count(&self) -> usize {
        if self.is_easylights() {
            EASYLIGHTS_PORTS
        } else {
            PORTS_PER_BOARD * EXPANSION_SLOTS
        }
    }

    pub fn expansions(&self) -> &[ExpansionType] {
        &self.info.expansions
    }

    /// Whether the binary file transfer is available
    pub fn firmware_supports_upload(&self) -> bool {
        match self.info.family {
            ControllerFamily::EasyLights => false,
            _ if self.info.hardware_v3 => self.info.main_firmware >= V3_UPLOAD_FIRMWARE,
            _ => self.info.main_firmware >= V2_UPLOAD_FIRMWARE,
        }
    }

    /// Whether the unpack table applies to a controller configured as `model`
    pub fn unpack_supported(&self, model: &str) -> bool {
        match model {
            MODEL_PRO_V2 => self.info.main_firmware >= V2_UPLOAD_FIRMWARE,
            MODEL_PRO_V3 => self.info.main_firmware >= V3_UPLOAD_FIRMWARE,
            _ => false,
        }
    }

    /// Reject a layout this controller cannot take, before anything is sent
    pub fn check_compatible(&self, layout: &Layout) -> Result<()> {
        let info = &self.info;
        match info.family {
            ControllerFamily::HinksPix if info.main_firmware < MIN_HINKSPIX_FIRMWARE => {
                return Err(UploadError::configuration(format!(
                    "HinksPix CPU Firmware is too old (v{}) Update to v{} or Newer.",
                    info.main_firmware, MIN_HINKSPIX_FIRMWARE
                )));
            }
            ControllerFamily::Unknown => {
                return Err(UploadError::configuration(
                    "Controller did not identify as HinksPix or EasyLights",
                ));
            }
            _ => {}
        }
        let model = layout.controller.model.as_str();
        if model == MODEL_PRO_V2 && info.family == ControllerFamily::HinksPix && info.hardware_v3 {
            return Err(UploadError::configuration(
                "Controller Reports as PRO V3 BUT You have the Model as PRO V1/V2 - Please Fix",
            ));
        }
        if model == MODEL_PRO_V3 && info.family == ControllerFamily::HinksPix && !info.hardware_v3
        {
            return Err(UploadError::configuration(
                "Controller Reports as PRO V1/V2 BUT You have the Model as PRO V3 - Please Fix",
            ));
        }
        if !self.is_easylights() && layout.outputs.len() > info.max_universes as usize {
            return Err(too_many_universes(layout.outputs.len(), info.max_universes));
        }
        let max_port = layout.max_pixel_port() as usize;
        if max_port > self.port_count() {
            return Err(UploadError::configuration(format!(
                "Pixel Output {} does not exist on {} ({} ports)",
                max_port,
                info.model_name(),
                self.port_count()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// JSON endpoint write; the reply must carry `"OK"`
    fn post(&mut self, url: &str, data: &str, operation: &str) -> Result<()> {
        let reply = self.plane.request(url, &[("DATA", data)])?;
        if reply.contains(JSON_OK) {
            Ok(())
        } else {
            error!("Failed Return {}", reply);
            Err(UploadError::Rejected {
                operation: operation.to_string(),
                reply,
            })
        }
    }

    fn get_json(&mut self, url: &str, block: usize) -> Result<Value> {
        let block = block.to_string();
        let body = self.plane.request(url, &[("BLK", block.as_str())])?;
        parse_json(&body)
    }

    fn get_row(&mut self, row: u32, data: Option<&str>) -> Result<String> {
        let row_text = row.to_string();
        let mut headers = vec![("ROW", row_text.as_str())];
        if let Some(data) = data {
            headers.push(("DATA", data));
        }
        self.plane.request(ROW_DATA_URL, &headers)
    }

    /// Legacy row write; the reply must be `done`
    fn set_row(&mut self, row: u32, data: Option<&str>) -> Result<()> {
        let reply = self.get_row(row, data)?;
        if reply.trim() == ROW_DONE {
            Ok(())
        } else {
            error!("{} Return {}", row, reply);
            Err(UploadError::Rejected {
                operation: format!("row {}", row),
                reply,
            })
        }
    }

    // =========================================================================
    // Reading controller state
    // =========================================================================

    /// Fresh port table, seeded from the controller unless under full control
    pub fn read_pixel_outputs(&mut self, full_control: bool, default_brightness: u32) -> Vec<PixelOutput> {
        let mut outputs: Vec<PixelOutput> = (1..=(PORTS_PER_BOARD * EXPANSION_SLOTS) as u32)
            .map(|port| PixelOutput::new(port, default_brightness))
            .collect();
        if full_control {
            return outputs;
        }
        for board in 0..EXPANSION_SLOTS {
            if !self.info.expansions[board].drives_pixels() {
                continue;
            }
            let ports = &mut outputs[board * PORTS_PER_BOARD..(board + 1) * PORTS_PER_BOARD];
            if let Err(e) = self.read_board(board, ports) {
                error!("Invalid port data for expansion {}: {}", board + 1, e);
            }
        }
        outputs
    }

    fn read_board(&mut self, board: usize, ports: &mut [PixelOutput]) -> Result<()> {
        let rows = list_rows(&self.get_json(JSON_PORT_URL, board)?)?;
        if rows.len() != ports.len() {
            return Err(UploadError::protocol(format!(
                "controller reported {} ports, expansion has {}",
                rows.len(),
                ports.len()
            )));
        }
        for (row, output) in rows.iter().zip(ports.iter_mut()) {
            match PortRow::parse(row, output.port) {
                Ok(parsed) => parsed.apply_to(output),
                Err(e) => error!("{}", e),
            }
        }
        Ok(())
    }

    /// Serial state as last configured, unless under full control
    pub fn read_serial(&mut self, full_control: bool) -> SerialOutput {
        if full_control {
            return SerialOutput::default();
        }
        if self.is_easylights() {
            warn!("EasyLights has no serial read-back; starting from defaults");
            return SerialOutput::default();
        }
        match self
            .get_json(JSON_MODE_URL, 0)
            .and_then(|reply| parse_serial_state(&reply))
        {
            Ok(serial) => serial,
            Err(e) => {
                error!("Invalid serial data from controller: {}", e);
                SerialOutput::default()
            }
        }
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Input mode and the input universe table
    pub fn upload_input_universes(
        &mut self,
        layout: &Layout,
        universes: &[InputUniverse],
    ) -> Result<()> {
        if self.is_easylights() {
            return self.upload_input_universes_legacy(layout, universes);
        }
        let max = self.info.max_universes;
        if layout.outputs.len() > max as usize {
            return Err(too_many_universes(layout.outputs.len(), max));
        }
        let kind = layout.output_kind();
        let (ddp_start, ddp_channels) = layout
            .outputs
            .first()
            .map(|o| (o.start_channel, o.channels))
            .unwrap_or_default();

        let mode = self.get_json(JSON_MODE_URL, 0)?;
        if mode.get("CMD").is_none() {
            return Err(UploadError::MissingMember {
                member: "CMD",
                payload: mode.to_string(),
            });
        }
        self.post(
            JSON_POST_URL,
            &command::input_mode(kind, ddp_start, ddp_channels),
            "input mode",
        )?;
        if kind == OutputKind::Ddp {
            return Ok(());
        }

        let (blocks, bound) = universe_blocks(
            universes,
            max,
            command::universe_record,
            command::universe_placeholder,
            UNIVERSE_UNUSED,
        );
        for (block, rows) in blocks.iter().enumerate() {
            self.post(JSON_POST_URL, &command::universe_block(block, rows), "input universes")?;
        }
        self.post(JSON_POST_URL, &command::universe_count(bound), "universe count")
    }

    fn upload_input_universes_legacy(
        &mut self,
        layout: &Layout,
        universes: &[InputUniverse],
    ) -> Result<()> {
        let limits = parse_key_values(&self.get_row(ROW_UNIVERSE_LIMITS, None)?);
        let max: u32 = limits
            .get("C")
            .and_then(|c| c.trim().parse().ok())
            .ok_or_else(|| UploadError::protocol("universe limit row has no 'C' value"))?;
        if layout.outputs.len() > max as usize {
            return Err(too_many_universes(layout.outputs.len(), max));
        }
        let kind = layout.output_kind();
        let first = layout.outputs.first();
        let multicast = first.is_some_and(|o| o.multicast);
        let ddp_start = match (kind, first) {
            (OutputKind::Ddp, Some(o)) => o.start_channel,
            _ => 0,
        };

        let mut first_error = None;
        let mut bound = 0;
        if kind != OutputKind::Ddp {
            let (blocks, count) = universe_blocks(
                universes,
                max,
                command::universe_record_legacy,
                command::universe_placeholder_legacy,
                UNIVERSE_UNUSED_LEGACY,
            );
            bound = count;
            for (block, rows) in blocks.iter().enumerate() {
                let data = command::universe_block_legacy(block, rows);
                if let Err(e) = self.set_row(ROW_UNIVERSE_BLOCK, Some(&data)) {
                    first_error.get_or_insert(e);
                }
            }
        }
        let mode = command::input_mode_legacy(multicast, kind, max, bound, ddp_start);
        if let Err(e) = self.set_row(ROW_INPUT_MODE, Some(&mode)) {
            first_error.get_or_insert(e);
        }
        first_error.map_or(Ok(()), Err)
    }

    /// One SCONFIG per non-empty bank of each long-range board
    pub fn upload_smart_remotes(&mut self, table: &SmartRemoteTable) -> Result<()> {
        let mut first_error = None;
        for board in 0..EXPANSION_SLOTS {
            if self.info.expansions[board] != ExpansionType::LongRange {
                continue;
            }
            for bank in 0..BANKS_PER_BOARD {
                let remotes = table.bank(board, bank);
                debug!("Smart remotes expansion {} bank {}", board, bank);
                if remotes.is_empty() {
                    continue;
                }
                remotes.iter().for_each(|r| r.dump());
                let data = command::smart_config(board, bank, remotes);
                if let Err(e) = self.post(JSON_POST_URL, &data, "smart remotes") {
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Port configuration, one write per pixel board
    pub fn upload_pixel_outputs(&mut self, outputs: &[PixelOutput]) -> Result<()> {
        if self.is_easylights() {
            let ports = &outputs[..EASYLIGHTS_PORTS.min(outputs.len())];
            ports.iter().for_each(PixelOutput::dump);
            info!("Set String Output Information for EasyLights.");
            return self.set_row(ROW_PIXEL_OUTPUTS, Some(&command::pixel_config_legacy(ports)));
        }
        let mut first_error = None;
        for board in 0..EXPANSION_SLOTS {
            if !self.info.expansions[board].drives_pixels() {
                continue;
            }
            let start = board * PORTS_PER_BOARD;
            let Some(ports) = outputs.get(start..start + PORTS_PER_BOARD) else {
                continue;
            };
            debug!("Building pixel upload Expansion {}", board + 1);
            ports.iter().for_each(PixelOutput::dump);
            let data = command::pixel_config(board, ports);
            if let Err(e) = self.post(JSON_POST_URL, &data, "pixel outputs") {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Serial port, only when there is something to send
    pub fn upload_serial(
        &mut self,
        serial: &SerialOutput,
        kind: OutputKind,
        port_used: bool,
    ) -> Result<()> {
        serial.dump();
        if self.is_easylights() {
            if !port_used {
                return Ok(());
            }
            return self.set_row(ROW_SERIAL, Some(&command::serial_config_legacy(serial, kind)));
        }
        if !serial.upload {
            debug!("Serial port unchanged");
            return Ok(());
        }
        self.post(JSON_POST_URL, &command::serial_config(serial), "serial")
    }

    /// Unpack table blocks in order, stopping at the first rejection
    pub fn upload_unpack(&mut self, table: &UnpackTable) -> Result<()> {
        for request in table.requests() {
            self.post(JSON_UNPACK_URL, &request, "unpack")?;
        }
        Ok(())
    }

    /// Reboot into normal operation
    ///
    /// HinksPix drops the connection while rebooting, so the command is
    /// sent twice without reading a reply.
    pub fn reboot(&mut self, gap: Duration) -> Result<()> {
        info!("Rebooting Controller.");
        if self.is_easylights() {
            return self.set_row(ROW_REBOOT, None);
        }
        self.plane.send_no_response(JSON_POST_URL, &[("DATA", REBOOT)]);
        thread::sleep(gap);
        self.plane.send_no_response(JSON_POST_URL, &[("DATA", REBOOT)]);
        Ok(())
    }
}

fn parse_json(body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| UploadError::protocol(format!("invalid JSON reply '{}': {}", body, e)))
}

fn too_many_universes(count: usize, max: u32) -> UploadError {
    UploadError::configuration(format!(
        "Attempt to upload {} universes to HinksPix controller but only {} are supported.",
        count, max
    ))
}

/// Input table rows grouped six to a write
///
/// Bound universes take their own row, free indices up to `max` get a
/// placeholder, and the tail of the last block is padded with `unused`.
/// Also returns the number of bound rows.
fn universe_blocks(
    universes: &[InputUniverse],
    max: u32,
    record: impl Fn(&InputUniverse) -> String,
    placeholder: impl Fn(u32) -> String,
    unused: &str,
) -> (Vec<Vec<String>>, u32) {
    let block_count = (max as usize).div_ceil(UNIVERSES_PER_BLOCK);
    let mut index = 1;
    let mut bound = 0;
    let blocks = (0..block_count)
        .map(|_| {
            (0..UNIVERSES_PER_BLOCK)
                .map(|_| {
                    if let Some(uni) = by_index(universes, index) {
                        index += 1;
                        bound += 1;
                        record(uni)
                    } else if index <= max {
                        index += 1;
                        placeholder(index - 1)
                    } else {
                        unused.to_string()
                    }
                })
                .collect()
        })
        .collect();
    (blocks, bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Header;
    use std::collections::VecDeque;

    /// Replies in order, records every request
    #[derive(Default)]
    struct Scripted {
        replies: VecDeque<Result<String>>,
        sent: Vec<(String, Vec<(String, String)>)>,
        fire_and_forget: usize,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|r| Ok(r.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    impl ControlPlane for Scripted {
        fn request(&mut self, path: &str, headers: &[Header<'_>]) -> Result<String> {
            self.sent.push((
                path.to_string(),
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(r#"{"RESULT":"OK"}"#.to_string()))
        }

        fn send_no_response(&mut self, _path: &str, _headers: &[Header<'_>]) {
            self.fire_and_forget += 1;
        }
    }

    const PRO_INFO: &str = r#"{"BD1":"L","BD2":"S","BD3":"N","BD4":"N","BD5":"N","Type":"P","Controller":"H","MaxU":"8","MCPU":"V1.151","PCPU":"V1.1","ECPU":"V1.1","WEB":"V1.1"}"#;
    const PRO80_INFO: &str = r#"{"BD1":"S","Type":"8","Controller":"H","MaxU":"684","MCPU":"V1.130"}"#;
    const EASY_INFO: &str = r#"{"BD1":"S","Type":"P","Controller":"E","MaxU":"65","MCPU":"V1.122"}"#;

    fn connect(info: &str, replies: &[&str]) -> HinksPix<Scripted> {
        let mut all = vec![info];
        all.extend_from_slice(replies);
        HinksPix::connect(Scripted::new(&all), 3).unwrap()
    }

    #[test]
    fn test_connect_retries_empty_reply() {
        let driver = HinksPix::connect(Scripted::new(&["", "", PRO_INFO]), 3).unwrap();
        assert_eq!(driver.info().model_name(), "HinksPix PRO");
        assert_eq!(driver.plane.sent.len(), 3);
    }

    #[test]
    fn test_connect_gives_up() {
        assert!(HinksPix::connect(Scripted::new(&["", "", "", PRO_INFO]), 3).is_err());
    }

    #[test]
    fn test_capabilities() {
        let pro = connect(PRO_INFO, &[]);
        assert!(pro.firmware_supports_upload());
        assert!(pro.unpack_supported(MODEL_PRO_V2));
        assert!(!pro.unpack_supported("EasyLights"));

        let pro80 = connect(PRO80_INFO, &[]);
        assert!(pro80.firmware_supports_upload());
        assert!(pro80.unpack_supported(MODEL_PRO_V3));
        assert!(!pro80.unpack_supported(MODEL_PRO_V2));

        let easy = connect(EASY_INFO, &[]);
        assert!(!easy.firmware_supports_upload());
        assert_eq!(easy.port_count(), 16);
    }

    #[test]
    fn test_model_mismatch_rejected() {
        let pro80 = connect(PRO80_INFO, &[]);
        let mut layout = Layout::default();
        layout.controller.model = MODEL_PRO_V2.into();
        let err = pro80.check_compatible(&layout).unwrap_err();
        assert!(err.to_string().contains("PRO V1/V2 - Please Fix"));
    }

    #[test]
    fn test_old_firmware_rejected() {
        let old = connect(
            r#"{"BD1":"S","Type":"P","Controller":"H","MaxU":"145","MCPU":"V1.100"}"#,
            &[],
        );
        let err = old.check_compatible(&Layout::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "HinksPix CPU Firmware is too old (v100) Update to v101 or Newer."
        );
    }

    #[test]
    fn test_read_board_rows() {
        let rows: Vec<String> = (1..=16)
            .map(|p| format!(r#"{{"V":"{},1,1,50,150,0,2,0,90,2"}}"#, p + 16))
            .collect();
        let mut bad = rows.clone();
        bad[3] = r#"{"V":"99,1,1,50,150,0,2,0,90,2"}"#.to_string();
        let reply = format!(r#"{{"LIST":[{}]}}"#, bad.join(","));
        // the first board answers without a LIST and is skipped
        let mut pro = connect(PRO_INFO, &["{}", &reply]);
        let outputs = pro.read_pixel_outputs(false, 100);
        assert_eq!(outputs.len(), 80);
        assert_eq!(outputs[16].pixels, 50);
        assert_eq!(outputs[16].color_order, 2);
        assert_eq!(outputs[19].pixels, 0);
        assert_eq!(outputs[0].brightness, 100);
        assert_eq!(pro.plane.sent[2].1, vec![("BLK".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_full_control_skips_reads() {
        let mut pro = connect(PRO_INFO, &[]);
        let outputs = pro.read_pixel_outputs(true, 47);
        assert_eq!(outputs[5].brightness, 40);
        assert_eq!(pro.read_serial(true), SerialOutput::default());
        assert_eq!(pro.plane.sent.len(), 1);
    }

    #[test]
    fn test_universe_blocks_layout() {
        let mut uni = InputUniverse::new(10, 510);
        uni.index = 1;
        uni.controller_start = 1;
        let (blocks, bound) = universe_blocks(
            &[uni],
            8,
            command::universe_record,
            command::universe_placeholder,
            UNIVERSE_UNUSED,
        );
        assert_eq!(bound, 1);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0][0], r#"{"V":"1,10,510,1,1,510"}"#);
        assert_eq!(blocks[0][1], r#"{"V":"2,2,0,1,0,0"}"#);
        assert_eq!(blocks[1][1], r#"{"V":"8,8,0,1,0,0"}"#);
        assert_eq!(blocks[1][2], UNIVERSE_UNUSED);
    }

    #[test]
    fn test_rejected_post_names_operation() {
        let mut pro = connect(PRO_INFO, &["FAIL"]);
        let err = pro
            .upload_serial(
                &SerialOutput {
                    upload: true,
                    ..Default::default()
                },
                OutputKind::E131,
                true,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "serial rejected by controller: 'FAIL'");
    }

    #[test]
    fn test_hinkspix_reboot_is_fire_and_forget() {
        let mut pro = connect(PRO_INFO, &[]);
        pro.reboot(Duration::from_millis(1)).unwrap();
        assert_eq!(pro.plane.fire_and_forget, 2);
        assert_eq!(pro.plane.sent.len(), 1);
    }

    #[test]
    fn test_easylights_reboot_waits_for_done() {
        let mut easy = connect(EASY_INFO, &["busy"]);
        assert!(easy.reboot(Duration::from_millis(1)).is_err());
        let (path, headers) = &easy.plane.sent[1];
        assert_eq!(path, ROW_DATA_URL);
        assert_eq!(headers[0], ("ROW".to_string(), "1111".to_string()));
    }
}
