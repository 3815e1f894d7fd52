//! Decoding of controller replies
//!
//! Positional rows are parsed with strict arity: a row with the wrong
//! field count, a non-numeric field, or a port index that does not match
//! the port being read is rejected whole and never partially applied.

use crate::constants::EXPANSION_SLOTS;
use crate::error::{Result, UploadError};
use crate::model::{
    Direction, ExpansionType, PixelOutput, SerialOutput, SmartRemote, SmartRemoteKind,
};
use serde_json::Value;
use std::collections::HashMap;

fn split_fields<'a>(row: &'a str, expected: usize) -> Result<Vec<&'a str>> {
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() != expected {
        return Err(UploadError::FieldCount {
            expected,
            found: fields.len(),
            row: row.to_string(),
        });
    }
    Ok(fields)
}

fn number(field: &str, row: &str) -> Result<u32> {
    field
        .parse()
        .map_err(|_| UploadError::protocol(format!("non-numeric field '{}' in '{}'", field, row)))
}

/// One pixel port as reported by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRow {
    pub port: u32,
    pub protocol: u32,
    pub controller_start: u32,
    pub pixels: u32,
    pub controller_end: u32,
    pub direction: u32,
    pub color_order: u32,
    pub null_pixels: u32,
    pub brightness: u32,
    pub gamma: u32,
}

impl PortRow {
    /// Parse `port,protocol,start,pixels,end,dir,order,nulls,brightness,gamma`
    ///
    /// A protocol of `undefined` reads as 0.
    pub fn parse(row: &str, expected_port: u32) -> Result<Self> {
        let f = split_fields(row, 10)?;
        let port = number(f[0], row)?;
        if port != expected_port {
            return Err(UploadError::PortMismatch {
                expected: expected_port,
                row: row.to_string(),
            });
        }
        let protocol = if f[1] == "undefined" {
            0
        } else {
            number(f[1], row)?
        };
        Ok(Self {
            port,
            protocol,
            controller_start: number(f[2], row)?,
            pixels: number(f[3], row)?,
            controller_end: number(f[4], row)?,
            direction: number(f[5], row)?,
            color_order: number(f[6], row)?,
            null_pixels: number(f[7], row)?,
            brightness: number(f[8], row)?,
            gamma: number(f[9], row)?,
        })
    }

    /// Copy the reported state onto a port
    ///
    /// The end channel is not copied; it follows from start, pixels and
    /// colour order.
    pub fn apply_to(&self, output: &mut PixelOutput) {
        output.protocol = self.protocol;
        output.pixels = self.pixels;
        output.direction = Direction::from_code(self.direction);
        output.color_order = self.color_order;
        output.null_pixels = self.null_pixels;
        output.brightness = self.brightness;
        output.gamma = self.gamma;
        output.set_controller_channels(self.controller_start);
    }
}

/// Parse `id,kind,start0,start1,start2,start3`
pub fn parse_smart_row(row: &str) -> Result<SmartRemote> {
    let f = split_fields(row, 6)?;
    let mut remote = SmartRemote::new(number(f[0], row)?);
    remote.kind = SmartRemoteKind::from_code(number(f[1], row)?);
    for (slot, field) in remote.start_pixels.iter_mut().zip(&f[2..]) {
        *slot = number(field, row)?;
    }
    Ok(remote)
}

/// `V` strings of a `{"LIST":[{"V":"..."},...]}` reply
pub fn list_rows(reply: &Value) -> Result<Vec<String>> {
    let list = reply
        .get("LIST")
        .and_then(Value::as_array)
        .ok_or_else(|| UploadError::MissingMember {
            member: "LIST",
            payload: reply.to_string(),
        })?;
    list.iter()
        .map(|item| {
            item.get("V")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| UploadError::MissingMember {
                    member: "V",
                    payload: item.to_string(),
                })
        })
        .collect()
}

/// Member as text, numbers included
fn member_text(reply: &Value, key: &str) -> Option<String> {
    match reply.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(u32::from(*b).to_string()),
        _ => None,
    }
}

/// Member as an integer, numeric strings included
fn member_u32(reply: &Value, key: &str) -> u32 {
    member_text(reply, key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Serial state from the mode endpoint
pub fn parse_serial_state(reply: &Value) -> Result<SerialOutput> {
    if reply.get("CMD").is_none() {
        return Err(UploadError::MissingMember {
            member: "CMD",
            payload: reply.to_string(),
        });
    }
    Ok(SerialOutput {
        e131_enabled: member_u32(reply, "DMX_ACTIVE") != 0,
        e131_universe: member_u32(reply, "DMX_UNIV"),
        e131_start_channel: member_u32(reply, "DMX_START"),
        e131_channels: member_u32(reply, "DMX_CHAN_CNT"),
        ddp_enabled: member_u32(reply, "DDP_DMX_ACTIVE") != 0,
        ddp_start_channel: member_u32(reply, "DDP_DMX_START"),
        ddp_channels: member_u32(reply, "DDP_DMX_CHAN_CNT"),
        upload: false,
    })
}

/// Hardware family reported by the board-info endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerFamily {
    HinksPix,
    EasyLights,
    #[default]
    Unknown,
}

/// Decoded board-info reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardInfo {
    pub family: ControllerFamily,
    /// PRO 80 / hardware V3
    pub hardware_v3: bool,
    pub expansions: [ExpansionType; EXPANSION_SLOTS],
    pub max_universes: u32,
    pub main_firmware: u32,
    pub main_version: String,
    pub power_version: String,
    pub wifi_version: String,
    pub web_version: String,
}

/// Version members carry a 3-character prefix ("V1.151" style)
fn version_text(reply: &Value, key: &str) -> String {
    let raw = member_text(reply, key).unwrap_or_else(|| "0".to_string());
    raw.chars().skip(3).collect()
}

impl BoardInfo {
    pub fn from_json(reply: &Value) -> Result<Self> {
        if !reply.as_object().is_some_and(|o| !o.is_empty()) {
            return Err(UploadError::protocol(format!(
                "empty board info reply: {}",
                reply
            )));
        }
        let mut expansions = [ExpansionType::NotPresent; EXPANSION_SLOTS];
        for (slot, exp) in expansions.iter_mut().enumerate() {
            let code = member_text(reply, &format!("BD{}", slot + 1)).unwrap_or_default();
            *exp = ExpansionType::decode(&code);
        }
        let family = match member_text(reply, "Controller").as_deref() {
            Some("H") => ControllerFamily::HinksPix,
            Some("E") => ControllerFamily::EasyLights,
            _ => ControllerFamily::Unknown,
        };
        let main_version = version_text(reply, "MCPU");
        Ok(Self {
            family,
            hardware_v3: member_text(reply, "Type").as_deref() == Some("8"),
            expansions,
            max_universes: member_u32(reply, "MaxU"),
            main_firmware: main_version.trim().parse().unwrap_or(0),
            main_version,
            power_version: version_text(reply, "PCPU"),
            wifi_version: version_text(reply, "ECPU"),
            web_version: version_text(reply, "WEB"),
        })
    }

    pub fn model_name(&self) -> &'static str {
        match self.family {
            ControllerFamily::EasyLights => "EasyLights Pix16",
            ControllerFamily::HinksPix if self.hardware_v3 => "HinksPix PRO 80",
            ControllerFamily::HinksPix => "HinksPix PRO",
            ControllerFamily::Unknown => "Unknown",
        }
    }

    pub fn version_string(&self) -> String {
        format!(
            "MAIN:{},POWER:{},WIFI:{},WEB:{}",
            self.main_version, self.power_version, self.wifi_version, self.web_version
        )
    }
}

/// `K,V,K,V,...` row reply; odd item counts yield an empty map
pub fn parse_key_values(text: &str) -> HashMap<String, String> {
    let items: Vec<&str> = text.trim().split(',').collect();
    if items.len() % 2 != 0 {
        return HashMap::new();
    }
    items
        .chunks(2)
        .map(|kv| (kv[0].to_string(), kv[1].to_string()))
        .collect()
}

/// One entry of the SD-card directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    /// Packed FAT date
    pub date: u32,
    /// Packed FAT time
    pub time: u32,
}

/// Parse `*NAME,date,time!*NAME,date,time!...`
///
/// Anything from the acknowledgement sentinel on is ignored, as are
/// entries without exactly three fields.
pub fn parse_file_listing(text: &str) -> Vec<FileEntry> {
    let body = text.split('|').next().unwrap_or_default();
    body.split('!')
        .filter_map(|item| {
            let item = item.strip_prefix('*').unwrap_or(item);
            let parts: Vec<&str> = item.split(',').collect();
            if parts.len() != 3 || parts[0].is_empty() {
                return None;
            }
            Some(FileEntry {
                name: parts[0].to_string(),
                date: parts[1].trim().parse().unwrap_or(0),
                time: parts[2].trim().parse().unwrap_or(0),
            })
        })
        .collect()
}
