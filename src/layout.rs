//! Logical layout supplied by the sequencer
//!
//! The upload engine never edits models; it only reads, per physical
//! port, the ordered channel spans the layout places there.

use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Input transport of the controller's network outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    E131,
    ArtNet,
    Ddp,
}

impl OutputKind {
    /// Mode number used by the serial and EasyLights commands
    pub fn mode_code(self) -> u32 {
        match self {
            Self::E131 => 0,
            Self::Ddp => 1,
            Self::ArtNet => 2,
        }
    }
}

/// One network output (a universe, or the DDP block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOutput {
    #[serde(default)]
    pub kind: OutputKind,
    #[serde(default)]
    pub universe: u32,
    pub channels: u32,
    /// Absolute start channel
    #[serde(default = "one")]
    pub start_channel: u32,
    #[serde(default)]
    pub multicast: bool,
}

/// Controller entry as configured in the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub name: String,
    /// "PRO V1/V2", "PRO V3" or "EasyLights"
    pub model: String,
    pub universe_per_string: bool,
    pub full_control: bool,
    pub default_brightness: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: "PRO V1/V2".to_string(),
            universe_per_string: false,
            full_control: false,
            default_brightness: 100,
        }
    }
}

/// A contiguous block of channels belonging to one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpan {
    pub name: String,
    /// Absolute 1-based start channel
    pub start_channel: u32,
    pub channels: u32,
    #[serde(default = "three")]
    pub channels_per_pixel: u32,
    #[serde(default)]
    pub universe: u32,
    /// Start channel inside `universe`
    #[serde(default = "one")]
    pub universe_start_channel: u32,
    /// 0 = no smart remote, otherwise the 1-based remote id
    #[serde(default)]
    pub smart_remote: u32,
    #[serde(default)]
    pub smart_remote_type: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub color_order: Option<String>,
    #[serde(default)]
    pub brightness: Option<u32>,
    #[serde(default)]
    pub gamma: Option<u32>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub start_null_pixels: Option<u32>,
}

impl ModelSpan {
    pub fn end_channel(&self) -> u32 {
        (self.start_channel + self.channels).saturating_sub(1)
    }

    pub fn uses_smart_remote(&self) -> bool {
        self.smart_remote > 0
    }
}

/// What a port entry is in the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortEntry {
    Model(ModelSpan),
    SubModel {
        parent: String,
        #[serde(flatten)]
        span: ModelSpan,
    },
    Group {
        name: String,
        members: Vec<ModelSpan>,
    },
}

impl PortEntry {
    /// Channel spans this entry places on the port, in order
    pub fn spans(&self) -> &[ModelSpan] {
        match self {
            Self::Model(span) => std::slice::from_ref(span),
            Self::SubModel { span, .. } => std::slice::from_ref(span),
            Self::Group { members, .. } => members,
        }
    }
}

/// Pixel port contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPort {
    /// 1-based physical port
    pub port: u32,
    #[serde(default)]
    pub entries: Vec<PortEntry>,
}

impl PixelPort {
    pub fn spans(&self) -> impl Iterator<Item = &ModelSpan> {
        self.entries.iter().flat_map(|e| e.spans().iter())
    }

    pub fn first_span(&self) -> Option<&ModelSpan> {
        self.spans().next()
    }

    pub fn uses_smart_remote(&self) -> bool {
        self.spans().any(ModelSpan::uses_smart_remote)
    }

    pub fn channels(&self) -> u32 {
        self.spans().map(|s| s.channels).sum()
    }

    pub fn pixels(&self) -> u32 {
        self.spans()
            .map(|s| s.channels / s.channels_per_pixel.max(1))
            .sum()
    }
}

/// DMX / serial port contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialPort {
    #[serde(default = "one")]
    pub port: u32,
    #[serde(default)]
    pub entries: Vec<PortEntry>,
}

impl SerialPort {
    pub fn spans(&self) -> impl Iterator<Item = &ModelSpan> {
        self.entries.iter().flat_map(|e| e.spans().iter())
    }

    pub fn start_channel(&self) -> u32 {
        self.spans().map(|s| s.start_channel).min().unwrap_or(0)
    }

    pub fn end_channel(&self) -> u32 {
        self.spans().map(ModelSpan::end_channel).max().unwrap_or(0)
    }

    /// Universe and in-universe start of the first span
    pub fn universe(&self) -> (u32, u32) {
        self.spans()
            .min_by_key(|s| s.start_channel)
            .map(|s| (s.universe, s.universe_start_channel))
            .unwrap_or((0, 0))
    }
}

/// Everything the upload reads from the sequencer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub controller: ControllerSettings,
    pub outputs: Vec<NetworkOutput>,
    pub pixel_ports: Vec<PixelPort>,
    pub serial_ports: Vec<SerialPort>,
}

impl Layout {
    /// Load a layout exported as JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| UploadError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| UploadError::LayoutParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn output_kind(&self) -> OutputKind {
        self.outputs.first().map(|o| o.kind).unwrap_or_default()
    }

    pub fn pixel_port(&self, port: u32) -> Option<&PixelPort> {
        self.pixel_ports.iter().find(|p| p.port == port)
    }

    pub fn serial_port(&self, port: u32) -> Option<&SerialPort> {
        self.serial_ports
            .iter()
            .find(|p| p.port == port && p.spans().next().is_some())
    }

    pub fn max_pixel_port(&self) -> u32 {
        self.pixel_ports.iter().map(|p| p.port).max().unwrap_or(0)
    }
}

fn one() -> u32 {
    1
}

fn three() -> u32 {
    3
}

/// Plain RGB span in universe 1, for tests across the crate
#[cfg(test)]
pub(crate) fn test_span(name: &str, start: u32, channels: u32) -> ModelSpan {
    ModelSpan {
        name: name.to_string(),
        start_channel: start,
        channels,
        channels_per_pixel: 3,
        universe: 1,
        universe_start_channel: 1,
        smart_remote: 0,
        smart_remote_type: String::new(),
        protocol: None,
        color_order: None,
        brightness: None,
        gamma: None,
        direction: None,
        start_null_pixels: None,
    }
}
