//! Physical pixel output port

use super::encode::{bytes_per_pixel, encode_brightness, Direction};
use tracing::debug;

/// One pixel output on the controller
///
/// The controller end channel is always derived from the start channel,
/// the pixel count and the bytes per pixel of the colour order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelOutput {
    /// 1-based port number
    pub port: u32,
    pub protocol: u32,
    /// Universe of the first model (informational)
    pub universe: u32,
    /// Universe-relative start channel of the first model (informational)
    pub start_channel: u32,
    pub pixels: u32,
    pub direction: Direction,
    pub color_order: u32,
    pub null_pixels: u32,
    pub brightness: u32,
    pub gamma: u32,
    pub used: bool,
    controller_start: u32,
}

impl PixelOutput {
    /// Fresh port with controller defaults
    pub fn new(port: u32, default_brightness: u32) -> Self {
        Self {
            port,
            protocol: 0,
            universe: 0,
            start_channel: 0,
            pixels: 0,
            direction: Direction::Forward,
            color_order: 0,
            null_pixels: 0,
            brightness: encode_brightness(default_brightness),
            gamma: 1,
            used: false,
            controller_start: 0,
        }
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        bytes_per_pixel(self.color_order)
    }

    /// Channels this port occupies in the controller's buffer
    pub fn channel_count(&self) -> u32 {
        self.pixels * self.bytes_per_pixel()
    }

    pub fn set_controller_channels(&mut self, start: u32) {
        self.controller_start = start;
    }

    pub fn controller_start(&self) -> u32 {
        self.controller_start
    }

    pub fn controller_end(&self) -> u32 {
        (self.controller_start + self.channel_count()).saturating_sub(1)
    }

    pub fn dump(&self) {
        debug!(
            "    Output {} Uni {} StartChan {} Pixels {} Dir {} Protocol {} Nulls {} ColorOrder {} Brightness {} Gamma {} ControllerStart {} ControllerEnd {} Used {}",
            self.port,
            self.universe,
            self.start_channel,
            self.pixels,
            self.direction.code(),
            self.protocol,
            self.null_pixels,
            self.color_order,
            self.brightness,
            self.gamma,
            self.controller_start,
            self.controller_end(),
            self.used
        );
    }
}
