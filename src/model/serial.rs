//! DMX / serial output port

use tracing::debug;

/// Serial port configuration for both input transports
///
/// Only one half is active per upload: E1.31/Art-Net uses the universe
/// fields, DDP uses the absolute DDP fields. `upload` is raised whenever
/// a field changes from the value read back from the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerialOutput {
    pub e131_enabled: bool,
    pub e131_universe: u32,
    pub e131_start_channel: u32,
    pub e131_channels: u32,
    pub ddp_enabled: bool,
    pub ddp_start_channel: u32,
    pub ddp_channels: u32,
    pub upload: bool,
}

impl SerialOutput {
    /// Route the port from a universe (E1.31 / Art-Net)
    pub fn apply_universe(&mut self, universe: u32, start_channel: u32, channels: u32) {
        set_tracked(&mut self.e131_universe, universe, &mut self.upload);
        set_tracked(&mut self.e131_start_channel, start_channel, &mut self.upload);
        set_tracked(&mut self.e131_channels, channels, &mut self.upload);
        if !self.e131_enabled {
            self.e131_enabled = true;
            self.upload = true;
        }
    }

    /// Route the port from an absolute DDP channel
    pub fn apply_ddp(&mut self, start_channel: u32, channels: u32) {
        set_tracked(&mut self.ddp_start_channel, start_channel, &mut self.upload);
        set_tracked(&mut self.ddp_channels, channels, &mut self.upload);
        if !self.ddp_enabled {
            self.ddp_enabled = true;
            self.upload = true;
        }
    }

    pub fn dump(&self) {
        debug!(
            "   E131 Uni {} E131 StartChan {} E131 NumOfChan {} E131 Enabled {} DDP StartChan {} DDP NumOfChan {} DDP Enabled {} Upload {}",
            self.e131_universe,
            self.e131_start_channel,
            self.e131_channels,
            self.e131_enabled,
            self.ddp_start_channel,
            self.ddp_channels,
            self.ddp_enabled,
            self.upload
        );
    }
}

fn set_tracked(field: &mut u32, value: u32, dirty: &mut bool) {
    if *field != value {
        *field = value;
        *dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_state_stays_clean() {
        let mut serial = SerialOutput {
            e131_enabled: true,
            e131_universe: 10,
            e131_start_channel: 1,
            e131_channels: 16,
            ..Default::default()
        };
        serial.apply_universe(10, 1, 16);
        assert!(!serial.upload);
    }

    #[test]
    fn test_any_change_marks_upload() {
        let mut serial = SerialOutput {
            e131_enabled: true,
            e131_universe: 10,
            e131_start_channel: 1,
            e131_channels: 16,
            ..Default::default()
        };
        serial.apply_universe(10, 1, 32);
        assert!(serial.upload);
        assert_eq!(serial.e131_channels, 32);
    }

    #[test]
    fn test_enabling_ddp_marks_upload() {
        let mut serial = SerialOutput::default();
        serial.apply_ddp(0, 0);
        assert!(serial.ddp_enabled);
        assert!(serial.upload);
        assert!(!serial.e131_enabled);
    }
}
