//! Channel allocation
//!
//! Assigns each used pixel port a controller-relative channel range,
//! walking ports in number order with one running cursor. With universe
//! per string the input universe table is filled as the walk goes;
//! otherwise it is bound up front in declaration order.

use crate::constants::{MIN_SERIAL_CHANNELS, PORTS_PER_BOARD};
use crate::error::{Result, UploadError};
use crate::layout::{Layout, ModelSpan, NetworkOutput, OutputKind, PixelPort, SerialPort};
use crate::model::encode::{encode_brightness, encode_color_order, encode_gamma, encode_protocol};
use crate::model::universe::by_universe_mut;
use crate::model::{Direction, ExpansionType, InputUniverse, PixelOutput, SerialOutput};
use tracing::{debug, info_span};

/// Input table rows for the controller's network outputs
///
/// `sequential` places them in declaration order with cumulative start
/// channels; otherwise rows stay unplaced for the port walk to fill.
pub fn bind_universes(outputs: &[NetworkOutput], sequential: bool) -> Vec<InputUniverse> {
    let mut universes: Vec<InputUniverse> = outputs
        .iter()
        .map(|o| InputUniverse::new(o.universe, o.channels))
        .collect();
    if sequential {
        let mut start = 1;
        for (i, uni) in universes.iter_mut().enumerate() {
            uni.index = i as u32 + 1;
            uni.controller_start = start;
            start += uni.channels;
        }
    }
    universes
}

/// Running channel cursor over the controller's buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAllocator {
    universe_per_string: bool,
    next_channel: u32,
    next_index: u32,
}

impl ChannelAllocator {
    pub fn new(universe_per_string: bool) -> Self {
        Self {
            universe_per_string,
            next_channel: 1,
            next_index: 1,
        }
    }

    /// Next free controller channel
    pub fn next_channel(&self) -> u32 {
        self.next_channel
    }

    /// Next free input table row
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Place one pixel port at the cursor
    ///
    /// Ports without spans are left untouched and consume nothing.
    pub fn allocate_port(
        &mut self,
        port: &PixelPort,
        output: &mut PixelOutput,
        universes: &mut [InputUniverse],
    ) -> Result<()> {
        let Some(first) = port.first_span() else {
            return Ok(());
        };
        apply_first_span(output, first)?;
        output.pixels = port.pixels();
        output.used = true;
        output.set_controller_channels(self.next_channel);

        if self.universe_per_string {
            for span in port.spans() {
                self.walk_universes(span, universes)?;
            }
        } else {
            // The controller sizes the port from its first colour order
            self.next_channel += output.channel_count();
        }
        Ok(())
    }

    /// Bind every universe a span touches, starting at its own universe
    fn walk_universes(&mut self, span: &ModelSpan, universes: &mut [InputUniverse]) -> Result<()> {
        let mut universe = span.universe;
        let mut remaining = span.channels;
        while remaining > 0 {
            let binding = by_universe_mut(universes, universe)
                .filter(|u| u.channels > 0)
                .ok_or_else(|| {
                    UploadError::configuration(format!(
                        "Model '{}' uses universe {} which is not an input of this controller",
                        span.name, universe
                    ))
                })?;
            binding.index = self.next_index;
            binding.controller_start = self.next_channel;
            self.next_index += 1;
            self.next_channel += binding.channels;
            remaining = remaining.saturating_sub(binding.channels);
            universe += 1;
        }
        Ok(())
    }

    /// Fold the serial port into the cursor sequence
    ///
    /// The span is widened to the 16-channel hardware floor. Under DDP the
    /// port is addressed absolutely and the cursor does not move.
    pub fn allocate_serial(
        &mut self,
        port: &SerialPort,
        kind: OutputKind,
        serial: &mut SerialOutput,
        universes: &mut [InputUniverse],
    ) {
        let start = port.start_channel();
        let channels = (port.end_channel() + 1)
            .saturating_sub(start)
            .max(MIN_SERIAL_CHANNELS);

        if kind == OutputKind::Ddp {
            serial.apply_ddp(start, channels);
            return;
        }

        let (universe, universe_start) = port.universe();
        serial.apply_universe(universe, universe_start, channels);
        if !self.universe_per_string {
            self.next_channel += channels;
            return;
        }
        if let Some(binding) = by_universe_mut(universes, universe) {
            binding.index = self.next_index;
            binding.controller_start = self.next_channel;
            binding.channels = channels;
            self.next_index += 1;
            self.next_channel += channels;
        }
    }
}

/// Copy the first span's port-wide settings onto the output
fn apply_first_span(output: &mut PixelOutput, span: &ModelSpan) -> Result<()> {
    if let Some(protocol) = &span.protocol {
        output.protocol = encode_protocol(protocol).ok_or_else(|| {
            UploadError::configuration(format!(
                "Port {}: protocol '{}' is not supported by HinksPix",
                output.port, protocol
            ))
        })?;
    }
    if let Some(order) = &span.color_order {
        output.color_order = encode_color_order(order).ok_or_else(|| {
            UploadError::configuration(format!(
                "Port {}: colour order '{}' is not supported by HinksPix",
                output.port, order
            ))
        })?;
    }
    if let Some(nulls) = span.start_null_pixels {
        output.null_pixels = nulls;
    }
    if let Some(brightness) = span.brightness {
        output.brightness = encode_brightness(brightness);
    }
    if let Some(direction) = &span.direction {
        output.direction = Direction::from_layout(direction);
    }
    if let Some(gamma) = span.gamma {
        output.gamma = encode_gamma(gamma);
    }
    output.universe = span.universe;
    output.start_channel = span.universe_start_channel;
    Ok(())
}

/// Place every pixel port of the layout
pub fn allocate_ports(
    layout: &Layout,
    allocator: &mut ChannelAllocator,
    outputs: &mut [PixelOutput],
    universes: &mut [InputUniverse],
) -> Result<()> {
    let _span = info_span!("allocate").entered();
    let port_count = outputs.len();
    for number in 1..=layout.max_pixel_port() {
        let Some(port) = layout.pixel_port(number) else {
            continue;
        };
        let output = outputs
            .iter_mut()
            .find(|o| o.port == number)
            .ok_or_else(|| {
                UploadError::configuration(format!(
                    "Pixel Output {} does not exist on this controller ({} ports)",
                    number, port_count
                ))
            })?;
        allocator.allocate_port(port, output, universes)?;
        debug!(
            "Port {} -> channels {}..{}",
            number,
            output.controller_start(),
            output.controller_end()
        );
    }
    Ok(())
}

/// Reject used ports on expansion slots with no board fitted
pub fn check_pixel_outputs(outputs: &[PixelOutput], expansions: &[ExpansionType]) -> Result<()> {
    for output in outputs.iter().filter(|o| o.used) {
        let board = (output.port as usize - 1) / PORTS_PER_BOARD;
        let present = expansions
            .get(board)
            .is_some_and(|e| *e != ExpansionType::NotPresent);
        if !present {
            return Err(UploadError::configuration(format!(
                "Pixel Output {} is being used on Expansion Port {} and no Output Board is Connected!",
                output.port,
                board + 1
            )));
        }
    }
    Ok(())
}
