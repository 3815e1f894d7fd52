//! Unpack table: relocation of layout channels onto contiguous controller channels
//!
//! One entry per model span, pixel ports first in port order, then the
//! serial port. Entries are sorted by their layout position and merged
//! into runs that stay contiguous on both sides, so the controller's
//! EEPROM-backed table holds as few records as possible.

use crate::codec::command::{unpack_block, UNPACK_EMPTY};
use crate::constants::{SERIAL_REMAP_PORT, UNPACK_ENTRIES_PER_BLOCK};
use crate::layout::{Layout, ModelSpan};
use crate::model::PixelOutput;
use tracing::debug;

/// One relocation record
///
/// Positions are 0-based and end positions are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapEntry {
    /// Pixel port, or [`SERIAL_REMAP_PORT`] for the serial port
    pub port: u32,
    pub channels: u32,
    pub old_start: u32,
    pub old_end: u32,
    pub new_start: u32,
    pub new_end: u32,
    /// Cleared once merged into a predecessor
    pub active: bool,
}

impl RemapEntry {
    pub fn new(port: u32, old_start: u32, new_start: u32, channels: u32) -> Self {
        Self {
            port,
            channels,
            old_start,
            old_end: old_start + channels,
            new_start,
            new_end: new_start + channels,
            active: true,
        }
    }

    /// Whether `next` continues this entry on both sides
    fn continued_by(&self, next: &RemapEntry) -> bool {
        next.old_start == self.old_end && next.new_start == self.new_end
    }

    fn absorb(&mut self, next: &RemapEntry) {
        self.old_end += next.channels;
        self.new_end += next.channels;
        self.channels += next.channels;
    }

    fn moves(&self) -> bool {
        self.old_start != self.new_start
    }
}

/// Merge contiguous runs in place
///
/// `entries` must already be sorted by `old_start`. Each entry is compared
/// with the last entry still active; continued runs are folded into it and
/// deactivated. Returns the number of entries left active.
pub fn compact(entries: &mut [RemapEntry]) -> usize {
    if entries.is_empty() {
        return 0;
    }
    let mut kept = 0;
    for i in 1..entries.len() {
        if entries[kept].continued_by(&entries[i]) {
            let next = entries[i].clone();
            entries[kept].absorb(&next);
            entries[i].active = false;
        } else {
            kept = i;
        }
    }
    entries.iter().filter(|e| e.active).count()
}

/// Compacted unpack table for one upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackTable {
    entries: Vec<RemapEntry>,
}

impl UnpackTable {
    /// Build, sort and compact the table for `layout`
    ///
    /// `outputs` are the allocated pixel ports. Each port's new range is
    /// as wide as the controller sizes it, so new positions line up with
    /// the controller start channels.
    pub fn build(layout: &Layout, outputs: &[PixelOutput]) -> Self {
        let mut ports: Vec<(u32, Vec<&ModelSpan>, Option<u32>)> = Vec::new();
        for number in 1..=layout.max_pixel_port() {
            if let Some(pixel) = layout.pixel_port(number) {
                let width = outputs
                    .iter()
                    .find(|o| o.port == number && o.used)
                    .map(PixelOutput::channel_count);
                ports.push((number, pixel.spans().collect(), width));
            }
        }
        if let Some(serial) = layout.serial_port(1) {
            ports.push((SERIAL_REMAP_PORT, serial.spans().collect(), None));
        }

        // Layout positions are relative to the lowest channel on the controller
        let offset = ports
            .iter()
            .flat_map(|(_, spans, _)| spans.iter())
            .map(|s| s.start_channel.saturating_sub(1))
            .min()
            .unwrap_or(0);
        let mut entries = Vec::new();
        let mut next = 0;
        for (port, spans, width) in ports {
            let base = next;
            for span in spans {
                let old = span.start_channel.saturating_sub(1) - offset;
                entries.push(RemapEntry::new(port, old, next, span.channels));
                next += span.channels;
            }
            if let Some(width) = width {
                next = base + width;
            }
        }
        Self::from_entries(entries)
    }

    /// Sort and compact prepared entries
    pub fn from_entries(mut entries: Vec<RemapEntry>) -> Self {
        dump("Total map", &entries);
        entries.sort_by_key(|e| e.old_start);
        dump("After sort", &entries);
        let active = compact(&mut entries);
        dump("After compaction", &entries);
        debug!("{} of {} unpack entries active", active, entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[RemapEntry] {
        &self.entries
    }

    pub fn active(&self) -> impl Iterator<Item = &RemapEntry> {
        self.entries.iter().filter(|e| e.active)
    }

    /// Whether any channel actually moves
    ///
    /// An identity mapping is sent as an empty table.
    pub fn is_dirty(&self) -> bool {
        self.active().any(RemapEntry::moves)
    }

    /// Control-plane payloads in send order
    ///
    /// Blocks of up to 16 entries, each carrying the number of entries
    /// still pending after it. A clean table yields one empty block.
    pub fn requests(&self) -> Vec<String> {
        if !self.is_dirty() {
            return vec![UNPACK_EMPTY.to_string()];
        }
        let active: Vec<RemapEntry> = self.active().cloned().collect();
        let mut left = active.len();
        active
            .chunks(UNPACK_ENTRIES_PER_BLOCK)
            .enumerate()
            .map(|(block, chunk)| {
                left -= chunk.len();
                unpack_block(block, chunk, left)
            })
            .collect()
    }
}

fn dump(title: &str, entries: &[RemapEntry]) {
    debug!("{}", title);
    for (i, e) in entries.iter().enumerate() {
        debug!(
            "{} {} Port={} MyStart={} MyEnd={} NewStart={} NewEnd={} NumChans={}",
            i,
            !e.active,
            e.port,
            e.old_start,
            e.old_end,
            e.new_start,
            e.new_end,
            e.channels
        );
    }
}
