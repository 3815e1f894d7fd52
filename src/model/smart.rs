//! Smart remote units and their per-board banks

use crate::constants::{BANKS_PER_BOARD, EXPANSION_SLOTS, PORTS_PER_BANK};
use tracing::debug;

/// Smart remote family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmartRemoteKind {
    /// Plain 4-port remote
    #[default]
    Standard,
    /// 16-port remote, occupies four consecutive ids
    Sixteen,
    /// 16-port AC remote, addressed in pixels
    SixteenAc,
}

impl SmartRemoteKind {
    /// Classify a layout remote type string ("falcon_v2", "16ac", ...)
    pub fn from_type_name(name: &str) -> Self {
        if name.contains("16ac") {
            Self::SixteenAc
        } else if name.contains("16") {
            Self::Sixteen
        } else {
            Self::Standard
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Standard => 0,
            Self::Sixteen => 1,
            Self::SixteenAc => 2,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Sixteen,
            2 => Self::SixteenAc,
            _ => Self::Standard,
        }
    }
}

/// One daisy-chained remote inside a bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartRemote {
    /// 0-based position in the bank
    pub id: u32,
    pub kind: SmartRemoteKind,
    /// Start pixel for each of the bank's sub-ports
    pub start_pixels: [u32; PORTS_PER_BANK],
}

impl SmartRemote {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            kind: SmartRemoteKind::Standard,
            start_pixels: [0; PORTS_PER_BANK],
        }
    }

    pub fn dump(&self) {
        debug!(
            "  ID {} Type {} Port 1 Start Pixel {} Port 2 Start Pixel {} Port 3 Start Pixel {} Port 4 Start Pixel {}",
            self.id,
            self.kind.code(),
            self.start_pixels[0],
            self.start_pixels[1],
            self.start_pixels[2],
            self.start_pixels[3]
        );
    }
}

/// Remotes of every (expansion board, bank) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartRemoteTable {
    boards: Vec<[Vec<SmartRemote>; BANKS_PER_BOARD]>,
}

impl Default for SmartRemoteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartRemoteTable {
    pub fn new() -> Self {
        Self {
            boards: (0..EXPANSION_SLOTS).map(|_| Default::default()).collect(),
        }
    }

    pub fn bank(&self, board: usize, bank: usize) -> &[SmartRemote] {
        &self.boards[board][bank]
    }

    pub fn bank_mut(&mut self, board: usize, bank: usize) -> &mut Vec<SmartRemote> {
        &mut self.boards[board][bank]
    }

    /// Whether any bank on `board` holds a remote
    pub fn board_has_remotes(&self, board: usize) -> bool {
        self.boards[board].iter().any(|bank| !bank.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        (0..self.boards.len()).all(|b| !self.board_has_remotes(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_type_name() {
        assert_eq!(
            SmartRemoteKind::from_type_name("falcon_v2"),
            SmartRemoteKind::Standard
        );
        assert_eq!(
            SmartRemoteKind::from_type_name("hinks_16"),
            SmartRemoteKind::Sixteen
        );
        assert_eq!(
            SmartRemoteKind::from_type_name("hinks_16ac"),
            SmartRemoteKind::SixteenAc
        );
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = SmartRemoteTable::new();
        assert!(table.is_empty());
        assert_eq!(table.bank(EXPANSION_SLOTS - 1, BANKS_PER_BOARD - 1).len(), 0);
    }
}
