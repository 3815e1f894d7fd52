//! Smart remote grouping
//!
//! Ports 1..16 of an expansion board feed four banks of four sub-ports.
//! Every remote id seen on a port becomes a unit in its bank, carrying the
//! pixel at which that sub-port's string reaches the remote.

use crate::constants::{
    BANKS_PER_BOARD, EXPANSION_SLOTS, MAX_SMART_REMOTES, PORTS_PER_BANK, PORTS_PER_BOARD,
};
use crate::error::{Result, UploadError};
use crate::layout::{Layout, PixelPort};
use crate::model::{ExpansionType, SmartRemote, SmartRemoteKind, SmartRemoteTable};
use tracing::{debug, info_span};

/// Where a port sits on the expansion boards, all 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankPosition {
    pub board: usize,
    pub bank: usize,
    pub sub_port: usize,
}

impl BankPosition {
    pub fn of_port(port: u32) -> Result<Self> {
        let index = (port as usize)
            .checked_sub(1)
            .ok_or_else(|| UploadError::configuration("Pixel port numbers start at 1"))?;
        let board = index / PORTS_PER_BOARD;
        if board >= EXPANSION_SLOTS {
            return Err(UploadError::configuration(format!(
                "Pixel Output {} is beyond the last expansion board",
                port
            )));
        }
        let on_board = index % PORTS_PER_BOARD;
        Ok(Self {
            board,
            bank: on_board / PORTS_PER_BANK,
            sub_port: on_board % PORTS_PER_BANK,
        })
    }
}

/// Add the remotes used on one port to the table
pub fn assign_port(table: &mut SmartRemoteTable, port: &PixelPort) -> Result<()> {
    if !port.uses_smart_remote() {
        return Ok(());
    }
    let pos = BankPosition::of_port(port.port)?;
    let bank = table.bank_mut(pos.board, pos.bank);

    let mut previous = None;
    let mut start_pixel = 1;
    let mut port_channels = 0;
    for span in port.spans().filter(|s| s.uses_smart_remote()) {
        if span.smart_remote > MAX_SMART_REMOTES {
            return Err(UploadError::configuration(format!(
                "Model '{}' uses smart remote {} but a bank only addresses {}",
                span.name, span.smart_remote, MAX_SMART_REMOTES
            )));
        }
        let id = span.smart_remote - 1;
        if previous != Some(id) {
            let kind = SmartRemoteKind::from_type_name(&span.smart_remote_type);
            place_remote(bank, id, kind, pos.sub_port, start_pixel, port_channels);
        }
        port_channels += span.channels;
        start_pixel += span.channels / span.channels_per_pixel.max(3);
        previous = Some(id);
    }
    Ok(())
}

/// Record `start_pixel` for `id`, creating the unit if needed
fn place_remote(
    bank: &mut Vec<SmartRemote>,
    id: u32,
    kind: SmartRemoteKind,
    sub_port: usize,
    start_pixel: u32,
    port_channels: u32,
) {
    if let Some(remote) = bank.iter_mut().find(|r| r.id == id) {
        remote.start_pixels[sub_port] = start_pixel;
        return;
    }
    match kind {
        SmartRemoteKind::Sixteen => {
            // the four ids of one 16-port unit are always created together
            let base = (id / PORTS_PER_BANK as u32) * PORTS_PER_BANK as u32;
            for sibling in base..base + PORTS_PER_BANK as u32 {
                if bank.iter().all(|r| r.id != sibling) {
                    let mut remote = SmartRemote::new(sibling);
                    if sibling == base {
                        remote.kind = SmartRemoteKind::Sixteen;
                    }
                    bank.push(remote);
                }
            }
            if let Some(remote) = bank.iter_mut().find(|r| r.id == id) {
                remote.start_pixels[sub_port] = start_pixel;
            }
        }
        SmartRemoteKind::SixteenAc => {
            let mut remote = SmartRemote::new(id);
            remote.kind = SmartRemoteKind::SixteenAc;
            remote.start_pixels[sub_port] = port_channels / 3 + 1;
            bank.push(remote);
        }
        SmartRemoteKind::Standard => {
            let mut remote = SmartRemote::new(id);
            remote.start_pixels[sub_port] = start_pixel;
            bank.push(remote);
        }
    }
}

/// Group the smart remotes of every pixel port
pub fn group_remotes(layout: &Layout) -> Result<SmartRemoteTable> {
    let _span = info_span!("smart_remotes").entered();
    let mut table = SmartRemoteTable::new();
    for number in 1..=layout.max_pixel_port() {
        if let Some(port) = layout.pixel_port(number) {
            assign_port(&mut table, port)?;
        }
    }
    for board in 0..EXPANSION_SLOTS {
        for bank in 0..BANKS_PER_BOARD {
            for remote in table.bank(board, bank) {
                debug!("Board {} Bank {}", board, bank);
                remote.dump();
            }
        }
    }
    Ok(table)
}

/// Reject remotes on boards that are not long-range differential
pub fn check_smart_receivers(table: &SmartRemoteTable, expansions: &[ExpansionType]) -> Result<()> {
    for board in 0..EXPANSION_SLOTS {
        let long_range = expansions.get(board) == Some(&ExpansionType::LongRange);
        if !long_range && table.board_has_remotes(board) {
            return Err(UploadError::configuration(format!(
                "Expansion Port {} has Smart Receivers but it is not a Long Range Differential Board!",
                board + 1
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{test_span, ModelSpan, PortEntry};
    use proptest::prelude::*;

    fn remote_span(name: &str, channels: u32, remote: u32, kind: &str) -> ModelSpan {
        let mut span = test_span(name, 1, channels);
        span.smart_remote = remote;
        span.smart_remote_type = kind.to_string();
        span
    }

    fn port(number: u32, spans: Vec<ModelSpan>) -> PixelPort {
        PixelPort {
            port: number,
            entries: spans.into_iter().map(PortEntry::Model).collect(),
        }
    }

    #[test]
    fn test_bank_position() {
        assert_eq!(
            BankPosition::of_port(1).unwrap(),
            BankPosition { board: 0, bank: 0, sub_port: 0 }
        );
        assert_eq!(
            BankPosition::of_port(22).unwrap(),
            BankPosition { board: 1, bank: 1, sub_port: 1 }
        );
        assert!(BankPosition::of_port(81).is_err());
        assert!(BankPosition::of_port(0).is_err());
    }

    #[test]
    fn test_chain_of_standard_remotes() {
        let mut table = SmartRemoteTable::new();
        let p = port(
            3,
            vec![
                remote_span("a", 150, 1, "falcon_v2"),
                remote_span("b", 150, 2, "falcon_v2"),
                remote_span("c", 60, 2, "falcon_v2"),
            ],
        );
        assign_port(&mut table, &p).unwrap();
        let bank = table.bank(0, 0);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[0].id, 0);
        assert_eq!(bank[0].start_pixels, [0, 0, 1, 0]);
        assert_eq!(bank[1].id, 1);
        assert_eq!(bank[1].start_pixels, [0, 0, 51, 0]);
    }

    #[test]
    fn test_existing_remote_gets_sub_port_start() {
        let mut table = SmartRemoteTable::new();
        assign_port(&mut table, &port(1, vec![remote_span("a", 30, 1, "")])).unwrap();
        assign_port(
            &mut table,
            &port(2, vec![remote_span("b", 300, 2, ""), remote_span("c", 30, 1, "")]),
        )
        .unwrap();
        let bank = table.bank(0, 0);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[0].start_pixels, [1, 101, 0, 0]);
    }

    #[test]
    fn test_models_without_remote_are_skipped() {
        let mut table = SmartRemoteTable::new();
        let p = port(
            1,
            vec![test_span("plain", 1, 300), remote_span("a", 30, 2, "")],
        );
        assign_port(&mut table, &p).unwrap();
        assert_eq!(table.bank(0, 0)[0].start_pixels[0], 1);
    }

    #[test]
    fn test_sixteen_family_fills_four_ids() {
        let mut table = SmartRemoteTable::new();
        let p = port(
            5,
            vec![
                remote_span("a", 90, 6, "hinks_16"),
                remote_span("b", 90, 7, "hinks_16"),
            ],
        );
        assign_port(&mut table, &p).unwrap();
        let bank = table.bank(0, 1);
        let ids: Vec<u32> = bank.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5, 6, 7]);
        assert_eq!(bank[0].kind, SmartRemoteKind::Sixteen);
        assert_eq!(bank[1].kind, SmartRemoteKind::Standard);
        assert_eq!(bank[1].start_pixels[0], 1);
        assert_eq!(bank[2].start_pixels[0], 31);
    }

    #[test]
    fn test_sixteen_ac_starts_from_channels() {
        let mut table = SmartRemoteTable::new();
        let mut rgbw = remote_span("w", 400, 1, "falcon_v2");
        rgbw.channels_per_pixel = 4;
        let p = port(2, vec![rgbw, remote_span("ac", 16, 2, "hinks_16ac")]);
        assign_port(&mut table, &p).unwrap();
        let bank = table.bank(0, 0);
        assert_eq!(bank[1].kind, SmartRemoteKind::SixteenAc);
        assert_eq!(bank[1].start_pixels, [0, 134, 0, 0]);
    }

    #[test]
    fn test_remote_id_above_limit() {
        let mut table = SmartRemoteTable::new();
        let err = assign_port(&mut table, &port(1, vec![remote_span("a", 3, 17, "")])).unwrap_err();
        assert!(err.to_string().contains("smart remote 17"));
    }

    #[test]
    fn test_check_smart_receivers() {
        let mut table = SmartRemoteTable::new();
        assign_port(&mut table, &port(17, vec![remote_span("a", 3, 1, "")])).unwrap();
        let ok = [ExpansionType::LocalSpi, ExpansionType::LongRange];
        assert!(check_smart_receivers(&table, &ok).is_ok());
        let bad = [ExpansionType::LongRange, ExpansionType::LocalSpi];
        assert_eq!(
            check_smart_receivers(&table, &bad).unwrap_err().to_string(),
            "Expansion Port 2 has Smart Receivers but it is not a Long Range Differential Board!"
        );
    }

    proptest! {
        #[test]
        fn sixteen_family_always_creates_aligned_quad(remote in 1u32..=16, number in 1u32..=80) {
            let mut table = SmartRemoteTable::new();
            assign_port(&mut table, &port(number, vec![remote_span("a", 30, remote, "hinks_16")])).unwrap();
            let pos = BankPosition::of_port(number).unwrap();
            let mut ids: Vec<u32> = table.bank(pos.board, pos.bank).iter().map(|r| r.id).collect();
            ids.sort_unstable();
            let base = ((remote - 1) / 4) * 4;
            prop_assert_eq!(ids, vec![base, base + 1, base + 2, base + 3]);
        }
    }
}
