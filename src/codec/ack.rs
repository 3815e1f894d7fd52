//! Acknowledgement lines on the binary socket
//!
//! The controller answers every packet with printable text containing a
//! `|` sentinel. A line is complete once the sentinel has been seen and
//! the stream then yields a non-printable byte, reaches EOF, or goes idle.

use super::Codec;
use crate::constants::{ACK_OK, ACK_SENTINEL};

/// One completed acknowledgement line (printable bytes only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckLine(pub String);

impl AckLine {
    pub fn is_ok(&self) -> bool {
        self.0.contains(ACK_OK)
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// Incremental acknowledgement decoder
#[derive(Debug, Default)]
pub struct AckDecoder {
    line: String,
    found: bool,
}

impl AckDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the sentinel has been seen on the current line
    pub fn sentinel_seen(&self) -> bool {
        self.found
    }

    /// Complete the pending line at EOF or after the idle grace
    pub fn finish(&mut self) -> Option<AckLine> {
        if self.found {
            Some(self.take())
        } else {
            None
        }
    }

    /// Whatever printable text has arrived, sentinel or not
    ///
    /// Listings may end without a sentinel; the caller decides whether
    /// that text is usable.
    pub fn take_partial(&mut self) -> Option<AckLine> {
        if self.line.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> AckLine {
        self.found = false;
        AckLine(std::mem::take(&mut self.line))
    }
}

impl Codec for AckDecoder {
    type Frame = AckLine;

    fn decode(&mut self, data: &[u8], mut on_frame: impl FnMut(AckLine)) {
        for &byte in data {
            if byte == ACK_SENTINEL {
                self.found = true;
            }
            if byte.is_ascii_graphic() || byte == b' ' {
                self.line.push(byte as char);
            } else if self.found {
                on_frame(self.take());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Vec<AckLine> {
        let mut decoder = AckDecoder::new();
        let mut lines = Vec::new();
        decoder.decode(data, |l| lines.push(l));
        lines
    }

    #[test]
    fn test_fok_is_success() {
        let lines = decode_all(b"|FOK\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_ok());
    }

    #[test]
    fn test_fail_is_rejected_despite_sentinel() {
        let lines = decode_all(b"|FAIL\n");
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].is_ok());
        assert_eq!(lines[0].text(), "|FAIL");
    }

    #[test]
    fn test_control_bytes_before_sentinel_are_skipped() {
        let lines = decode_all(b"\r\nOK|FOK\r\n");
        assert_eq!(lines[0].text(), "OK|FOK");
    }

    #[test]
    fn test_split_across_reads() {
        let mut decoder = AckDecoder::new();
        let mut lines = Vec::new();
        decoder.decode(b"|F", |l| lines.push(l));
        assert!(lines.is_empty());
        assert!(decoder.sentinel_seen());
        decoder.decode(b"OK\0", |l| lines.push(l));
        assert_eq!(lines, vec![AckLine("|FOK".into())]);
    }

    #[test]
    fn test_finish_requires_sentinel() {
        let mut decoder = AckDecoder::new();
        decoder.decode(b"FOK", |_| {});
        assert_eq!(decoder.finish(), None);
        decoder.decode(b"|FOK", |_| {});
        assert_eq!(decoder.finish(), Some(AckLine("FOK|FOK".into())));
    }

    #[test]
    fn test_take_partial_without_sentinel() {
        let mut decoder = AckDecoder::new();
        assert_eq!(decoder.take_partial(), None);
        decoder.decode(b"*A.HSEQ,1,2!\r\n*B.HSEQ,3,4!", |_| panic!("no sentinel"));
        assert_eq!(decoder.finish(), None);
        assert_eq!(
            decoder.take_partial(),
            Some(AckLine("*A.HSEQ,1,2!*B.HSEQ,3,4!".into()))
        );
        assert_eq!(decoder.take_partial(), None);
    }
}
