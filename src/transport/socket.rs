//! Binary packet protocol on the controller's raw TCP port
//!
//! Every operation opens its own connection, sends packets strictly in
//! order and waits for one acknowledgement line per packet. The
//! controller accepts a single binary connection at a time, so nothing
//! here is pooled.

use super::connect;
use crate::codec::packet::{self, StructType, CMD_FILE, MAX_REMOTE_NAME};
use crate::codec::row::{parse_file_listing, FileEntry};
use crate::codec::{AckDecoder, AckLine, Codec};
use crate::config::Config;
use crate::constants::{
    ACK_IDLE_GRACE, DEFAULT_ACK_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, FRAME_PAYLOAD_SIZE,
};
use crate::error::{Result, UploadError};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Connection parameters for binary operations
#[derive(Debug, Clone)]
pub struct BinarySession {
    address: String,
    connect_timeout: Duration,
    ack_timeout: Duration,
}

impl BinarySession {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host, port),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            address: format!("{}:{}", config.controller.host, config.controller.binary_port),
            connect_timeout: config.timeouts.connect(),
            ack_timeout: config.timeouts.ack(),
        }
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    fn open(&self) -> Result<TcpStream> {
        let stream = connect(&self.address, self.connect_timeout).inspect_err(|e| {
            error!("{}", e);
        })?;
        stream
            .set_write_timeout(Some(self.ack_timeout))
            .map_err(|e| UploadError::Io {
                operation: "configure binary connection",
                source: e,
            })?;
        Ok(stream)
    }

    /// Send one packet and require a `|FOK` acknowledgement
    fn exchange(&self, stream: &mut TcpStream, packet: &[u8], operation: &'static str) -> Result<()> {
        stream.write_all(packet).map_err(|e| UploadError::Io {
            operation,
            source: e,
        })?;
        let line = read_line(stream, self.ack_timeout, operation)?;
        expect_ok(&line, operation)
    }

    /// Transfer a local file to the controller's SD card
    ///
    /// `progress(done, total, message)` is called after every acknowledged
    /// chunk; returning `false` drops the connection without the close
    /// frame and fails with [`UploadError::Cancelled`].
    pub fn upload_file(
        &self,
        local: &Path,
        remote_name: &str,
        timestamp: u32,
        mut progress: impl FnMut(usize, usize, &str) -> bool,
    ) -> Result<()> {
        if remote_name.len() > MAX_REMOTE_NAME {
            return Err(UploadError::FileNameTooLong {
                name: remote_name.to_string(),
                max: MAX_REMOTE_NAME,
            });
        }
        let map_read = |e| UploadError::Io {
            operation: "read local file",
            source: e,
        };
        let mut file = File::open(local).map_err(map_read)?;
        let size = file.metadata().map_err(map_read)?.len() as usize;
        let max_loop = size / FRAME_PAYLOAD_SIZE + 1;

        let mut stream = self.open()?;
        info!("Uploading '{}' ({} bytes) as '{}'", local.display(), size, remote_name);
        progress(
            0,
            max_loop,
            &format!("Uploading '{}' (0/{})", remote_name, max_loop),
        );

        let mut chunk = [0u8; FRAME_PAYLOAD_SIZE];
        let mut filled = read_chunk(&mut file, &mut chunk).map_err(map_read)?;
        let frame = packet::data_frame(CMD_FILE, StructType::Open, &chunk[..filled]);
        self.exchange(&mut stream, &frame, "file open")?;

        let started = Instant::now();
        let mut step = 0;
        loop {
            step += 1;
            let message = transfer_message(remote_name, step, max_loop, started.elapsed());
            if !progress(step, max_loop + 1, &message) {
                info!("Upload of '{}' cancelled after {} chunks", remote_name, step);
                return Err(UploadError::Cancelled);
            }

            if filled < FRAME_PAYLOAD_SIZE {
                let frame = packet::close_frame(remote_name, timestamp)?;
                self.exchange(&mut stream, &frame, "file close")?;
                debug!("File {} uploaded successfully", remote_name);
                return Ok(());
            }

            filled = read_chunk(&mut file, &mut chunk).map_err(map_read)?;
            let frame = packet::data_frame(CMD_FILE, StructType::Append, &chunk[..filled]);
            self.exchange(&mut stream, &frame, "file append")?;
        }
    }

    /// Set the controller clock
    pub fn set_time(&self, now: &NaiveDateTime) -> Result<()> {
        let mut stream = self.open()?;
        self.exchange(&mut stream, &packet::time_frame(now), "set time")
    }

    /// Send a one-byte mode command
    pub fn set_mode(&self, mode: u8) -> Result<()> {
        let mut stream = self.open()?;
        self.exchange(&mut stream, &packet::command_packet(mode), "set mode")
    }

    /// Read the SD-card directory listing
    pub fn list_files(&self, command: u8) -> Result<Vec<FileEntry>> {
        let mut stream = self.open()?;
        stream
            .write_all(&packet::command_packet(command))
            .map_err(|e| UploadError::Io {
                operation: "list files",
                source: e,
            })?;
        let line = read_reply(&mut stream, self.ack_timeout, "list files", true)?;
        // A plain success acknowledgement means the listing was refused
        if line.is_ok() {
            error!("list files failed: '{}'", line.text());
            return Err(UploadError::Rejected {
                operation: "list files".to_string(),
                reply: line.text().to_string(),
            });
        }
        Ok(parse_file_listing(line.text()))
    }
}

fn transfer_message(name: &str, step: usize, max_loop: usize, elapsed: Duration) -> String {
    let elapsed_ms = elapsed.as_millis() as usize;
    if elapsed_ms == 0 {
        return format!("Uploading '{}' ({}/{})", name, step, max_loop);
    }
    let remaining = max_loop.saturating_sub(step) * (elapsed_ms / step) / 1000;
    format!(
        "Uploading '{}' ({}/{}) Remaining time: {}m {}s",
        name,
        step,
        max_loop,
        remaining / 60,
        remaining % 60
    )
}

/// Fill `buf` as far as the file allows
fn read_chunk(file: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn expect_ok(line: &AckLine, operation: &'static str) -> Result<()> {
    if line.is_ok() {
        Ok(())
    } else {
        error!("{} failed: '{}'", operation, line.text());
        Err(UploadError::Rejected {
            operation: operation.to_string(),
            reply: line.text().to_string(),
        })
    }
}

/// Read one acknowledgement line before `timeout` elapses
///
/// After the sentinel the line also ends on EOF or when no byte arrives
/// within a short grace period.
pub fn read_line(stream: &mut TcpStream, timeout: Duration, operation: &'static str) -> Result<AckLine> {
    read_reply(stream, timeout, operation, false)
}

/// Like [`read_line`]; with `partial` set, text received before a timeout
/// or EOF is returned even when no sentinel arrived
fn read_reply(
    stream: &mut TcpStream,
    timeout: Duration,
    operation: &'static str,
    partial: bool,
) -> Result<AckLine> {
    let finish = |decoder: &mut AckDecoder| {
        decoder
            .finish()
            .or_else(|| partial.then(|| decoder.take_partial()).flatten())
    };
    let deadline = Instant::now() + timeout;
    let mut decoder = AckDecoder::new();
    let mut buf = [0u8; 256];
    loop {
        let now = Instant::now();
        if now >= deadline {
            return finish(&mut decoder).ok_or(UploadError::Timeout {
                operation,
                waited: timeout,
            });
        }
        let mut wait = deadline - now;
        if decoder.sentinel_seen() {
            wait = wait.min(ACK_IDLE_GRACE);
        }
        stream
            .set_read_timeout(Some(wait))
            .map_err(|e| UploadError::Io { operation, source: e })?;

        match stream.read(&mut buf) {
            Ok(0) => {
                return finish(&mut decoder).ok_or(UploadError::Io {
                    operation,
                    source: io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed before acknowledgement",
                    ),
                });
            }
            Ok(n) => {
                let mut complete = None;
                decoder.decode(&buf[..n], |line| {
                    complete.get_or_insert(line);
                });
                if let Some(line) = complete {
                    return Ok(line);
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                if let Some(line) = decoder.finish() {
                    return Ok(line);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(UploadError::Io { operation, source: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_read_chunk_fills_across_short_reads() {
        let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        let mut cursor = Cursor::new(data);
        let mut buf = [0u8; FRAME_PAYLOAD_SIZE];
        assert_eq!(read_chunk(&mut cursor, &mut buf).unwrap(), 580);
        assert_eq!(read_chunk(&mut cursor, &mut buf).unwrap(), 420);
        assert_eq!(read_chunk(&mut cursor, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_transfer_message() {
        assert_eq!(
            transfer_message("A.HSEQ", 1, 4, Duration::ZERO),
            "Uploading 'A.HSEQ' (1/4)"
        );
        assert_eq!(
            transfer_message("A.HSEQ", 2, 4, Duration::from_secs(60)),
            "Uploading 'A.HSEQ' (2/4) Remaining time: 1m 0s"
        );
    }

    fn serve_once(reply: &'static [u8]) -> (u16, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![0u8; 22];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(reply).unwrap();
            thread::sleep(Duration::from_millis(200));
            request
        });
        (port, handle)
    }

    #[test]
    fn test_set_mode_acknowledged() {
        let (port, server) = serve_once(b"|FOK\r\n");
        BinarySession::new("127.0.0.1", port).set_mode(b'M').unwrap();
        let request = server.join().unwrap();
        assert_eq!(&request[18..], &[b'M', 0x5a, 0xa5, 0]);
    }

    #[test]
    fn test_set_mode_rejected() {
        let (port, server) = serve_once(b"|FAIL\r\n");
        let err = BinarySession::new("127.0.0.1", port).set_mode(b'M').unwrap_err();
        assert!(matches!(err, UploadError::Rejected { ref reply, .. } if reply == "|FAIL"));
        server.join().unwrap();
    }

    #[test]
    fn test_ack_completes_on_idle_after_sentinel() {
        // No terminator after the sentinel; the idle grace ends the line.
        let (port, server) = serve_once(b"|FOK");
        BinarySession::new("127.0.0.1", port).set_mode(b'M').unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_ack_timeout_without_sentinel() {
        let (port, server) = serve_once(b"FOK");
        let err = BinarySession::new("127.0.0.1", port)
            .with_ack_timeout(Duration::from_millis(100))
            .set_mode(b'M')
            .unwrap_err();
        assert!(matches!(err, UploadError::Timeout { .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_list_files() {
        let (port, server) = serve_once(b"*SHOW.HSEQ,1002,1504!*XMAS.HSEQ,1003,1600!|\r\n");
        let files = BinarySession::new("127.0.0.1", port).list_files(b'L').unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].name, "XMAS.HSEQ");
        server.join().unwrap();
    }

    #[test]
    fn test_list_files_without_sentinel_uses_received_text() {
        let (port, server) = serve_once(b"*SHOW.HSEQ,1002,1504!*XMAS.HSEQ,1003,1600!");
        let files = BinarySession::new("127.0.0.1", port).list_files(b'L').unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "SHOW.HSEQ");
        assert_eq!((files[0].date, files[0].time), (1002, 1504));
        server.join().unwrap();
    }

    #[test]
    fn test_list_files_plain_ok_is_refusal() {
        let (port, server) = serve_once(b"|FOK\n");
        let err = BinarySession::new("127.0.0.1", port).list_files(b'L').unwrap_err();
        assert!(matches!(err, UploadError::Rejected { ref reply, .. } if reply == "|FOK"));
        server.join().unwrap();
    }

    #[test]
    fn test_list_files_silent_controller_times_out() {
        let (port, server) = serve_once(b"");
        let err = BinarySession::new("127.0.0.1", port)
            .with_ack_timeout(Duration::from_millis(100))
            .list_files(b'L')
            .unwrap_err();
        assert!(matches!(err, UploadError::Timeout { .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_long_remote_name_rejected_before_connecting() {
        let err = BinarySession::new("127.0.0.1", 1)
            .upload_file(Path::new("/nonexistent"), &"N".repeat(30), 0, |_, _, _| true)
            .unwrap_err();
        assert!(matches!(err, UploadError::FileNameTooLong { .. }));
    }
}
