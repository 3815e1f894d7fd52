//! Binary file transfer against a fake controller socket

use hinks_upload::codec::packet::{
    fat_timestamp, FrameHeader, StructType, CLOSE_RECORD_SIZE, HEADER_SIZE,
};
use hinks_upload::constants::REMOTE_NAME_FIELD;
use hinks_upload::transport::BinarySession;
use hinks_upload::UploadError;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Frame as received by the fake controller
#[derive(Debug)]
struct Received {
    struct_type: StructType,
    data_size: usize,
    body: Vec<u8>,
}

/// Accept one connection and acknowledge every frame with `ack`
///
/// Stops at the close frame or when the client hangs up.
fn fake_controller(ack: &'static [u8]) -> (u16, JoinHandle<Vec<Received>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut frames = Vec::new();
        loop {
            let mut header = [0u8; HEADER_SIZE];
            if stream.read_exact(&mut header).is_err() {
                break;
            }
            let parsed = FrameHeader::parse(&header).expect("valid header");
            let mut body = vec![0u8; parsed.total_size as usize - HEADER_SIZE];
            stream.read_exact(&mut body).unwrap();
            let struct_type = StructType::from_code(parsed.struct_type).unwrap();
            frames.push(Received {
                struct_type,
                data_size: parsed.data_size as usize,
                body,
            });
            stream.write_all(ack).unwrap();
            if struct_type == StructType::Close {
                break;
            }
        }
        frames
    });
    (port, handle)
}

fn temp_file(name: &str, content: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hinks-upload-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_file_is_sent_in_chunks_and_closed() {
    let content: Vec<u8> = (0..1200u32).map(|i| (i % 251) as u8).collect();
    let local = temp_file("chunks.bin", &content);
    let (port, server) = fake_controller(b"|FOK\r\n");
    let stamp = fat_timestamp(2024, 12, 1, 18, 30, 10);

    let mut steps = Vec::new();
    BinarySession::new("127.0.0.1", port)
        .upload_file(&local, "SHOW.HSEQ", stamp, |done, total, _| {
            steps.push((done, total));
            true
        })
        .unwrap();

    let frames = server.join().unwrap();
    let types: Vec<StructType> = frames.iter().map(|f| f.struct_type).collect();
    assert_eq!(
        types,
        vec![StructType::Open, StructType::Append, StructType::Append, StructType::Close]
    );
    let sent: Vec<u8> = frames[..3].iter().flat_map(|f| f.body.clone()).collect();
    assert_eq!(sent, content);
    assert_eq!(frames[2].data_size, 40);

    let close = &frames[3];
    assert_eq!(close.data_size, 0);
    assert_eq!(close.body.len(), CLOSE_RECORD_SIZE);
    assert_eq!(&close.body[..9], b"SHOW.HSEQ");
    assert!(close.body[9..REMOTE_NAME_FIELD].iter().all(|&b| b == 0));
    assert_eq!(
        u32::from_le_bytes(close.body[REMOTE_NAME_FIELD..].try_into().unwrap()),
        stamp
    );

    // 1200 bytes is 3 chunks: one initial report, then one per step
    assert_eq!(steps, vec![(0, 3), (1, 4), (2, 4), (3, 4)]);
    std::fs::remove_file(local).ok();
}

#[test]
fn test_cancel_drops_connection_without_close() {
    let local = temp_file("cancel.bin", &[7u8; 2000]);
    let (port, server) = fake_controller(b"|FOK\r\n");

    let err = BinarySession::new("127.0.0.1", port)
        .upload_file(&local, "CANCEL.HSEQ", 0, |done, _, _| done == 0)
        .unwrap_err();
    assert!(matches!(err, UploadError::Cancelled));

    let frames = server.join().unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].struct_type, StructType::Open);
    std::fs::remove_file(local).ok();
}

#[test]
fn test_rejected_open_stops_transfer() {
    let local = temp_file("reject.bin", b"tiny");
    let (port, server) = fake_controller(b"|FERR\r\n");

    let err = BinarySession::new("127.0.0.1", port)
        .upload_file(&local, "TINY.HSEQ", 0, |_, _, _| true)
        .unwrap_err();
    assert!(matches!(err, UploadError::Rejected { ref reply, .. } if reply == "|FERR"));

    let frames = server.join().unwrap();
    assert_eq!(frames.len(), 1);
    std::fs::remove_file(local).ok();
}

#[test]
fn test_unreachable_controller() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let local = temp_file("unreachable.bin", b"x");

    let err = BinarySession::new("127.0.0.1", port)
        .upload_file(&local, "X.HSEQ", 0, |_, _, _| true)
        .unwrap_err();
    assert!(matches!(err, UploadError::Connect { .. }));
    std::fs::remove_file(local).ok();
}
