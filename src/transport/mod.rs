//! Byte-level I/O with the controller
//!
//! Two independent channels:
//! - **http**: GET requests with custom headers on the control plane,
//!   one kept-alive connection per driver
//! - **socket**: the binary packet protocol, one connection per operation
//!
//! The orchestrator only sees the [`ControlPlane`] trait so it can be
//! driven against a recording mock in tests.

pub mod http;
pub mod socket;

pub use http::HttpControlClient;
pub use socket::BinarySession;

use crate::error::{Result, UploadError};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Extra request header, name and value
pub type Header<'a> = (&'a str, &'a str);

/// Request/response exchange with the controller's web server
///
/// Requests are strictly sequential; implementations are not shared
/// between threads.
pub trait ControlPlane {
    /// GET `path` (relative to the controller base) and return the body
    fn request(&mut self, path: &str, headers: &[Header<'_>]) -> Result<String>;

    /// Send a request without waiting for its reply
    ///
    /// Used for commands that make the controller drop the connection.
    fn send_no_response(&mut self, path: &str, headers: &[Header<'_>]);
}

impl<T: ControlPlane + ?Sized> ControlPlane for &mut T {
    fn request(&mut self, path: &str, headers: &[Header<'_>]) -> Result<String> {
        (**self).request(path, headers)
    }

    fn send_no_response(&mut self, path: &str, headers: &[Header<'_>]) {
        (**self).send_no_response(path, headers)
    }
}

/// Open a TCP connection with a bounded connect time
///
/// Tries every resolved address in turn; keepalive and no-delay are set
/// on the socket before connecting.
pub fn connect(address: &str, timeout: Duration) -> Result<TcpStream> {
    let map_err = |e| UploadError::Connect {
        address: address.to_string(),
        source: e,
    };
    let addrs = address.to_socket_addrs().map_err(map_err)?;
    let mut last_error =
        std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved");
    for addr in addrs {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(map_err)?;
        socket.set_nodelay(true).map_err(map_err)?;
        socket.set_keepalive(true).map_err(map_err)?;
        match socket.connect_timeout(&addr.into(), timeout) {
            Ok(()) => return Ok(socket.into()),
            Err(e) => last_error = e,
        }
    }
    Err(map_err(last_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_to_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let stream = connect(&address, Duration::from_secs(1)).unwrap();
        assert_eq!(stream.peer_addr().unwrap(), listener.local_addr().unwrap());
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);
        let err = connect(&address, Duration::from_millis(500)).unwrap_err();
        assert!(matches!(err, UploadError::Connect { .. }));
    }
}
