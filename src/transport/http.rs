//! HTTP/1.1 control-plane client
//!
//! The controller's web server is addressed with plain GET requests whose
//! payload travels in custom headers (`DATA:`, `ROW:`, `BLK:`). A single
//! connection is kept alive for the whole upload and re-opened once if the
//! controller closed it between requests.

use super::{connect, ControlPlane, Header};
use crate::config::Config;
use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONTROLLER_PORT, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{Result, UploadError};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Parsed response
#[derive(Debug)]
struct Response {
    status: u16,
    body: String,
    close: bool,
}

/// Keep-alive HTTP client bound to one controller
pub struct HttpControlClient {
    /// `host:port` actually connected to (the proxy when one is set)
    address: String,
    host: String,
    base_path: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    no_response_wait: Duration,
    conn: Option<BufReader<TcpStream>>,
}

impl HttpControlClient {
    pub fn new(host: &str, port: u16, base_path: &str) -> Self {
        Self {
            address: format!("{}:{}", host, port),
            host: host.to_string(),
            base_path: base_path.trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            no_response_wait: Duration::from_millis(1),
            conn: None,
        }
    }

    /// Client for the configured controller, through the FPP proxy if set
    pub fn from_config(config: &Config) -> Self {
        let controller = &config.controller;
        let base = controller.base_path.trim_end_matches('/');
        let mut client = match controller.proxy.as_deref().filter(|p| !p.is_empty()) {
            Some(proxy) => {
                let (host, port) = split_host_port(proxy);
                Self::new(host, port, &format!("/proxy/{}{}", controller.host, base))
            }
            None => Self::new(&controller.host, controller.http_port, base),
        };
        client.request_timeout = config.timeouts.request();
        client.connect_timeout = config.timeouts.connect();
        client.no_response_wait = config.timeouts.reboot();
        client
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Full URL of `path`, for diagnostics
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}{}", self.host, self.base_path, path)
    }

    fn render(&self, path: &str, headers: &[Header<'_>]) -> String {
        let mut out = format!(
            "GET {}{} HTTP/1.1\r\nHost: {}\r\nContent-type: text/plain\r\n",
            self.base_path, path, self.host
        );
        for (name, value) in headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("Connection: keep-alive\r\n\r\n");
        out
    }

    fn stream(&mut self) -> Result<&mut BufReader<TcpStream>> {
        if self.conn.is_none() {
            let stream = connect(&self.address, self.connect_timeout)?;
            debug!("Opened control connection to {}", self.address);
            self.conn = Some(BufReader::new(stream));
        }
        self.conn.as_mut().ok_or_else(|| UploadError::Io {
            operation: "open control connection",
            source: io::Error::new(io::ErrorKind::NotConnected, "no connection"),
        })
    }
}

impl ControlPlane for HttpControlClient {
    fn request(&mut self, path: &str, headers: &[Header<'_>]) -> Result<String> {
        let url = self.url(path);
        debug!("Making request to '{}'", url);
        for (name, value) in headers {
            debug!("  {}: {}", name, value);
        }
        let raw = self.render(path, headers);

        let mut retried = false;
        let response = loop {
            let reused = self.conn.is_some();
            let request_timeout = self.request_timeout;
            let reader = self.stream()?;
            match transact(reader, raw.as_bytes(), request_timeout) {
                Ok(response) => break response,
                Err(e) => {
                    self.conn = None;
                    if is_timeout(&e) {
                        return Err(UploadError::Timeout {
                            operation: "control request",
                            waited: self.request_timeout,
                        });
                    }
                    if reused && !retried {
                        debug!("Kept-alive connection dropped ({}), reconnecting", e);
                        retried = true;
                        continue;
                    }
                    return Err(UploadError::Io {
                        operation: "control request",
                        source: e,
                    });
                }
            }
        };

        if response.close {
            self.conn = None;
        }
        if !(200..300).contains(&response.status) {
            warn!("{} returned HTTP {}", url, response.status);
            return Err(UploadError::HttpStatus {
                path: url,
                status: response.status,
            });
        }
        debug!("'{}'", response.body);
        Ok(response.body)
    }

    fn send_no_response(&mut self, path: &str, headers: &[Header<'_>]) {
        let url = self.url(path);
        debug!("Making request to '{}' without waiting for a reply", url);
        // The controller drops every open connection on reboot.
        self.conn = None;
        let raw = self.render(path, headers);
        let mut stream = match connect(&self.address, self.connect_timeout) {
            Ok(stream) => stream,
            Err(e) => {
                debug!("{}", e);
                return;
            }
        };
        if let Err(e) = stream.write_all(raw.as_bytes()) {
            debug!("Write to {} failed: {}", url, e);
            return;
        }
        let wait = self.no_response_wait.max(Duration::from_millis(1));
        if stream.set_read_timeout(Some(wait)).is_ok() {
            let mut scratch = [0u8; 256];
            let _ = stream.read(&mut scratch);
        }
    }
}

/// `host[:port]`, port 80 when absent
fn split_host_port(address: &str) -> (&str, u16) {
    match address.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (address, DEFAULT_CONTROLLER_PORT),
        },
        None => (address, DEFAULT_CONTROLLER_PORT),
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// Write one request and read its response within `timeout`
///
/// The timeout bounds the whole exchange, not each socket call.
fn transact(
    reader: &mut BufReader<TcpStream>,
    request: &[u8],
    timeout: Duration,
) -> io::Result<Response> {
    let mut conn = Deadline {
        inner: reader,
        deadline: Instant::now() + timeout,
    };
    {
        let remaining = conn.remaining()?;
        let stream = conn.inner.get_mut();
        stream.set_write_timeout(Some(remaining))?;
        stream.write_all(request)?;
        stream.flush()?;
    }
    read_response(&mut conn)
}

/// Buffered connection whose reads share one deadline
struct Deadline<'a> {
    inner: &'a mut BufReader<TcpStream>,
    deadline: Instant,
}

impl Deadline<'_> {
    fn remaining(&self) -> io::Result<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "request deadline passed"))
    }

    /// Arm the socket before it has to wait for more bytes
    fn arm(&mut self) -> io::Result<()> {
        if self.inner.buffer().is_empty() {
            let remaining = self.remaining()?;
            self.inner.get_ref().set_read_timeout(Some(remaining))?;
        }
        Ok(())
    }
}

impl Read for Deadline<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.arm()?;
        self.inner.read(buf)
    }
}

impl BufRead for Deadline<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.arm()?;
        self.inner.fill_buf()
    }

    fn consume(&mut self, amount: usize) {
        self.inner.consume(amount)
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> io::Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-response",
        ));
    }
    Ok(line)
}

fn read_response<R: BufRead>(reader: &mut R) -> io::Result<Response> {
    let status_line = read_line(reader)?;
    let mut parts = status_line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(invalid(format!("bad status line '{}'", status_line.trim())));
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(format!("bad status line '{}'", status_line.trim())))?;

    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    let mut close = version == "HTTP/1.0";
    loop {
        let line = read_line(reader)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().ok(),
                "transfer-encoding" => chunked = value.eq_ignore_ascii_case("chunked"),
                "connection" => close = value.eq_ignore_ascii_case("close"),
                _ => {}
            }
        }
    }

    let body = if chunked {
        read_chunked(reader)?
    } else if let Some(length) = content_length {
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        body
    } else {
        // No framing: the body runs to EOF.
        close = true;
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        body
    };

    Ok(Response {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
        close,
    })
}

fn read_chunked<R: BufRead>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let size_line = read_line(reader)?;
        let size_text = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|_| invalid(format!("bad chunk size '{}'", size_text)))?;
        if size == 0 {
            // Trailers
            while !read_line(reader)?.trim().is_empty() {}
            return Ok(body);
        }
        let start = body.len();
        body.resize(start + size, 0);
        reader.read_exact(&mut body[start..])?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
    }
}
