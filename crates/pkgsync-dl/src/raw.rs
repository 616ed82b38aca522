//! Hand-written HTTP/1.1 POST over a plain TCP stream.
//!
//! Legacy upload endpoints expect the Authorization header on the very first request and
//! the multipart body byte for byte as the client produced it. Writing the request
//! ourselves guarantees both.

use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    time::Duration,
};

use url::{Host, Url};

use crate::error::{DownloadError, Result};

/// Headers that [`post`] always writes itself.
const RESERVED_HEADERS: [&str; 4] = ["host", "content-length", "connection", "user-agent"];

/// Upper bound on a register/upload response. Index servers answer with a short page.
pub const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

fn invalid_host(url: &Url) -> DownloadError {
    DownloadError::InvalidUrl {
        url: url.to_string(),
        source: url::ParseError::EmptyHost,
    }
}

/// Socket addresses for `url`. IPv6 literals are resolved without their brackets.
fn target_addrs(url: &Url) -> Result<Vec<SocketAddr>> {
    if url.host().is_none() {
        return Err(invalid_host(url));
    }
    Ok(url.socket_addrs(|| Some(80))?)
}

fn connect(url: &Url, timeout: Option<Duration>) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in target_addrs(url)? {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err
        .unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("{url} did not resolve to any address"),
            )
        })
        .into())
}

/// Renders the request head. The body follows unchanged.
pub fn request_head(
    url: &Url,
    headers: &[(String, String)],
    content_length: usize,
    user_agent: Option<&str>,
) -> Result<String> {
    let host = match url.host() {
        Some(Host::Ipv6(addr)) => format!("[{addr}]"),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Domain(domain)) => domain.to_string(),
        None => return Err(invalid_host(url)),
    };

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host_header = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut head = format!("POST {target} HTTP/1.1\r\nHost: {host_header}\r\n");
    if let Some(user_agent) = user_agent {
        head.push_str(&format!("User-Agent: {user_agent}\r\n"));
    }
    for (key, value) in headers {
        if RESERVED_HEADERS
            .iter()
            .any(|reserved| key.eq_ignore_ascii_case(reserved))
        {
            continue;
        }
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {content_length}\r\nConnection: close\r\n\r\n"
    ));

    Ok(head)
}

/// Reads until EOF, failing once more than `limit` bytes arrive.
fn read_capped<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    reader.take(limit + 1).read_to_end(&mut raw)?;
    if raw.len() as u64 > limit {
        return Err(DownloadError::InvalidResponse(format!(
            "response larger than {limit} bytes"
        )));
    }
    Ok(raw)
}

/// POSTs `body` to `url` and reads the response, up to [`MAX_RESPONSE_BYTES`].
pub fn post(
    url: &Url,
    headers: &[(String, String)],
    body: &[u8],
    timeout: Option<Duration>,
    user_agent: Option<&str>,
) -> Result<RawResponse> {
    let head = request_head(url, headers, body.len(), user_agent)?;

    let mut stream = connect(url, timeout)?;
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;

    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()?;

    let raw = read_capped(&mut stream, MAX_RESPONSE_BYTES)?;
    parse_response(&raw)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parses a complete HTTP/1.x response read until the server closed the connection.
pub fn parse_response(raw: &[u8]) -> Result<RawResponse> {
    let head_end = find(raw, b"\r\n\r\n")
        .ok_or_else(|| DownloadError::InvalidResponse("missing end of response headers".into()))?;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let mut body = raw[head_end + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(DownloadError::InvalidResponse(format!(
            "bad status line `{status_line}`"
        )));
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| DownloadError::InvalidResponse(format!("bad status line `{status_line}`")))?;
    let reason = parts.next().unwrap_or_default().to_string();

    let mut chunked = false;
    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        } else if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    if chunked {
        body = decode_chunked(&body)?;
    } else if let Some(len) = content_length {
        if body.len() < len {
            return Err(DownloadError::InvalidResponse(format!(
                "truncated response: {} of {len} bytes",
                body.len()
            )));
        }
        body.truncate(len);
    }

    Ok(RawResponse {
        status,
        reason,
        body,
    })
}

fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>> {
    let malformed = || DownloadError::InvalidResponse("malformed chunked body".into());
    let mut out = Vec::new();

    loop {
        let line_end = find(data, b"\r\n").ok_or_else(malformed)?;
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed())?;
        data = &data[line_end + 2..];

        if size == 0 {
            return Ok(out);
        }
        if data.len() < size {
            return Err(malformed());
        }
        out.extend_from_slice(&data[..size]);
        data = data.get(size + 2..).unwrap_or_default();
    }
}
