//! Banner grabbing over raw TCP: HTTP `Server` header, SMTP greeting, and an
//! SMTP envelope check for catch-all mail exchangers.

use crate::config::user_agent;
use crate::error::ProbeError;
use rand::Rng;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_HEADER_BYTES: usize = 64 * 1024;
const SMTP_BANNER_FALLBACK_LEN: usize = 40;
const MAX_LINE_BYTES: u64 = 4096;

pub async fn http_banner(addr: SocketAddr, vhost: &str) -> Result<Option<String>, ProbeError> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "HEAD / HTTP/1.1\r\nHost: {}\r\nUser-agent: {}\r\nConnection: close\r\n\r\n",
        vhost,
        user_agent()
    );
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        response.extend_from_slice(&buf[..n]);
        if headers_complete(&response) || response.len() >= MAX_HEADER_BYTES {
            break;
        }
    }

    let banner = parse_http_banner(&String::from_utf8_lossy(&response));
    debug!(%addr, vhost, ?banner, "HTTP banner.");
    Ok(banner)
}

fn headers_complete(response: &[u8]) -> bool {
    response.windows(4).any(|w| w == b"\r\n\r\n") || response.windows(2).any(|w| w == b"\n\n")
}

/// `Server` header value, or `HTTP <status>` when the server doesn't say.
pub fn parse_http_banner(response: &str) -> Option<String> {
    let mut lines = response.lines();
    let status_line = lines.next()?;

    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("server") {
                return Some(value.trim().to_string());
            }
        }
    }

    status_line
        .split(' ')
        .nth(1)
        .filter(|code| !code.is_empty())
        .map(|code| format!("HTTP {}", code))
}

pub async fn smtp_banner(host: &str, port: u16) -> Result<Option<String>, ProbeError> {
    let stream = TcpStream::connect((host, port)).await?;
    let mut reader = BufReader::new(stream).take(MAX_LINE_BYTES);
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line).await?;

    let banner = parse_smtp_banner(&String::from_utf8_lossy(&line));
    debug!(host, ?banner, "SMTP banner.");
    Ok(banner)
}

pub fn parse_smtp_banner(greeting: &str) -> Option<String> {
    let line = greeting.lines().next()?.trim_end();
    if line.is_empty() {
        return None;
    }
    match line.strip_prefix("220") {
        Some(rest) => Some(rest.trim_start_matches(['-', ' ']).trim().to_string()),
        None => Some(line.chars().take(SMTP_BANNER_FALLBACK_LEN).collect()),
    }
}

struct SmtpConnection {
    reader: BufReader<TcpStream>,
}

impl SmtpConnection {
    /// Reads a possibly multi-line reply and returns its code and last line.
    async fn reply(&mut self) -> Result<(u16, String), ProbeError> {
        loop {
            let mut raw = Vec::new();
            let read = (&mut self.reader)
                .take(MAX_LINE_BYTES)
                .read_until(b'\n', &mut raw)
                .await?;
            if read == 0 {
                return Err(ProbeError::Protocol("connection closed".to_string()));
            }
            let line = String::from_utf8_lossy(&raw).trim_end().to_string();
            let code = line
                .get(..3)
                .and_then(|c| c.parse::<u16>().ok())
                .ok_or_else(|| ProbeError::Protocol(format!("bad SMTP reply: {:?}", line)))?;
            if line.as_bytes().get(3) != Some(&b'-') {
                return Ok((code, line));
            }
        }
    }

    async fn command(&mut self, command: &str) -> Result<u16, ProbeError> {
        self.reader
            .get_mut()
            .write_all(format!("{}\r\n", command).as_bytes())
            .await?;
        Ok(self.reply().await?.0)
    }
}

fn random_mailbox(stem: &str) -> String {
    format!("{}{}", stem, rand::thread_rng().gen_range(0..10_000))
}

/// Walks an SMTP envelope up to `RCPT TO` for a made-up mailbox on
/// `to_domain`. No message is sent.
pub async fn mx_accepts_any(
    host: &str,
    port: u16,
    from_domain: &str,
    to_domain: &str,
) -> Result<bool, ProbeError> {
    let from = format!("{}@{}", random_mailbox("randomgenius"), from_domain);
    let to = format!("{}@{}", random_mailbox("randommaster"), to_domain);

    let stream = TcpStream::connect((host, port)).await?;
    let mut smtp = SmtpConnection {
        reader: BufReader::new(stream),
    };

    let (greeting, _) = smtp.reply().await?;
    if greeting != 220 {
        return Ok(false);
    }
    if smtp.command(&format!("EHLO {}", from_domain)).await? != 250
        && smtp.command(&format!("HELO {}", from_domain)).await? != 250
    {
        return Ok(false);
    }
    if smtp.command(&format!("MAIL FROM:<{}>", from)).await? != 250 {
        return Ok(false);
    }
    let rcpt = smtp.command(&format!("RCPT TO:<{}>", to)).await?;
    let _ = smtp.command("QUIT").await;

    debug!(host, to = %to, rcpt, "MX check.");
    Ok((200..300).contains(&rcpt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_http_banner_prefers_server_header() {
        let response = "HTTP/1.1 301 Moved Permanently\r\nLocation: https://x/\r\nServer: nginx/1.18.0\r\n\r\n";
        assert_eq!(parse_http_banner(response).as_deref(), Some("nginx/1.18.0"));
    }

    #[test]
    fn test_http_banner_falls_back_to_status() {
        let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
        assert_eq!(parse_http_banner(response).as_deref(), Some("HTTP 404"));
        assert_eq!(parse_http_banner(""), None);
        assert_eq!(parse_http_banner("garbage"), None);
    }

    #[test]
    fn test_smtp_banner_rules() {
        assert_eq!(
            parse_smtp_banner("220 mx.example.com ESMTP Postfix\r\n").as_deref(),
            Some("mx.example.com ESMTP Postfix")
        );
        assert_eq!(
            parse_smtp_banner("220-mx.example.com ESMTP\r\n").as_deref(),
            Some("mx.example.com ESMTP")
        );
        let refused = "554 5.7.1 This server does not accept connections from your network at all";
        assert_eq!(parse_smtp_banner(refused).unwrap().chars().count(), 40);
        assert_eq!(parse_smtp_banner(""), None);
    }

    #[tokio::test]
    async fn test_http_banner_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nServer: Apache\r\n\r\n")
                .await
                .unwrap();
            request
        });

        let banner = http_banner(addr, "examp1e.com").await.unwrap();
        assert_eq!(banner.as_deref(), Some("Apache"));
        let request = server.await.unwrap();
        assert!(request.starts_with("HEAD / HTTP/1.1\r\n"));
        assert!(request.contains("Host: examp1e.com\r\n"));
    }

    #[tokio::test]
    async fn test_mx_check_against_catch_all() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(socket);
            reader.get_mut().write_all(b"220 catchall ESMTP\r\n").await.unwrap();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let reply: &[u8] = if line.starts_with("EHLO") {
                    b"250-catchall\r\n250 SIZE 1000\r\n"
                } else if line.starts_with("QUIT") {
                    b"221 bye\r\n"
                } else {
                    b"250 ok\r\n"
                };
                reader.get_mut().write_all(reply).await.unwrap();
                if line.starts_with("QUIT") {
                    break;
                }
            }
        });

        let accepted = mx_accepts_any("127.0.0.1", port, "example.com", "examp1e.com")
            .await
            .unwrap();
        assert!(accepted);
    }

    #[tokio::test]
    async fn test_smtp_greeting_without_newline_is_capped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut greeting = b"220 ".to_vec();
            greeting.extend(std::iter::repeat(b'x').take(64 * 1024));
            let _ = socket.write_all(&greeting).await;
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        });

        let banner = smtp_banner("127.0.0.1", port).await.unwrap().unwrap();
        assert_eq!(banner.len() as u64, MAX_LINE_BYTES - 4);
    }
}
