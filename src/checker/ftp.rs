// src/checker/ftp.rs
// =============================================================================
// Probes ftp:// URLs with a minimal control-channel dialogue:
//
//   <- 220 greeting
//   -> USER anonymous        <- 331 / 230
//   -> PASS anonymous@       <- 230
//   -> TYPE I                (many servers refuse SIZE in ASCII mode)
//   -> SIZE /path            <- 213 file exists
//   -> MDTM /path            <- 213 file exists (when SIZE is not implemented)
//   -> CWD /path             <- 250 directory exists (tried when both fail)
//   -> QUIT
//
// No data connection is ever opened. The last meaningful reply code becomes
// the outcome and classify_ftp_reply decides what it means. Decoded URL
// parts go onto the control channel verbatim, so CR/LF in them is rejected.
// =============================================================================

use super::verdict::ProbeOutcome;
use crate::config::CheckerConfig;
use crate::error::ProbeError;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;
use url::{Host, Url};

const DEFAULT_FTP_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASS: &str = "anonymous@";

pub(crate) async fn probe(url: &Url, config: &CheckerConfig) -> ProbeOutcome {
    match timeout(config.full_timeout(), session(url, config.connect_timeout())).await {
        Ok(Ok(code)) => ProbeOutcome::FtpReply { code },
        Ok(Err(error)) => ProbeOutcome::failed(error),
        Err(_) => ProbeOutcome::failed(ProbeError::Timeout),
    }
}

async fn session(url: &Url, connect_timeout: Duration) -> Result<u16, ProbeError> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => return Err(ProbeError::InvalidUrl(format!("{url}: missing host"))),
    };
    let port = url.port().unwrap_or(DEFAULT_FTP_PORT);

    let user = match url.username() {
        "" => ANONYMOUS_USER.to_string(),
        name => control_arg(url, name)?,
    };
    let pass = match url.password() {
        Some(password) => control_arg(url, password)?,
        None => ANONYMOUS_PASS.to_string(),
    };
    let path = control_arg(url, url.path())?;

    let stream = connect(&host, port, connect_timeout).await?;
    let mut control = Control::new(stream);

    let greeting = control.read_reply().await?;
    if greeting.code != 220 {
        return Err(ProbeError::Protocol(format!("unexpected greeting: {greeting}")));
    }

    let mut login = control.command(&format!("USER {user}")).await?;
    if login.code == 331 {
        login = control.command(&format!("PASS {pass}")).await?;
    }
    if !login.is_completion() {
        control.quit().await;
        return Ok(login.code);
    }

    let code = if path.is_empty() || path == "/" {
        login.code
    } else {
        locate(&mut control, &path).await?
    };

    control.quit().await;
    Ok(code)
}

// 213 when `path` is a file, otherwise whatever CWD says about it.
async fn locate(control: &mut Control, path: &str) -> Result<u16, ProbeError> {
    // The answer does not matter; servers without binary mode still get SIZE.
    control.command("TYPE I").await?;

    let size = control.command(&format!("SIZE {path}")).await?;
    if size.code == 213 {
        return Ok(size.code);
    }
    if is_not_implemented(size.code) {
        let mdtm = control.command(&format!("MDTM {path}")).await?;
        if mdtm.code == 213 {
            return Ok(mdtm.code);
        }
    }

    Ok(control.command(&format!("CWD {path}")).await?.code)
}

fn is_not_implemented(code: u16) -> bool {
    matches!(code, 500 | 502 | 504)
}

async fn connect(host: &str, port: u16, limit: Duration) -> Result<TcpStream, ProbeError> {
    let addrs: Vec<SocketAddr> = timeout(limit, lookup_host((host, port)))
        .await
        .map_err(|_| ProbeError::Timeout)?
        .map_err(|e| ProbeError::Dns(format!("{host}: {e}")))?
        .collect();

    let mut last_error = ProbeError::Dns(format!("{host}: no addresses"));
    for addr in addrs {
        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => last_error = ProbeError::Connect(format!("{addr}: {e}")),
            Err(_) => last_error = ProbeError::Timeout,
        }
    }
    Err(last_error)
}

// Percent-decodes one URL part for use as a command argument.
fn control_arg(url: &Url, raw: &str) -> Result<String, ProbeError> {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    if decoded.contains(|c: char| c == '\r' || c == '\n') {
        return Err(ProbeError::InvalidUrl(format!(
            "{url}: line break in FTP command argument"
        )));
    }
    Ok(decoded.into_owned())
}

/// One (possibly multi-line) server reply.
#[derive(Debug)]
struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

struct Control {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Control {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn command(&mut self, line: &str) -> Result<Reply, ProbeError> {
        let shown = if line.starts_with("PASS ") { "PASS ****" } else { line };
        debug!(command = shown, "ftp");

        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply, ProbeError> {
        let first = self.read_line().await?;
        let code = reply_code(&first)?;
        let mut text = first.get(4..).unwrap_or_default().to_string();

        // "123-first line" ... "123 last line"
        if first.as_bytes().get(3) == Some(&b'-') {
            let bare = code.to_string();
            let terminator = format!("{code} ");
            loop {
                let line = self.read_line().await?;
                if line == bare {
                    text.clear();
                    break;
                }
                if let Some(last) = line.strip_prefix(&terminator) {
                    text = last.to_string();
                    break;
                }
            }
        }

        Ok(Reply { code, text })
    }

    async fn read_line(&mut self) -> Result<String, ProbeError> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;
        if read == 0 {
            return Err(ProbeError::Protocol("connection closed by server".to_string()));
        }
        Ok(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string())
    }

    // Best effort; the verdict is already decided.
    async fn quit(&mut self) {
        let _ = self.writer.write_all(b"QUIT\r\n").await;
        let _ = self.writer.shutdown().await;
    }
}

fn reply_code(line: &str) -> Result<u16, ProbeError> {
    line.get(..3)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| ProbeError::Protocol(format!("malformed reply: {line:?}")))
}
