//! Command socket transport.
//!
//! JSON lines over a Unix stream socket: each line from the client is one
//! [`Command`], each line back is one [`Response`]. The server handles a
//! single connection at a time.
//!
//! Connection retries live here, on the client side only.

use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::app::commands::{Command, Response};

const MAX_RETRIES: u8 = 3;
const RETRY_BACKOFF_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("cannot reach daemon at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("socket I/O: {0}")]
    Io(#[from] io::Error),
    #[error("bad reply: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("daemon closed the connection without replying")]
    NoReply,
}

/// Bind the command socket, replacing a stale socket file. Fails with
/// [`ErrorKind::AddrInUse`] if a daemon is already answering on `path`.
pub fn bind(path: &Path) -> io::Result<UnixListener> {
    if UnixStream::connect(path).is_ok() {
        return Err(io::Error::new(
            ErrorKind::AddrInUse,
            format!("another daemon is listening on {}", path.display()),
        ));
    }
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed stale socket {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    UnixListener::bind(path)
}

/// Serve one connection until the peer hangs up. Undecodable lines get
/// a [`Response::Error`] and the connection stays open.
pub fn serve_connection(
    stream: UnixStream,
    mut handler: impl FnMut(Command) -> Response,
) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Command>(&line) {
            Ok(cmd) => {
                debug!("IPC command: {cmd:?}");
                handler(cmd)
            }
            Err(e) => Response::Error {
                message: format!("invalid command: {e}"),
            },
        };
        let mut out = serde_json::to_string(&response).map_err(io::Error::other)?;
        out.push('\n');
        writer.write_all(out.as_bytes())?;
        writer.flush()?;
    }
    Ok(())
}

/// Accept connections forever, one at a time.
pub fn serve(listener: &UnixListener, mut handler: impl FnMut(Command) -> Response) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = serve_connection(stream, &mut handler) {
                    warn!("IPC connection error: {e}");
                }
            }
            Err(e) => warn!("IPC accept failed: {e}"),
        }
    }
}

fn connect_with_retry(path: &Path) -> Result<UnixStream, IpcError> {
    let mut attempt = 0;
    loop {
        match UnixStream::connect(path) {
            Ok(s) => return Ok(s),
            Err(e) if attempt + 1 < MAX_RETRIES => {
                attempt += 1;
                debug!("connect attempt {attempt} failed: {e}");
                thread::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)));
            }
            Err(source) => {
                return Err(IpcError::Connect {
                    path: path.display().to_string(),
                    source,
                });
            }
        }
    }
}

/// Send one command and wait for its response.
pub fn send(path: &Path, cmd: &Command) -> Result<Response, IpcError> {
    let mut stream = connect_with_retry(path)?;
    let mut line = serde_json::to_string(cmd)?;
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    stream.flush()?;

    let mut reply = String::new();
    BufReader::new(stream).read_line(&mut reply)?;
    if reply.trim().is_empty() {
        return Err(IpcError::NoReply);
    }
    Ok(serde_json::from_str(reply.trim())?)
}
