use std::path::Path;
use std::process::Stdio;
use std::{cmp, io};

use futures_util::StreamExt;
use gide_debug::OutputSink;
use gide_debug::backend::{Mode, Params};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, FramedRead};

use crate::{Error, Result};

const LISTENING: &str = "API server listening at:";

/// Longest console line kept whole; longer ones are split.
const MAX_LINE: usize = 64 * 1024;

/// Headless Delve server spawned for a debugging session.
///
/// The server is killed when this is dropped, unless it was
/// [released](Self::release).
pub(crate) struct Server {
    child: Option<Child>,
    pub(crate) addr: String,
}

impl Server {
    /// Spawns a headless Delve server for the given executable, and waits
    /// for it to listen.
    ///
    /// Everything the server prints is appended to `sink`.
    #[tracing::instrument(name = "Launch", skip_all, fields(dlv = %dlv.display(), mode = ?params.mode))]
    pub(crate) async fn launch(
        dlv: &Path,
        exe: &Path,
        root: &Path,
        params: &Params,
        sink: &OutputSink,
    ) -> Result<Self> {
        let mut command = Command::new(dlv);

        match params.mode {
            Mode::Exec => command.arg("exec").arg(exe),
            Mode::Test => command.arg("test").arg(exe),
            Mode::Attach => {
                let pid = params.pid.ok_or(Error::MissingPid)?;
                command.arg("attach").arg(pid.to_string())
            }
            Mode::Connect => return Err(Error::MissingAddress),
        };

        command
            .args(["--headless", "--api-version=2", "--listen=127.0.0.1:0"])
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if params.mode != Mode::Attach && !params.args.is_empty() {
            command.arg("--").args(&params.args);
        }

        let mut child = command
            .spawn()
            .map_err(|e| Error::Spawn(dlv.to_path_buf(), e))?;

        let stderr = child.stderr.take();
        let stdout = child.stdout.take();

        // killed on early return
        let mut server = Self {
            child: Some(child),
            addr: String::new(),
        };

        if let Some(stderr) = stderr {
            tokio::spawn(forward(FramedRead::new(stderr, ConsoleCodec::new()), sink.clone()));
        }

        let stdout = stdout.ok_or(Error::NoListenAddress)?;
        let mut lines = FramedRead::new(stdout, ConsoleCodec::new());

        server.addr = loop {
            let line = lines.next().await.ok_or(Error::NoListenAddress)??;
            sink.append_line(&line);

            if let Some(addr) = parse_listen_addr(&line) {
                break addr.to_owned();
            }
        };

        tracing::info!(addr = %server.addr, "debugger server listening");

        tokio::spawn(forward(lines, sink.clone()));

        Ok(server)
    }

    /// Leaves the server running after this is dropped.
    pub(crate) fn release(mut self) {
        // a dropped child keeps running, and is reaped by the runtime
        self.child.take();
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(child) = &mut self.child {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "debugger server already gone");
            }
        }
    }
}

async fn forward<R: AsyncRead + Unpin>(mut lines: FramedRead<R, ConsoleCodec>, sink: OutputSink) {
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => sink.append_line(&line),
            Err(e) => {
                tracing::debug!(error = %e, "debugger output closed");
                break;
            }
        }
    }
}

/// Splits console output into lines.
///
/// Output is arbitrary bytes: invalid UTF-8 is replaced, and lines longer
/// than [`MAX_LINE`] are cut into several.
#[derive(Debug, Default)]
pub(crate) struct ConsoleCodec {
    // bytes already searched for a newline
    next_index: usize,
}

impl ConsoleCodec {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn take(&mut self, src: &mut BytesMut, len: usize, skip: usize) -> String {
        let chunk = src.split_to(len + skip);
        self.next_index = 0;

        let line = String::from_utf8_lossy(&chunk[..len]);
        line.strip_suffix('\r').unwrap_or(&*line).to_owned()
    }
}

impl Decoder for ConsoleCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        let read_to = cmp::min(MAX_LINE, src.len());

        if let Some(pos) = src[self.next_index..read_to]
            .iter()
            .position(|b| *b == b'\n')
        {
            let len = self.next_index + pos;
            return Ok(Some(self.take(src, len, 1)));
        }

        if src.len() >= MAX_LINE {
            return Ok(Some(self.take(src, MAX_LINE, 0)));
        }

        self.next_index = read_to;
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        if src.is_empty() {
            Ok(None)
        } else {
            let len = src.len();
            Ok(Some(self.take(src, len, 0)))
        }
    }
}

/// Extracts the address from the line printed by a headless Delve server
/// once it listens.
pub(crate) fn parse_listen_addr(line: &str) -> Option<&str> {
    let (_, addr) = line.split_once(LISTENING)?;
    let addr = addr.trim();

    (!addr.is_empty()).then_some(addr)
}
