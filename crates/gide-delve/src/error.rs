use std::io;
use std::path::PathBuf;

use tokio_util::codec::LinesCodecError;

/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The debugger server could not be spawned.
    #[error("failed to spawn {0}")]
    Spawn(PathBuf, #[source] io::Error),

    /// The debugger server exited before reporting its listen address.
    #[error("debugger server exited before listening")]
    NoListenAddress,

    /// No server address was given in connect mode.
    #[error("no debugger server address to connect to")]
    MissingAddress,

    /// No process ID was given in attach mode.
    #[error("no process ID to attach to")]
    MissingPid,

    /// The connection to the debugger server could not be established.
    #[error("failed to connect to {0}")]
    Connect(String, #[source] io::Error),

    /// I/O error on the connection.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Framing error on the connection.
    #[error(transparent)]
    Codec(#[from] LinesCodecError),

    /// Malformed JSON message.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Error reported by the debugger server.
    #[error("{0}")]
    Rpc(String),

    /// The connection to the debugger server was closed.
    #[error("connection to the debugger lost")]
    ConnectionLost,
}

impl From<Error> for gide_debug::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::ConnectionLost => Self::ConnectionLost,
            e @ (Error::Io(_) | Error::Codec(_) | Error::Connect(..)) => Self::Transport(Box::new(e)),
            e => Self::Backend(Box::new(e)),
        }
    }
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
