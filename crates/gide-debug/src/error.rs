/// Boxed error coming from a backend implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No live debugger session.
    #[error("debugger not started")]
    NotStarted,

    /// The debugged process is executing, or another command is in flight.
    #[error("debugger is currently running and cannot return info")]
    IsRunning,

    /// The debugger was started twice on a live session.
    #[error("debugger already started")]
    AlreadyStarted,

    /// A stop was requested but the debugged process is not running.
    #[error("debugger is not running")]
    NotRunning,

    /// The debugged process has exited.
    #[error("process has exited with status {status}")]
    Exited {
        /// Exit status of the process.
        status: i32,
    },

    /// No backend is registered for the given language.
    #[error("file type {0} not supported")]
    UnsupportedLanguage(String),

    /// The backend does not implement the given operation.
    #[error("{0} is not supported by this debugger")]
    Unsupported(&'static str),

    /// A frame was selected beyond the current stack.
    #[error("frame {depth} out of range (stack has {len} frames)")]
    FrameOutOfRange {
        /// Requested frame depth.
        depth: usize,

        /// Number of frames of the current stack.
        len: usize,
    },

    /// The connection to the debugger was lost.
    #[error("connection to the debugger lost")]
    ConnectionLost,

    /// Error while talking to the debugger.
    #[error("debugger transport: {0}")]
    Transport(#[source] BoxError),

    /// Error reported by the debugger.
    #[error(transparent)]
    Backend(BoxError),
}

impl Error {
    /// Returns whether the error means the backend connection is gone.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionLost | Self::Transport(_))
    }
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
