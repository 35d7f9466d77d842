//! This crate implements a [Backend](gide_debug::backend::Backend) for Go
//! programs, driving a headless [Delve](https://github.com/go-delve/delve)
//! server through its JSON-RPC API.
//!
//! The server is either spawned by the backend (`dlv exec`, `dlv test` or
//! `dlv attach`), or already listening somewhere (connect mode). Its console
//! output is appended to the session [OutputSink](gide_debug::OutputSink).
//!
//! ```no_run
//! use gide_debug::backend::{Language, Registry};
//! use gide_delve::Delve;
//!
//! let registry = Registry::new().register(Language::Go, |_exe, root, _sink| Ok(Delve::new(root)));
//! ```

mod api;
mod backend;
mod convert;
mod error;
mod process;
mod rpc;

pub use self::backend::Delve;
pub use self::error::{Error, Result};
