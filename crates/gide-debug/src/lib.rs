//! This crate implements the session controller of the Gide debugger panel.
//!
//! Three main components are provided:
//! - A trait to implement a debugger backend (e.g., a Delve client),
//!   responsible for driving the debugged process.
//! - The execution state model, holding the authoritative view of the
//!   debugged process (threads, tasks, stack, variables, breakpoints).
//! - The session controller, which validates commands against the current
//!   state, issues them to the backend and pushes the resulting state into
//!   the model and out to a [Presenter](self::presenter::Presenter).
//!
//! # Driving a session
//!
//! ```no_run
//! use gide_debug::backend::{Language, Registry};
//! use gide_debug::controller::Controller;
//! use gide_debug::presenter::{Intent, Presenter};
//! # use gide_debug::backend::Backend;
//!
//! struct Panel;
//!
//! impl Presenter for Panel {
//!     fn show_file(&self, path: &std::path::Path, line: u32) {
//!         //
//!         // highlight the current execution line
//!         //
//!     }
//! }
//!
//! # async fn run<B: Backend>(registry: Registry<B>) -> gide_debug::Result<()> {
//! let controller = Controller::builder()
//!     .with_registry(registry)
//!     .with_presenter(Panel)
//!     .target(Language::Go, "./hello")
//!     .build();
//!
//! controller.start().await?;
//! controller.dispatch(Intent::AddBreak { file: "main.go".into(), line: 10 }).await?;
//!
//! // runs on a separate task, the handle resolves once the debuggee stops
//! let stopped = controller.continue_exec().await?;
//! let _ = stopped.await;
//! # Ok(())
//! # }
//! ```
//!
//! # Implementing a backend
//!
//! The [Backend](self::backend::Backend) trait is the capability contract
//! between the controller and a concrete debugger. Backends are selected at
//! startup through a [Registry](self::backend::Registry) keyed by source
//! language.

/// Module containing the debugger backend contract and its registry.
pub mod backend;

/// Module implementing the session controller.
pub mod controller;

mod error;
mod output;

/// Module containing the presentation adapter contract.
pub mod presenter;

/// Module containing the execution state model.
pub mod state;

pub use self::error::{BoxError, Error, Result};
pub use self::output::OutputSink;
