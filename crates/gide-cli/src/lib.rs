//! Crate implementing the terminal front-end of the Gide debugger.

mod cli;
mod config;
mod console;
mod presenter;
mod run;

pub use self::cli::{CliAction, CliOpts};
pub use self::config::DebugConfig;
pub use self::presenter::TerminalPresenter;
pub use self::run::evaluate_run;
