use std::path::{Path, PathBuf};

use crate::state::{Break, ExecState, Frame, Task, Thread, Variable};

/// Trait for implementing the presentation side of a debugging session
/// (e.g., the views of a debugger panel).
///
/// The [Controller](crate::controller::Controller) calls these functions
/// after updating the corresponding section of the execution state. They are
/// called with the session state locked: implementors read what they are
/// handed and return promptly.
pub trait Presenter: Send + Sync + 'static {
    /// Function called when the execution state changes (running, stopped,
    /// exited).
    fn show_state(&self, _state: &ExecState) {}

    /// Function called when the desired breakpoints change.
    fn show_breaks(&self, _breaks: &[Break]) {}

    /// Function called when the stack is refreshed.
    fn show_stack(&self, _stack: &[Frame]) {}

    /// Function called when the variables of the selected frame are
    /// refreshed.
    fn show_vars(&self, _vars: &[Variable]) {}

    /// Function called when the system threads are refreshed.
    fn show_threads(&self, _threads: &[Thread]) {}

    /// Function called when the tasks are refreshed.
    ///
    /// Only called for backends supporting tasks.
    fn show_tasks(&self, _tasks: &[Task]) {}

    /// Function called when the selected frame changes, so that the current
    /// execution line can be highlighted.
    fn show_file(&self, _path: &Path, _line: u32) {}

    /// Function called when the session ends, so that the breakpoint markers
    /// can be cleared.
    fn clear_break_markers(&self, _breaks: &[Break]) {}

    /// Function called when a command running in the background failed.
    fn command_failed(&self, _err: &crate::Error) {}
}

/// Intent originating from the presentation side, forwarded unchanged to
/// the [Controller](crate::controller::Controller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Add a breakpoint.
    AddBreak {
        /// Source file.
        file: PathBuf,

        /// Source line.
        line: u32,
    },

    /// Delete a breakpoint.
    DeleteBreak {
        /// Source file.
        file: PathBuf,

        /// Source line.
        line: u32,
    },

    /// Turn a breakpoint on or off.
    EnableBreak {
        /// Source file.
        file: PathBuf,

        /// Source line.
        line: u32,

        /// Whether the breakpoint is enabled.
        on: bool,
    },

    /// Change the condition and trace flag of a breakpoint.
    AmendBreak {
        /// Source file.
        file: PathBuf,

        /// Source line.
        line: u32,

        /// Condition expression (empty for none).
        cond: String,

        /// Whether the breakpoint is a tracepoint.
        trace: bool,
    },

    /// Select a frame of the current stack.
    SetFrame(usize),

    /// Select a thread (or a task, for backends supporting tasks).
    SetThread(i64),

    /// Resume execution.
    Continue,

    /// Step to the next line.
    Next,

    /// Step into the next line.
    Step,

    /// Step out of the current function.
    StepOut,

    /// Step a single instruction.
    SingleStep,

    /// Suspend the running process.
    Stop,

    /// Cancel an interrupted step.
    CancelNext,

    /// Resume execution backwards.
    Rewind,

    /// Restart the process.
    Restart,

    /// Detach from the process.
    Detach {
        /// Whether the process is killed.
        kill: bool,
    },

    /// Disconnect from the debugger.
    Disconnect {
        /// Whether the process is resumed first.
        cont: bool,
    },
}
