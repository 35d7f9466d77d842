mod params;
mod registry;

use std::future::{self, Future};
use std::path::Path;

pub use self::params::{Mode, Params, VarParams};
pub use self::registry::{Constructor, Language, Registry};
use crate::OutputSink;
use crate::state::{Break, ExecState, Frame, Task, Thread, Variable};

/// Trait implementing the capability contract of a debugger backend.
///
/// All methods take `&self`, so that a [stop](Self::stop) can be issued
/// while a [continue_exec](Self::continue_exec) is in flight. Implementors
/// are responsible for their own interior synchronization.
///
/// # Errors
///
/// Implementors report [NotStarted](crate::Error::NotStarted) when no
/// session is live (before [start](Self::start), after
/// [detach](Self::detach) or [disconnect](Self::disconnect)), and
/// [IsRunning](crate::Error::IsRunning) for execution control or
/// introspection while the process is running.
pub trait Backend: Send + Sync + 'static {
    /// Returns whether the debugger supports a level of threading below the
    /// system thread level.
    ///
    /// If true, execution contexts are addressed by [Task] ID, otherwise by
    /// [Thread] ID. This is fixed for a given implementation.
    fn has_tasks(&self) -> bool;

    /// Returns whether the debugger can execute backwards.
    fn can_rewind(&self) -> bool {
        false
    }

    /// Starts the debugger for the given executable.
    ///
    /// `root` is the project root path (used for trimming file names), and
    /// the console output of the debugger session is appended to `sink`.
    ///
    /// On success, the process is stopped and ready for commands.
    fn start(
        &self,
        exe: &Path,
        root: &Path,
        sink: OutputSink,
        params: &Params,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    /// Sets the parameters controlling how info is returned.
    fn set_params(&self, params: &Params);

    /// Returns whether the debugger is active and ready for commands.
    ///
    /// This never blocks.
    fn is_active(&self) -> bool;

    /// Returns the process ID of the debugged process.
    fn process_pid(&self) -> impl Future<Output = crate::Result<u32>> + Send;

    /// Detaches the debugger, optionally killing the process.
    fn detach(&self, kill: bool) -> impl Future<Output = crate::Result<()>> + Send;

    /// Closes the connection to the debugger without detaching first.
    ///
    /// If `cont` is true, the process is resumed before closing.
    fn disconnect(&self, cont: bool) -> impl Future<Output = crate::Result<()>> + Send;

    /// Restarts the process with identical parameters.
    fn restart(&self) -> impl Future<Output = crate::Result<()>> + Send;

    /// Returns the current execution state.
    ///
    /// This returns immediately, even if the process is running.
    fn get_state(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Resumes execution.
    ///
    /// The returned future resolves once execution stops again (breakpoint,
    /// signal, exit or explicit [stop](Self::stop)), which may take
    /// forever. A lost connection resolves it with an error.
    fn continue_exec(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Resumes execution backwards.
    ///
    /// Only meaningful when [can_rewind](Self::can_rewind) is true.
    fn rewind(&self) -> impl Future<Output = crate::Result<ExecState>> + Send {
        future::ready(Err(crate::Error::Unsupported("rewind")))
    }

    /// Continues to the next source line, not entering function calls.
    fn step_over(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Continues to the next source line, entering function calls.
    fn step_into(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Continues to the return point of the current function.
    fn step_out(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Steps a single CPU instruction.
    fn step_single(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Switches the current system thread.
    fn switch_thread(&self, id: i64) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Switches the current task.
    fn switch_task(&self, id: i64) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Suspends the running process.
    fn stop(&self) -> impl Future<Output = crate::Result<ExecState>> + Send;

    /// Cancels a step that was interrupted by another breakpoint or a
    /// manual stop.
    fn cancel_next(&self) -> impl Future<Output = crate::Result<()>> + Send;

    /// Returns the breakpoint with the given ID.
    fn get_break(&self, id: i64) -> impl Future<Output = crate::Result<Break>> + Send;

    /// Sets a new breakpoint at the given file (unique enough) and line.
    fn set_break(&self, fpath: &Path, line: u32)
    -> impl Future<Output = crate::Result<Break>> + Send;

    /// Lists all breakpoints.
    fn list_breaks(&self) -> impl Future<Output = crate::Result<Vec<Break>>> + Send;

    /// Deletes the breakpoint with the given ID.
    fn clear_break(&self, id: i64) -> impl Future<Output = crate::Result<()>> + Send;

    /// Updates the condition and trace flag of the given breakpoint.
    fn amend_break(
        &self,
        id: i64,
        cond: &str,
        trace: bool,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    /// Updates the backend breakpoints to match the given desired list.
    ///
    /// Live breakpoints with no enabled desired counterpart are cleared,
    /// missing ones are set, and the ones whose condition or trace flag
    /// differ are amended. A breakpoint the backend refuses to set is
    /// skipped (it shows up as unresolved once merged).
    fn update_breaks(&self, desired: &[Break]) -> impl Future<Output = crate::Result<()>> + Send {
        async move {
            let live = self.list_breaks().await?;

            for cb in &live {
                let Some(id) = cb.id else { continue };

                if !desired.iter().any(|bk| bk.on && bk.same_location(cb)) {
                    tracing::debug!(id, file = %cb.file, line = cb.line, "clearing breakpoint");
                    self.clear_break(id).await?;
                }
            }

            for bk in desired.iter().filter(|bk| bk.on) {
                let installed = live.iter().find(|cb| cb.same_location(bk));

                let (id, cond, trace) = match installed {
                    Some(cb) => (cb.id, cb.cond.as_str(), cb.trace),
                    None => match self.set_break(&bk.fpath, bk.line).await {
                        Ok(cb) => (cb.id, "", false),
                        Err(e) if e.is_transport() => return Err(e),
                        Err(e) => {
                            tracing::warn!(error = %e, file = %bk.file, line = bk.line, "breakpoint not set");
                            continue;
                        }
                    },
                };

                if let Some(id) = id {
                    if cond != bk.cond || trace != bk.trace {
                        self.amend_break(id, &bk.cond, bk.trace).await?;
                    }
                }
            }

            Ok(())
        }
    }

    /// Returns the ID of the current execution context from the given state:
    /// the task if [has_tasks](Self::has_tasks), otherwise the thread.
    fn cur_thread_id(&self, state: &ExecState) -> Option<i64> {
        if self.has_tasks() {
            state.cur_task
        } else {
            state.cur_thread
        }
    }

    /// Lists all system threads.
    fn list_threads(&self) -> impl Future<Output = crate::Result<Vec<Thread>>> + Send;

    /// Returns the thread with the given ID.
    fn get_thread(&self, id: i64) -> impl Future<Output = crate::Result<Thread>> + Send;

    /// Lists all tasks (if supported).
    fn list_tasks(&self) -> impl Future<Output = crate::Result<Vec<Task>>> + Send;

    /// Returns the stack, up to the given depth, of the given thread or task.
    fn stack(&self, id: i64, depth: usize)
    -> impl Future<Output = crate::Result<Vec<Frame>>> + Send;

    /// Lists all variables in scope of the current thread, whose name
    /// matches `filter`.
    fn list_all_vars(&self, filter: &str)
    -> impl Future<Output = crate::Result<Vec<Variable>>> + Send;

    /// Lists the arguments and local variables of the given frame of the
    /// given thread or task.
    fn list_vars(
        &self,
        id: i64,
        frame: usize,
    ) -> impl Future<Output = crate::Result<Vec<Variable>>> + Send;

    /// Returns the variable with the given name, in the given frame of the
    /// given thread or task.
    fn get_var(
        &self,
        name: &str,
        id: i64,
        frame: usize,
    ) -> impl Future<Output = crate::Result<Variable>> + Send;

    /// Sets the value of a variable, in the given frame of the given thread
    /// or task.
    fn set_var(
        &self,
        name: &str,
        value: &str,
        id: i64,
        frame: usize,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    /// Lists the source files of the process matching `filter`.
    fn list_sources(&self, filter: &str)
    -> impl Future<Output = crate::Result<Vec<String>>> + Send;

    /// Lists the functions of the process matching `filter`.
    fn list_funcs(&self, filter: &str) -> impl Future<Output = crate::Result<Vec<String>>> + Send;

    /// Lists the types of the process matching `filter`.
    fn list_types(&self, filter: &str) -> impl Future<Output = crate::Result<Vec<String>>> + Send;
}
