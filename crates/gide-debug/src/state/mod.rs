mod breaks;
mod types;

pub use self::breaks::{Break, BreakStatus};
pub use self::types::{Frame, Task, Thread, Variable};

/// Execution state of the debugged process, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecState {
    /// Process ID of the debugged process.
    pub pid: u32,

    /// Whether the process is executing.
    pub running: bool,

    /// Whether a step is outstanding (e.g., it was interrupted by another
    /// breakpoint and must be cancelled or completed).
    pub next_up: bool,

    /// Current system thread.
    pub cur_thread: Option<i64>,

    /// Current task, for backends supporting tasks.
    pub cur_task: Option<i64>,

    /// Whether the process has exited.
    pub exited: bool,

    /// Exit status, meaningful once exited.
    pub exit_status: i32,

    /// Whether the process is being recorded (allows reverse execution).
    pub recording: bool,
}

/// All the debug state of a session.
///
/// This is the authoritative view of the debugged process. It is mutated by
/// the [Controller](crate::controller::Controller) only, and handed out to
/// presenters by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllState {
    /// Current execution state.
    pub state: ExecState,

    /// Selected frame depth within [stack](Self::stack).
    pub cur_frame: usize,

    /// Desired breakpoints (user intent).
    pub breaks: Vec<Break>,

    /// Breakpoints as last reported by the backend.
    pub cur_breaks: Vec<Break>,

    /// Stack of the current thread (or task).
    pub stack: Vec<Frame>,

    /// Arguments and local variables of the selected frame.
    pub vars: Vec<Variable>,

    /// System threads.
    pub threads: Vec<Thread>,

    /// Tasks, for backends supporting them.
    pub tasks: Vec<Task>,
}

impl AllState {
    /// Returns the frame at the given depth of the current stack.
    pub fn stack_frame(&self, depth: usize) -> Option<&Frame> {
        self.stack.get(depth)
    }

    /// Returns the selected frame.
    pub fn cur_stack_frame(&self) -> Option<&Frame> {
        self.stack_frame(self.cur_frame)
    }

    /// Returns the thread with the given ID.
    pub fn thread_by_id(&self, id: i64) -> Option<&Thread> {
        self.threads.iter().find(|th| th.id == id)
    }

    /// Returns the task with the given ID.
    pub fn task_by_id(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Returns the variable of the selected frame with the given name.
    pub fn var_by_name(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// Resets the state for a new run of the process.
    ///
    /// Desired breakpoints are kept, only their live status is forgotten.
    pub fn reset(&mut self) {
        self.state = ExecState::default();
        self.cur_frame = 0;
        self.stack.clear();
        self.vars.clear();
        self.threads.clear();
        self.tasks.clear();
        self.reset_breaks();
    }
}
