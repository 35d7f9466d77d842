use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use gide_debug::presenter::Presenter;
use gide_debug::state::{Break, BreakStatus, ExecState, Frame, Task, Thread, Variable};

/// Presenter printing the session events to a terminal.
///
/// Only the events worth reporting on each stop are printed (execution
/// state, location, failures). The other sections are printed on demand
/// with the `fmt_*` helpers.
pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalPresenter {
    /// Creates a presenter printing to stdout.
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Creates a presenter printing to the given writer.
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Prints the given lines.
    pub fn print(&self, lines: impl IntoIterator<Item = impl AsRef<str>>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);

        for line in lines {
            if writeln!(out, "{}", line.as_ref()).is_err() {
                return;
            }
        }
        let _ = out.flush();
    }

    /// Prints a single line.
    pub fn message(&self, line: impl AsRef<str>) {
        self.print([line]);
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for TerminalPresenter {
    fn show_state(&self, state: &ExecState) {
        let line = if state.exited {
            format!("process {} has exited with status {}", state.pid, state.exit_status)
        } else if state.running {
            "running...".to_owned()
        } else {
            return;
        };
        self.message(line);
    }

    fn show_file(&self, path: &Path, line: u32) {
        self.message(format!("> {}:{line}", path.display()));
    }

    fn clear_break_markers(&self, breaks: &[Break]) {
        if !breaks.is_empty() {
            self.message(format!("session ended, {} breakpoint(s) kept", breaks.len()));
        }
    }

    fn command_failed(&self, err: &gide_debug::Error) {
        self.message(format!("error: {err}"));
    }
}

pub fn fmt_break(bk: &Break) -> String {
    let status = match bk.status {
        BreakStatus::Pending => "pending",
        BreakStatus::Installed => "installed",
        BreakStatus::Unresolved => "unresolved",
        BreakStatus::Disabled => "disabled",
    };

    let mut line = format!("{}:{} [{status}]", bk.file, bk.line);

    if let Some(id) = bk.id {
        line.push_str(&format!(" #{id}"));
    }
    if bk.trace {
        line.push_str(" trace");
    }
    if !bk.cond.is_empty() {
        line.push_str(&format!(" if {}", bk.cond));
    }
    if bk.hits > 0 {
        line.push_str(&format!(" (hits: {})", bk.hits));
    }
    line
}

pub fn fmt_frame(frame: &Frame, selected: bool) -> String {
    let marker = if selected { '*' } else { ' ' };
    format!(
        "{marker}{:>3} {} at {}:{}",
        frame.depth, frame.func, frame.file, frame.line
    )
}

pub fn fmt_thread(th: &Thread, current: bool) -> String {
    let marker = if current { '*' } else { ' ' };
    let func = th.func.as_deref().unwrap_or("?");

    match th.task_id {
        Some(task) => format!(
            "{marker}Thread {} (goroutine {task}) {func} at {}:{}",
            th.id, th.file, th.line
        ),
        None => format!("{marker}Thread {} {func} at {}:{}", th.id, th.file, th.line),
    }
}

pub fn fmt_task(task: &Task, current: bool) -> String {
    let marker = if current { '*' } else { ' ' };
    let func = task.func.as_deref().unwrap_or("?");

    let mut line = format!("{marker}Goroutine {} {func} at {}:{}", task.id, task.file, task.line);
    if let Some(start) = &task.start_func {
        line.push_str(&format!(" (started by {start})"));
    }
    line
}

/// Formats a variable and its loaded children, one line each.
pub fn fmt_var(var: &Variable) -> Vec<String> {
    let mut lines = Vec::new();
    push_var(&mut lines, var, 0);
    lines
}

fn push_var(lines: &mut Vec<String>, var: &Variable, indent: usize) {
    let value = if var.value.is_empty() && !var.children.is_empty() {
        "{...}"
    } else {
        var.value.as_str()
    };

    lines.push(format!(
        "{:indent$}{} {} = {value}",
        "",
        var.name,
        var.type_name,
        indent = indent * 2
    ));

    for child in &var.children {
        push_var(lines, child, indent + 1);
    }
}
