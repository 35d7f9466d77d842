use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gide_debug::presenter::Presenter;
use gide_debug::state::{Break, ExecState, Frame, Task, Thread, Variable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    State(ExecState),
    Breaks(Vec<Break>),
    Stack(usize),
    Vars(usize),
    Threads(usize),
    Tasks(usize),
    File(PathBuf, u32),
    ClearMarkers(usize),
    Failed(String),
}

/// Presenter recording everything it is shown.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    shown: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingPresenter {
    pub fn take(&self) -> Vec<Shown> {
        std::mem::take(&mut *self.shown.lock().unwrap())
    }

    pub fn files(&self) -> Vec<(PathBuf, u32)> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Shown::File(path, line) => Some((path.clone(), *line)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Shown::Failed(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, shown: Shown) {
        self.shown.lock().unwrap().push(shown);
    }
}

impl Presenter for RecordingPresenter {
    fn show_state(&self, state: &ExecState) {
        self.push(Shown::State(state.clone()));
    }

    fn show_breaks(&self, breaks: &[Break]) {
        self.push(Shown::Breaks(breaks.to_vec()));
    }

    fn show_stack(&self, stack: &[Frame]) {
        self.push(Shown::Stack(stack.len()));
    }

    fn show_vars(&self, vars: &[Variable]) {
        self.push(Shown::Vars(vars.len()));
    }

    fn show_threads(&self, threads: &[Thread]) {
        self.push(Shown::Threads(threads.len()));
    }

    fn show_tasks(&self, tasks: &[Task]) {
        self.push(Shown::Tasks(tasks.len()));
    }

    fn show_file(&self, path: &Path, line: u32) {
        self.push(Shown::File(path.to_path_buf(), line));
    }

    fn clear_break_markers(&self, breaks: &[Break]) {
        self.push(Shown::ClearMarkers(breaks.len()));
    }

    fn command_failed(&self, err: &gide_debug::Error) {
        self.push(Shown::Failed(err.to_string()));
    }
}
