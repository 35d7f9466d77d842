use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use gide_debug::backend::{Backend, Language, Params, Registry};
use gide_debug::state::{Break, ExecState, Frame, Task, Thread, Variable};
use gide_debug::{Error, OutputSink};
use regex::Regex;
use tokio::sync::mpsc;

/// Scripted debuggee shared between a test and the backends it registers.
pub struct Script {
    pub has_tasks: bool,
    pub can_rewind: AtomicBool,

    /// State returned by the commands that stop immediately.
    pub stopped: Mutex<ExecState>,

    pub breaks: Mutex<Vec<Break>>,
    pub stack: Mutex<Vec<Frame>>,
    pub vars: Mutex<Vec<Variable>>,
    pub threads: Mutex<Vec<Thread>>,
    pub tasks: Mutex<Vec<Task>>,

    /// Methods matching this fail with a backend error.
    pub failing: Mutex<Option<Regex>>,

    /// Methods matching this fail with a lost connection.
    pub losing: Mutex<Option<Regex>>,

    /// Files refused by `set_break`.
    pub unreachable: Mutex<Option<Regex>>,

    /// Log of the backend calls, by method name.
    pub calls: Mutex<Vec<String>>,

    next_id: AtomicI64,
    resolve_tx: mpsc::UnboundedSender<gide_debug::Result<ExecState>>,
    resolve_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<gide_debug::Result<ExecState>>>,
}

impl Script {
    pub fn new(has_tasks: bool) -> Arc<Self> {
        let (resolve_tx, resolve_rx) = mpsc::unbounded_channel();

        let stopped = ExecState {
            pid: 4242,
            cur_thread: Some(1),
            cur_task: has_tasks.then_some(1),
            ..Default::default()
        };

        Arc::new(Self {
            has_tasks,
            can_rewind: AtomicBool::new(false),
            stopped: Mutex::new(stopped),
            breaks: Mutex::new(Vec::new()),
            stack: Mutex::new(vec![frame(0, "main.main", 10), frame(1, "runtime.main", 250)]),
            vars: Mutex::new(vec![var("i", "3")]),
            threads: Mutex::new(vec![Thread {
                id: 1,
                task_id: has_tasks.then_some(1),
                ..Default::default()
            }]),
            tasks: Mutex::new(if has_tasks {
                vec![Task {
                    id: 1,
                    thread_id: Some(1),
                    ..Default::default()
                }]
            } else {
                Vec::new()
            }),
            failing: Mutex::new(None),
            losing: Mutex::new(None),
            unreachable: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            resolve_tx,
            resolve_rx: tokio::sync::Mutex::new(resolve_rx),
        })
    }

    /// Builds a registry constructing backends driven by this script.
    pub fn registry(self: &Arc<Self>) -> Registry<FakeBackend> {
        let script = Arc::clone(self);

        Registry::new().register(Language::Go, move |_exe: &Path, _root: &Path, _sink| {
            Ok(FakeBackend {
                script: Arc::clone(&script),
                active: AtomicBool::new(false),
            })
        })
    }

    /// Makes the in-flight `continue_exec` return the given result.
    pub fn resolve(&self, res: gide_debug::Result<ExecState>) {
        self.resolve_tx.send(res).unwrap();
    }

    /// Makes the in-flight `continue_exec` return a stop at the current
    /// location.
    pub fn hit(&self) {
        let state = self.stopped.lock().unwrap().clone();
        self.resolve(Ok(state));
    }

    pub fn fail_on(&self, pattern: &str) {
        *self.failing.lock().unwrap() = Some(Regex::new(pattern).unwrap());
    }

    pub fn lose_on(&self, pattern: &str) {
        *self.losing.lock().unwrap() = Some(Regex::new(pattern).unwrap());
    }

    pub fn called(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| *m == method)
            .count()
    }

    fn enter(&self, method: &str) -> gide_debug::Result<()> {
        self.calls.lock().unwrap().push(method.to_owned());

        let matches = |re: &Mutex<Option<Regex>>| {
            re.lock()
                .unwrap()
                .as_ref()
                .is_some_and(|re| re.is_match(method))
        };

        if matches(&self.losing) {
            return Err(Error::ConnectionLost);
        }
        if matches(&self.failing) {
            return Err(Error::Backend(format!("{method} failed").into()));
        }
        Ok(())
    }

    fn stop_here(&self) -> ExecState {
        self.stopped.lock().unwrap().clone()
    }
}

pub fn frame(depth: usize, func: &str, line: u32) -> Frame {
    Frame {
        depth,
        fpath: PathBuf::from("/src/app/main.go"),
        file: "main.go".to_owned(),
        line,
        func: func.to_owned(),
        ..Default::default()
    }
}

pub fn var(name: &str, value: &str) -> Variable {
    Variable {
        name: name.to_owned(),
        type_name: "int".to_owned(),
        value: value.to_owned(),
        ..Default::default()
    }
}

pub struct FakeBackend {
    script: Arc<Script>,
    active: AtomicBool,
}

impl Backend for FakeBackend {
    fn has_tasks(&self) -> bool {
        self.script.has_tasks
    }

    fn can_rewind(&self) -> bool {
        self.script.can_rewind.load(Ordering::SeqCst)
    }

    async fn start(
        &self,
        exe: &Path,
        _root: &Path,
        sink: OutputSink,
        _params: &Params,
    ) -> gide_debug::Result<()> {
        self.script.enter("start")?;

        sink.append_line(&format!("launching {}", exe.display()));
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_params(&self, _params: &Params) {
        self.script.calls.lock().unwrap().push("set_params".to_owned());
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn process_pid(&self) -> gide_debug::Result<u32> {
        self.script.enter("process_pid")?;
        Ok(self.script.stop_here().pid)
    }

    async fn detach(&self, _kill: bool) -> gide_debug::Result<()> {
        self.script.enter("detach")?;
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self, _cont: bool) -> gide_debug::Result<()> {
        self.script.enter("disconnect")?;
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn restart(&self) -> gide_debug::Result<()> {
        self.script.enter("restart")?;
        self.script.breaks.lock().unwrap().iter_mut().for_each(|bk| bk.hits = 0);
        Ok(())
    }

    async fn get_state(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("get_state")?;
        Ok(self.script.stop_here())
    }

    async fn continue_exec(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("continue_exec")?;

        let mut rx = self.script.resolve_rx.lock().await;
        rx.recv().await.unwrap_or(Err(Error::ConnectionLost))
    }

    async fn rewind(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("rewind")?;

        let mut rx = self.script.resolve_rx.lock().await;
        rx.recv().await.unwrap_or(Err(Error::ConnectionLost))
    }

    async fn step_over(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("step_over")?;
        Ok(self.script.stop_here())
    }

    async fn step_into(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("step_into")?;
        Ok(self.script.stop_here())
    }

    async fn step_out(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("step_out")?;
        Ok(self.script.stop_here())
    }

    async fn step_single(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("step_single")?;
        Ok(self.script.stop_here())
    }

    async fn switch_thread(&self, id: i64) -> gide_debug::Result<ExecState> {
        self.script.enter("switch_thread")?;

        let mut state = self.script.stopped.lock().unwrap();
        state.cur_thread = Some(id);
        Ok(state.clone())
    }

    async fn switch_task(&self, id: i64) -> gide_debug::Result<ExecState> {
        self.script.enter("switch_task")?;

        let mut state = self.script.stopped.lock().unwrap();
        state.cur_task = Some(id);
        Ok(state.clone())
    }

    async fn stop(&self) -> gide_debug::Result<ExecState> {
        self.script.enter("stop")?;

        let state = self.script.stop_here();
        self.script.resolve(Ok(state.clone()));
        Ok(state)
    }

    async fn cancel_next(&self) -> gide_debug::Result<()> {
        self.script.enter("cancel_next")?;
        self.script.stopped.lock().unwrap().next_up = false;
        Ok(())
    }

    async fn get_break(&self, id: i64) -> gide_debug::Result<Break> {
        self.script.enter("get_break")?;

        let breaks = self.script.breaks.lock().unwrap();
        breaks
            .iter()
            .find(|bk| bk.id == Some(id))
            .cloned()
            .ok_or_else(|| Error::Backend(format!("no breakpoint {id}").into()))
    }

    async fn set_break(&self, fpath: &Path, line: u32) -> gide_debug::Result<Break> {
        self.script.enter("set_break")?;

        let refused = self
            .script
            .unreachable
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|re| re.is_match(&fpath.to_string_lossy()));
        if refused {
            return Err(Error::Backend("could not find statement".into()));
        }

        let bk = Break {
            id: Some(self.script.next_id.fetch_add(1, Ordering::SeqCst)),
            ..Break::new(fpath, line)
        };
        self.script.breaks.lock().unwrap().push(bk.clone());
        Ok(bk)
    }

    async fn list_breaks(&self) -> gide_debug::Result<Vec<Break>> {
        self.script.enter("list_breaks")?;
        Ok(self.script.breaks.lock().unwrap().clone())
    }

    async fn clear_break(&self, id: i64) -> gide_debug::Result<()> {
        self.script.enter("clear_break")?;
        self.script.breaks.lock().unwrap().retain(|bk| bk.id != Some(id));
        Ok(())
    }

    async fn amend_break(&self, id: i64, cond: &str, trace: bool) -> gide_debug::Result<()> {
        self.script.enter("amend_break")?;

        let mut breaks = self.script.breaks.lock().unwrap();
        if let Some(bk) = breaks.iter_mut().find(|bk| bk.id == Some(id)) {
            bk.cond = cond.to_owned();
            bk.trace = trace;
        }
        Ok(())
    }

    async fn list_threads(&self) -> gide_debug::Result<Vec<Thread>> {
        self.script.enter("list_threads")?;
        Ok(self.script.threads.lock().unwrap().clone())
    }

    async fn get_thread(&self, id: i64) -> gide_debug::Result<Thread> {
        self.script.enter("get_thread")?;

        let threads = self.script.threads.lock().unwrap();
        threads
            .iter()
            .find(|th| th.id == id)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("no thread {id}").into()))
    }

    async fn list_tasks(&self) -> gide_debug::Result<Vec<Task>> {
        self.script.enter("list_tasks")?;
        Ok(self.script.tasks.lock().unwrap().clone())
    }

    async fn stack(&self, _id: i64, depth: usize) -> gide_debug::Result<Vec<Frame>> {
        self.script.enter("stack")?;

        let stack = self.script.stack.lock().unwrap();
        Ok(stack.iter().take(depth).cloned().collect())
    }

    async fn list_all_vars(&self, filter: &str) -> gide_debug::Result<Vec<Variable>> {
        self.script.enter("list_all_vars")?;

        let vars = self.script.vars.lock().unwrap();
        Ok(vars.iter().filter(|v| v.name.contains(filter)).cloned().collect())
    }

    async fn list_vars(&self, _id: i64, _frame: usize) -> gide_debug::Result<Vec<Variable>> {
        self.script.enter("list_vars")?;
        Ok(self.script.vars.lock().unwrap().clone())
    }

    async fn get_var(&self, name: &str, _id: i64, _frame: usize) -> gide_debug::Result<Variable> {
        self.script.enter("get_var")?;

        let vars = self.script.vars.lock().unwrap();
        vars.iter()
            .find(|v| v.name == name)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("could not find symbol value for {name}").into()))
    }

    async fn set_var(
        &self,
        name: &str,
        value: &str,
        _id: i64,
        _frame: usize,
    ) -> gide_debug::Result<()> {
        self.script.enter("set_var")?;

        let mut vars = self.script.vars.lock().unwrap();
        if let Some(v) = vars.iter_mut().find(|v| v.name == name) {
            v.value = value.to_owned();
        }
        Ok(())
    }

    async fn list_sources(&self, filter: &str) -> gide_debug::Result<Vec<String>> {
        self.script.enter("list_sources")?;
        Ok(vec!["/src/app/main.go".to_owned()]
            .into_iter()
            .filter(|s| s.contains(filter))
            .collect())
    }

    async fn list_funcs(&self, filter: &str) -> gide_debug::Result<Vec<String>> {
        self.script.enter("list_funcs")?;
        Ok(vec!["main.main".to_owned(), "main.work".to_owned()]
            .into_iter()
            .filter(|s| s.contains(filter))
            .collect())
    }

    async fn list_types(&self, filter: &str) -> gide_debug::Result<Vec<String>> {
        self.script.enter("list_types")?;
        Ok(vec!["main.Config".to_owned()]
            .into_iter()
            .filter(|s| s.contains(filter))
            .collect())
    }
}
