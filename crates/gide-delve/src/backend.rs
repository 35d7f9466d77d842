use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use gide_debug::OutputSink;
use gide_debug::backend::{Backend, Mode, Params};
use gide_debug::state::{Break, ExecState, Frame, Task, Thread, Variable};

use crate::api::{self, DebuggerCommand};
use crate::convert;
use crate::process::Server;
use crate::rpc::RpcClient;

/// Live connection to a Delve server.
struct Connection {
    rpc: RpcClient,
    server: Mutex<Option<Server>>,
    sink: OutputSink,
}

/// Debugger backend for Go programs, driving a headless
/// [Delve](https://github.com/go-delve/delve) server over its JSON-RPC API.
///
/// Tasks are goroutines.
pub struct Delve {
    dlv: PathBuf,
    root: PathBuf,
    conn: RwLock<Option<Arc<Connection>>>,
    params: Mutex<Params>,
    running: AtomicBool,
    recording: AtomicBool,
}

/// Marks the process as running until dropped.
struct Running<'a>(&'a AtomicBool);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Delve {
    /// Creates a Delve backend launching the `dlv` found in `PATH`.
    ///
    /// `root` is the project root, used for trimming file names.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_dlv("dlv", root)
    }

    /// Creates a Delve backend launching the given `dlv` executable.
    pub fn with_dlv(dlv: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            dlv: dlv.into(),
            root: root.into(),
            conn: RwLock::new(None),
            params: Mutex::new(Params::default()),
            running: AtomicBool::new(false),
            recording: AtomicBool::new(false),
        }
    }

    fn connection(&self) -> gide_debug::Result<Arc<Connection>> {
        self.conn
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(gide_debug::Error::NotStarted)
    }

    /// Returns the connection, if the process is not running.
    fn ready(&self) -> gide_debug::Result<Arc<Connection>> {
        let conn = self.connection()?;

        if self.running.load(Ordering::SeqCst) {
            return Err(gide_debug::Error::IsRunning);
        }
        Ok(conn)
    }

    fn take_connection(&self) -> gide_debug::Result<Arc<Connection>> {
        self.running.store(false, Ordering::SeqCst);

        self.conn
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(gide_debug::Error::NotStarted)
    }

    fn begin_running(&self) -> gide_debug::Result<Running<'_>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(gide_debug::Error::IsRunning);
        }
        Ok(Running(&self.running))
    }

    fn load_config(&self) -> api::LoadConfig {
        convert::load_config(&self.params.lock().unwrap_or_else(PoisonError::into_inner).vars)
    }

    fn record(&self, st: &api::DebuggerState) -> crate::Result<ExecState> {
        self.recording.store(st.recording, Ordering::SeqCst);
        convert::exec_state(st)
    }

    /// Issues an execution command and waits for the process to stop.
    async fn command(&self, cmd: DebuggerCommand) -> gide_debug::Result<ExecState> {
        let conn = self.connection()?;
        let _running = self.begin_running()?;

        tracing::debug!(command = cmd.name, "resuming");

        let out: api::CommandOut = conn.rpc.call("Command", cmd).await?;
        Ok(self.record(&out.state)?)
    }
}

impl Backend for Delve {
    fn has_tasks(&self) -> bool {
        true
    }

    fn can_rewind(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    #[tracing::instrument(name = "Delve", skip_all, fields(exe = %exe.display()))]
    async fn start(
        &self,
        exe: &Path,
        root: &Path,
        sink: OutputSink,
        params: &Params,
    ) -> gide_debug::Result<()> {
        if self.connection().is_ok() {
            return Err(gide_debug::Error::AlreadyStarted);
        }

        let (server, addr) = match params.mode {
            Mode::Connect => {
                let addr = params.addr.clone().ok_or(crate::Error::MissingAddress)?;
                (None, addr)
            }
            _ => {
                let server = Server::launch(&self.dlv, exe, root, params, &sink).await?;
                let addr = server.addr.clone();
                (Some(server), addr)
            }
        };

        let rpc = RpcClient::connect(&addr).await?;

        *self.params.lock().unwrap_or_else(PoisonError::into_inner) = params.clone();
        self.running.store(false, Ordering::SeqCst);

        *self.conn.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(Connection {
            rpc,
            server: Mutex::new(server),
            sink,
        }));

        Ok(())
    }

    fn set_params(&self, params: &Params) {
        *self.params.lock().unwrap_or_else(PoisonError::into_inner) = params.clone();
    }

    fn is_active(&self) -> bool {
        self.connection().is_ok()
    }

    async fn process_pid(&self) -> gide_debug::Result<u32> {
        let conn = self.connection()?;

        let out: api::ProcessPidOut = conn.rpc.call("ProcessPid", api::Empty {}).await?;
        Ok(convert::pid(out.pid)?)
    }

    async fn detach(&self, kill: bool) -> gide_debug::Result<()> {
        let conn = self.take_connection()?;

        // the server exits right after replying
        match conn.rpc.call::<_, serde_json::Value>("Detach", api::DetachIn { kill }).await {
            Ok(_) | Err(crate::Error::ConnectionLost) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn disconnect(&self, cont: bool) -> gide_debug::Result<()> {
        let conn = self.take_connection()?;

        if cont {
            conn.rpc
                .notify("Command", DebuggerCommand::named("continue"))
                .await?;
        }

        // the server outlives the connection, for another client to pick up
        let server = conn
            .server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(server) = server {
            server.release();
        }

        Ok(())
    }

    async fn restart(&self) -> gide_debug::Result<()> {
        let conn = self.ready()?;

        let _: serde_json::Value = conn.rpc.call("Restart", api::RestartIn::default()).await?;
        Ok(())
    }

    async fn get_state(&self) -> gide_debug::Result<ExecState> {
        let conn = self.connection()?;

        let out: api::StateOut = conn
            .rpc
            .call("State", api::StateIn { non_blocking: true })
            .await?;
        Ok(self.record(&out.state)?)
    }

    async fn continue_exec(&self) -> gide_debug::Result<ExecState> {
        let conn = self.connection()?;
        let _running = self.begin_running()?;

        loop {
            let out: api::CommandOut = conn
                .rpc
                .call("Command", DebuggerCommand::named("continue"))
                .await?;

            let (traces, trace_only) = convert::tracepoint_hits(&out.state, &self.root);
            for line in &traces {
                conn.sink.append_line(line);
            }

            if out.state.exited || !trace_only {
                return Ok(self.record(&out.state)?);
            }

            tracing::trace!("tracepoint hit, resuming");
        }
    }

    async fn rewind(&self) -> gide_debug::Result<ExecState> {
        if !self.can_rewind() {
            return Err(gide_debug::Error::Unsupported("rewind"));
        }
        self.command(DebuggerCommand::named("rewind")).await
    }

    async fn step_over(&self) -> gide_debug::Result<ExecState> {
        self.command(DebuggerCommand::named("next")).await
    }

    async fn step_into(&self) -> gide_debug::Result<ExecState> {
        self.command(DebuggerCommand::named("step")).await
    }

    async fn step_out(&self) -> gide_debug::Result<ExecState> {
        self.command(DebuggerCommand::named("stepOut")).await
    }

    async fn step_single(&self) -> gide_debug::Result<ExecState> {
        self.command(DebuggerCommand::named("stepInstruction")).await
    }

    async fn switch_thread(&self, id: i64) -> gide_debug::Result<ExecState> {
        self.command(DebuggerCommand {
            thread_id: id,
            ..DebuggerCommand::named("switchThread")
        })
        .await
    }

    async fn switch_task(&self, id: i64) -> gide_debug::Result<ExecState> {
        self.command(DebuggerCommand {
            goroutine_id: id,
            ..DebuggerCommand::named("switchGoroutine")
        })
        .await
    }

    async fn stop(&self) -> gide_debug::Result<ExecState> {
        let conn = self.connection()?;

        let out: api::CommandOut = conn
            .rpc
            .call("Command", DebuggerCommand::named("halt"))
            .await?;
        Ok(self.record(&out.state)?)
    }

    async fn cancel_next(&self) -> gide_debug::Result<()> {
        let conn = self.ready()?;

        let _: serde_json::Value = conn.rpc.call("CancelNext", api::Empty {}).await?;
        Ok(())
    }

    async fn get_break(&self, id: i64) -> gide_debug::Result<Break> {
        let conn = self.ready()?;

        let out: api::BreakpointOut = conn
            .rpc
            .call("GetBreakpoint", api::BreakpointIdIn { id })
            .await?;
        Ok(convert::breakpoint(&out.breakpoint, &self.root))
    }

    async fn set_break(&self, fpath: &Path, line: u32) -> gide_debug::Result<Break> {
        let conn = self.ready()?;

        let breakpoint = api::Breakpoint {
            file: fpath.to_string_lossy().into_owned(),
            line,
            ..Default::default()
        };

        let out: api::BreakpointOut = conn
            .rpc
            .call("CreateBreakpoint", api::BreakpointIn { breakpoint })
            .await?;

        tracing::debug!(id = out.breakpoint.id, file = %out.breakpoint.file, line, "breakpoint set");

        Ok(convert::breakpoint(&out.breakpoint, &self.root))
    }

    async fn list_breaks(&self) -> gide_debug::Result<Vec<Break>> {
        let conn = self.ready()?;

        let out: api::ListBreakpointsOut = conn
            .rpc
            .call("ListBreakpoints", api::ListBreakpointsIn { all: false })
            .await?;

        // internal breakpoints (e.g., unrecovered panics) have negative IDs
        Ok(out
            .breakpoints
            .iter()
            .filter(|bp| bp.id > 0)
            .map(|bp| convert::breakpoint(bp, &self.root))
            .collect())
    }

    async fn clear_break(&self, id: i64) -> gide_debug::Result<()> {
        let conn = self.ready()?;

        let _: api::BreakpointOut = conn
            .rpc
            .call("ClearBreakpoint", api::BreakpointIdIn { id })
            .await?;
        Ok(())
    }

    async fn amend_break(&self, id: i64, cond: &str, trace: bool) -> gide_debug::Result<()> {
        let conn = self.ready()?;

        let out: api::BreakpointOut = conn
            .rpc
            .call("GetBreakpoint", api::BreakpointIdIn { id })
            .await?;

        let breakpoint = api::Breakpoint {
            cond: cond.to_owned(),
            tracepoint: trace,
            ..out.breakpoint
        };

        let _: serde_json::Value = conn
            .rpc
            .call("AmendBreakpoint", api::BreakpointIn { breakpoint })
            .await?;
        Ok(())
    }

    async fn list_threads(&self) -> gide_debug::Result<Vec<Thread>> {
        let conn = self.ready()?;

        let out: api::ListThreadsOut = conn.rpc.call("ListThreads", api::Empty {}).await?;
        Ok(out
            .threads
            .iter()
            .map(|th| convert::thread(th, &self.root))
            .collect())
    }

    async fn get_thread(&self, id: i64) -> gide_debug::Result<Thread> {
        let conn = self.ready()?;

        let out: api::GetThreadOut = conn.rpc.call("GetThread", api::GetThreadIn { id }).await?;
        let th = out
            .thread
            .ok_or_else(|| crate::Error::Rpc(format!("no thread {id}")))?;
        Ok(convert::thread(&th, &self.root))
    }

    async fn list_tasks(&self) -> gide_debug::Result<Vec<Task>> {
        let conn = self.ready()?;

        let out: api::ListGoroutinesOut = conn
            .rpc
            .call("ListGoroutines", api::ListGoroutinesIn { start: 0, count: 0 })
            .await?;
        Ok(out
            .goroutines
            .iter()
            .map(|g| convert::task(g, &self.root))
            .collect())
    }

    async fn stack(&self, id: i64, depth: usize) -> gide_debug::Result<Vec<Frame>> {
        let conn = self.ready()?;

        let out: api::StacktraceOut = conn
            .rpc
            .call(
                "Stacktrace",
                api::StacktraceIn {
                    id,
                    depth,
                    full: false,
                },
            )
            .await?;
        Ok(out
            .locations
            .iter()
            .enumerate()
            .map(|(depth, sf)| convert::frame(depth, sf, &self.root))
            .collect())
    }

    async fn list_all_vars(&self, filter: &str) -> gide_debug::Result<Vec<Variable>> {
        let conn = self.ready()?;

        let out: api::VariablesOut = conn
            .rpc
            .call(
                "ListPackageVars",
                api::ListPackageVarsIn {
                    filter,
                    cfg: self.load_config(),
                },
            )
            .await?;
        Ok(out.variables.iter().map(convert::variable).collect())
    }

    async fn list_vars(&self, id: i64, frame: usize) -> gide_debug::Result<Vec<Variable>> {
        let conn = self.ready()?;

        let input = api::ScopedVarsIn {
            scope: convert::scope(id, frame),
            cfg: self.load_config(),
        };

        let args: api::ArgsOut = conn.rpc.call("ListFunctionArgs", &input).await?;
        let locals: api::VariablesOut = conn.rpc.call("ListLocalVars", &input).await?;

        Ok(args
            .args
            .iter()
            .chain(&locals.variables)
            .map(convert::variable)
            .collect())
    }

    async fn get_var(&self, name: &str, id: i64, frame: usize) -> gide_debug::Result<Variable> {
        let conn = self.ready()?;

        let out: api::EvalOut = conn
            .rpc
            .call(
                "Eval",
                api::EvalIn {
                    scope: convert::scope(id, frame),
                    expr: name,
                    cfg: self.load_config(),
                },
            )
            .await?;

        let var = out
            .variable
            .ok_or_else(|| crate::Error::Rpc(format!("could not evaluate {name}")))?;
        Ok(convert::variable(&var))
    }

    async fn set_var(
        &self,
        name: &str,
        value: &str,
        id: i64,
        frame: usize,
    ) -> gide_debug::Result<()> {
        let conn = self.ready()?;

        let _: serde_json::Value = conn
            .rpc
            .call(
                "Set",
                api::SetIn {
                    scope: convert::scope(id, frame),
                    symbol: name,
                    value,
                },
            )
            .await?;
        Ok(())
    }

    async fn list_sources(&self, filter: &str) -> gide_debug::Result<Vec<String>> {
        let conn = self.ready()?;

        let out: api::ListSourcesOut = conn
            .rpc
            .call("ListSources", api::FilterIn { filter })
            .await?;
        Ok(out.sources)
    }

    async fn list_funcs(&self, filter: &str) -> gide_debug::Result<Vec<String>> {
        let conn = self.ready()?;

        let out: api::ListFunctionsOut = conn
            .rpc
            .call("ListFunctions", api::FilterIn { filter })
            .await?;
        Ok(out.funcs)
    }

    async fn list_types(&self, filter: &str) -> gide_debug::Result<Vec<String>> {
        let conn = self.ready()?;

        let out: api::ListTypesOut = conn.rpc.call("ListTypes", api::FilterIn { filter }).await?;
        Ok(out.types)
    }
}
