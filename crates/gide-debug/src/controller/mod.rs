mod builder;
mod cascade;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::Instrument;

pub use self::builder::Builder;
use self::builder::NeedsRegistry;
use crate::backend::{Backend, Language, Params, Registry};
use crate::presenter::{Intent, Presenter};
use crate::state::{AllState, Break, ExecState, Frame, Task, Thread, Variable};
use crate::{Error, OutputSink};

/// Phase of a debugging session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No backend session.
    #[default]
    Unattached,

    /// The process is suspended and can be inspected.
    Stopped,

    /// The process is executing.
    Running,

    /// The process has exited, the backend is still alive.
    Exited,
}

/// Debugging session controller.
///
/// This is a cheap handle: clones drive the same session, so that a
/// [stop](Self::stop) can be issued from anywhere while a
/// [continue_exec](Self::continue_exec) is in flight.
///
/// At most one execution command is in flight at a time. Commands issued
/// while another one is outstanding fail with
/// [IsRunning](crate::Error::IsRunning), except for [stop](Self::stop).
pub struct Controller<B, P> {
    shared: Arc<Shared<B, P>>,
}

impl<B, P> Clone for Controller<B, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<B, P> {
    registry: Registry<B>,
    presenter: P,
    target: Target,
    sink: OutputSink,
    session: Mutex<Session<B>>,
}

/// Program to debug.
pub(crate) struct Target {
    pub(crate) lang: Language,
    pub(crate) exe: PathBuf,
    pub(crate) root: PathBuf,
}

struct Session<B> {
    backend: Option<Arc<B>>,
    phase: Phase,
    params: Params,

    /// Bumped whenever the backend session is replaced or reset, so that
    /// late results of a previous one are discarded.
    epoch: u64,

    /// Execution command in flight.
    pending: Option<Command>,

    /// Whether a stop request is in flight.
    stopping: bool,

    /// Phase and execution state when the pending command was issued,
    /// restored if it fails.
    saved: (Phase, ExecState),

    all: AllState,
}

impl<B> Session<B> {
    /// Returns the backend, if the process is stopped and no command is in
    /// flight.
    fn available(&self) -> crate::Result<Arc<B>> {
        match self.phase {
            Phase::Unattached => return Err(Error::NotStarted),
            Phase::Running => return Err(Error::IsRunning),
            Phase::Exited => {
                return Err(Error::Exited {
                    status: self.all.state.exit_status,
                });
            }
            Phase::Stopped => (),
        }

        if self.pending.is_some() {
            return Err(Error::IsRunning);
        }

        self.backend.clone().ok_or(Error::NotStarted)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Restart,
    Continue,
    Rewind,
    Next,
    Step,
    StepOut,
    SingleStep,
    Switch,
    CancelNext,
    Stop,
}

impl Command {
    /// Returns whether the command resumes the process (and thus needs the
    /// breakpoints to be up to date).
    fn resumes(self) -> bool {
        matches!(
            self,
            Self::Continue | Self::Rewind | Self::Next | Self::Step | Self::StepOut | Self::SingleStep
        )
    }

    /// Returns whether the command lets the process run freely until the
    /// next stop.
    fn runs_freely(self) -> bool {
        matches!(self, Self::Continue | Self::Rewind)
    }
}

/// Exclusive right to drive the backend for one command.
struct Claim<B> {
    backend: Arc<B>,
    epoch: u64,
    command: Command,
}

impl Controller<(), ()> {
    /// Creates a controller builder.
    pub const fn builder() -> Builder<NeedsRegistry> {
        Builder::new()
    }
}

impl<B: Backend, P: Presenter> Controller<B, P> {
    fn new(
        registry: Registry<B>,
        presenter: P,
        target: Target,
        params: Params,
        sink: OutputSink,
    ) -> Self {
        let session = Session {
            backend: None,
            phase: Phase::Unattached,
            params,
            epoch: 0,
            pending: None,
            stopping: false,
            saved: (Phase::Unattached, ExecState::default()),
            all: AllState::default(),
        };

        Self {
            shared: Arc::new(Shared {
                registry,
                presenter,
                target,
                sink,
                session: Mutex::new(session),
            }),
        }
    }

    /// Returns the sink receiving the console output of the debugger.
    pub fn output(&self) -> &OutputSink {
        &self.shared.sink
    }

    /// Returns the presenter.
    pub fn presenter(&self) -> &P {
        &self.shared.presenter
    }

    /// Returns the current phase of the session.
    pub async fn phase(&self) -> Phase {
        self.lock().await.phase
    }

    /// Returns a snapshot of the debug state.
    pub async fn state(&self) -> AllState {
        self.lock().await.all.clone()
    }

    /// Returns whether a backend session is live (even if the process has
    /// exited).
    pub async fn is_active(&self) -> bool {
        let session = self.lock().await;
        session.backend.as_ref().is_some_and(|b| b.is_active())
    }

    /// Returns whether the process is stopped and ready for commands.
    pub async fn is_available(&self) -> bool {
        self.lock().await.available().is_ok()
    }

    /// Returns whether a step command would be accepted right now.
    pub async fn can_step(&self) -> bool {
        let session = self.lock().await;
        session.available().is_ok() && !session.all.state.next_up
    }

    /// Returns the parameters of the session.
    pub async fn params(&self) -> Params {
        self.lock().await.params.clone()
    }

    /// Changes the parameters of the session, forwarding them to the live
    /// backend if any.
    pub async fn set_params(&self, params: Params) {
        let mut session = self.lock().await;

        if let Some(backend) = &session.backend {
            backend.set_params(&params);
        }
        session.params = params;
    }

    async fn lock(&self) -> MutexGuard<'_, Session<B>> {
        self.shared.session.lock().await
    }

    /// Starts a backend session for the target program.
    ///
    /// On success, the process is stopped at its entry and the whole debug
    /// state is refreshed. If the process has exited, this restarts it.
    #[tracing::instrument(name = "Start", skip(self), fields(lang = %self.shared.target.lang))]
    pub async fn start(&self) -> crate::Result<()> {
        let phase = self.lock().await.phase;

        match phase {
            Phase::Unattached => self.launch().await,
            Phase::Exited => self.relaunch().await,
            Phase::Stopped | Phase::Running => Err(Error::AlreadyStarted),
        }
    }

    /// Restarts the process with the same parameters.
    ///
    /// Desired breakpoints are kept. Without a live backend session, this
    /// is equivalent to [start](Self::start).
    #[tracing::instrument(name = "Restart", skip(self))]
    pub async fn restart(&self) -> crate::Result<()> {
        let phase = self.lock().await.phase;

        match phase {
            Phase::Unattached => self.launch().await,
            Phase::Running => Err(Error::IsRunning),
            Phase::Stopped | Phase::Exited => self.relaunch().await,
        }
    }

    async fn launch(&self) -> crate::Result<()> {
        let (epoch, params) = {
            let mut session = self.lock().await;

            if session.phase != Phase::Unattached {
                return Err(Error::AlreadyStarted);
            }
            if session.pending.is_some() {
                return Err(Error::IsRunning);
            }

            session.epoch += 1;
            session.pending = Some(Command::Start);
            session.saved = (Phase::Unattached, ExecState::default());
            (session.epoch, session.params.clone())
        };

        let target = &self.shared.target;
        let started = async {
            let backend = self.shared.registry.create(
                target.lang,
                &target.exe,
                &target.root,
                self.shared.sink.clone(),
            )?;

            backend
                .start(&target.exe, &target.root, self.shared.sink.clone(), &params)
                .await?;

            let state = backend.get_state().await?;
            Ok((Arc::new(backend), state))
        }
        .await;

        let (backend, state) = match started {
            Ok(started) => started,
            Err(e) => {
                let mut session = self.lock().await;
                if session.is_current(epoch) {
                    session.pending = None;
                }
                return Err(e);
            }
        };

        tracing::info!(pid = state.pid, "debugger started");

        {
            let mut session = self.lock().await;
            if !session.is_current(epoch) {
                return Ok(());
            }

            session.backend = Some(Arc::clone(&backend));
            session.phase = Phase::Stopped;
            session.all.reset();
        }

        let claim = Claim {
            backend,
            epoch,
            command: Command::Start,
        };
        self.settle(claim, state).await
    }

    async fn relaunch(&self) -> crate::Result<()> {
        let claim = {
            let mut session = self.lock().await;

            match session.phase {
                Phase::Unattached => return Err(Error::NotStarted),
                Phase::Running => return Err(Error::IsRunning),
                Phase::Stopped | Phase::Exited => (),
            }

            if session.pending.is_some() {
                return Err(Error::IsRunning);
            }

            let backend = session.backend.clone().ok_or(Error::NotStarted)?;

            session.epoch += 1;
            session.pending = Some(Command::Restart);
            session.saved = (session.phase, session.all.state.clone());

            Claim {
                backend,
                epoch: session.epoch,
                command: Command::Restart,
            }
        };

        let res = async {
            claim.backend.restart().await?;
            claim.backend.get_state().await
        }
        .await;

        if res.is_ok() {
            let mut session = self.lock().await;
            if session.is_current(claim.epoch) {
                session.all.reset();
                session.phase = Phase::Stopped;
            }
        }

        self.finish(claim, res).await
    }

    /// Resumes execution until the next stop.
    ///
    /// The command is issued on a separate task, whose handle is returned
    /// once the process is running. The state is refreshed when it stops
    /// again. Failures of the background task are reported through
    /// [command_failed](Presenter::command_failed).
    pub async fn continue_exec(&self) -> crate::Result<JoinHandle<()>> {
        self.resume_in_background(Command::Continue).await
    }

    /// Resumes execution backwards until the previous stop.
    ///
    /// Only available when the backend can rewind (e.g., the process is
    /// being recorded).
    pub async fn rewind(&self) -> crate::Result<JoinHandle<()>> {
        {
            let session = self.lock().await;
            let backend = session.available()?;

            if !backend.can_rewind() {
                return Err(Error::Unsupported("rewind"));
            }
        }

        self.resume_in_background(Command::Rewind).await
    }

    async fn resume_in_background(&self, command: Command) -> crate::Result<JoinHandle<()>> {
        let claim = self.claim(command).await?;

        if let Err(e) = self.push_breaks(&claim).await {
            return Err(self.fail(claim, e).await);
        }

        let this = self.clone();
        let span = tracing::info_span!("Continue", ?command);

        let task = async move {
            let res = match claim.command {
                Command::Rewind => claim.backend.rewind().await,
                _ => claim.backend.continue_exec().await,
            };

            if let Err(e) = this.finish(claim, res).await {
                tracing::warn!(error = %e, "execution failed");
                this.shared.presenter.command_failed(&e);
            }
        };

        Ok(tokio::spawn(task.instrument(span)))
    }

    /// Steps to the next source line, not entering function calls.
    #[tracing::instrument(name = "Next", skip(self))]
    pub async fn next(&self) -> crate::Result<()> {
        self.step_with(Command::Next).await
    }

    /// Steps to the next source line, entering function calls.
    #[tracing::instrument(name = "Step", skip(self))]
    pub async fn step(&self) -> crate::Result<()> {
        self.step_with(Command::Step).await
    }

    /// Steps out of the current function.
    #[tracing::instrument(name = "StepOut", skip(self))]
    pub async fn step_out(&self) -> crate::Result<()> {
        self.step_with(Command::StepOut).await
    }

    /// Steps a single CPU instruction.
    #[tracing::instrument(name = "SingleStep", skip(self))]
    pub async fn single_step(&self) -> crate::Result<()> {
        self.step_with(Command::SingleStep).await
    }

    async fn step_with(&self, command: Command) -> crate::Result<()> {
        let claim = self.claim(command).await?;

        let res = match self.push_breaks(&claim).await {
            Ok(()) => match command {
                Command::Next => claim.backend.step_over().await,
                Command::Step => claim.backend.step_into().await,
                Command::StepOut => claim.backend.step_out().await,
                _ => claim.backend.step_single().await,
            },
            Err(e) => Err(e),
        };

        self.finish(claim, res).await
    }

    /// Suspends the running process.
    ///
    /// The state is refreshed by the command that resumed the process, once
    /// it observes the stop.
    #[tracing::instrument(name = "Stop", skip(self))]
    pub async fn stop(&self) -> crate::Result<()> {
        let (backend, epoch, orphan) = {
            let mut session = self.lock().await;

            match session.phase {
                Phase::Running => (),
                Phase::Stopped => return Err(Error::NotRunning),
                Phase::Unattached => return Err(Error::NotStarted),
                Phase::Exited => {
                    return Err(Error::Exited {
                        status: session.all.state.exit_status,
                    });
                }
            }

            if session.stopping {
                return Err(Error::IsRunning);
            }

            let backend = session.backend.clone().ok_or(Error::NotStarted)?;
            session.stopping = true;

            // running with no command in flight to observe the stop
            let orphan = session.pending.is_none();
            if orphan {
                session.pending = Some(Command::Stop);
                session.saved = (session.phase, session.all.state.clone());
            }

            (backend, session.epoch, orphan)
        };

        let res = backend.stop().await;

        if orphan {
            let claim = Claim {
                backend,
                epoch,
                command: Command::Stop,
            };
            return self.finish(claim, res).await;
        }

        let mut session = self.lock().await;
        if session.is_current(epoch) {
            session.stopping = false;
        }

        res.map(|_| ())
    }

    /// Cancels a step that was interrupted by another breakpoint or a
    /// manual stop.
    ///
    /// This does nothing when no step is outstanding.
    #[tracing::instrument(name = "CancelNext", skip(self))]
    pub async fn cancel_next(&self) -> crate::Result<()> {
        {
            let session = self.lock().await;
            session.available()?;

            if !session.all.state.next_up {
                return Ok(());
            }
        }

        let claim = self.claim(Command::CancelNext).await?;

        let res = async {
            claim.backend.cancel_next().await?;
            claim.backend.get_state().await
        }
        .await;

        self.finish(claim, res).await
    }

    /// Selects the current thread (or task, for backends supporting tasks),
    /// then refreshes the state.
    #[tracing::instrument(name = "SetThread", skip(self))]
    pub async fn set_thread(&self, id: i64) -> crate::Result<()> {
        let claim = self.claim(Command::Switch).await?;

        let res = if claim.backend.has_tasks() {
            claim.backend.switch_task(id).await
        } else {
            claim.backend.switch_thread(id).await
        };

        self.finish(claim, res).await
    }

    /// Selects the frame at the given depth of the current stack, and
    /// loads its variables.
    ///
    /// Selecting a frame beyond the stack fails with
    /// [FrameOutOfRange](crate::Error::FrameOutOfRange) and leaves the
    /// state untouched.
    #[tracing::instrument(name = "SetFrame", skip(self))]
    pub async fn set_frame(&self, depth: usize) -> crate::Result<()> {
        let (backend, epoch, id) = {
            let session = self.lock().await;
            let backend = session.available()?;

            let out_of_range = Error::FrameOutOfRange {
                depth,
                len: session.all.stack.len(),
            };

            if session.all.stack_frame(depth).is_none() {
                return Err(out_of_range);
            }

            let id = backend
                .cur_thread_id(&session.all.state)
                .ok_or(out_of_range)?;

            (backend, session.epoch, id)
        };

        let vars = self.checked(epoch, backend.list_vars(id, depth).await).await?;

        let mut session = self.lock().await;
        if !session.is_current(epoch) || session.pending.is_some() {
            return Err(Error::IsRunning);
        }

        session.all.cur_frame = depth;
        session.all.vars = vars;

        let presenter = &self.shared.presenter;
        if let Some(frame) = session.all.cur_stack_frame() {
            presenter.show_file(&frame.fpath, frame.line);
        }
        presenter.show_stack(&session.all.stack);
        presenter.show_vars(&session.all.vars);

        Ok(())
    }

    /// Adds a breakpoint to the desired set.
    ///
    /// The breakpoint is sent to the backend before the next command
    /// resuming the process.
    pub async fn add_break(&self, file: impl Into<PathBuf>, line: u32) -> crate::Result<()> {
        let mut bk = Break::new(file, line);
        bk.file = self.trim(&bk.fpath);
        let file = bk.file.clone();

        let mut session = self.lock().await;

        if session.all.add_break(bk) {
            tracing::debug!(%file, line, "breakpoint added");
        }
        self.shared.presenter.show_breaks(&session.all.breaks);

        Ok(())
    }

    /// Deletes a breakpoint from the desired set.
    ///
    /// If the process is stopped, the breakpoint is cleared from the backend
    /// right away, otherwise before the next command resuming the process.
    pub async fn delete_break(&self, file: &Path, line: u32) -> crate::Result<()> {
        let (live, epoch) = {
            let mut session = self.lock().await;

            let Some(bk) = session.all.delete_break_by_file(file, line) else {
                return Ok(());
            };
            self.shared.presenter.show_breaks(&session.all.breaks);

            let live = session.available().ok().zip(bk.id);
            (live, session.epoch)
        };

        if let Some((backend, id)) = live {
            if let Err(e) = self.checked(epoch, backend.clear_break(id).await).await {
                if e.is_transport() {
                    return Err(e);
                }
                tracing::warn!(id, error = %e, "breakpoint not cleared");
            }
        }

        Ok(())
    }

    /// Turns a breakpoint on or off.
    pub async fn enable_break(&self, file: &Path, line: u32, on: bool) -> crate::Result<()> {
        let mut session = self.lock().await;

        if let Some(bk) = session.all.break_by_file_mut(file, line) {
            bk.on = on;
            bk.submitted = false;
            session.all.merge_breaks();
        }
        self.shared.presenter.show_breaks(&session.all.breaks);

        Ok(())
    }

    /// Changes the condition and trace flag of a breakpoint.
    ///
    /// An installed breakpoint is amended right away if the process is
    /// stopped, otherwise before the next command resuming the process.
    pub async fn amend_break(
        &self,
        file: &Path,
        line: u32,
        cond: impl Into<String>,
        trace: bool,
    ) -> crate::Result<()> {
        let cond = cond.into();

        let (live, epoch) = {
            let mut session = self.lock().await;

            let Some(bk) = session.all.break_by_file_mut(file, line) else {
                return Ok(());
            };
            bk.cond.clone_from(&cond);
            bk.trace = trace;
            let id = bk.id.filter(|_| bk.on);

            self.shared.presenter.show_breaks(&session.all.breaks);
            (session.available().ok().zip(id), session.epoch)
        };

        if let Some((backend, id)) = live {
            self.checked(epoch, backend.amend_break(id, &cond, trace).await)
                .await?;
        }

        Ok(())
    }

    /// Detaches from the process, optionally killing it.
    ///
    /// The session ends even if the backend fails to detach.
    #[tracing::instrument(name = "Detach", skip(self))]
    pub async fn detach(&self, kill: bool) -> crate::Result<()> {
        let backend = self.end_session().await?;
        backend.detach(kill).await
    }

    /// Closes the connection to the debugger, optionally resuming the
    /// process first.
    #[tracing::instrument(name = "Disconnect", skip(self))]
    pub async fn disconnect(&self, cont: bool) -> crate::Result<()> {
        let backend = self.end_session().await?;
        backend.disconnect(cont).await
    }

    async fn end_session(&self) -> crate::Result<Arc<B>> {
        let mut session = self.lock().await;

        let backend = match (session.phase, &session.backend) {
            (Phase::Unattached, _) | (_, None) => return Err(Error::NotStarted),
            (_, Some(backend)) => Arc::clone(backend),
        };

        self.drop_session(&mut session);
        Ok(backend)
    }

    /// Returns the stack, up to the given depth, of the given thread or
    /// task.
    pub async fn stack(&self, id: i64, depth: usize) -> crate::Result<Vec<Frame>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.stack(id, depth).await).await
    }

    /// Lists all variables in scope whose name matches `filter`.
    pub async fn list_all_vars(&self, filter: &str) -> crate::Result<Vec<Variable>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.list_all_vars(filter).await).await
    }

    /// Lists the arguments and local variables of the given frame of the
    /// given thread or task.
    pub async fn list_vars(&self, id: i64, frame: usize) -> crate::Result<Vec<Variable>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.list_vars(id, frame).await).await
    }

    /// Returns a variable of the given frame of the given thread or task.
    pub async fn get_var(&self, name: &str, id: i64, frame: usize) -> crate::Result<Variable> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.get_var(name, id, frame).await)
            .await
    }

    /// Sets the value of a variable of the given frame of the given thread
    /// or task.
    ///
    /// The variables of the selected frame are reloaded afterwards.
    pub async fn set_var(&self, name: &str, value: &str, id: i64, frame: usize) -> crate::Result<()> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.set_var(name, value, id, frame).await)
            .await?;

        let selected = {
            let session = self.lock().await;
            let cur_id = backend.cur_thread_id(&session.all.state);
            (cur_id == Some(id) && session.all.cur_frame == frame).then_some(session.all.cur_frame)
        };

        if let Some(frame) = selected {
            let vars = self.checked(epoch, backend.list_vars(id, frame).await).await?;

            let mut session = self.lock().await;
            if session.is_current(epoch) && session.pending.is_none() {
                session.all.vars = vars;
                self.shared.presenter.show_vars(&session.all.vars);
            }
        }

        Ok(())
    }

    /// Lists all system threads.
    pub async fn list_threads(&self) -> crate::Result<Vec<Thread>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.list_threads().await).await
    }

    /// Lists all tasks.
    pub async fn list_tasks(&self) -> crate::Result<Vec<Task>> {
        let (backend, epoch) = self.introspect().await?;

        if !backend.has_tasks() {
            return Err(Error::Unsupported("tasks"));
        }
        self.checked(epoch, backend.list_tasks().await).await
    }

    /// Lists the source files of the process matching `filter`.
    pub async fn list_sources(&self, filter: &str) -> crate::Result<Vec<String>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.list_sources(filter).await).await
    }

    /// Lists the functions of the process matching `filter`.
    pub async fn list_funcs(&self, filter: &str) -> crate::Result<Vec<String>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.list_funcs(filter).await).await
    }

    /// Lists the types of the process matching `filter`.
    pub async fn list_types(&self, filter: &str) -> crate::Result<Vec<String>> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.list_types(filter).await).await
    }

    /// Returns the process ID of the debugged process.
    pub async fn process_pid(&self) -> crate::Result<u32> {
        let (backend, epoch) = self.introspect().await?;
        self.checked(epoch, backend.process_pid().await).await
    }

    async fn introspect(&self) -> crate::Result<(Arc<B>, u64)> {
        let session = self.lock().await;
        Ok((session.available()?, session.epoch))
    }

    /// Forwards an intent from the presentation side.
    ///
    /// Resuming intents run in the background: their failures are reported
    /// through [command_failed](Presenter::command_failed).
    pub async fn dispatch(&self, intent: Intent) -> crate::Result<()> {
        tracing::debug!(?intent, "dispatching");

        match intent {
            Intent::AddBreak { file, line } => self.add_break(file, line).await,
            Intent::DeleteBreak { file, line } => self.delete_break(&file, line).await,
            Intent::EnableBreak { file, line, on } => self.enable_break(&file, line, on).await,
            Intent::AmendBreak {
                file,
                line,
                cond,
                trace,
            } => self.amend_break(&file, line, cond, trace).await,
            Intent::SetFrame(depth) => self.set_frame(depth).await,
            Intent::SetThread(id) => self.set_thread(id).await,
            Intent::Continue => self.continue_exec().await.map(|_| ()),
            Intent::Rewind => self.rewind().await.map(|_| ()),
            Intent::Next => self.next().await,
            Intent::Step => self.step().await,
            Intent::StepOut => self.step_out().await,
            Intent::SingleStep => self.single_step().await,
            Intent::Stop => self.stop().await,
            Intent::CancelNext => self.cancel_next().await,
            Intent::Restart => self.restart().await,
            Intent::Detach { kill } => self.detach(kill).await,
            Intent::Disconnect { cont } => self.disconnect(cont).await,
        }
    }

    /// Claims the in-flight slot for an execution command.
    async fn claim(&self, command: Command) -> crate::Result<Claim<B>> {
        let mut session = self.lock().await;
        let backend = session.available()?;

        // an interrupted step must be cancelled (or completed) first
        if session.all.state.next_up && command != Command::CancelNext {
            return Err(Error::IsRunning);
        }

        session.pending = Some(command);
        session.saved = (session.phase, session.all.state.clone());

        if command.resumes() {
            session.all.state.next_up = true;
        }
        if command.runs_freely() {
            session.phase = Phase::Running;
            session.all.state.running = true;
        }

        self.shared.presenter.show_state(&session.all.state);

        Ok(Claim {
            backend,
            epoch: session.epoch,
            command,
        })
    }

    /// Sends the desired breakpoints to the backend.
    async fn push_breaks(&self, claim: &Claim<B>) -> crate::Result<()> {
        let desired = self.lock().await.all.breaks.clone();

        claim.backend.update_breaks(&desired).await?;

        let mut session = self.lock().await;
        if session.is_current(claim.epoch) {
            session.all.mark_breaks_submitted(&desired);
        }

        Ok(())
    }

    /// Checks the result of a call made outside of a claim, ending the
    /// session if the backend connection is gone.
    async fn checked<T>(&self, epoch: u64, res: crate::Result<T>) -> crate::Result<T> {
        if let Err(e) = &res {
            if e.is_transport() {
                let mut session = self.lock().await;
                if session.is_current(epoch) {
                    tracing::warn!(error = %e, "debugger connection lost");
                    self.drop_session(&mut session);
                }
            }
        }
        res
    }

    fn trim(&self, path: &Path) -> String {
        path.strip_prefix(&self.shared.target.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}
