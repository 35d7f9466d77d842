use super::{Claim, Controller, Phase, Session};
use crate::backend::Backend;
use crate::presenter::Presenter;
use crate::state::{Break, ExecState, Frame, Task, Thread, Variable};
use crate::Error;

/// Sections of the debug state reloaded after each stop.
struct Refresh {
    breaks: Vec<Break>,
    stack: Vec<Frame>,
    vars: Vec<Variable>,
    threads: Vec<Thread>,
    tasks: Vec<Task>,
}

impl<B: Backend, P: Presenter> Controller<B, P> {
    /// Releases a claim with the outcome of its command.
    pub(super) async fn finish(
        &self,
        claim: Claim<B>,
        res: crate::Result<ExecState>,
    ) -> crate::Result<()> {
        match res {
            Ok(state) => self.settle(claim, state).await,
            Err(e) => Err(self.fail(claim, e).await),
        }
    }

    /// Records the state reached by a command, and if the process is
    /// stopped, reloads every section of the debug state.
    ///
    /// The reloaded sections are committed all at once: if one of them
    /// fails to load, only the execution state is recorded.
    #[tracing::instrument(name = "Settle", skip_all, fields(command = ?claim.command))]
    pub(super) async fn settle(&self, claim: Claim<B>, state: ExecState) -> crate::Result<()> {
        if state.exited || state.running {
            let mut session = self.lock().await;
            if !session.is_current(claim.epoch) {
                tracing::debug!("discarding stale state");
                return Ok(());
            }

            if state.exited {
                tracing::info!(status = state.exit_status, "process exited");
                session.phase = Phase::Exited;
            } else {
                session.phase = Phase::Running;
            }

            session.pending = None;
            session.stopping = false;
            session.all.state = state;
            self.shared.presenter.show_state(&session.all.state);

            return Ok(());
        }

        let fetched = self.fetch(&claim.backend, &state).await;

        let mut session = self.lock().await;
        if !session.is_current(claim.epoch) {
            tracing::debug!("discarding stale state");
            return Ok(());
        }

        session.pending = None;
        session.stopping = false;
        session.phase = Phase::Stopped;
        session.all.state = state;

        let refresh = match fetched {
            Ok(refresh) => refresh,
            Err(e) => {
                tracing::warn!(error = %e, "state refresh failed");

                if e.is_transport() {
                    self.drop_session(&mut session);
                } else {
                    self.shared.presenter.show_state(&session.all.state);
                }
                return Err(e);
            }
        };

        let all = &mut session.all;
        all.cur_breaks = refresh.breaks;
        all.merge_breaks();
        all.stack = refresh.stack;
        all.vars = refresh.vars;
        all.threads = refresh.threads;
        all.tasks = refresh.tasks;
        all.cur_frame = 0;

        tracing::debug!(
            thread = ?all.state.cur_thread,
            task = ?all.state.cur_task,
            frames = all.stack.len(),
            "stopped"
        );

        self.notify(&session, claim.backend.has_tasks());

        Ok(())
    }

    async fn fetch(&self, backend: &B, state: &ExecState) -> crate::Result<Refresh> {
        let depth = self.lock().await.params.stack_depth;

        let breaks = backend.list_breaks().await?;

        let (stack, vars) = match backend.cur_thread_id(state) {
            Some(id) => {
                let stack = backend.stack(id, depth).await?;
                let vars = if stack.is_empty() {
                    Vec::new()
                } else {
                    backend.list_vars(id, 0).await?
                };
                (stack, vars)
            }
            None => (Vec::new(), Vec::new()),
        };

        let threads = backend.list_threads().await?;

        let tasks = if backend.has_tasks() {
            backend.list_tasks().await?
        } else {
            Vec::new()
        };

        Ok(Refresh {
            breaks,
            stack,
            vars,
            threads,
            tasks,
        })
    }

    fn notify(&self, session: &Session<B>, has_tasks: bool) {
        let presenter = &self.shared.presenter;
        let all = &session.all;

        presenter.show_state(&all.state);
        if let Some(frame) = all.cur_stack_frame() {
            presenter.show_file(&frame.fpath, frame.line);
        }
        presenter.show_breaks(&all.breaks);
        presenter.show_stack(&all.stack);
        presenter.show_vars(&all.vars);
        presenter.show_threads(&all.threads);
        if has_tasks {
            presenter.show_tasks(&all.tasks);
        }
    }

    /// Releases a claim whose command failed.
    ///
    /// The state the command started from is restored, unless the backend
    /// connection is gone, in which case the session ends.
    pub(super) async fn fail(&self, claim: Claim<B>, err: Error) -> Error {
        let mut session = self.lock().await;
        if !session.is_current(claim.epoch) {
            return err;
        }

        session.pending = None;
        session.stopping = false;

        if err.is_transport() {
            tracing::warn!(error = %err, command = ?claim.command, "debugger connection lost");
            self.drop_session(&mut session);
        } else {
            tracing::debug!(error = %err, command = ?claim.command, "command failed");

            let (phase, state) = session.saved.clone();
            session.phase = phase;
            session.all.state = state;
            self.shared.presenter.show_state(&session.all.state);
        }

        err
    }

    /// Ends the backend session, keeping the desired breakpoints.
    pub(super) fn drop_session(&self, session: &mut Session<B>) {
        session.backend = None;
        session.phase = Phase::Unattached;
        session.epoch += 1;
        session.pending = None;
        session.stopping = false;

        let presenter = &self.shared.presenter;
        presenter.clear_break_markers(&session.all.breaks);

        session.all.reset();
        presenter.show_state(&session.all.state);
        presenter.show_breaks(&session.all.breaks);
    }
}
