use std::path::PathBuf;

use super::{Controller, Target};
use crate::OutputSink;
use crate::backend::{Backend, Language, Params, Registry};
use crate::presenter::Presenter;

/// Builder for [Controller].
///
/// It is usually created by calling [Controller::builder], and allows to
/// specify the available backends, the presenter and the program to debug.
pub struct Builder<S> {
    state: S,
}

impl Builder<NeedsRegistry> {
    pub(super) const fn new() -> Self {
        Self {
            state: NeedsRegistry,
        }
    }
}

impl Builder<NeedsRegistry> {
    /// Specifies the available backends.
    pub fn with_registry<B: Backend>(self, registry: Registry<B>) -> Builder<NeedsPresenter<B>> {
        Builder {
            state: NeedsPresenter { registry },
        }
    }
}

impl<B: Backend> Builder<NeedsPresenter<B>> {
    /// Specifies the presentation side of the session.
    pub fn with_presenter<P: Presenter>(self, presenter: P) -> Builder<NeedsTarget<B, P>> {
        Builder {
            state: NeedsTarget {
                registry: self.state.registry,
                presenter,
            },
        }
    }
}

impl<B, P> Builder<NeedsTarget<B, P>> {
    /// Specifies the program to debug, and its source language (which
    /// selects the backend).
    ///
    /// The project root defaults to the directory of `exe`.
    pub fn target(self, lang: Language, exe: impl Into<PathBuf>) -> Builder<Ready<B, P>> {
        let exe = exe.into();
        let root = exe.parent().map(PathBuf::from).unwrap_or_default();

        Builder {
            state: Ready {
                registry: self.state.registry,
                presenter: self.state.presenter,
                target: Target {
                    lang,
                    exe,
                    root,
                },
                params: Params::default(),
                sink: OutputSink::new(),
            },
        }
    }
}

impl<B, P> Builder<Ready<B, P>> {
    /// Specifies the project root, used for trimming file names.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.state.target.root = root.into();
        self
    }

    /// Specifies the session parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.state.params = params;
        self
    }

    /// Specifies the sink receiving the console output of the debugger
    /// (a fresh one is used otherwise).
    pub fn output(mut self, sink: OutputSink) -> Self {
        self.state.sink = sink;
        self
    }
}

impl<B: Backend, P: Presenter> Builder<Ready<B, P>> {
    /// Builds the controller.
    ///
    /// No backend is constructed until [start](Controller::start) is called.
    pub fn build(self) -> Controller<B, P> {
        let Ready {
            registry,
            presenter,
            target,
            params,
            sink,
        } = self.state;

        Controller::new(registry, presenter, target, params, sink)
    }
}

pub struct NeedsRegistry;

pub struct NeedsPresenter<B> {
    registry: Registry<B>,
}

pub struct NeedsTarget<B, P> {
    registry: Registry<B>,
    presenter: P,
}

pub struct Ready<B, P> {
    registry: Registry<B>,
    presenter: P,
    target: Target,
    params: Params,
    sink: OutputSink,
}
