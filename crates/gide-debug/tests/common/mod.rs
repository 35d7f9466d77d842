mod backend;
mod presenter;

use std::sync::Arc;

pub use self::backend::{FakeBackend, Script, frame, var};
pub use self::presenter::{RecordingPresenter, Shown};
use gide_debug::backend::Language;
use gide_debug::controller::Controller;

pub type TestController = Controller<FakeBackend, RecordingPresenter>;

/// Builds a controller over a scripted Go debuggee.
pub fn controller(has_tasks: bool) -> (TestController, Arc<Script>, RecordingPresenter) {
    let script = Script::new(has_tasks);
    let presenter = RecordingPresenter::default();

    let controller = Controller::builder()
        .with_registry(script.registry())
        .with_presenter(presenter.clone())
        .target(Language::Go, "/src/app/hello")
        .build();

    (controller, script, presenter)
}
