use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use gide_debug::backend::{Language, Mode, Params, Registry};
use gide_debug::controller::Controller;
use gide_delve::Delve;
use miette::IntoDiagnostic;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::console::{self, Line, Query};
use crate::presenter::{TerminalPresenter, fmt_break, fmt_frame, fmt_task, fmt_thread, fmt_var};
use crate::{CliAction, DebugConfig};

type GideController = Controller<Delve, TerminalPresenter>;

/// Runs an interactive debugging session.
pub fn evaluate_run(config: Option<String>, action: CliAction) -> miette::Result<()> {
    let config = parse_debug_config(config)?;

    let (program, params) = session_params(action, &config);
    let program = std::path::absolute(program).into_diagnostic()?;

    let root = match &config.root {
        Some(root) => root.clone(),
        None if params.mode == Mode::Test => program.clone(),
        None => program.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    runtime.block_on(async move {
        let dlv = config.dlv.unwrap_or_else(|| PathBuf::from("dlv"));

        let registry = Registry::new().register(Language::Go, move |_exe, root, _sink| {
            Ok(Delve::with_dlv(dlv.clone(), root))
        });

        let mode = params.mode;

        let controller = Controller::builder()
            .with_registry(registry)
            .with_presenter(TerminalPresenter::new())
            .target(Language::Go, program)
            .root(root)
            .params(params)
            .build();

        let mut output = controller.output().subscribe();
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            loop {
                match output.recv().await {
                    Ok(chunk) => {
                        let _ = stdout.write_all(chunk.as_bytes()).await;
                        let _ = stdout.flush().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "debugger output dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        controller.start().await.into_diagnostic()?;

        tokio::spawn({
            let controller = controller.clone();
            async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if let Err(e) = controller.stop().await {
                        controller.presenter().message(format!("error: {e}"));
                    }
                }
            }
        });

        run_console(&controller).await?;

        if controller.is_active().await {
            let res = match mode {
                Mode::Connect => controller.disconnect(false).await,
                Mode::Attach => controller.detach(false).await,
                Mode::Exec | Mode::Test => controller.detach(true).await,
            };
            res.into_diagnostic()?;
        }

        Ok(())
    })
}

async fn run_console(controller: &GideController) -> miette::Result<()> {
    let presenter = controller.presenter();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.into_diagnostic()? {
        let res = match console::parse(&line) {
            Ok(Line::Empty) => Ok(()),
            Ok(Line::Help) => {
                presenter.message(console::HELP);
                Ok(())
            }
            Ok(Line::Quit) => break,
            Ok(Line::Intent(intent)) => controller.dispatch(intent).await,
            Ok(Line::Query(query)) => answer(controller, query).await,
            Err(e) => {
                presenter.message(e.to_string());
                Ok(())
            }
        };

        if let Err(e) = res {
            presenter.message(format!("error: {e}"));
        }
    }

    Ok(())
}

async fn answer(controller: &GideController, query: Query) -> gide_debug::Result<()> {
    let presenter = controller.presenter();
    let all = controller.state().await;

    // the selected goroutine and frame
    let id = all.state.cur_task.or(all.state.cur_thread).unwrap_or_default();
    let frame = all.cur_frame;

    match query {
        Query::Breaks => presenter.print(all.breaks.iter().map(fmt_break)),
        Query::Stack => presenter.print(
            all.stack
                .iter()
                .map(|f| fmt_frame(f, f.depth == all.cur_frame)),
        ),
        Query::Vars => presenter.print(all.vars.iter().flat_map(fmt_var)),
        Query::Threads => {
            let threads = controller.list_threads().await?;
            presenter.print(
                threads
                    .iter()
                    .map(|th| fmt_thread(th, Some(th.id) == all.state.cur_thread)),
            );
        }
        Query::Tasks => {
            let tasks = controller.list_tasks().await?;
            presenter.print(
                tasks
                    .iter()
                    .map(|task| fmt_task(task, Some(task.id) == all.state.cur_task)),
            );
        }
        Query::Pid => presenter.message(controller.process_pid().await?.to_string()),
        Query::Print(expr) => {
            let var = controller.get_var(&expr, id, frame).await?;
            presenter.print(fmt_var(&var));
        }
        Query::Set { name, value } => controller.set_var(&name, &value, id, frame).await?,
        Query::Globals(filter) => {
            let vars = controller.list_all_vars(&filter).await?;
            presenter.print(vars.iter().flat_map(fmt_var));
        }
        Query::Sources(filter) => presenter.print(controller.list_sources(&filter).await?),
        Query::Funcs(filter) => presenter.print(controller.list_funcs(&filter).await?),
        Query::Types(filter) => presenter.print(controller.list_types(&filter).await?),
    }

    Ok(())
}

fn session_params(action: CliAction, config: &DebugConfig) -> (PathBuf, Params) {
    let mut params = Params {
        stack_depth: config.stack_depth,
        vars: config.var_params(),
        ..Default::default()
    };

    let program = match action {
        CliAction::Exec { program, args } => {
            params.args = args;
            program
        }
        CliAction::Test { package, args } => {
            params.mode = Mode::Test;
            params.args = args;
            package
        }
        CliAction::Attach { pid, program } => {
            params.mode = Mode::Attach;
            params.pid = Some(pid);
            program
        }
        CliAction::Connect { addr, program } => {
            params.mode = Mode::Connect;
            params.addr = Some(addr);
            program
        }
    };

    (program, params)
}

fn parse_debug_config(config: Option<String>) -> miette::Result<DebugConfig> {
    let Some(config) = config else {
        return Ok(knus::parse("<default>", "")?);
    };

    let path = Path::new(&config);

    let config = if let Some((filename, "kdl")) = path
        .file_name()
        .and_then(OsStr::to_str)
        .zip(path.extension().and_then(OsStr::to_str))
    {
        let content = std::fs::read_to_string(path).into_diagnostic()?;
        knus::parse(filename, &content)?
    } else {
        knus::parse("<content>", &config)?
    };

    Ok(config)
}
