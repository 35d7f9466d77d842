use std::path::{Path, PathBuf};

use gide_debug::backend::VarParams;
use gide_debug::state::{Break, BreakStatus, ExecState, Frame, Task, Thread, Variable};

use crate::api;

pub(crate) fn trim(root: &Path, file: &str) -> String {
    let path = Path::new(file);

    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn func_name(func: Option<&api::Function>) -> Option<String> {
    func.map(|f| f.name.clone()).filter(|name| !name.is_empty())
}

fn nonzero(id: i64) -> Option<i64> {
    (id != 0).then_some(id)
}

pub(crate) fn pid(pid: i64) -> crate::Result<u32> {
    u32::try_from(pid).map_err(|_| crate::Error::Rpc(format!("invalid process ID {pid}")))
}

pub(crate) fn exec_state(st: &api::DebuggerState) -> crate::Result<ExecState> {
    let cur_task = st
        .current_goroutine
        .as_ref()
        .map(|g| g.id)
        .or_else(|| st.current_thread.as_ref().map(|th| th.goroutine_id))
        .and_then(nonzero);

    Ok(ExecState {
        pid: pid(st.pid)?,
        running: st.running,
        next_up: st.next_in_progress,
        cur_thread: st.current_thread.as_ref().map(|th| th.id),
        cur_task,
        exited: st.exited,
        exit_status: st.exit_status,
        recording: st.recording,
    })
}

pub(crate) fn thread(th: &api::Thread, root: &Path) -> Thread {
    Thread {
        id: th.id,
        task_id: nonzero(th.goroutine_id),
        pc: th.pc,
        fpath: PathBuf::from(&th.file),
        file: trim(root, &th.file),
        line: th.line,
        func: func_name(th.function.as_ref()),
    }
}

pub(crate) fn task(g: &api::Goroutine, root: &Path) -> Task {
    // the user location skips runtime frames
    let loc = if g.user_current_loc.file.is_empty() {
        &g.current_loc
    } else {
        &g.user_current_loc
    };

    Task {
        id: g.id,
        thread_id: nonzero(g.thread_id),
        pc: loc.pc,
        fpath: PathBuf::from(&loc.file),
        file: trim(root, &loc.file),
        line: loc.line,
        func: func_name(loc.function.as_ref()),
        start_func: func_name(g.start_loc.function.as_ref()),
    }
}

pub(crate) fn frame(depth: usize, sf: &api::Stackframe, root: &Path) -> Frame {
    let loc = &sf.location;

    Frame {
        depth,
        pc: loc.pc,
        fpath: PathBuf::from(&loc.file),
        file: trim(root, &loc.file),
        line: loc.line,
        func: func_name(loc.function.as_ref()).unwrap_or_else(|| "?".to_owned()),
    }
}

pub(crate) fn variable(v: &api::Variable) -> Variable {
    let value = if v.unreadable.is_empty() {
        v.value.clone()
    } else {
        format!("(unreadable {})", v.unreadable)
    };

    Variable {
        name: v.name.clone(),
        type_name: v.type_name.clone(),
        value,
        len: v.len,
        cap: v.cap,
        addr: v.addr,
        children: v.children.iter().map(variable).collect(),
    }
}

pub(crate) fn breakpoint(bp: &api::Breakpoint, root: &Path) -> Break {
    Break {
        id: Some(bp.id),
        fpath: PathBuf::from(&bp.file),
        file: trim(root, &bp.file),
        line: bp.line,
        func: Some(bp.function_name.clone()).filter(|name| !name.is_empty()),
        on: !bp.disabled,
        cond: bp.cond.clone(),
        trace: bp.tracepoint,
        hits: bp.total_hit_count,
        status: BreakStatus::Installed,
        submitted: true,
    }
}

pub(crate) fn load_config(params: &VarParams) -> api::LoadConfig {
    api::LoadConfig {
        follow_pointers: params.follow_pointers,
        max_variable_recurse: params.max_recurse,
        max_string_len: params.max_string_len,
        max_array_values: params.max_array_values,
        max_struct_fields: params.max_struct_fields,
    }
}

pub(crate) fn scope(id: i64, frame: usize) -> api::EvalScope {
    api::EvalScope {
        goroutine_id: id,
        frame: i32::try_from(frame).unwrap_or(i32::MAX),
        deferred_call: 0,
    }
}

/// Returns the trace lines of the threads stopped at tracepoints, and
/// whether *every* stopped thread is at one (so that execution can be
/// resumed right away).
pub(crate) fn tracepoint_hits(st: &api::DebuggerState, root: &Path) -> (Vec<String>, bool) {
    let stopped: Vec<_> = st
        .threads
        .iter()
        .filter_map(|th| th.breakpoint.as_ref().map(|bp| (th, bp)))
        .collect();

    let lines = stopped
        .iter()
        .filter(|(_, bp)| bp.tracepoint)
        .map(|(th, bp)| {
            let func = func_name(th.function.as_ref()).unwrap_or_else(|| "?".to_owned());
            format!(
                "> goroutine({}): {func}() {}:{} (hits: {})",
                th.goroutine_id,
                trim(root, &th.file),
                th.line,
                bp.total_hit_count
            )
        })
        .collect();

    let trace_only = !stopped.is_empty() && stopped.iter().all(|(_, bp)| bp.tracepoint);

    (lines, trace_only)
}
