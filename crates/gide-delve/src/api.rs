//! Wire types of the Delve JSON-RPC API (version 2).
//!
//! Only the fields used by this crate are declared; unknown fields are
//! ignored and missing ones take their default value.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a Go slice, which is `null` when empty.
fn nullable<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DebuggerState {
    #[serde(rename = "Pid")]
    pub pid: i64,

    #[serde(rename = "Running")]
    pub running: bool,

    #[serde(rename = "Recording")]
    pub recording: bool,

    #[serde(rename = "currentThread")]
    pub current_thread: Option<Thread>,

    #[serde(rename = "currentGoroutine")]
    pub current_goroutine: Option<Goroutine>,

    #[serde(rename = "Threads", deserialize_with = "nullable")]
    pub threads: Vec<Thread>,

    #[serde(rename = "NextInProgress")]
    pub next_in_progress: bool,

    pub exited: bool,

    #[serde(rename = "exitStatus")]
    pub exit_status: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Function {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thread {
    pub id: i64,
    pub pc: u64,
    pub file: String,
    pub line: u32,
    pub function: Option<Function>,

    #[serde(rename = "goroutineID")]
    pub goroutine_id: i64,

    #[serde(rename = "breakPoint")]
    pub breakpoint: Option<Breakpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub pc: u64,
    pub file: String,
    pub line: u32,
    pub function: Option<Function>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Goroutine {
    pub id: i64,
    pub current_loc: Location,
    pub user_current_loc: Location,
    pub start_loc: Location,

    #[serde(rename = "threadID")]
    pub thread_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Stackframe {
    #[serde(flatten)]
    pub location: Location,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Breakpoint {
    pub id: i64,
    pub name: String,
    pub addr: u64,
    pub file: String,
    pub line: u32,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub function_name: String,

    #[serde(rename = "Cond")]
    pub cond: String,

    #[serde(rename = "continue")]
    pub tracepoint: bool,

    pub total_hit_count: u64,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Variable {
    pub name: String,
    pub addr: u64,

    #[serde(rename = "type")]
    pub type_name: String,

    pub value: String,
    pub len: i64,
    pub cap: i64,
    #[serde(deserialize_with = "nullable")]
    pub children: Vec<Variable>,
    pub unreadable: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadConfig {
    pub follow_pointers: bool,
    pub max_variable_recurse: i32,
    pub max_string_len: i32,
    pub max_array_values: i32,
    pub max_struct_fields: i32,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalScope {
    #[serde(rename = "GoroutineID")]
    pub goroutine_id: i64,
    pub frame: i32,
    pub deferred_call: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerCommand {
    pub name: &'static str,

    #[serde(rename = "threadID", skip_serializing_if = "is_zero")]
    pub thread_id: i64,

    #[serde(rename = "goroutineID", skip_serializing_if = "is_zero")]
    pub goroutine_id: i64,
}

impl DebuggerCommand {
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

// Method parameters and results, named after the RPCServer methods.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CommandOut {
    pub state: DebuggerState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateIn {
    pub non_blocking: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StateOut {
    pub state: DebuggerState,
}

#[derive(Debug, Default, Serialize)]
pub struct Empty {}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProcessPidOut {
    pub pid: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachIn {
    pub kill: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartIn {
    pub position: String,
    pub reset_args: bool,
    pub rerecord: bool,
    pub rebuild: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointIn {
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BreakpointOut {
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointIdIn {
    pub id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBreakpointsIn {
    pub all: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListBreakpointsOut {
    #[serde(deserialize_with = "nullable")]
    pub breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListThreadsOut {
    #[serde(deserialize_with = "nullable")]
    pub threads: Vec<Thread>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetThreadIn {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GetThreadOut {
    pub thread: Option<Thread>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListGoroutinesIn {
    pub start: i64,
    pub count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListGoroutinesOut {
    #[serde(deserialize_with = "nullable")]
    pub goroutines: Vec<Goroutine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StacktraceIn {
    pub id: i64,
    pub depth: usize,
    pub full: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StacktraceOut {
    #[serde(deserialize_with = "nullable")]
    pub locations: Vec<Stackframe>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScopedVarsIn {
    pub scope: EvalScope,
    pub cfg: LoadConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListPackageVarsIn<'a> {
    pub filter: &'a str,
    pub cfg: LoadConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VariablesOut {
    #[serde(deserialize_with = "nullable")]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ArgsOut {
    #[serde(deserialize_with = "nullable")]
    pub args: Vec<Variable>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalIn<'a> {
    pub scope: EvalScope,
    pub expr: &'a str,
    pub cfg: LoadConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EvalOut {
    pub variable: Option<Variable>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetIn<'a> {
    pub scope: EvalScope,
    pub symbol: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterIn<'a> {
    pub filter: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListSourcesOut {
    #[serde(deserialize_with = "nullable")]
    pub sources: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListFunctionsOut {
    #[serde(deserialize_with = "nullable")]
    pub funcs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListTypesOut {
    #[serde(deserialize_with = "nullable")]
    pub types: Vec<String>,
}
