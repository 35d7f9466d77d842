use std::str::FromStr;

/// How the debugger gets hold of the process to debug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Debug a standard executable program.
    #[default]
    Exec,

    /// Debug a testing program.
    Test,

    /// Attach to an already-running process.
    Attach,

    /// Connect to an already-running debugger server.
    Connect,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exec" => Ok(Self::Exec),
            "test" => Ok(Self::Test),
            "attach" => Ok(Self::Attach),
            "connect" => Ok(Self::Connect),
            other => Err(format!("unknown debug mode: {other}")),
        }
    }
}

/// Limits applied when loading variables from the debugged process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarParams {
    /// Whether pointers are automatically dereferenced.
    pub follow_pointers: bool,

    /// How far to recurse into nested types.
    pub max_recurse: i32,

    /// Maximum number of bytes read from a string.
    pub max_string_len: i32,

    /// Maximum number of elements read from arrays, slices and maps.
    pub max_array_values: i32,

    /// Maximum number of fields read from a struct (-1 reads all).
    pub max_struct_fields: i32,
}

impl Default for VarParams {
    fn default() -> Self {
        Self {
            follow_pointers: true,
            max_recurse: 1,
            max_string_len: 64,
            max_array_values: 64,
            max_struct_fields: -1,
        }
    }
}

/// Parameters of a debugging session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// How the process to debug is obtained.
    pub mode: Mode,

    /// Arguments passed to the debugged program.
    pub args: Vec<String>,

    /// Process to attach to, in [Attach](Mode::Attach) mode.
    pub pid: Option<u32>,

    /// Address of the debugger server, in [Connect](Mode::Connect) mode.
    pub addr: Option<String>,

    /// Maximum depth of fetched stacks.
    pub stack_depth: usize,

    /// Limits applied when loading variables.
    pub vars: VarParams,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            mode: Mode::Exec,
            args: Vec::new(),
            pid: None,
            addr: None,
            stack_depth: 50,
            vars: VarParams::default(),
        }
    }
}
