use std::path::PathBuf;

/// A system thread of the debugged process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
    /// System-level thread identifier.
    pub id: i64,

    /// Task currently running on this thread, if any.
    pub task_id: Option<i64>,

    /// Current program counter.
    pub pc: u64,

    /// Full path of the current source file.
    pub fpath: PathBuf,

    /// Source file, relative to the project root when possible.
    pub file: String,

    /// Current source line.
    pub line: u32,

    /// Name of the currently executing function.
    pub func: Option<String>,
}

/// A task (lightweight execution unit below the thread level, e.g., a
/// goroutine).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    /// Task identifier.
    pub id: i64,

    /// System thread the task is running on, if it is running.
    pub thread_id: Option<i64>,

    /// Current program counter.
    pub pc: u64,

    /// Full path of the current source file.
    pub fpath: PathBuf,

    /// Source file, relative to the project root when possible.
    pub file: String,

    /// Current source line.
    pub line: u32,

    /// Name of the currently executing function.
    pub func: Option<String>,

    /// Name of the function the task was started with.
    pub start_func: Option<String>,
}

/// One entry of a call stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Depth from the innermost call (0 is the innermost).
    pub depth: usize,

    /// Program counter of the frame.
    pub pc: u64,

    /// Full path of the source file.
    pub fpath: PathBuf,

    /// Source file, relative to the project root when possible.
    pub file: String,

    /// Source line.
    pub line: u32,

    /// Function name.
    pub func: String,
}

/// A variable of the debugged process.
///
/// Scalar values are fully described by [value](Self::value), structured
/// values (structs, slices, maps, pointers) carry their elements in
/// [children](Self::children).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variable {
    /// Variable name.
    pub name: String,

    /// Type descriptor.
    pub type_name: String,

    /// Value, formatted for display.
    pub value: String,

    /// Length of strings, slices, arrays, maps and channels.
    pub len: i64,

    /// Capacity of slices and channels.
    pub cap: i64,

    /// Address of the variable.
    pub addr: u64,

    /// Elements of structured values.
    pub children: Vec<Variable>,
}

impl Variable {
    /// Returns the direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Variable> {
        self.children.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::Variable;

    #[test]
    fn child_lookup() {
        let var = Variable {
            name: "p".to_owned(),
            type_name: "main.Point".to_owned(),
            children: vec![
                Variable {
                    name: "X".to_owned(),
                    value: "1".to_owned(),
                    ..Default::default()
                },
                Variable {
                    name: "Y".to_owned(),
                    value: "2".to_owned(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert_eq!(var.child("Y").map(|v| v.value.as_str()), Some("2"));
        assert!(var.child("Z").is_none());
    }
}
