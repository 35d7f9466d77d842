use std::path::PathBuf;

use gide_debug::backend::VarParams;

/// Configuration of the debugger.
#[derive(Debug, PartialEq, knus::Decode)]
pub struct DebugConfig {
    /// Maximum depth of fetched stacks.
    #[knus(child, default = 50, unwrap(argument))]
    pub stack_depth: usize,

    /// Whether pointers are automatically dereferenced.
    #[knus(child, default = true, unwrap(argument))]
    pub follow_pointers: bool,

    /// How far to recurse into nested types.
    #[knus(child, default = 1, unwrap(argument))]
    pub max_recurse: i32,

    /// Maximum number of bytes read from a string.
    #[knus(child, default = 64, unwrap(argument))]
    pub max_string_len: i32,

    /// Maximum number of elements read from arrays, slices and maps.
    #[knus(child, default = 64, unwrap(argument))]
    pub max_array_values: i32,

    /// Maximum number of fields read from a struct (-1 reads all).
    #[knus(child, default = -1, unwrap(argument))]
    pub max_struct_fields: i32,

    /// Path of the `dlv` executable (looked up in `PATH` by default).
    #[knus(child, unwrap(argument))]
    pub dlv: Option<PathBuf>,

    /// Project root (the directory of the program by default).
    #[knus(child, unwrap(argument))]
    pub root: Option<PathBuf>,
}

impl DebugConfig {
    /// Returns the limits applied when loading variables.
    pub fn var_params(&self) -> VarParams {
        VarParams {
            follow_pointers: self.follow_pointers,
            max_recurse: self.max_recurse,
            max_string_len: self.max_string_len,
            max_array_values: self.max_array_values,
            max_struct_fields: self.max_struct_fields,
        }
    }
}
