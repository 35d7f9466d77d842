use std::path::PathBuf;

/// The Gide debugger.
#[derive(clap::Parser)]
pub struct CliOpts {
    /// Debugger configuration (KDL format).
    ///
    /// If it ends with `.kdl`, it is treated as a path to a configuration
    /// file. Otherwise it is directly parsed as inline KDL-formatted
    /// configuration.
    #[clap(short, long, global = true, value_name = "CONTENT/PATH")]
    pub config: Option<String>,

    /// How the program to debug is obtained.
    #[clap(subcommand)]
    pub action: CliAction,
}

/// How the program to debug is obtained.
#[derive(clap::Subcommand)]
pub enum CliAction {
    /// Command to debug an executable program.
    Exec {
        /// Path of the program to run.
        program: PathBuf,

        /// Program's arguments.
        args: Vec<String>,
    },

    /// Command to debug the tests of a package.
    Test {
        /// Path of the package to test.
        package: PathBuf,

        /// Arguments of the test binary.
        args: Vec<String>,
    },

    /// Command to attach to a running process.
    Attach {
        /// ID of the process.
        pid: u32,

        /// Path of the program run by the process, used to select the
        /// debugger and the project root.
        program: PathBuf,
    },

    /// Command to connect to a debugger server already listening.
    Connect {
        /// Address of the debugger server (e.g., `127.0.0.1:2345`).
        addr: String,

        /// Path of the program debugged by the server, used to select the
        /// debugger and the project root.
        program: PathBuf,
    },
}

impl CliOpts {
    /// Parses the CLI from the command-line.
    ///
    /// # Warning
    ///
    /// Exits on error.
    pub fn parse_from_cmdline() -> Self {
        <Self as clap::Parser>::parse()
    }
}
