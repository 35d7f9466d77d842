#![allow(missing_docs)]
#![allow(clippy::print_stderr)]

use gide_cli::CliOpts;

use tracing_subscriber::EnvFilter;

fn main() {
    let cli = CliOpts::parse_from_cmdline();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("GIDE_LOG")
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = gide_cli::evaluate_run(cli.config, cli.action) {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
