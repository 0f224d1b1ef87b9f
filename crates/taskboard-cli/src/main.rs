use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging();

    let output = cli::run(&args)?;
    print!("{output}");
    Ok(())
}

/// Logs go to stderr so stdout stays machine readable. `TASKBOARD_LOG`
/// takes an `EnvFilter` directive and defaults to `warn`.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("TASKBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
