use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = tools::Cli::parse();
    let env = tools::ToolEnv::from_process_env();
    let stdout = io::stdout();
    if let Err(e) = tools::run(cli, &env, &mut stdout.lock()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
