//! html2fortitude - convert HTML/ERB templates into Fortitude widget classes.
//!
//! Each input file becomes a Ruby class; directories are converted
//! recursively and `-` reads standard input.

mod convert;
mod error;
mod naming;
mod output;
mod scanner;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use convert::ConvertArgs;
use output::Output;

/// Converts HTML/ERB templates into Fortitude widget classes.
#[derive(Parser)]
#[command(name = "html2fortitude", version, about, arg_required_else_help = true)]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if cli.args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.args.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
