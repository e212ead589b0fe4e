use std::process::ExitCode;

use clap::Parser;

use tunevault::cli::Args;
use tunevault::runtime;

fn main() -> ExitCode {
    let args = Args::parse();
    match runtime::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tunevault: {e}");
            ExitCode::FAILURE
        }
    }
}
