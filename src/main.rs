use std::process::ExitCode;

use clap::Parser;

use patlak::cli::Args;

fn main() -> ExitCode {
    match patlak::run(Args::parse()) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(3)),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(3)
        }
    }
}
