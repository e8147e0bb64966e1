//! vidcut command-line entry point
//!
//! ```bash
//! vidcut cut demo.mp4 00:00:05 00:00:12
//! vidcut cut demo.mp4 5 12.5 -o intro.mp4 --mode reencode
//! vidcut probe demo.mp4 --json
//! vidcut thumbnail demo.mp4 00:01:00 -o frame.jpg
//! ```

use std::process::ExitCode;

use clap::Parser;

use vidcut::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
