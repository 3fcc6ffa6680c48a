//! luxe-assist command-line entry point.

use std::io::{self, Write};

use clap::Parser;
use luxe_assist::cli::{Cli, execute};
use luxe_assist::logging::{self, LogFormat};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose, LogFormat::from_env());

    let output = execute(&cli)?;
    if !output.is_empty() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}
