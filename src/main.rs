use std::io;

use clap::Parser;

mod accounting;
mod app;
mod cli;
mod constants;
mod domain;
mod error;
mod logging;
mod normalize;
mod storage;

use cli::{Cli, Command};

fn main() -> Result<(), io::Error> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Ui) => {
            if let Err(e) = logging::init_file(&storage::get_log_path()) {
                eprintln!("Warning: could not open log file: {}", e);
            }
            app::run_ui()
        }
        Some(command) => {
            logging::init_stderr();
            cli::run_command(command);
            Ok(())
        }
    }
}
