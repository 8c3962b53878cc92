use clap::Parser;
use meshshot::{run, Cli, Outcome};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(Outcome::Saved(path)) => {
            println!("Saved mesh screenshot to: {}", path.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::ViewerClosed) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
