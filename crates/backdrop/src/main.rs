mod animate;
mod check;
mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;
use paths::ConfigLocation;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let location = ConfigLocation::resolve(cli.config.as_deref());
    match cli.command {
        Some(Command::Check(args)) => check::run(args),
        Some(Command::Animate(args)) => animate::run(args, location.load()?),
        Some(Command::Run) | None => run::run(cli.run, location.load()?),
    }
}
