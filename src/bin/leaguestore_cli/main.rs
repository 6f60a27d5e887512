mod app;
mod commands;
mod context;
mod formatters;
mod repl;
mod utils;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let cli = app::Cli::parse();

    // RUST_LOG a priorité sur -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    info!("Démarrage de leaguestore");

    let result = app::run(cli);

    info!("Fin de leaguestore");

    result
}
