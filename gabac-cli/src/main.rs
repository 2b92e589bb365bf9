use clap::Parser;
use cli::{Cli, Commands};
use human_panic::setup_panic;

use crate::logging::init_logging;

mod cli;
mod cmd;
mod logging;

fn main() -> anyhow::Result<()> {
    setup_panic!();

    let cli: Cli = Cli::parse();

    init_logging(cli.verbose.log_level_filter()).expect("Could not initialize logging");

    match &cli.command {
        Commands::Compress {
            config,
            input,
            output,
        } => cmd::compress::compress(config, input, output)?,
        Commands::Decompress {
            config,
            input,
            output,
        } => cmd::decompress::decompress(config, input, output)?,
        Commands::ShowConfig { word_size } => cmd::show_config::show_config(*word_size)?,
    }

    Ok(())
}
