//! Главный исполняемый файл rustdb-query

use anyhow::Context;
use clap::Parser;
use rustdb_query::cli::Cli;
use rustdb_query::common::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("failed to load configuration")?;
    init_logging(&config.logging.level).context("failed to initialize logging")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli.execute(&config, &mut out)?;
    Ok(())
}
