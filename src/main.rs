use std::path::Path;

use clap::Parser;
use comic_notifier::{init_logging, run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _handle = init_logging(cli.log_level.into(), Path::new(&cli.log_dir))?;
    run(cli)?;
    Ok(())
}
