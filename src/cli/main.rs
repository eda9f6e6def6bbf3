use clap::Parser;
use remotefs::core::config::{Cli, ExplorerConfig};
use remotefs::core::telemetry::init_logging;

fn main() -> anyhow::Result<()> {
    let config = ExplorerConfig::from(Cli::parse());
    init_logging(config.log_directive());

    let text = config.read_input()?;
    let tree = config.build_tree(&text)?;
    let output = config.render(&tree)?;
    println!("{output}");
    Ok(())
}
