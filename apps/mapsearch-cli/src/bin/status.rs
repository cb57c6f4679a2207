use std::path::PathBuf;

use clap::Parser;
use mapsearch_cli::{build_manager, init_tracing, render_table};
use mapsearch_core::Config;

/// Print the search backend status as a table.
#[derive(Parser)]
#[command(name = "mapsearch-status", version)]
struct Args {
    #[arg(long, env = "MAPSEARCH_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let (config, base) = match args.config {
        Some(path) => {
            let base = path.parent().map(PathBuf::from).unwrap_or_default();
            (Config::from_file(&path)?, base)
        }
        None => (Config::load()?, std::env::current_dir()?),
    };
    let manager = build_manager(&config, &base)?;
    print!("{}", render_table(&manager.status()?));
    Ok(())
}
