use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mapsearch_cli::{build_manager, init_tracing, read_records};
use mapsearch_core::{Config, Record, SearchManager};

#[derive(Parser)]
#[command(name = "mapsearch", version, about = "Index and search mapped objects")]
struct Cli {
    /// Configuration file; defaults to config.toml + config.<RUST_ENV>.toml
    #[arg(long, env = "MAPSEARCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every object in a JSON, JSON array or JSON Lines file
    Index {
        #[arg(long)]
        class: String,
        file: PathBuf,
    },
    /// Remove every object in the file from its index
    Deindex {
        #[arg(long)]
        class: String,
        file: PathBuf,
    },
    Search {
        query: String,
        /// Logical index name, repeatable
        #[arg(long = "index", required = true)]
        indexes: Vec<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Destroy and recreate every locale variant of an index
    Purge { index: String },
    /// List physical indexes
    Indexes,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    match path {
        Some(path) => {
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            Ok((Config::from_file(path)?, base))
        }
        None => Ok((Config::load()?, std::env::current_dir()?)),
    }
}

fn apply_file(
    manager: &SearchManager,
    class: &str,
    file: &Path,
    remove: bool,
) -> anyhow::Result<usize> {
    let records = read_records(file)?;
    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} objects ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    for value in records {
        let record = Record::new(class, value);
        if remove {
            manager.deindex(&record)?;
        } else {
            manager.index(&record)?;
        }
        pb.inc(1);
    }
    manager.flush()?;
    pb.finish_with_message("flushed");
    Ok(pb.position() as usize)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let (config, base) = load_config(cli.config.as_deref())?;
    let manager = build_manager(&config, &base)?;

    match cli.command {
        Command::Index { class, file } => {
            let count = apply_file(&manager, &class, &file, false)?;
            println!("Indexed {count} {class} objects from {}", file.display());
        }
        Command::Deindex { class, file } => {
            let count = apply_file(&manager, &class, &file, true)?;
            println!("Removed {count} {class} objects listed in {}", file.display());
        }
        Command::Search { query, indexes, locale, limit, json } => {
            let mut search = manager.create_search(query.as_str()).indexes(indexes);
            if let Some(locale) = locale {
                search = search.locale(locale);
            }
            if let Some(limit) = limit {
                search = search.limit(limit);
            }
            let hits = search.execute()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                println!("Found {} results for \"{query}\"", hits.len());
                for (i, hit) in hits.iter().enumerate() {
                    let title = hit.document.title.as_deref().unwrap_or("-");
                    println!(
                        "  {}. score={:.4}  {}#{}  {}",
                        i + 1,
                        hit.score,
                        hit.document.class,
                        hit.id,
                        title
                    );
                }
            }
        }
        Command::Purge { index } => {
            manager.purge(&index)?;
            println!("Purged {index}");
        }
        Command::Indexes => {
            for name in manager.list_indexes()? {
                println!("{name}");
            }
        }
    }
    Ok(())
}
