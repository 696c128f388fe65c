use clap::Subcommand;
use std::path::PathBuf;
use stubscope_core::StubCache;
use tabled::{Table, Tabled};

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache statistics
    Stats,
    /// List persisted stub trees
    List {
        /// Sort by size instead of hash
        #[arg(long)]
        by_size: bool,
    },
    /// Drop the cached stubs of one file
    Invalidate {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Clear the cache
    Clear,
}

#[derive(Tabled)]
struct TreeRow {
    #[tabled(rename = "Hash")]
    hash: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Zstd")]
    compressed: bool,
    #[tabled(rename = "Stubs")]
    stubs: String,
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

pub fn run(cache: &StubCache, cmd: CacheCommands) -> anyhow::Result<()> {
    match cmd {
        CacheCommands::Stats => {
            let stats = cache.stats();
            println!("Cache Directory: {}", stats.cache_dir.display());
            println!("Stub Trees:      {}", stats.persisted_trees);
            println!("Total Size:      {}", human_size(stats.persisted_bytes));
        }
        CacheCommands::List { by_size } => {
            let mut trees = cache.scan();
            if by_size {
                trees.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
            }

            let rows: Vec<TreeRow> = trees
                .into_iter()
                .map(|t| TreeRow {
                    hash: t.hash,
                    size: human_size(t.size_bytes),
                    compressed: t.compressed,
                    stubs: t
                        .stub_count
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "corrupt".to_string()),
                })
                .collect();

            if rows.is_empty() {
                println!("No cached stub trees found.");
            } else {
                println!("{}", Table::new(rows));
            }
        }
        CacheCommands::Invalidate { path } => {
            if cache.invalidate(&path) {
                println!("Dropped cached stubs of {}", path.display());
            } else {
                println!("Nothing cached for {}", path.display());
            }
        }
        CacheCommands::Clear => {
            cache.clear()?;
            println!("Cache cleared successfully.");
        }
    }

    Ok(())
}
