use crate::Session;
use std::path::Path;
use std::time::Instant;
use stubscope_core::{FileIndex, IndexKey, discover_sources, index_corpus};
use stubscope_java::JAVA_EXTENSIONS;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "Indexed")]
    indexed: usize,
    #[tabled(rename = "Cached")]
    cached: usize,
    #[tabled(rename = "Rebuilt")]
    rebuilt: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Declarations")]
    declarations: usize,
    #[tabled(rename = "Keys")]
    keys: usize,
}

pub fn run(session: &Session, path: &Path, lookups: &[String]) -> anyhow::Result<()> {
    // Parse lookups first so that a typo fails fast
    let lookups = lookups
        .iter()
        .map(|k| k.parse::<IndexKey>().map_err(anyhow::Error::msg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    info!("Indexing project at: {}...", path.display());
    let started = Instant::now();

    let files = discover_sources(path, JAVA_EXTENSIONS);
    let index = FileIndex::new();
    let report = index_corpus(&files, &session.parser, &session.naming, &session.cache, &index);

    info!("Indexing complete in {:?}", started.elapsed());
    println!(
        "{}",
        Table::new([ReportRow {
            files: files.len(),
            indexed: report.indexed,
            cached: report.cached,
            rebuilt: report.rebuilt,
            failed: report.failed,
            declarations: report.declarations,
            keys: index.key_count(),
        }])
    );
    if report.diagnostics > 0 {
        println!("{} malformed-input diagnostics (see log)", report.diagnostics);
    }
    for (file, reason) in &report.failures {
        println!("failed: {}: {}", file.display(), reason);
    }

    for key in &lookups {
        let files = index.files_for(key);
        println!("\n{} ({} files)", key, files.len());
        for file in files {
            let shown = file.strip_prefix(path).unwrap_or(&file);
            println!("  {}", shown.display());
        }
    }
    Ok(())
}
