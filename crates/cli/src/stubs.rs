use crate::Session;
use anyhow::Context as _;
use std::path::Path;
use stubscope_core::{FactCollector, StubBuilder, StubTree, codec, index_stub_tree};
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Tabled)]
struct KeyRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Keys")]
    keys: String,
}

pub fn build(session: &Session, path: &Path) -> anyhow::Result<()> {
    let loaded = session
        .cache
        .load_or_build(path, &session.parser, &session.naming)
        .with_context(|| format!("Failed to build stubs for {}", path.display()))?;

    let tree = loaded.file.tree();
    info!(
        path = %path.display(),
        outcome = ?loaded.outcome,
        stubs = tree.len(),
        "Stubs ready"
    );
    println!("File:         {}", path.display());
    println!("Outcome:      {:?}", loaded.outcome);
    println!("Stubs:        {}", tree.len());
    println!("Declarations: {}", tree.declaration_count());
    if loaded.diagnostics > 0 {
        println!("Diagnostics:  {}", loaded.diagnostics);
    }
    Ok(())
}

/// Persisted trees are printed as stored; sources are parsed fresh, bypassing
/// the cache, so that diagnostics can be shown.
pub fn dump(session: &Session, path: &Path, keys: bool) -> anyhow::Result<()> {
    let tree = if path.extension().is_some_and(|e| e == "stubs") {
        session
            .cache
            .read_persisted(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
    } else {
        parse_fresh(session, path)?
    };

    if keys {
        print_keys(&tree);
    } else {
        print!("{}", tree);
        let bytes = codec::serialize(&tree)?;
        println!("({} stubs, {} bytes encoded)", tree.len(), bytes.len());
    }
    Ok(())
}

fn parse_fresh(session: &Session, path: &Path) -> anyhow::Result<StubTree> {
    let root = session
        .parser
        .parse(path)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    let out = StubBuilder::new(session.naming.as_ref()).build(&root);
    for diagnostic in &out.diagnostics {
        eprintln!(
            "warning: {}..{} {:?}: {}",
            diagnostic.range.start, diagnostic.range.end, diagnostic.kind, diagnostic.reason
        );
    }
    Ok(out.tree)
}

fn print_keys(tree: &StubTree) {
    let mut facts = FactCollector::new();
    index_stub_tree(tree, &mut facts);

    let rows: Vec<KeyRow> = facts
        .occurrences
        .iter()
        .map(|o| KeyRow {
            kind: o.kind.to_string(),
            name: o.name.as_deref().unwrap_or("<anonymous>").to_string(),
            keys: o
                .keys
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect();

    if rows.is_empty() {
        println!("No declarations.");
    } else {
        println!("{}", Table::new(rows));
    }
}
