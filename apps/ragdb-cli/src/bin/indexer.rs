use std::env;
use std::path::PathBuf;

use ragdb_core::config::RagdbConfig;
use ragdb_embed::default_embedding_service;
use ragdb_ingest::DocumentLoader;
use ragdb_vector::VectorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = RagdbConfig::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                if let Some(n) = args.get(i + 1).and_then(|a| a.parse::<usize>().ok()) {
                    limit = Some(n);
                    i += 1;
                } else {
                    eprintln!("Error: --limit requires a number");
                    std::process::exit(1);
                }
            }
            arg if !arg.starts_with('-') => data_dir = Some(PathBuf::from(arg)),
            _ => {}
        }
        i += 1;
    }
    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from("data"));

    println!("ragdb Indexer\n=============");
    println!("Data directory: {}", data_dir.display());
    println!("Store root: {}", config.store.root);
    if let Some(n) = limit {
        println!("Limiting ingestion to first {} files", n);
    }

    let loader = DocumentLoader::new();
    let outcome = match limit {
        Some(n) => loader.load_directory_limited(&data_dir, n)?,
        None => loader.load_directory(&data_dir)?,
    };
    println!("Ingestion: {}", outcome.report.summary());
    for failure in &outcome.report.failures {
        println!("  skipped {}: {}", failure.path, failure.reason);
    }

    let service = default_embedding_service(&config.embedding, config.store.dim);
    let store = VectorStore::new(&config, service)?;
    store.load().await?;

    let report = store.build_from_documents(&outcome.documents).await?;
    let generation = store.persist().await?;

    println!("\n✅ Indexing completed successfully!");
    println!(
        "📊 {} documents -> {} chunks ({} new, {} replaced), persisted as generation {}",
        report.documents, report.chunks, report.appended, report.replaced, generation
    );
    println!("\n💡 To query, use: cargo run --bin ragdb-query '<question>'");
    Ok(())
}
