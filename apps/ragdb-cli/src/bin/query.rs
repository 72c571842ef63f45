use std::env;
use std::sync::Arc;

use ragdb_core::config::RagdbConfig;
use ragdb_embed::default_embedding_service;
use ragdb_rag::{default_summarizer, RagSearch};
use ragdb_vector::VectorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <question> [--top-k N]", args[0]);
        eprintln!("Example: {} 'Explain Transformer architecture' --top-k 3", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let mut top_k = None;
    let mut i = 2;
    while i < args.len() {
        if args[i] == "--top-k" {
            if let Some(k) = args.get(i + 1).and_then(|a| a.parse::<usize>().ok()) {
                top_k = Some(k);
                i += 1;
            } else {
                eprintln!("Error: --top-k requires a number");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = RagdbConfig::load()?;

    println!("🔍 ragdb-query\n==============");
    println!("Question: {}", query_text);

    let service = default_embedding_service(&config.embedding, config.store.dim);
    let store = Arc::new(VectorStore::new(&config, service)?);
    store.load().await?;

    let status = store.status()?;
    println!(
        "Store: {} records, dim {}, metric {}, generation {}",
        status.records,
        status.dim,
        status.metric,
        status
            .generation
            .map_or_else(|| "none".to_string(), |g| g.to_string())
    );

    let summarizer = default_summarizer(&config.summarizer)?;
    let rag = RagSearch::new(store, summarizer, config.query);
    let answer = rag.search_and_summarize(query_text, top_k).await?;

    println!("\n📝 Summary:\n{}", answer.summary);
    if answer.no_context {
        println!("\n(no grounding context was retrieved)");
    }
    println!("\n🔍 {} supporting chunks:", answer.hits.len());
    for (i, hit) in answer.hits.iter().enumerate() {
        let source = hit
            .metadata
            .get("source_path")
            .map_or("<unknown>", String::as_str);
        println!("\n  {}. score={:.4}  id={}  source={}", i + 1, hit.score, hit.chunk_id, source);
        println!("     {}", hit.text);
    }
    Ok(())
}
