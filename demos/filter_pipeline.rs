//! Fans a batch of simulated downloads out over two byte-level filters,
//! persisting each filtered payload through an `Operation::then` step.
//!
//! Run with: cargo run --example filter_pipeline

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taskgang_rust::gang::{ConfigBuilder, Operation, Resolve, TaskGang, Transform};
use taskgang_rust::pool;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Simulated remote fetch: a locator becomes a byte payload.
struct Download;

#[async_trait]
impl Resolve<String, Vec<u8>> for Download {
    async fn resolve(&self, item: &String) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        if item.ends_with("missing") {
            return Err(format!("{item}: not found").into());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(item.bytes().cycle().take(64).collect())
    }
}

struct Invert;

#[async_trait]
impl Transform<Vec<u8>, Vec<u8>> for Invert {
    async fn apply(&self, input: &Vec<u8>) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        Ok(input.iter().map(|b| !b).collect())
    }
}

struct Threshold;

#[async_trait]
impl Transform<Vec<u8>, Vec<u8>> for Threshold {
    async fn apply(&self, input: &Vec<u8>) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        Ok(input
            .iter()
            .map(|b| if *b >= 128 { 255 } else { 0 })
            .collect())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let batches: Vec<Vec<String>> = vec![
        vec!["img-ka".into(), "img-uci".into(), "img-missing".into()],
        vec!["img-kitten".into(), "img-robot".into()],
    ];

    // Store each filtered payload's size in a shared sink, the way a real
    // pipeline would persist the payload itself.
    let sink: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let store = |label: &'static str| {
        let sink = Arc::clone(&sink);
        move |payload: Vec<u8>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().await.push((label.to_string(), payload.len()));
                Ok::<_, Box<dyn Error + Send + Sync>>(payload)
            }
        }
    };

    let config = ConfigBuilder::default()
        .pool(
            pool::ConfigBuilder::default()
                .worker_num(4usize)
                .build()?,
        )
        .record_reports(true)
        .build()?;

    let mut gang = TaskGang::new(config, batches.into_iter(), Download);
    gang.register(Operation::new("invert", Invert).then(store("invert")));
    gang.register(Operation::new("threshold", Threshold).then(store("threshold")));

    let summary = gang.run(&CancellationToken::new()).await;

    println!(
        "{} operations succeeded and {} operations failed.\n",
        summary.succeeded, summary.failed
    );
    for report in &summary.reports {
        match &report.outcome {
            Ok(payload) => println!(
                "  {} on {} -> {} bytes",
                report.operation,
                report.item,
                payload.len()
            ),
            Err(err) => println!("  {} on {} -> {}", report.operation, report.item, err),
        }
    }

    let stored = sink.lock().await;
    println!("\n{} filtered payloads persisted", stored.len());
    Ok(())
}
