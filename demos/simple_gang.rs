//! Minimal task-gang run over two batches of numbers.
//!
//! Run with: cargo run --example simple_gang

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use taskgang_rust::gang::{Config, Operation, Resolve, TaskGang, Transform};
use tokio_util::sync::CancellationToken;

/// Pretends to fetch the payload a work item points at.
struct SlowFetch;

#[async_trait]
impl Resolve<u32, u64> for SlowFetch {
    async fn resolve(&self, item: &u32) -> Result<u64, Box<dyn Error + Send + Sync>> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(*item as u64)
    }
}

struct Square;

#[async_trait]
impl Transform<u64, u64> for Square {
    async fn apply(&self, input: &u64) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(input * input)
    }
}

/// Fails on odd inputs to show the failure accounting.
struct HalveEven;

#[async_trait]
impl Transform<u64, u64> for HalveEven {
    async fn apply(&self, input: &u64) -> Result<u64, Box<dyn Error + Send + Sync>> {
        if input % 2 == 0 {
            Ok(input / 2)
        } else {
            Err(format!("{input} is odd").into())
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let batches: Vec<Vec<u32>> = vec![vec![1, 2, 3, 4], vec![5, 6]];

    let mut gang = TaskGang::new(Config::default(), batches.into_iter(), SlowFetch);
    gang.register(Operation::new("square", Square));
    gang.register(Operation::new("halve", HalveEven));

    println!("Dispatching 2 batches x 2 operations...\n");
    let summary = gang.run(&CancellationToken::new()).await;

    for tally in &summary.cycles {
        println!(
            "cycle {}: {}/{} succeeded",
            tally.cycle, tally.succeeded, tally.expected
        );
    }
    println!(
        "\ndone: {} succeeded, {} failed across {} cycles",
        summary.succeeded,
        summary.failed,
        summary.cycles.len()
    );
}
