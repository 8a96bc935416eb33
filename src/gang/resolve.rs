use std::error::Error;

use async_trait::async_trait;

/// Turns a work item into the input its operations consume, e.g. fetching
/// the resource a locator points at.
///
/// The engine resolves each item once on a pool worker and shares the
/// outcome with every operation scheduled against that item, so a failure
/// here surfaces as one failed report per operation instead of crashing
/// the cycle.
#[async_trait]
pub trait Resolve<I, R>: Send + Sync {
    async fn resolve(&self, item: &I) -> Result<R, Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl<I, R, F, Fut> Resolve<I, R> for F
where
    F: Fn(&I) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<R, Box<dyn Error + Send + Sync>>> + Send,
    I: Sync,
{
    async fn resolve(&self, item: &I) -> Result<R, Box<dyn Error + Send + Sync>> {
        self(item).await
    }
}
