use async_trait::async_trait;

/// Produces the batches the engine consumes, one per cycle.
///
/// The `&mut self` receiver pins production to the single control task, so
/// concurrent calls are unrepresentable. Returning `None` signals
/// permanent exhaustion; the engine never calls `next_batch` again
/// afterwards.
#[async_trait]
pub trait BatchSource<I>: Send {
    async fn next_batch(&mut self) -> Option<Vec<I>>;
}

/// Any iterator of batches is a source, so a `Vec<Vec<I>>` can be fed to
/// the engine directly via `into_iter()`.
#[async_trait]
impl<I, It> BatchSource<I> for It
where
    It: Iterator<Item = Vec<I>> + Send,
{
    async fn next_batch(&mut self) -> Option<Vec<I>> {
        self.next()
    }
}
