use tokio::sync::mpsc;

/// Multi-producer, single-consumer queue of completion handles.
///
/// Worker tasks push exactly one handle per finished sub-task; the
/// harvester pops them FIFO in completion order, which is unrelated to
/// submission order. The buffer is unbounded so a pushing worker never
/// stalls.
pub struct CompletionQueue<T> {
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> CompletionQueue<T> {
    /// Creates the push side and the pop side of a completion queue.
    pub fn channel() -> (CompletionHandle<T>, CompletionQueue<T>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (CompletionHandle { sender }, CompletionQueue { receiver })
    }

    /// Waits for the next completion.
    ///
    /// Returns `None` only once every push handle has been dropped and the
    /// buffer is empty, at which point nothing more can ever arrive.
    pub async fn pop(&mut self) -> Option<T> {
        self.receiver.recv().await
    }
}

/// Push side of a [`CompletionQueue`], cloned into every sub-task.
pub struct CompletionHandle<T> {
    sender: mpsc::UnboundedSender<T>,
}

impl<T> Clone for CompletionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> CompletionHandle<T> {
    /// Pushes one completion without blocking.
    ///
    /// A push after the consumer is gone means the run was torn down, so
    /// the value is dropped.
    pub fn push(&self, value: T) {
        let _ = self.sender.send(value);
    }
}
