use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use super::types::TaskError;

/// A side-effect-isolated transform applied to a resolved work item.
///
/// Implement it directly for operations carrying per-kind state, or let
/// the blanket impl lift a plain async closure.
#[async_trait]
pub trait Transform<R, T>: Send + Sync {
    async fn apply(&self, input: &R) -> Result<T, Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl<R, T, F, Fut> Transform<R, T> for F
where
    F: Fn(&R) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<T, Box<dyn Error + Send + Sync>>> + Send,
    R: Sync,
{
    async fn apply(&self, input: &R) -> Result<T, Box<dyn Error + Send + Sync>> {
        self(input).await
    }
}

type StepFn<T> =
    Box<dyn Fn(T) -> BoxFuture<'static, Result<T, Box<dyn Error + Send + Sync>>> + Send + Sync>;

/// A named member of the registered operation set.
///
/// The name tags every report this operation produces; the transform does
/// the work. Cloning shares the underlying transform, so the same
/// operation can be fanned out across sub-tasks cheaply.
pub struct Operation<R, T> {
    name: String,
    transform: Arc<dyn Transform<R, T>>,
}

impl<R, T> Clone for Operation<R, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            transform: Arc::clone(&self.transform),
        }
    }
}

impl<R, T> Operation<R, T>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new(name: impl Into<String>, transform: impl Transform<R, T> + 'static) -> Self {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the transform, recovering any failure into a [`TaskError`]
    /// attributed to this operation.
    ///
    /// Errors and panics are both contained here; nothing escapes into the
    /// worker running the sub-task.
    pub(crate) async fn apply(&self, input: &R) -> Result<T, TaskError> {
        match AssertUnwindSafe(self.transform.apply(input))
            .catch_unwind()
            .await
        {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(err)) => Err(TaskError::Operation {
                operation: self.name.clone(),
                message: err.to_string(),
            }),
            Err(_) => Err(TaskError::Panicked {
                operation: self.name.clone(),
            }),
        }
    }

    /// Chains a post-step onto the operation's success payload.
    ///
    /// Wrappers compose as plain functions: an operation that produces a
    /// payload and a step that, say, persists it combine with
    /// `op.then(store)`. A failing step fails the whole sub-task under
    /// this operation's name.
    pub fn then<F, Fut>(self, step: F) -> Operation<R, T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, Box<dyn Error + Send + Sync>>>
            + Send
            + 'static,
    {
        Operation {
            name: self.name,
            transform: Arc::new(ThenStep {
                inner: self.transform,
                step: Box::new(move |payload| step(payload).boxed()),
            }),
        }
    }
}

struct ThenStep<R, T> {
    inner: Arc<dyn Transform<R, T>>,
    step: StepFn<T>,
}

#[async_trait]
impl<R, T> Transform<R, T> for ThenStep<R, T>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    async fn apply(&self, input: &R) -> Result<T, Box<dyn Error + Send + Sync>> {
        let payload = self.inner.apply(input).await?;
        (self.step)(payload).await
    }
}
