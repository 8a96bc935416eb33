use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::gang::dispatch::Dispatcher;
use crate::gang::harvest::Harvester;
use crate::gang::{BatchSource, Operation, Resolve, TaskError, Transform};
use crate::pool::{Backpressure, CompletionQueue, ConfigBuilder, WorkerPool};

// Resolver that hands the item through unchanged, counting invocations.
struct CountingResolver {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Resolve<i32, i32> for CountingResolver {
    async fn resolve(&self, item: &i32) -> Result<i32, Box<dyn Error + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(*item)
    }
}

// Resolver that refuses one designated item.
struct RefusingResolver {
    poison: i32,
}

#[async_trait]
impl Resolve<i32, i32> for RefusingResolver {
    async fn resolve(&self, item: &i32) -> Result<i32, Box<dyn Error + Send + Sync>> {
        if *item == self.poison {
            Err("unreachable input".into())
        } else {
            Ok(*item)
        }
    }
}

struct Doubler;

#[async_trait]
impl Transform<i32, i32> for Doubler {
    async fn apply(&self, input: &i32) -> Result<i32, Box<dyn Error + Send + Sync>> {
        Ok(input * 2)
    }
}

struct Negate;

#[async_trait]
impl Transform<i32, i32> for Negate {
    async fn apply(&self, input: &i32) -> Result<i32, Box<dyn Error + Send + Sync>> {
        Ok(-input)
    }
}

// Transform that panics on zero.
struct PanicsOnZero;

#[async_trait]
impl Transform<i32, i32> for PanicsOnZero {
    async fn apply(&self, input: &i32) -> Result<i32, Box<dyn Error + Send + Sync>> {
        if *input == 0 {
            panic!("zero input");
        }
        Ok(*input)
    }
}

fn small_pool(worker_num: usize) -> WorkerPool {
    let config = ConfigBuilder::default()
        .worker_num(worker_num)
        .queue_capacity(64usize)
        .build()
        .unwrap();
    WorkerPool::new(Arc::new(config))
}

#[tokio::test]
async fn test_dispatch_count_matches_batch_times_operations() {
    let mut pool = small_pool(2);
    let (handle, queue) = CompletionQueue::channel();
    let cancel = CancellationToken::new();

    let operations: Arc<[Operation<i32, i32>]> = vec![
        Operation::new("double", Doubler),
        Operation::new("negate", Negate),
    ]
    .into();
    let resolver: Arc<dyn Resolve<i32, i32>> = Arc::new(CountingResolver {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let dispatcher = Dispatcher::new(resolver, operations);
    let mut harvester = Harvester::new(queue, true);

    let expected = dispatcher.dispatch(&pool, &handle, vec![1, 2, 3], 1).await;
    assert_eq!(expected, 6);

    let outcome = harvester.harvest(expected, &cancel).await;
    assert_eq!(outcome.succeeded + outcome.failed, 6);
    assert_eq!(outcome.succeeded, 6);
    assert_eq!(outcome.reports.len(), 6);
    assert!(!outcome.interrupted);

    pool.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_resolution_runs_once_per_item() {
    let mut pool = small_pool(4);
    let (handle, queue) = CompletionQueue::channel();
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let operations: Arc<[Operation<i32, i32>]> = vec![
        Operation::new("double", Doubler),
        Operation::new("negate", Negate),
        Operation::new("double_again", Doubler),
    ]
    .into();
    let resolver: Arc<dyn Resolve<i32, i32>> = Arc::new(CountingResolver {
        calls: Arc::clone(&calls),
    });
    let dispatcher = Dispatcher::new(resolver, operations);
    let mut harvester = Harvester::new(queue, false);

    let expected = dispatcher.dispatch(&pool, &handle, vec![42], 1).await;
    let outcome = harvester.harvest(expected, &cancel).await;

    assert_eq!(outcome.succeeded, 3);
    // Three operations on one item share a single resolution.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    pool.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_resolver_failure_fails_every_operation_on_the_item() {
    let mut pool = small_pool(2);
    let (handle, queue) = CompletionQueue::channel();
    let cancel = CancellationToken::new();

    let operations: Arc<[Operation<i32, i32>]> = vec![
        Operation::new("double", Doubler),
        Operation::new("negate", Negate),
    ]
    .into();
    let resolver: Arc<dyn Resolve<i32, i32>> = Arc::new(RefusingResolver { poison: 13 });
    let dispatcher = Dispatcher::new(resolver, operations);
    let mut harvester = Harvester::new(queue, true);

    let expected = dispatcher.dispatch(&pool, &handle, vec![13, 1], 1).await;
    let outcome = harvester.harvest(expected, &cancel).await;

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 2);
    for report in outcome.reports.iter().filter(|r| !r.succeeded()) {
        assert_eq!(*report.item, 13);
        assert!(matches!(report.outcome, Err(TaskError::Resolve(_))));
    }

    pool.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_operation_panic_is_contained() {
    let mut pool = small_pool(2);
    let (handle, queue) = CompletionQueue::channel();
    let cancel = CancellationToken::new();

    let operations: Arc<[Operation<i32, i32>]> = vec![
        Operation::new("panicky", PanicsOnZero),
        Operation::new("double", Doubler),
    ]
    .into();
    let resolver: Arc<dyn Resolve<i32, i32>> = Arc::new(CountingResolver {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let dispatcher = Dispatcher::new(resolver, operations);
    let mut harvester = Harvester::new(queue, true);

    let expected = dispatcher.dispatch(&pool, &handle, vec![0], 1).await;
    let outcome = harvester.harvest(expected, &cancel).await;

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 1);
    let failed = outcome.reports.iter().find(|r| !r.succeeded()).unwrap();
    assert!(matches!(
        failed.outcome,
        Err(TaskError::Panicked { .. })
    ));

    // The worker that contained the panic keeps serving later cycles.
    let expected = dispatcher.dispatch(&pool, &handle, vec![5], 2).await;
    let outcome = harvester.harvest(expected, &cancel).await;
    assert_eq!(outcome.succeeded, 2);

    pool.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_rejected_submissions_are_still_counted() {
    let config = ConfigBuilder::default()
        .worker_num(1usize)
        .queue_capacity(1usize)
        .backpressure(Backpressure::Reject)
        .build()
        .unwrap();
    let mut pool = WorkerPool::new(Arc::new(config));
    let (handle, queue) = CompletionQueue::channel();
    let cancel = CancellationToken::new();

    // Wedge the single worker so dispatch overflows the one-slot queue.
    let started = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    {
        let started = Arc::clone(&started);
        let gate = Arc::clone(&gate);
        pool.submit(async move {
            started.notify_one();
            gate.notified().await;
        })
        .await
        .unwrap();
    }
    started.notified().await;

    let operations: Arc<[Operation<i32, i32>]> =
        vec![Operation::new("double", Doubler)].into();
    let resolver: Arc<dyn Resolve<i32, i32>> = Arc::new(CountingResolver {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let dispatcher = Dispatcher::new(resolver, operations);
    let mut harvester = Harvester::new(queue, true);

    let expected = dispatcher
        .dispatch(&pool, &handle, vec![1, 2, 3, 4], 1)
        .await;
    assert_eq!(expected, 4);

    gate.notify_one();
    let outcome = harvester.harvest(expected, &cancel).await;

    // One sub-task fit the queue; the other three were refused but still
    // reported, so the count never drifts.
    assert_eq!(outcome.succeeded + outcome.failed, 4);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 3);
    assert!(
        outcome
            .reports
            .iter()
            .filter(|r| !r.succeeded())
            .all(|r| matches!(r.outcome, Err(TaskError::Rejected)))
    );

    pool.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_harvest_zero_expected_returns_immediately() {
    let (_handle, queue) = CompletionQueue::<crate::gang::TaskReport<i32, i32>>::channel();
    let cancel = CancellationToken::new();
    let mut harvester = Harvester::new(queue, false);

    let outcome = harvester.harvest(0, &cancel).await;
    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.failed, 0);
    assert!(!outcome.interrupted);
}

#[tokio::test]
async fn test_operation_then_chains_a_post_step() {
    let op = Operation::new("double", Doubler).then(|payload: i32| async move {
        Ok::<_, Box<dyn Error + Send + Sync>>(payload + 10)
    });

    assert_eq!(op.name(), "double");
    assert_eq!(op.apply(&5).await, Ok(20));
}

#[tokio::test]
async fn test_operation_then_failure_is_attributed_to_the_operation() {
    let op = Operation::new("double", Doubler).then(|_payload: i32| async move {
        Err::<i32, Box<dyn Error + Send + Sync>>("sink unavailable".into())
    });

    let err = op.apply(&5).await.unwrap_err();
    assert_eq!(
        err,
        TaskError::Operation {
            operation: "double".to_string(),
            message: "sink unavailable".to_string(),
        }
    );
}

#[tokio::test]
async fn test_closures_satisfy_the_transform_and_resolve_seams() {
    let mut pool = small_pool(2);
    let (handle, queue) = CompletionQueue::channel();
    let cancel = CancellationToken::new();

    let resolver = |item: &i32| {
        let item = *item;
        async move { Ok::<i32, Box<dyn Error + Send + Sync>>(item * 10) }
    };
    let increment = |input: &i32| {
        let input = *input;
        async move { Ok::<i32, Box<dyn Error + Send + Sync>>(input + 1) }
    };

    let operations: Arc<[Operation<i32, i32>]> =
        vec![Operation::new("increment", increment)].into();
    let resolver: Arc<dyn Resolve<i32, i32>> = Arc::new(resolver);
    let dispatcher = Dispatcher::new(resolver, operations);
    let mut harvester = Harvester::new(queue, true);

    let expected = dispatcher.dispatch(&pool, &handle, vec![3], 1).await;
    let outcome = harvester.harvest(expected, &cancel).await;

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.reports[0].outcome, Ok(31));

    pool.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_iterator_is_a_batch_source() {
    let mut source = vec![vec![1, 2], vec![3]].into_iter();

    assert_eq!(source.next_batch().await, Some(vec![1, 2]));
    assert_eq!(source.next_batch().await, Some(vec![3]));
    assert_eq!(source.next_batch().await, None);
}
