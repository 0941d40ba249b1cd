use async_trait::async_trait;
use ordaa_actor::{Action, ActionHandler, Coordinator, CorrelationId, FrameworkError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

// --- Test Handler ---

#[derive(Debug)]
enum JournalAction {
    Append(u32),
    Slow(u32, Duration),
    Block,
}

impl Action for JournalAction {
    fn kind(&self) -> &'static str {
        match self {
            JournalAction::Append(_) => "append",
            JournalAction::Slow(..) => "slow",
            JournalAction::Block => "block",
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum JournalError {
    #[error("odd entries are rejected: {0}")]
    Odd(u32),
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

#[derive(Default)]
struct Journal {
    rejects_odd: bool,
}

#[derive(Clone, Default)]
struct JournalContext {
    log: Arc<Mutex<Vec<u32>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    gate: Arc<Notify>,
}

impl JournalContext {
    fn entries(&self) -> Vec<u32> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, value: u32) -> u32 {
        let mut log = self.log.lock().unwrap();
        log.push(value);
        (log.len() - 1) as u32
    }
}

#[async_trait]
impl ActionHandler for Journal {
    type Action = JournalAction;
    type Output = u32;
    type Context = JournalContext;
    type Error = JournalError;

    async fn handle(
        &mut self,
        action: JournalAction,
        ctx: &JournalContext,
    ) -> Result<u32, JournalError> {
        let now = ctx.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        ctx.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match action {
            JournalAction::Append(value) if self.rejects_odd && value % 2 == 1 => {
                Err(JournalError::Odd(value))
            }
            JournalAction::Append(value) => {
                tokio::task::yield_now().await;
                Ok(ctx.push(value))
            }
            JournalAction::Slow(value, delay) => {
                tokio::time::sleep(delay).await;
                Ok(ctx.push(value))
            }
            JournalAction::Block => {
                ctx.gate.notified().await;
                Ok(0)
            }
        };

        ctx.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn start(
    handler: Journal,
    buffer: usize,
) -> (
    ordaa_actor::CoordinatorClient<Journal>,
    JournalContext,
    CancellationToken,
    tokio::task::JoinHandle<()>,
) {
    let shutdown = CancellationToken::new();
    let ctx = JournalContext::default();
    let (coordinator, client) = Coordinator::new(handler, buffer, shutdown.clone());
    let worker = tokio::spawn(coordinator.run(ctx.clone()));
    (client, ctx, shutdown, worker)
}

// --- Tests ---

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_each_get_their_own_result() {
    let (client, ctx, shutdown, worker) = start(Journal::default(), 4);

    let producers: Vec<_> = (0..200u32)
        .map(|value| {
            let client = client.clone();
            tokio::spawn(async move { (value, client.submit(JournalAction::Append(value)).await) })
        })
        .collect();

    let mut seen = Vec::new();
    for producer in producers {
        let (value, result) = producer.await.unwrap();
        let index = result.unwrap() as usize;
        // The index handed back must point at this producer's own entry.
        assert_eq!(ctx.entries()[index], value);
        seen.push(index);
    }

    seen.sort_unstable();
    assert_eq!(seen, (0..200).collect::<Vec<_>>());
    assert_eq!(ctx.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(client.broker().pending(), 0);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test]
async fn actions_from_one_producer_apply_in_submission_order() {
    let (client, ctx, shutdown, worker) = start(Journal::default(), 16);

    for value in [5, 3, 9, 1] {
        client.submit(JournalAction::Append(value)).await.unwrap();
    }
    assert_eq!(ctx.entries(), vec![5, 3, 9, 1]);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test]
async fn business_errors_reach_only_the_failing_caller() {
    let (client, ctx, shutdown, worker) = start(Journal { rejects_odd: true }, 16);

    let odd = client.submit(JournalAction::Append(7));
    let even = client.submit(JournalAction::Append(8));
    let (odd, even) = tokio::join!(odd, even);

    assert!(matches!(odd, Err(JournalError::Odd(7))));
    assert_eq!(even.unwrap(), 0);
    assert_eq!(ctx.entries(), vec![8]);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test]
async fn caller_timeout_abandons_id_and_late_result_is_dropped() {
    let (client, ctx, shutdown, worker) = start(Journal::default(), 16);

    let result = client
        .submit_within(
            JournalAction::Slow(42, Duration::from_millis(200)),
            Duration::from_millis(20),
        )
        .await;
    assert!(matches!(
        result,
        Err(JournalError::Framework(FrameworkError::Timeout(_)))
    ));
    assert_eq!(client.broker().pending(), 0);

    // The worker still applies the action; its result just has nowhere to go.
    let next = client.submit(JournalAction::Append(43)).await.unwrap();
    assert_eq!(next, 1);
    assert_eq!(ctx.entries(), vec![42, 43]);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test]
async fn cancellation_abandons_queued_actions() {
    let (client, ctx, shutdown, worker) = start(Journal::default(), 16);

    let blocker = {
        let client = client.clone();
        tokio::spawn(async move { client.submit(JournalAction::Block).await })
    };
    while client.broker().pending() == 0 {
        tokio::task::yield_now().await;
    }

    let queued: Vec<_> = (0..3u32)
        .map(|value| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .submit_within(JournalAction::Append(value), Duration::from_millis(100))
                    .await
            })
        })
        .collect();
    while client.broker().pending() < 4 {
        tokio::task::yield_now().await;
    }

    shutdown.cancel();
    ctx.gate.notify_one();
    worker.await.unwrap();

    // The in-progress action completes; the queued ones are never applied.
    assert_eq!(blocker.await.unwrap().unwrap(), 0);
    for task in queued {
        assert!(matches!(
            task.await.unwrap(),
            Err(JournalError::Framework(FrameworkError::Timeout(_)))
        ));
    }
    assert!(ctx.entries().is_empty());
    assert!(client.is_closed());
}

#[tokio::test]
async fn submit_after_worker_gone_reports_closed() {
    let shutdown = CancellationToken::new();
    let (coordinator, client) = Coordinator::new(Journal::default(), 4, shutdown);
    drop(coordinator);

    let result = client.submit(JournalAction::Append(1)).await;
    assert!(matches!(
        result,
        Err(JournalError::Framework(FrameworkError::ActorClosed))
    ));
    assert_eq!(client.broker().pending(), 0);
}

#[tokio::test]
async fn producer_supplied_id_is_echoed_and_must_be_unique() {
    let (client, ctx, shutdown, worker) = start(Journal::default(), 16);
    let id = CorrelationId::new();

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.submit_as(id, JournalAction::Block).await })
    };
    while !client.broker().is_pending(&id) {
        tokio::task::yield_now().await;
    }

    let duplicate = client.submit_as(id, JournalAction::Append(1)).await;
    assert!(matches!(
        duplicate,
        Err(JournalError::Framework(FrameworkError::DuplicateCorrelation(dup))) if dup == id
    ));

    ctx.gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), 0);

    // Once resolved, the id may be reused.
    assert_eq!(client.submit_as(id, JournalAction::Append(2)).await.unwrap(), 0);

    shutdown.cancel();
    worker.await.unwrap();
}
