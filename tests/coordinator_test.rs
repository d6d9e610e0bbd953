//! End-to-end coordinator semantics: admission, throttling, coalescing,
//! FIFO cache eviction, and the drain-and-stop protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;

use reqvisor::{
    Config, Coordinator, Event, EventKind, Outcome, Request, RequestError, RequestFn, RequestRef,
};

const WAIT: Duration = Duration::from_secs(5);

/// Test request with observable resolution paths.
///
/// Reports the start of every `run` on `started`, every `set_result` payload
/// on `delivered`, and counts completed runs. Enforces the one-shot contract:
/// a second resolution of any kind bumps `violations`.
struct Probe {
    id: String,
    cacheable: bool,
    value: String,
    gate: Option<Arc<Notify>>,
    resolved: AtomicBool,
    ctx: ProbeCtx,
}

#[derive(Clone)]
struct ProbeCtx {
    completed_runs: Arc<AtomicUsize>,
    violations: Arc<AtomicUsize>,
    started: mpsc::UnboundedSender<String>,
    delivered: mpsc::UnboundedSender<Outcome<String>>,
}

impl ProbeCtx {
    fn new() -> (
        Self,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedReceiver<Outcome<String>>,
    ) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let (delivered_tx, delivered_rx) = mpsc::unbounded_channel();
        let ctx = Self {
            completed_runs: Arc::new(AtomicUsize::new(0)),
            violations: Arc::new(AtomicUsize::new(0)),
            started: started_tx,
            delivered: delivered_tx,
        };
        (ctx, started_rx, delivered_rx)
    }

    fn probe(&self, id: &str, cacheable: bool, value: &str) -> RequestRef<String> {
        self.build(id, cacheable, value, None)
    }

    fn gated(&self, id: &str, cacheable: bool, value: &str, gate: Arc<Notify>) -> RequestRef<String> {
        self.build(id, cacheable, value, Some(gate))
    }

    fn build(
        &self,
        id: &str,
        cacheable: bool,
        value: &str,
        gate: Option<Arc<Notify>>,
    ) -> RequestRef<String> {
        Arc::new(Probe {
            id: id.to_string(),
            cacheable,
            value: value.to_string(),
            gate,
            resolved: AtomicBool::new(false),
            ctx: self.clone(),
        })
    }

    fn completed_runs(&self) -> usize {
        self.completed_runs.load(Ordering::SeqCst)
    }

    fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Request for Probe {
    type Value = String;

    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self) -> Outcome<String> {
        if self.resolved.swap(true, Ordering::SeqCst) {
            self.ctx.violations.fetch_add(1, Ordering::SeqCst);
        }
        let _ = self.ctx.started.send(self.id.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.ctx.completed_runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.clone())
    }

    fn cacheable(&self) -> bool {
        self.cacheable
    }

    fn set_result(&self, outcome: Outcome<String>) {
        if self.resolved.swap(true, Ordering::SeqCst) {
            self.ctx.violations.fetch_add(1, Ordering::SeqCst);
        }
        let _ = self.ctx.delivered.send(outcome);
    }
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting on channel")
        .expect("channel closed")
}

/// Waits for an event matching the predicate, skipping everything else.
async fn wait_for_event(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    pred: impl Fn(&Event) -> bool,
) -> Event {
    timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(ev) if pred(&ev) => return ev,
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    panic!("event bus closed while waiting")
                }
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_submitted_request_executes() {
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(2, 10)).build();

    coordinator.submit(ctx.probe("a", true, "va"));
    assert_eq!(recv(&mut started).await, "a");

    coordinator.stop().await;

    assert_eq!(ctx.completed_runs(), 1);
    assert!(delivered.try_recv().is_err(), "executed request must not be delivered");
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coalesced_duplicate_delivered_same_outcome() {
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(4, 10)).build();
    let gate = Arc::new(Notify::new());

    // The duplicate's own value differs; receiving "va" proves it was
    // resolved from the primary's execution, not its own.
    coordinator.submit(ctx.gated("a", true, "va", Arc::clone(&gate)));
    coordinator.submit(ctx.probe("a", true, "vb"));

    assert_eq!(recv(&mut started).await, "a");
    gate.notify_one();

    assert_eq!(recv(&mut delivered).await, Ok("va".to_string()));

    coordinator.stop().await;
    assert_eq!(ctx.completed_runs(), 1, "one execution for the shared identity");
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_throttle_limit_bounds_concurrency() {
    let coordinator = Coordinator::<String>::builder(Config::new(2, 0)).build();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    for i in 0..12 {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        let done = done_tx.clone();
        let request: RequestRef<String> = RequestFn::arc(
            format!("job-{i}"),
            false,
            move || {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                let done = done.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    let _ = done.send(());
                    Ok(String::new())
                }
            },
            |_| {},
        );
        coordinator.submit(request);
    }

    for _ in 0..12 {
        recv(&mut done_rx).await;
    }
    coordinator.stop().await;

    let peak = peak.load(Ordering::SeqCst);
    assert!(peak >= 1, "nothing ever executed");
    assert!(peak <= 2, "throttle exceeded: {peak} concurrent executions");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dedup_scenario_two_identities() {
    // capacity=10, throttle=2; two "a" and one "b" in flight together:
    // one run each for "a" and "b", the duplicate "a" gets "a"'s outcome.
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(2, 10)).build();
    let gate = Arc::new(Notify::new());

    coordinator.submit(ctx.gated("a", true, "va", Arc::clone(&gate)));
    coordinator.submit(ctx.probe("a", true, "dup"));
    coordinator.submit(ctx.probe("b", true, "vb"));

    let mut first_started = vec![recv(&mut started).await, recv(&mut started).await];
    first_started.sort();
    assert_eq!(first_started, vec!["a".to_string(), "b".to_string()]);

    gate.notify_one();
    assert_eq!(recv(&mut delivered).await, Ok("va".to_string()));

    coordinator.stop().await;
    assert_eq!(ctx.completed_runs(), 2);
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifo_eviction_forces_reexecution() {
    // cache capacity 1: storing "y" evicts "x"; resubmitting "x" runs again.
    let (ctx, mut started, _delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(2, 1)).build();
    let mut events = coordinator.subscribe();

    coordinator.submit(ctx.probe("x", true, "vx"));
    assert_eq!(recv(&mut started).await, "x");
    wait_for_event(&mut events, |e| {
        e.kind == EventKind::CacheStored && e.id.as_deref() == Some("x")
    })
    .await;

    coordinator.submit(ctx.probe("y", true, "vy"));
    assert_eq!(recv(&mut started).await, "y");
    let evicted = wait_for_event(&mut events, |e| e.kind == EventKind::CacheEvicted).await;
    assert_eq!(evicted.id.as_deref(), Some("x"));

    // "x" was evicted, so resubmitting it misses the cache and runs again.
    coordinator.submit(ctx.probe("x", true, "vx-again"));
    assert_eq!(recv(&mut started).await, "x");

    coordinator.stop().await;
    assert_eq!(ctx.completed_runs(), 3);
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cache_hit_resolves_without_execution() {
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(2, 10)).build();
    let mut events = coordinator.subscribe();

    coordinator.submit(ctx.probe("a", true, "va"));
    wait_for_event(&mut events, |e| e.kind == EventKind::CacheStored).await;

    coordinator.submit(ctx.probe("a", true, "ignored"));
    assert_eq!(recv(&mut delivered).await, Ok("va".to_string()));

    coordinator.stop().await;
    assert_eq!(recv(&mut started).await, "a");
    assert!(started.try_recv().is_err(), "cache hit must not execute");
    assert_eq!(ctx.completed_runs(), 1);
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_noncacheable_duplicates_each_execute() {
    // Nothing is cached, so the duplicate cannot be resolved by delivery;
    // it executes itself once the first run releases the identity.
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(4, 10)).build();
    let gate = Arc::new(Notify::new());

    coordinator.submit(ctx.gated("a", false, "first", Arc::clone(&gate)));
    coordinator.submit(ctx.probe("a", false, "second"));

    assert_eq!(recv(&mut started).await, "a");
    gate.notify_one();
    assert_eq!(recv(&mut started).await, "a");

    coordinator.stop().await;
    assert_eq!(ctx.completed_runs(), 2);
    assert!(delivered.try_recv().is_err());
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_waits_for_inflight_execution() {
    let (ctx, mut started, _delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(2, 10)).build();
    let gate = Arc::new(Notify::new());

    coordinator.submit(ctx.gated("slow", false, "v", Arc::clone(&gate)));
    assert_eq!(recv(&mut started).await, "slow");

    let stopper = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.stop().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!stopper.is_finished(), "stop returned while execution in flight");

    gate.notify_one();
    stopper.await.expect("stop task panicked");

    assert_eq!(ctx.completed_runs(), 1, "execution completed before stop returned");
    assert!(!coordinator.is_running());
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_drops_unadmitted_request() {
    // Throttle 1: "z" sits queued behind an in-flight execution when stop
    // arrives, is neither cached nor coalesced, and gets no resolution.
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(1, 10)).build();
    let mut events = coordinator.subscribe();
    let gate = Arc::new(Notify::new());

    coordinator.submit(ctx.gated("a", false, "va", Arc::clone(&gate)));
    assert_eq!(recv(&mut started).await, "a");
    coordinator.submit(ctx.probe("z", true, "vz"));

    let stopper = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.stop().await })
    };

    wait_for_event(&mut events, |e| {
        e.kind == EventKind::RequestDropped && e.id.as_deref() == Some("z")
    })
    .await;

    gate.notify_one();
    stopper.await.expect("stop task panicked");

    assert_eq!(ctx.completed_runs(), 1, "only the in-flight request ran");
    assert!(delivered.try_recv().is_err(), "dropped request must not be delivered");
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_submit_after_stop_is_discarded() {
    let (ctx, _started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::default()).build();
    let mut events = coordinator.subscribe();

    coordinator.stop().await;
    assert!(!coordinator.is_running());

    coordinator.submit(ctx.probe("late", true, "v"));
    wait_for_event(&mut events, |e| {
        e.kind == EventKind::RequestDiscarded && e.id.as_deref() == Some("late")
    })
    .await;

    assert_eq!(ctx.completed_runs(), 0);
    assert!(delivered.try_recv().is_err());
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coalesced_duplicate_delivered_while_stopping() {
    // A duplicate coalesced against an in-flight cacheable execution must
    // still be delivered during the drain: cache hits apply unconditionally.
    let (ctx, mut started, mut delivered) = ProbeCtx::new();
    let coordinator = Coordinator::<String>::builder(Config::new(1, 10)).build();
    let gate = Arc::new(Notify::new());

    coordinator.submit(ctx.gated("a", true, "va", Arc::clone(&gate)));
    assert_eq!(recv(&mut started).await, "a");
    coordinator.submit(ctx.probe("a", true, "dup"));

    let stopper = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.stop().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    gate.notify_one();
    stopper.await.expect("stop task panicked");

    assert_eq!(recv(&mut delivered).await, Ok("va".to_string()));
    assert_eq!(ctx.completed_runs(), 1);
    assert_eq!(ctx.violations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_error_outcome_delivered_verbatim() {
    let coordinator = Coordinator::<String>::builder(Config::new(2, 10)).build();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let primary: RequestRef<String> = RequestFn::arc(
        "a",
        true,
        || async { Err(RequestError::fail("boom")) },
        |_| {},
    );
    let duplicate: RequestRef<String> = RequestFn::arc(
        "a",
        true,
        || async { Ok(String::new()) },
        move |outcome: Outcome<String>| {
            let _ = tx.send(outcome);
        },
    );

    coordinator.submit(primary);
    coordinator.submit(duplicate);

    assert_eq!(recv(&mut rx).await, Err(RequestError::fail("boom")));
    coordinator.stop().await;
}
