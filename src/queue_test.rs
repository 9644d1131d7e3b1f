use std::sync::Mutex;

use super::*;

fn config(min_ms: u64, recovery_ms: u64, backoff_ms: u64) -> QueueConfig {
    QueueConfig {
        min_delay: Duration::from_millis(min_ms),
        recovery_window: Duration::from_millis(recovery_ms),
        backoff_period: Duration::from_millis(backoff_ms),
    }
}

type Log = Arc<Mutex<Vec<(usize, Instant)>>>;

/// Enqueue a job that logs its dispatch instant and returns `outcome`.
async fn logged(queue: &RequestQueue, log: &Log, id: usize, outcome: Result<usize, ApiError>) -> Result<usize, ApiError> {
    let log = log.clone();
    queue
        .enqueue(move || async move {
            log.lock().unwrap().push((id, Instant::now()));
            outcome
        })
        .await
}

// =============================================================================
// ordering and spacing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn runs_fifo_with_min_delay_between_dispatches() {
    let queue = RequestQueue::spawn(config(500, 30_000, 60_000));
    let log: Log = Arc::default();

    let results = futures::future::join_all((0..5).map(|i| logged(&queue, &log, i, Ok(i)))).await;
    let results: Vec<usize> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(results, vec![0, 1, 2, 3, 4]);

    let log = log.lock().unwrap().clone();
    let order: Vec<usize> = log.iter().map(|(id, _)| *id).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    for pair in log.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(500), "dispatches too close: {pair:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn first_dispatch_is_immediate() {
    let queue = RequestQueue::spawn(config(500, 30_000, 60_000));
    let start = Instant::now();
    let log: Log = Arc::default();

    logged(&queue, &log, 0, Ok(0)).await.unwrap();
    assert!(log.lock().unwrap()[0].1 - start < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn job_errors_reach_their_caller() {
    let queue = RequestQueue::spawn(config(10, 1_000, 1_000));
    let result: Result<(), ApiError> = queue
        .enqueue(|| async { Err(ApiError::Validation("title is required".into())) })
        .await;
    assert!(matches!(result, Err(ApiError::Validation(msg)) if msg == "title is required"));
}

// =============================================================================
// rate limiting
// =============================================================================

#[tokio::test(start_paused = true)]
async fn rate_limit_pauses_until_recovery_window_elapses() {
    let queue = RequestQueue::spawn(config(100, 30_000, 60_000));
    let log: Log = Arc::default();

    let results = futures::future::join_all([
        logged(&queue, &log, 0, Err(ApiError::from_response(429, String::new()))),
        logged(&queue, &log, 1, Ok(1)),
        logged(&queue, &log, 2, Ok(2)),
    ])
    .await;

    assert!(results[0].as_ref().unwrap_err().is_rate_limited());
    assert_eq!(*results[1].as_ref().unwrap(), 1);

    let log = log.lock().unwrap().clone();
    assert!(log[1].1 - log[0].1 >= Duration::from_secs(30));
    // Still inside the backoff period: gap doubles.
    assert!(log[2].1 - log[1].1 >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn delay_returns_to_normal_after_backoff_period() {
    let queue = RequestQueue::spawn(config(100, 500, 1_000));
    let log: Log = Arc::default();

    let _ = logged(&queue, &log, 0, Err(ApiError::from_response(429, String::new()))).await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    let before = Instant::now();
    logged(&queue, &log, 1, Ok(1)).await.unwrap();

    let log = log.lock().unwrap().clone();
    assert!(log[1].1 - before < Duration::from_millis(100));
}

// =============================================================================
// Pacer
// =============================================================================

#[test]
fn pacer_slot_honors_recovery_and_doubled_gap() {
    let cfg = config(500, 30_000, 60_000);
    let t0 = Instant::now();
    let mut pacer = Pacer::default();
    assert_eq!(pacer.next_slot(&cfg, t0), t0);

    pacer.last_dispatch = Some(t0);
    assert_eq!(pacer.next_slot(&cfg, t0), t0 + Duration::from_millis(500));

    pacer.record_rate_limited(&cfg, t0);
    assert_eq!(pacer.next_slot(&cfg, t0), t0 + Duration::from_secs(30));

    pacer.last_dispatch = Some(t0 + Duration::from_secs(30));
    let later = t0 + Duration::from_secs(30);
    assert_eq!(pacer.next_slot(&cfg, later), later + Duration::from_secs(1));

    let after_backoff = t0 + Duration::from_secs(61);
    pacer.last_dispatch = Some(after_backoff);
    assert_eq!(pacer.next_slot(&cfg, after_backoff), after_backoff + Duration::from_millis(500));
}

// =============================================================================
// lifecycle
// =============================================================================

#[tokio::test]
async fn enqueue_after_worker_stops_reports_closed() {
    let (queue, handle) = RequestQueue::spawn_with_handle(config(10, 100, 100));
    handle.abort();
    let _ = handle.await;

    let result = queue.enqueue(|| async { Ok(()) }).await;
    assert!(matches!(result, Err(ApiError::QueueClosed)));
    assert_eq!(queue.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn pending_counts_unfinished_jobs() {
    let queue = RequestQueue::spawn(config(1_000, 1_000, 1_000));
    let first = tokio::spawn({
        let queue = queue.clone();
        async move { queue.enqueue(|| async { Ok(1) }).await }
    });
    let second = tokio::spawn({
        let queue = queue.clone();
        async move { queue.enqueue(|| async { Ok(2) }).await }
    });
    assert_eq!(first.await.unwrap().unwrap(), 1);
    assert_eq!(second.await.unwrap().unwrap(), 2);
    assert_eq!(queue.pending(), 0);
}
