use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use logsift::search::{ScanCoordinator, ScanReport, ScanState};
use logsift::{FilterOptions, FilterSpec, LogsiftError, ViewerConfig};

const TIMEOUT_MS: u64 = 2000;
const QUIET_MS: u64 = 200;

#[derive(Debug)]
enum Event {
    Done(ScanReport),
    Failed(LogsiftError),
}

type Events = (mpsc::UnboundedSender<Event>, mpsc::UnboundedReceiver<Event>);

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_millis(TIMEOUT_MS), rx.recv())
        .await
        .expect("scan outcome timed out")
        .expect("event channel closed unexpectedly")
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Event>) {
    if let Ok(Some(event)) = timeout(Duration::from_millis(QUIET_MS), rx.recv()).await {
        panic!("unexpected delivery: {event:?}");
    }
}

async fn wait_idle(coordinator: &ScanCoordinator) {
    timeout(Duration::from_millis(TIMEOUT_MS), async {
        while coordinator.state() != ScanState::Idle {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("coordinator did not return to idle");
}

async fn start(
    coordinator: &mut ScanCoordinator,
    events: &mpsc::UnboundedSender<Event>,
    text: &Arc<str>,
    spec: FilterSpec,
) -> u64 {
    let done_tx = events.clone();
    let error_tx = events.clone();
    coordinator
        .start_scan(
            Arc::clone(text),
            spec,
            move |report| {
                let _ = done_tx.send(Event::Done(report));
            },
            move |err| {
                let _ = error_tx.send(Event::Failed(err));
            },
        )
        .await
}

fn channel() -> Events {
    mpsc::unbounded_channel()
}

fn large_log(lines: usize) -> Arc<str> {
    let mut text = String::with_capacity(lines * 48);
    for n in 0..lines {
        let level = if n % 7 == 0 { "ERROR" } else { "INFO" };
        text.push_str(&format!("{level} request {n} served by worker-{}\n", n % 16));
    }
    Arc::from(text)
}

#[tokio::test]
async fn completed_scan_reports_view_and_matches() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text: Arc<str> = Arc::from("ERROR one\ninfo\nerror two error\n");

    let scan_id = start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("error", FilterOptions::default()),
    )
    .await;

    match next_event(&mut rx).await {
        Event::Done(report) => {
            assert_eq!(report.scan_id, scan_id);
            assert_eq!(report.filtered_lines, vec!["ERROR one", "error two error"]);
            assert_eq!(report.line_mapping, vec![0, 2]);
            assert_eq!(report.total_count, 3);
            let order: Vec<usize> = report.matches.iter().map(|m| m.order_index).collect();
            assert_eq!(order, vec![0, 1, 2]);
            assert_eq!(report.matches[0].matched_text, "ERROR");
            assert_eq!((report.matches[2].start, report.matches[2].end), (10, 15));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    assert_eq!(coordinator.last_outcome(), Some(ScanState::Completed));
    wait_idle(&coordinator).await;
    assert_eq!(coordinator.last_outcome(), Some(ScanState::Completed));
    assert_eq!(coordinator.with_engine(|engine| engine.get_keyword_total_count()), 3);
    coordinator.shutdown().await;
}

#[tokio::test]
async fn cancelled_scan_delivers_nothing() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text = large_log(50_000);

    start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("worker", FilterOptions::default()),
    )
    .await;
    coordinator.cancel_scan();

    assert_eq!(coordinator.last_outcome(), Some(ScanState::Cancelled));
    assert_quiet(&mut rx).await;
    wait_idle(&coordinator).await;
    coordinator.shutdown().await;
}

#[tokio::test]
async fn new_scan_supersedes_previous() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text = large_log(50_000);

    let first = start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("worker", FilterOptions::default()),
    )
    .await;
    let second = start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("ERROR", FilterOptions::default()),
    )
    .await;
    assert!(second > first);

    match next_event(&mut rx).await {
        Event::Done(report) => {
            assert_eq!(report.scan_id, second);
            assert_eq!(report.keywords.iter().collect::<Vec<_>>(), vec!["ERROR"]);
            assert!(report.line_mapping.iter().all(|line| line % 7 == 0));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_quiet(&mut rx).await;
    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_cancel_wait_still_delivers_only_latest() {
    let config = ViewerConfig {
        cancel_wait: Duration::ZERO,
        ..ViewerConfig::default()
    };
    let mut coordinator = ScanCoordinator::with_config(tokio::runtime::Handle::current(), config);
    let (tx, mut rx) = channel();
    let text = large_log(100_000);

    start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("request", FilterOptions::default()),
    )
    .await;
    let latest = start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("ERROR", FilterOptions::default()),
    )
    .await;

    match next_event(&mut rx).await {
        Event::Done(report) => assert_eq!(report.scan_id, latest),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_quiet(&mut rx).await;
    coordinator.shutdown().await;
}

#[tokio::test]
async fn malformed_boolean_expression_reports_parse_error() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text: Arc<str> = Arc::from("a\nb\n");

    start(&mut coordinator, &tx, &text, FilterSpec::boolean(r#""a" and ("b""#)).await;

    match next_event(&mut rx).await {
        Event::Failed(LogsiftError::Parse(err)) => {
            assert!(err.to_string().contains("position"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(coordinator.last_outcome(), Some(ScanState::Failed));
    wait_idle(&coordinator).await;
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn boolean_scan_filters_lines() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text: Arc<str> = Arc::from("db timeout\ncache timeout\ndb ok\nother\n");

    start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::boolean(r#""timeout" and ("db" or "cache")"#),
    )
    .await;

    match next_event(&mut rx).await {
        Event::Done(report) => {
            assert_eq!(report.line_mapping, vec![0, 1]);
            assert_eq!(report.filtered_lines, vec!["db timeout", "cache timeout"]);
            assert_eq!(report.keywords.len(), 3);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_regex_degrades_to_literal() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text: Arc<str> = Arc::from("call foo(\nfoo\n");
    let options = FilterOptions {
        use_regex: true,
        ..FilterOptions::default()
    };

    start(&mut coordinator, &tx, &text, FilterSpec::new("foo(", options)).await;

    match next_event(&mut rx).await {
        Event::Done(report) => assert_eq!(report.line_mapping, vec![0]),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn repeated_scan_is_served_again() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text: Arc<str> = Arc::from("x1\ny\nx2\n");
    let spec = FilterSpec::new("x", FilterOptions::default());

    start(&mut coordinator, &tx, &text, spec.clone()).await;
    let first = match next_event(&mut rx).await {
        Event::Done(report) => report,
        other => panic!("unexpected event: {other:?}"),
    };
    start(&mut coordinator, &tx, &text, spec).await;
    let second = match next_event(&mut rx).await {
        Event::Done(report) => report,
        other => panic!("unexpected event: {other:?}"),
    };

    assert_ne!(first.scan_id, second.scan_id);
    assert_eq!(first.matches, second.matches);
    assert_eq!(first.line_mapping, second.line_mapping);
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let mut coordinator = ScanCoordinator::new(tokio::runtime::Handle::current());
    let (tx, mut rx) = channel();
    let text = large_log(10_000);

    start(
        &mut coordinator,
        &tx,
        &text,
        FilterSpec::new("INFO", FilterOptions::default()),
    )
    .await;
    coordinator.shutdown().await;
    coordinator.shutdown().await;

    assert_eq!(coordinator.state(), ScanState::Idle);
    assert!(!coordinator.is_running());
    assert_quiet(&mut rx).await;
}
