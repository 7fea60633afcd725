//! Signal delivery is process-wide, so everything here runs as one test.

#![cfg(unix)]

use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use autocommand::{Runner, ShutdownSignal, WatchEngine};
use tempfile::TempDir;

fn send_signal(name: &str) {
    let status = Command::new("kill")
        .args([format!("-{name}"), std::process::id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_signals_stop_the_runner() {
    // SIGINT observed by a bare shutdown signal
    let signal = ShutdownSignal::arm().unwrap();
    send_signal("INT");

    tokio::time::timeout(Duration::from_secs(5), signal.wait())
        .await
        .expect("SIGINT was not observed");
    assert!(signal.is_triggered());

    // SIGTERM stops a running watch loop
    let temp = TempDir::new().unwrap();
    let mut engine = WatchEngine::new([".go"], |e| panic!("unexpected error: {e}"));
    engine.watch([temp.path()]);
    let runner = Runner::new(engine);

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let run = runner.run_with_action(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let killer = async {
        // The start-up run implies the handlers are installed.
        while runs.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        send_signal("TERM");
    };

    let (result, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(run, killer)
    })
    .await
    .expect("runner did not stop on SIGTERM");

    result.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    // A runner is single-use even after it stops.
    assert!(runner.is_running());
}
