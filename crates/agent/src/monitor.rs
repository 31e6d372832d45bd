//! Monitor loop
//!
//! Polls the tracker on a fixed interval and hands every flushed path set to
//! the orchestrator, one set at a time. The notification thread keeps
//! recording into the tracker while an analysis is in flight.
//!
//! Shutdown cancels a pending analysis (dropping the service call) but never
//! interrupts an approved apply: once edits start they run to the end.

use crate::orchestrator::{Orchestrator, Review, SessionStats};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use watcher::ChangeTracker;

/// Run until `shutdown` completes, returning the session counters
pub async fn run<F>(
    tracker: &ChangeTracker,
    orchestrator: &mut Orchestrator,
    poll_interval: Duration,
    shutdown: F,
) -> SessionStats
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let ready = existing(tracker.flush_ready(Instant::now()));
        if ready.is_empty() {
            continue;
        }

        let review = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, abandoning analysis in flight");
                break;
            }
            review = orchestrator.review(&ready) => review,
        };

        match review {
            Ok(Review::Approved { fix }) => {
                if let Err(e) = orchestrator.apply(&ready, &fix).await {
                    orchestrator.report_failure(&e);
                }
            }
            Ok(Review::Clean) | Ok(Review::Declined) => {}
            Err(e) => orchestrator.report_failure(&e),
        }
    }

    tracing::info!("Monitor loop stopped");
    orchestrator.stats().clone()
}

/// Drop paths deleted since they were recorded
fn existing(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| {
            let exists = path.exists();
            if !exists {
                tracing::debug!("Skipping removed file {}", path.display());
            }
            exists
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, Mode, Reply};
    use crate::testing::{FixedPrompter, ScriptedBackend, Step};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::oneshot;
    use tokio::time::sleep;
    use vigil_core::AgentConfig;

    const POLL: Duration = Duration::from_millis(500);

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn project() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.py");
        std::fs::write(&file, "print('hi')\n").unwrap();
        (temp_dir, file)
    }

    fn orchestrator(backend: &Arc<ScriptedBackend>, approve: bool, config: AgentConfig) -> Orchestrator {
        Orchestrator::new(backend.clone(), Box::new(FixedPrompter::new(approve)), config)
    }

    fn shutdown_signal() -> (oneshot::Sender<()>, impl Future<Output = ()>) {
        let (tx, rx) = oneshot::channel::<()>();
        (tx, async move {
            let _ = rx.await;
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_yields_one_analysis() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![Step::Reply(Reply::text("Looks good."))]);
        let mut orch = orchestrator(&backend, true, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            for _ in 0..3 {
                tracker.record(file.clone(), Instant::now());
                sleep(ms(200)).await;
            }
            sleep(ms(2500)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        let queries = backend.queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].prompt.contains(&file.display().to_string()));
        assert_eq!(stats.analyses, 1);
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_next_edit_recovers() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![Step::Hang, Step::Reply(Reply::text("All good"))]);
        let config = AgentConfig {
            analysis_timeout_secs: 5,
            ..Default::default()
        };
        let mut orch = orchestrator(&backend, true, config);
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            tracker.record(file.clone(), Instant::now());
            sleep(ms(10_000)).await;
            tracker.record(file.clone(), Instant::now());
            sleep(ms(3_000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        assert_eq!(backend.queries().len(), 2);
        assert_eq!(stats.analyses, 2);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_contained() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![Step::Fail(BackendError::Malformed("garbage".to_string()))]);
        let mut orch = orchestrator(&backend, true, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            tracker.record(file.clone(), Instant::now());
            sleep(ms(4000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_approved_fix_is_applied_write_enabled() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![
            Step::Reply(Reply::text("Bug: missing newline")),
            Step::Reply(Reply::text("Done")),
        ]);
        let mut orch = orchestrator(&backend, true, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            tracker.record(file.clone(), Instant::now());
            sleep(ms(4000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        let modes: Vec<Mode> = backend.queries().iter().map(|q| q.mode).collect();
        assert_eq!(modes, vec![Mode::ReadOnly, Mode::WriteEnabled]);
        assert_eq!(stats.fixes_applied, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_fix_is_not_applied() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![
            Step::Reply(Reply::text("Bug: missing newline")),
            Step::Reply(Reply::text("Done")),
        ]);
        let mut orch = orchestrator(&backend, false, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            tracker.record(file.clone(), Instant::now());
            sleep(ms(4000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        assert_eq!(backend.queries().len(), 1);
        assert_eq!(stats.fixes_declined, 1);
        assert_eq!(stats.fixes_applied, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![]);
        let mut orch = orchestrator(&backend, true, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            tracker.record(temp_dir.path().join("gone.py"), Instant::now());
            sleep(ms(4000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        assert!(backend.queries().is_empty());
        assert_eq!(stats.analyses, 0);
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_analysis() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![Step::Hang]);
        let mut orch = orchestrator(&backend, true, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();

        let edits = async {
            tracker.record(file.clone(), Instant::now());
            sleep(ms(5000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        assert_eq!(backend.queries().len(), 1);
        assert_eq!(backend.completed(), 0);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_apply() {
        let (_dir, file) = project();
        let tracker = ChangeTracker::new(ms(2000));
        let backend = ScriptedBackend::new(vec![
            Step::Reply(Reply::text("Bug: wrong operator")),
            Step::Slow(ms(10_000), Reply::text("Done")),
        ]);
        let mut orch = orchestrator(&backend, true, AgentConfig::default());
        let (tx, shutdown) = shutdown_signal();
        let started = Instant::now();

        let edits = async {
            tracker.record(file.clone(), Instant::now());
            // Review finishes around 2.5s; the apply is still running at 4s
            sleep(ms(4000)).await;
            let _ = tx.send(());
        };

        let (stats, ()) = tokio::join!(run(&tracker, &mut orch, POLL, shutdown), edits);

        assert_eq!(backend.completed(), 2);
        assert_eq!(stats.fixes_applied, 1);
        assert!(started.elapsed() >= ms(12_000));
    }
}
