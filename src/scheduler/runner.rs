//! Instance monitor runner.
//!
//! Each tick lists every instance and:
//! 1. Sends nothing when the list is empty
//! 2. Otherwise sends one report with counts, per-instance blocks and the
//!    hourly cost of running instances
//! 3. On a listing failure sends an alert with the error detail instead
//!
//! Notification failures are logged and never stop the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::notifier::Notifier;
use crate::provider::InstanceProvider;
use crate::report::{StatusSummary, check_failed_alert, periodic_report};

/// Messages that can be sent to the monitor.
#[derive(Debug, Clone)]
pub enum MonitorMessage {
    /// Stop the monitor.
    Shutdown,
}

/// What a single check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No instances exist; nothing was sent.
    Idle,

    /// A report covering `total` instances was sent.
    Reported { total: usize, running: usize },

    /// Listing failed; an alert was sent.
    Failed,
}

/// Periodic instance checker.
pub struct InstanceMonitor {
    /// Source of the instance list checked on each tick.
    provider: Arc<dyn InstanceProvider>,

    /// Destination for reports and failure alerts.
    notifier: Arc<dyn Notifier>,

    /// Time between checks. Defaults to one hour.
    check_interval: Duration,
}

impl InstanceMonitor {
    /// Creates a new instance monitor.
    #[must_use]
    pub fn new(provider: Arc<dyn InstanceProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider,
            notifier,
            check_interval: Duration::from_secs(60 * 60),
        }
    }

    /// Sets the time between checks.
    #[must_use]
    pub const fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Runs the monitor loop.
    ///
    /// The first check happens immediately. Runs until `Shutdown` arrives
    /// or every sender is dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<MonitorMessage>) {
        info!(
            "Instance monitor started, checking every {} minutes",
            self.check_interval.as_secs() / 60
        );

        let mut check_timer = interval(self.check_interval);
        check_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = check_timer.tick() => {
                    let outcome = self.check_instances().await;
                    debug!("Instance check finished: {:?}", outcome);
                }
                msg = rx.recv() => {
                    match msg {
                        Some(MonitorMessage::Shutdown) | None => {
                            info!("Instance monitor shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Performs one check and pushes its notification, if any.
    pub async fn check_instances(&self) -> CheckOutcome {
        let instances = match self.provider.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                error!("Instance check failed: {}", e);
                self.send(&check_failed_alert(&e.to_string())).await;
                return CheckOutcome::Failed;
            }
        };

        if instances.is_empty() {
            debug!("No instances, skipping report");
            return CheckOutcome::Idle;
        }

        let summary = StatusSummary::from_instances(&instances);
        let report = periodic_report(&instances, Local::now().naive_local());
        self.send(&report).await;

        info!(
            "Reported {} instances ({} running)",
            summary.total, summary.running
        );

        CheckOutcome::Reported {
            total: summary.total,
            running: summary.running,
        }
    }

    async fn send(&self, text: &str) {
        if let Err(e) = self.notifier.notify(text).await {
            warn!("{}", e);
        }
    }
}

impl std::fmt::Debug for InstanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceMonitor")
            .field("check_interval", &self.check_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::provider::fake::FakeProvider;
    use crate::provider::{Instance, InstanceStatus};
    use crate::scheduler::NotifyError;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
        delivered: Notify,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_owned());
            self.delivered.notify_one();
            if self.fail {
                return Err(NotifyError::Send("chat not found".to_owned()));
            }
            Ok(())
        }
    }

    fn monitor(provider: FakeProvider, notifier: &Arc<RecordingNotifier>) -> InstanceMonitor {
        InstanceMonitor::new(Arc::new(provider), notifier.clone())
    }

    fn with_instances(instances: Vec<Instance>) -> FakeProvider {
        FakeProvider::new().with_instances(instances)
    }

    #[tokio::test]
    async fn test_empty_list_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(FakeProvider::new(), &notifier);

        assert_eq!(monitor.check_instances().await, CheckOutcome::Idle);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_empty_list_sends_one_report() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(
            with_instances(vec![
                Instance::new("a", "alpha", InstanceStatus::Running, 1.5),
                Instance::new("b", "beta", InstanceStatus::Running, 1.5),
                Instance::new("c", "gamma", InstanceStatus::Exited, 4.0),
            ]),
            &notifier,
        );

        assert_eq!(
            monitor.check_instances().await,
            CheckOutcome::Reported {
                total: 3,
                running: 2
            }
        );

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Instances: 3"));
        assert!(sent[0].contains("(running: 2)"));
        assert!(sent[0].contains("$3.0000"));
    }

    #[tokio::test]
    async fn test_listing_failure_sends_alert() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(FakeProvider::failing(401, "bad key"), &notifier);

        assert_eq!(monitor.check_instances().await, CheckOutcome::Failed);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("<b>[Error]</b> Instance check failed"));
        assert!(sent[0].contains("bad key"));
    }

    #[tokio::test]
    async fn test_notify_failure_is_swallowed() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let monitor = monitor(
            with_instances(vec![Instance::new("a", "alpha", InstanceStatus::Running, 1.0)]),
            &notifier,
        );

        assert!(matches!(
            monitor.check_instances().await,
            CheckOutcome::Reported { .. }
        ));
    }

    #[tokio::test]
    async fn test_run_checks_immediately_and_stops_on_shutdown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(
            with_instances(vec![Instance::new("a", "alpha", InstanceStatus::Running, 1.0)]),
            &notifier,
        );

        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move { monitor.run(rx).await });

        notifier.delivered.notified().await;
        tx.send(MonitorMessage::Shutdown).await.unwrap();
        handle.await.unwrap();

        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(FakeProvider::new(), &notifier);

        let (tx, rx) = mpsc::channel::<MonitorMessage>(1);
        drop(tx);
        monitor.run(rx).await;
        assert!(notifier.sent().is_empty());
    }
}
