//! Monitor participant loop.

use scholar_bus::Mailbox;
use scholar_proto::{Clock, Envelope};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::log::EventLog;
use crate::report::MetricsReport;

/// Appends every monitoring event it receives, then reports at shutdown.
#[derive(Debug)]
pub struct MonitorService {
    log: EventLog,
    clock: Clock,
    started: f64,
}

impl MonitorService {
    /// Creates a monitor whose runtime is measured from now.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::with_log(clock, EventLog::new())
    }

    /// Creates a monitor appending to an existing log.
    #[must_use]
    pub fn with_log(clock: Clock, log: EventLog) -> Self {
        Self {
            log,
            clock,
            started: clock.now(),
        }
    }

    /// Handle on the log being filled.
    #[must_use]
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// Runs until `cancel` fires or the mailbox closes, then replays the log.
    pub async fn run(self, mut mailbox: Mailbox, cancel: CancellationToken) -> MetricsReport {
        info!(endpoint = %mailbox.identity(), "monitor online, logging events");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    // Events already queued were sent before shutdown.
                    while let Some(envelope) = mailbox.try_recv() {
                        self.record(&envelope);
                    }
                    debug!("monitor shutting down");
                    break;
                }
                received = mailbox.recv() => {
                    let Some(envelope) = received else {
                        warn!("monitor mailbox closed");
                        break;
                    };
                    self.record(&envelope);
                }
            }
        }

        let runtime = self.clock.now() - self.started;
        let report = self.log.report(runtime);
        info!(
            events = report.total_events,
            completed = report.completion.completed,
            started = report.completion.started,
            "monitor report ready"
        );
        report
    }

    fn record(&self, envelope: &Envelope) {
        match self.log.ingest(envelope, self.clock.now()) {
            Ok(()) => debug!(from = %envelope.sender, logged = self.log.len(), "event logged"),
            Err(e) => warn!(from = %envelope.sender, error = %e, "dropping event"),
        }
    }
}
