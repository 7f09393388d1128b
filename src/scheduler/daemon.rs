use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::scheduler::{PassContext, Scheduler, cadence::PollCadence};

/// Spawns the periodic radar pass loop. The first pass runs immediately.
///
/// Use `cancel_token.cancel()` to stop the loop; an in-flight pass is dropped.
#[must_use]
pub fn spawn_poll_daemon(
    scheduler: Scheduler,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    PollDaemon::new(scheduler, PollCadence::new(interval)).spawn(cancel_token)
}

struct PollDaemon {
    scheduler: Scheduler,
    cadence: PollCadence,
}

impl PollDaemon {
    fn new(scheduler: Scheduler, cadence: PollCadence) -> Self {
        Self { scheduler, cadence }
    }

    fn spawn(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel_token).await })
    }

    async fn run(self, cancel_token: CancellationToken) {
        info!(
            interval_seconds = self.cadence.interval().as_secs(),
            "radar poll daemon started"
        );
        let anchor = Utc::now();

        loop {
            let context = PassContext::scheduled();
            tokio::select! {
                () = cancel_token.cancelled() => break,
                outcome = self.scheduler.run_pass(context) => {
                    if let Err(err) = outcome {
                        error!(pass_id = %context.pass_id, error = %err, "scheduled radar pass failed");
                    }
                }
            }

            let now = Utc::now();
            let next = self.cadence.next_run_from(anchor, now);
            let wait = duration_until(next, now);
            info!(
                next_run_utc = %next.to_rfc3339(),
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "scheduled next radar pass"
            );

            tokio::select! {
                () = cancel_token.cancelled() => break,
                () = sleep(wait) => {}
            }
        }

        info!("radar poll daemon shutdown complete");
    }
}

fn duration_until(next: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
