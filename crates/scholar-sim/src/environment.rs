//! Periodic availability perturbations.

use rand::seq::SliceRandom;
use rand::Rng;
use scholar_bus::Outbox;
use scholar_proto::bodies::AvailabilityOverride;
use scholar_proto::{Clock, Identity, Performative, Protocol};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Every `period` units, tells one random tutor a random availability.
#[derive(Debug)]
pub struct Environment {
    tutors: Vec<Identity>,
    period: f64,
    outbox: Outbox,
    clock: Clock,
}

impl Environment {
    /// Creates an environment perturbing `tutors`.
    #[must_use]
    pub fn new(tutors: Vec<Identity>, period: f64, outbox: Outbox, clock: Clock) -> Self {
        Self {
            tutors,
            period,
            outbox,
            clock,
        }
    }

    /// Runs until `cancel` fires. Returns how many changes were delivered.
    pub async fn run(self, cancel: CancellationToken) -> usize {
        let mut delivered = 0;
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.clock.sleep(self.period) => {}
            }

            let Some((tutor, available)) = self.pick() else {
                continue;
            };
            let body = match serde_json::to_string(&AvailabilityOverride { available }) {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "availability change not encoded");
                    continue;
                }
            };
            match self
                .outbox
                .send(Protocol::Environment, Performative::Inform, &tutor, body)
            {
                Ok(_) => {
                    delivered += 1;
                    info!(tutor = %tutor, available, "environment changed tutor availability");
                }
                Err(e) => warn!(tutor = %tutor, error = %e, "availability change not delivered"),
            }
        }
        delivered
    }

    fn pick(&self) -> Option<(Identity, bool)> {
        let mut rng = rand::thread_rng();
        let tutor = self.tutors.choose(&mut rng)?.clone();
        Some((tutor, rng.gen_bool(0.5)))
    }
}
