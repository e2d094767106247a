//! Drives a session's countdown from a tokio interval.

use std::time::Duration;

use talk_core::{SessionHandle, SessionPhase};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// Call `tick()` every `period` until the session leaves Active.
///
/// The task returns the number of ticks it delivered. Ticks take the same
/// lock as `send` and `submit_decision`, so they never interleave with an
/// in-flight operation.
pub fn spawn_ticker(handle: SessionHandle, period: Duration) -> JoinHandle<u32> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        let mut ticks = 0;

        while handle.phase() == SessionPhase::Active {
            interval.tick().await;
            // Abandoned while we slept
            if handle.phase() != SessionPhase::Active {
                break;
            }

            let outcome = handle.tick();
            ticks += 1;
            debug!(session_id = %handle.id(), remaining = outcome.remaining_seconds, "Tick");
            if outcome.phase_changed {
                info!(session_id = %handle.id(), ticks, "Countdown finished");
                break;
            }
        }
        ticks
    })
}
