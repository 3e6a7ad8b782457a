// Pick-deadline timer. Each draft carries one; when a turn's time limit
// lapses the timer asks the engine to make the pick automatically.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::engine::DraftEngine;

/// Deadline tracker for a single draft. Lives inside the draft's registry
/// entry, so arming and disarming always happen under the same lock that
/// guards pick handling.
#[derive(Debug, Default)]
pub struct AutopickTimer {
    /// Bumped on every arm and disarm. A fired deadline only counts when its
    /// generation still matches, which neutralizes stale timers from turns
    /// that already resolved.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl AutopickTimer {
    /// Arm a deadline for the turn at `overall`. Any previously armed
    /// deadline is cancelled first. Returns the generation the spawned task
    /// will present back to the engine.
    pub fn arm(
        &mut self,
        engine: &DraftEngine,
        draft_id: &str,
        overall: u32,
        limit: Duration,
    ) -> u64 {
        self.disarm();
        let generation = self.generation;
        let engine = engine.clone();
        let draft_id = draft_id.to_string();
        // Anchor the deadline now; the spawned task may not poll immediately.
        let deadline = Instant::now() + limit;
        debug!(
            "Armed autopick deadline for draft {} pick #{} ({:?})",
            draft_id, overall, limit
        );
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            engine.deadline_elapsed(&draft_id, overall, generation).await;
        }));
        generation
    }

    /// Cancel any pending deadline.
    pub fn disarm(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// True when `generation` refers to the currently armed deadline.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

impl Drop for AutopickTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
