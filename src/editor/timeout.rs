use std::time::{Duration, Instant};

/// One scheduled expiry. `enabled` is a cancellation flag: a superseded
/// timer stays queued until its deadline passes, it just no longer acts.
#[derive(Debug)]
struct PendingExpiry {
    deadline: Instant,
    enabled: bool,
}

/// Single-slot, cancel-and-replace expiry timer for prefix mode.
///
/// Arming disables the previously armed instance, so at most one timer
/// can ever produce a visible effect even when rapid re-entry leaves
/// several in flight. Driven with caller-supplied `Instant`s from the
/// event loop, which also keeps the tests free of sleeps.
#[derive(Debug, Default)]
pub struct PrefixTimeout {
    pending: Vec<PendingExpiry>,
}

impl PrefixTimeout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an expiry at `now + timeout`, superseding any live timer.
    pub fn arm(&mut self, now: Instant, timeout: Duration) {
        if let Some(last) = self.pending.last_mut() {
            last.enabled = false;
        }
        self.pending.push(PendingExpiry {
            deadline: now + timeout,
            enabled: true,
        });
    }

    /// Drain timers whose deadline has passed. Returns true if a still
    /// enabled one fired, in which case the caller clears the mode.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        let mut fired = false;
        self.pending.retain(|p| {
            if p.deadline <= now {
                if p.enabled {
                    fired = true;
                }
                false
            } else {
                true
            }
        });
        fired
    }
}

/// Convert the configured float seconds into a timeout, truncating to
/// whole milliseconds.
pub fn combination_timeout(seconds: f64) -> Duration {
    Duration::from_millis((seconds * 1000.0) as u64)
}
