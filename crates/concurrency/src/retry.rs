use std::time::Duration;

/// Maps a delivery's attempt count to how long the queue should wait
/// before redelivering.
///
/// The default schedule is deliberately coarse — `3s, 30s, 300s, 1h`,
/// saturating at the last entry — exactness is the queue's job, not the
/// coordinator's; this only needs to back off quickly enough that a
/// flapping dependency doesn't thrash, and slowly enough that a genuinely
/// transient failure still recovers within a few minutes.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    schedule: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            schedule: vec![
                Duration::from_secs(3),
                Duration::from_secs(30),
                Duration::from_secs(300),
                Duration::from_secs(3600),
            ],
        }
    }
}

impl RetryPolicy {
    /// Build a policy from an explicit schedule. Panics if `schedule` is
    /// empty — a policy with no entries cannot answer `next`.
    pub fn new(schedule: Vec<Duration>) -> Self {
        assert!(!schedule.is_empty(), "retry schedule must not be empty");
        Self { schedule }
    }

    /// The delay to wait before the next attempt. `attempt` is 1-based (the
    /// queue's own redelivery counter); attempts beyond the schedule's
    /// length saturate at its last entry.
    pub fn next(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1) as usize;
        let idx = (attempt - 1).min(self.schedule.len() - 1);
        self.schedule[idx]
    }
}
