/// Outcome of evaluating the retry policy for a failed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enqueue via a delay queue. `next_attempt` is the retry count
    /// embedded in the re-published item.
    Retry { next_attempt: u32, delay_secs: u64 },

    /// All attempts exhausted; the item must be dead-lettered.
    GiveUp,
}

/// Bounded retry with a fixed per-tier delay schedule.
///
/// The tier table is indexed by the pre-increment retry count of the
/// failing attempt; counts past the end of the table reuse the last
/// tier. The delay itself is realized by broker queue topology, not by
/// any in-process timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_tiers: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_tiers: vec![60, 300, 900],
        }
    }
}

impl RetryPolicy {
    pub fn decide(&self, retry_count: u32) -> RetryDecision {
        if retry_count >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let delay_secs = self
            .delay_tiers
            .get(retry_count as usize)
            .or_else(|| self.delay_tiers.last())
            .copied()
            .unwrap_or(0);

        RetryDecision::Retry {
            next_attempt: retry_count + 1,
            delay_secs,
        }
    }
}
