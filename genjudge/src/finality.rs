use std::time::Duration;

/// How long to wait for a transaction to be accepted: a fixed number of status checks at a fixed interval.
///
/// The wait after every unsuccessful check, including the last, means that giving up takes exactly
/// `retries * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalityPolicy {
    pub retries: u32,
    pub interval: Duration,
}

impl Default for FinalityPolicy {
    fn default() -> Self {
        FinalityPolicy {
            retries: 80,
            interval: Duration::from_millis(5000),
        }
    }
}

/// A single status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based.
    pub number: u32,
    /// How long to wait after this check if the transaction is still in progress.
    pub wait: Duration,
}

impl FinalityPolicy {
    pub fn attempts(&self) -> impl Iterator<Item = Attempt> + use<> {
        let wait = self.interval;
        (1..=self.retries).map(move |number| Attempt { number, wait })
    }

    pub fn max_wait(&self) -> Duration {
        self.interval * self.retries
    }
}
