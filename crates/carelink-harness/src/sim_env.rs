//! Virtual-time environment.
//!
//! Time only moves when a test calls [`SimEnv::advance`] (or something awaits
//! [`Environment::sleep`]), so debounce windows and poll intervals are exact
//! and reproducible.

use std::{
    ops::Sub,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use carelink_core::env::Environment;
use chrono::{DateTime, TimeDelta, Utc};

/// Virtual monotonic instant, in milliseconds since the simulation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(u64);

impl SimInstant {
    /// Milliseconds since the simulation started.
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

/// Simulation environment with a shared virtual clock.
///
/// Clones share the clock, so a test, its driver and its mock server all see
/// the same time.
#[derive(Debug, Clone)]
pub struct SimEnv {
    millis: Arc<AtomicU64>,
    epoch: DateTime<Utc>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Wall clock starts at 2024-03-15 09:00 UTC.
    pub fn new() -> Self {
        Self::starting_at(DateTime::from_timestamp(1_710_493_200, 0).unwrap_or_default())
    }

    /// Environment whose wall clock starts at `epoch`.
    pub fn starting_at(epoch: DateTime<Utc>) -> Self {
        Self { millis: Arc::new(AtomicU64::new(0)), epoch }
    }

    /// Move time forward.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Time elapsed since the simulation started.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.millis.load(Ordering::SeqCst))
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::milliseconds(self.millis.load(Ordering::SeqCst) as i64);
        self.epoch + elapsed
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();
        let start = env.now();

        other.advance(Duration::from_secs(2));

        assert_eq!(env.now() - start, Duration::from_secs(2));
        assert_eq!(env.wall_clock() - other.wall_clock(), TimeDelta::zero());
    }

    #[test]
    fn sleep_advances_virtual_time() {
        let env = SimEnv::new();
        let before = env.wall_clock();
        drop(env.sleep(Duration::from_millis(1500)));

        assert_eq!(env.elapsed(), Duration::from_millis(1500));
        assert_eq!(env.wall_clock() - before, TimeDelta::milliseconds(1500));
    }
}
