//! Fixed-interval poll schedule.
//!
//! Drives unread-count polling. The timer never fires on its own: the owner
//! calls [`PollTimer::due`] on every tick and issues a fetch when it returns
//! `true`.

use std::{ops::Sub, time::Duration};

/// Default unread polling interval.
pub const DEFAULT_UNREAD_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Fixed-interval schedule.
///
/// # Invariants
///
/// - Fires at most once per `interval`.
/// - Never fires while stopped.
#[derive(Debug, Clone)]
pub struct PollTimer<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    interval: Duration,
    last_fired: Option<I>,
}

impl<I> PollTimer<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Stopped timer with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_fired: None }
    }

    /// Start the schedule. The caller fetches immediately; the next poll is
    /// due one interval after `now`.
    pub fn start(&mut self, now: I) {
        self.last_fired = Some(now);
    }

    /// Stop the schedule.
    pub fn stop(&mut self) {
        self.last_fired = None;
    }

    /// Whether the timer is running.
    pub fn is_running(&self) -> bool {
        self.last_fired.is_some()
    }

    /// Returns `true` and restarts the interval if a poll is due at `now`.
    pub fn due(&mut self, now: I) -> bool {
        match self.last_fired {
            Some(last) if now - last >= self.interval => {
                self.last_fired = Some(now);
                true
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn fires_once_per_interval() {
        let start = Instant::now();
        let mut timer = PollTimer::new(DEFAULT_UNREAD_POLL_INTERVAL);
        timer.start(start);

        assert!(!timer.due(start + Duration::from_secs(29)));
        assert!(timer.due(start + Duration::from_secs(30)));
        assert!(!timer.due(start + Duration::from_secs(31)));
        assert!(timer.due(start + Duration::from_secs(60)));
    }

    #[test]
    fn stopped_timer_never_fires() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(1));
        assert!(!timer.due(start + Duration::from_secs(5)));

        timer.start(start);
        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.due(start + Duration::from_secs(5)));
    }
}
