//! Environment abstraction for deterministic testing.
//!
//! Decouples chat logic from the system clock. Production uses real monotonic
//! and wall-clock time; simulation uses a manually advanced virtual clock so
//! debounce windows and poll intervals can be tested without sleeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Abstract environment providing time and async sleep.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context.
/// - `wall_clock()` is only used for display (day labels), never for
///   ordering or timeouts.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`; simulation uses a virtual
    /// instant.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current calendar time, for day labels in the transcript.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Sleeps for the specified duration.
    ///
    /// Only driver and runtime code may sleep; state machines never do.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
