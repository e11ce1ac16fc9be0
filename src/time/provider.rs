use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::local_date::LocalDate;

/// Abstraction over "now", so the engine never calls `Utc::now()` directly.
///
/// Per the concurrency contract, `now()` is called at most once per
/// scheduling run; the returned instant is threaded through explicitly from
/// there on.
pub trait TimeProvider: std::fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn local_date_string(&self, instant: &DateTime<Utc>) -> LocalDate {
        LocalDate::from_instant(instant)
    }
}

/// Production `TimeProvider`: real wall-clock time, with a test-only override
/// that can be toggled without swapping the provider instance out.
#[derive(Debug, Default)]
pub struct SystemTimeProvider {
    override_instant: Mutex<Option<DateTime<Utc>>>,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-only: pin `now()` to a fixed instant.
    pub fn set_override(&self, instant: DateTime<Utc>) {
        *self.override_instant.lock().unwrap() = Some(instant);
    }

    pub fn clear_override(&self) {
        *self.override_instant.lock().unwrap() = None;
    }

    pub fn is_overridden(&self) -> bool {
        self.override_instant.lock().unwrap().is_some()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        self.override_instant
            .lock()
            .unwrap()
            .unwrap_or_else(Utc::now)
    }
}

/// A `TimeProvider` fixed to a single instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(pub DateTime<Utc>);

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn system_provider_override_round_trips() {
        let provider = SystemTimeProvider::new();
        assert!(!provider.is_overridden());
        let fixed = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        provider.set_override(fixed);
        assert!(provider.is_overridden());
        assert_eq!(provider.now(), fixed);
        provider.clear_override();
        assert!(!provider.is_overridden());
    }

    #[test]
    fn fixed_provider_is_constant() {
        let fixed = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let provider = FixedTimeProvider(fixed);
        assert_eq!(provider.now(), fixed);
        assert_eq!(provider.now(), provider.now());
    }
}
