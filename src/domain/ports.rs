use chrono::{DateTime, Utc};

/// Source of the current instant.
///
/// Trades are stamped and exchange windows are anchored through this port so
/// that tests can pin time instead of racing the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
