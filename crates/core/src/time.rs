//! Effective file age and retention cutoffs

use crate::model::{Entry, TimeBasis, TimeUnit};
use chrono::{DateTime, Days, Months, Utc};
use std::num::NonZeroU32;

/// Source of "now" for a retention run
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Instant used to age an entry under the given time basis
///
/// Modification time is the fallback. A creation time of 0 means "not
/// recorded", so files genuinely created at the epoch are aged by mtime.
///
/// A timestamp outside the representable range is replaced by the other
/// one. If neither is usable the entry is treated as newest possible and is
/// never expired.
pub fn effective_time(entry: &Entry, basis: TimeBasis) -> DateTime<Utc> {
    let recorded_creation = (entry.created_at != 0).then_some(entry.created_at);

    let (primary, fallback) = match basis {
        TimeBasis::CreationTime if entry.created_at != 0 => {
            (entry.created_at, Some(entry.modified_at))
        }
        TimeBasis::ModificationTime if entry.modified_at < entry.created_at => {
            tracing::debug!(
                file_id = %entry.id,
                "Upload time is newer than modification time, continuing with that"
            );
            (entry.created_at, Some(entry.modified_at))
        }
        _ => (entry.modified_at, recorded_creation),
    };

    if let Some(time) = from_unix(primary) {
        return time;
    }

    tracing::debug!(file_id = %entry.id, timestamp = primary, "File timestamp is out of range");
    match fallback.and_then(from_unix) {
        Some(time) => time,
        None => {
            tracing::debug!(file_id = %entry.id, "No usable timestamp, file will be kept");
            DateTime::<Utc>::MAX_UTC
        }
    }
}

/// Expiry and warning cutoffs, computed once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoffs {
    /// Files aged strictly before this are disposed of
    pub expiry: DateTime<Utc>,
    /// Files aged strictly before this (but not expired) get a warning
    pub warning: DateTime<Utc>,
}

impl Cutoffs {
    pub fn compute(now: DateTime<Utc>, unit: TimeUnit, amount: NonZeroU32) -> Self {
        let expiry = expiry_cutoff(now, unit, amount);
        Self {
            expiry,
            warning: warning_cutoff(expiry),
        }
    }

    pub fn is_expired(&self, time: DateTime<Utc>) -> bool {
        time < self.expiry
    }

    /// Past the warning cutoff but not yet expired
    pub fn is_due_for_warning(&self, time: DateTime<Utc>) -> bool {
        !self.is_expired(time) && time < self.warning
    }
}

/// `now - amount × unit`, subtracting calendar months and years
///
/// Month arithmetic clamps to the end of the month, so one month before
/// March 31st is the last day of February. Saturates at the earliest
/// representable instant.
pub fn expiry_cutoff(now: DateTime<Utc>, unit: TimeUnit, amount: NonZeroU32) -> DateTime<Utc> {
    let amount = amount.get();
    let cutoff = match unit {
        TimeUnit::Day => now.checked_sub_days(Days::new(u64::from(amount))),
        TimeUnit::Week => now.checked_sub_days(Days::new(u64::from(amount) * 7)),
        TimeUnit::Month => now.checked_sub_months(Months::new(amount)),
        TimeUnit::Year => amount
            .checked_mul(12)
            .and_then(|months| now.checked_sub_months(Months::new(months))),
    };

    cutoff.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// One calendar day after the expiry cutoff
pub fn warning_cutoff(expiry: DateTime<Utc>) -> DateTime<Utc> {
    expiry
        .checked_add_days(Days::new(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
