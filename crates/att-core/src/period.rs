//! Resolving and classifying academic periods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::Period;
use crate::error::{CollaboratorExt, EntityKind, Error, Result};
use crate::store::Store;
use crate::types::PeriodId;

/// Whether aggregation may run for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Current or past.
    Active,
    /// Starts after today.
    Future,
}

/// `Future` iff `today` is before the period's first day.
pub fn classify(period: &Period, today: NaiveDate) -> PeriodStatus {
    if today < period.start_date {
        PeriodStatus::Future
    } else {
        PeriodStatus::Active
    }
}

/// Classifies an optional period; `None` means all time and is always active.
pub fn classify_scope(period: Option<&Period>, today: NaiveDate) -> PeriodStatus {
    period.map_or(PeriodStatus::Active, |p| classify(p, today))
}

/// Looks up a period reference. `None` (all time) resolves to `None`.
pub fn resolve<S: Store>(store: &S, period_id: Option<PeriodId>) -> Result<Option<Period>> {
    let Some(id) = period_id else {
        return Ok(None);
    };
    store
        .period(id)
        .collab()?
        .map(Some)
        .ok_or_else(|| Error::not_found(EntityKind::Period, id))
}

/// The period a session starting on `date` is tagged with.
///
/// Overlapping periods resolve to the lowest id.
pub fn containing(periods: &[Period], date: NaiveDate) -> Option<&Period> {
    periods
        .iter()
        .filter(|p| p.contains(date))
        .min_by_key(|p| p.id)
}
