//! Pure eligibility rules for holds. Nothing here reads the clock or the
//! database; callers pass `today` and the membership's open holds.

use chrono::{Duration, NaiveDate};
use models::{HoldStatus, MembershipStatus};
use uuid::Uuid;

use super::domain::{Assessment, Hold, Membership, OverlapKind, Scenario};
use super::errors::Rejection;

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Start date actually used for a request: an Upcoming membership never
/// holds before its own start.
pub fn effective_start(membership: &Membership, start: NaiveDate) -> NaiveDate {
    if membership.status == MembershipStatus::Upcoming && start < membership.start_date_loc {
        membership.start_date_loc
    } else {
        start
    }
}

/// Validate a requested interval and return the effective start.
pub fn validate_dates(
    membership: &Membership,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    max_days: i64,
) -> Result<NaiveDate, Rejection> {
    let start = effective_start(membership, start);
    if start < today {
        return Err(Rejection::StartInPast { start, today });
    }
    if end <= start {
        return Err(Rejection::EndNotAfterStart { start, end });
    }
    check_length(start, end, max_days)?;
    Ok(start)
}

pub fn check_length(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<(), Rejection> {
    let days = days_between(start, end);
    if days > max_days {
        return Err(Rejection::TooLong { days, max: max_days });
    }
    Ok(())
}

/// Fails if any open hold other than `exclude` is already Active.
pub fn check_active_holds(holds: &[Hold], exclude: &[Uuid]) -> Result<(), Rejection> {
    match holds
        .iter()
        .find(|h| !h.is_canceled && h.status == HoldStatus::Active && !exclude.contains(&h.id))
    {
        Some(active) => Err(Rejection::ActiveHoldExists { hold_id: active.id }),
        None => Ok(()),
    }
}

/// Classify how `[start, end]` intersects `existing`; both are closed.
pub fn overlap_kind(existing: &Hold, start: NaiveDate, end: NaiveDate) -> Option<OverlapKind> {
    let (es, ee) = (existing.start_date, existing.end_date);
    if es <= start && ee >= end {
        Some(OverlapKind::InsideExisting)
    } else if start <= es && end >= ee {
        Some(OverlapKind::ContainsExisting)
    } else if es <= start && start <= ee {
        Some(OverlapKind::StartsInsideExisting)
    } else if es <= end && end <= ee {
        Some(OverlapKind::EndsInsideExisting)
    } else {
        None
    }
}

/// First open hold (in slice order) intersecting `[start, end]`.
pub fn first_overlap<'a>(
    holds: &'a [Hold],
    start: NaiveDate,
    end: NaiveDate,
    exclude: &[Uuid],
) -> Option<(&'a Hold, OverlapKind)> {
    holds
        .iter()
        .filter(|h| h.is_open() && !exclude.contains(&h.id))
        .find_map(|h| overlap_kind(h, start, end).map(|kind| (h, kind)))
}

pub fn check_overlapping_holds(
    holds: &[Hold],
    start: NaiveDate,
    end: NaiveDate,
    exclude: &[Uuid],
) -> Result<(), Rejection> {
    match first_overlap(holds, start, end, exclude) {
        Some((hold, kind)) => Err(Rejection::Overlap { hold_id: hold.id, kind }),
        None => Ok(()),
    }
}

/// Count and day limits for one additional hold of `duration_days`.
/// A limit of 0 means unlimited.
pub fn check_limits(membership: &Membership, duration_days: i64) -> Result<(), Rejection> {
    let limit = membership.hold_limit_count;
    if limit > 0 && membership.hold_count >= limit {
        return Err(Rejection::CountLimitReached { count: membership.hold_count, limit });
    }
    check_day_limit(membership, duration_days)
}

/// Day limit only. A shrinking hold (`additional_days <= 0`) always passes.
pub fn check_day_limit(membership: &Membership, additional_days: i64) -> Result<(), Rejection> {
    let limit = membership.hold_limit_days;
    if limit > 0 && additional_days > 0 && i64::from(membership.hold_days) + additional_days > i64::from(limit) {
        return Err(Rejection::DaysLimitExceeded {
            used: membership.hold_days,
            requested: additional_days,
            limit,
        });
    }
    Ok(())
}

pub fn check_enablement(membership: &Membership) -> Result<(), Rejection> {
    if !membership.is_hold_enabled {
        return Err(Rejection::HoldsDisabled);
    }
    if !membership.can_be_modified {
        return Err(Rejection::NotModifiable);
    }
    Ok(())
}

pub fn check_membership_status(membership: &Membership) -> Result<(), Rejection> {
    if !membership.accepts_holds() {
        return Err(Rejection::InactiveMembership { status: membership.status });
    }
    Ok(())
}

/// Eligibility of a new hold, in order: membership status, dates, overlap,
/// active hold.
pub fn assess_new_hold(
    membership: &Membership,
    start: NaiveDate,
    end: NaiveDate,
    open_holds: &[Hold],
    today: NaiveDate,
    max_days: i64,
) -> Result<Assessment, Rejection> {
    check_membership_status(membership)?;
    let start = validate_dates(membership, start, end, today, max_days)?;
    check_overlapping_holds(open_holds, start, end, &[])?;
    check_active_holds(open_holds, &[])?;
    let scenario = match membership.status {
        MembershipStatus::Upcoming => Scenario::UpcomingMembershipNewHold,
        _ => Scenario::ActiveMembershipNewHold,
    };
    Ok(Assessment { scenario, start, end })
}
