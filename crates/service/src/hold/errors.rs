use chrono::NaiveDate;
use models::{HoldStatus, MembershipStatus};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::domain::OverlapKind;

/// A business rule refused the operation. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("hold start {start} is before today ({today})")]
    StartInPast { start: NaiveDate, today: NaiveDate },
    #[error("hold end {end} must be after start {start}")]
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },
    #[error("hold of {days} days exceeds the {max}-day maximum")]
    TooLong { days: i64, max: i64 },
    #[error("membership already has an active hold ({hold_id})")]
    ActiveHoldExists { hold_id: Uuid },
    #[error("dates overlap hold {hold_id} ({kind:?})")]
    Overlap { hold_id: Uuid, kind: OverlapKind },
    #[error("hold count limit reached ({count}/{limit})")]
    CountLimitReached { count: i32, limit: i32 },
    #[error("hold day limit exceeded ({used} used + {requested} requested > {limit})")]
    DaysLimitExceeded { used: i32, requested: i64, limit: i32 },
    #[error("holds are disabled for this membership")]
    HoldsDisabled,
    #[error("membership cannot be modified")]
    NotModifiable,
    #[error("membership status {status:?} does not accept holds")]
    InactiveMembership { status: MembershipStatus },
    #[error("hold is already canceled")]
    AlreadyCanceled,
    #[error("hold has already expired")]
    AlreadyExpired,
    #[error("hold has not started yet")]
    NotStarted,
    #[error("hold in status {status:?} cannot be modified")]
    StatusNotModifiable { status: HoldStatus },
    #[error("start date of an active hold cannot change")]
    StartImmutable,
}

/// Classification used by bulk reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidDates,
    ActiveHoldExists,
    OverlappingHolds,
    InactiveMembership,
    LimitExceeded,
    HoldsDisabled,
    InvalidState,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidDates => "invalid_dates",
            Self::ActiveHoldExists => "active_hold_exists",
            Self::OverlappingHolds => "overlapping_holds",
            Self::InactiveMembership => "inactive_membership",
            Self::LimitExceeded => "limit_exceeded",
            Self::HoldsDisabled => "holds_disabled",
            Self::InvalidState => "invalid_state",
        }
    }
}

impl Rejection {
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::StartInPast { .. }
            | Self::EndNotAfterStart { .. }
            | Self::TooLong { .. }
            | Self::StartImmutable => SkipReason::InvalidDates,
            Self::ActiveHoldExists { .. } => SkipReason::ActiveHoldExists,
            Self::Overlap { .. } => SkipReason::OverlappingHolds,
            Self::InactiveMembership { .. } => SkipReason::InactiveMembership,
            Self::CountLimitReached { .. } | Self::DaysLimitExceeded { .. } => SkipReason::LimitExceeded,
            Self::HoldsDisabled | Self::NotModifiable => SkipReason::HoldsDisabled,
            Self::AlreadyCanceled | Self::AlreadyExpired | Self::NotStarted | Self::StatusNotModifiable { .. } => {
                SkipReason::InvalidState
            }
        }
    }
}

/// Errors from hold operations
#[derive(Debug, Error)]
pub enum HoldError {
    #[error("hold rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl HoldError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            HoldError::Rejected(_) => 2001,
            HoldError::NotFound(_) => 2004,
            HoldError::Persistence(_) => 2100,
        }
    }

    /// Infrastructure failure, as opposed to a per-item business outcome.
    pub fn is_systemic(&self) -> bool {
        matches!(self, HoldError::Persistence(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            HoldError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for HoldError {
    fn from(e: sea_orm::DbErr) -> Self { HoldError::Persistence(e.to_string()) }
}
