//! Persisted status enums. Stored as small integers; the in-memory value is
//! always one of these variants.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a membership (`org_user_plan.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[sea_orm(num_value = 1)]
    Active,
    #[sea_orm(num_value = 2)]
    Upcoming,
    #[sea_orm(num_value = 3)]
    Hold,
    #[sea_orm(num_value = 4)]
    Expired,
    #[sea_orm(num_value = 5)]
    Canceled,
    #[sea_orm(num_value = 6)]
    Deleted,
    #[sea_orm(num_value = 7)]
    Pending,
}

impl MembershipStatus {
    /// Statuses that are derived from the membership's own date window and
    /// may therefore be recomputed when a hold ends.
    pub fn is_date_driven(self) -> bool {
        matches!(self, Self::Active | Self::Upcoming | Self::Hold | Self::Expired)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Upcoming => "upcoming",
            Self::Hold => "hold",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
            Self::Deleted => "deleted",
            Self::Pending => "pending",
        }
    }
}

/// Status of a single hold (`org_user_plan_hold.status`).
///
/// `Upcoming -> Active -> Expired`, and `{Upcoming, Active} -> Canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    #[sea_orm(num_value = 1)]
    Upcoming,
    #[sea_orm(num_value = 2)]
    Active,
    #[sea_orm(num_value = 3)]
    Expired,
    #[sea_orm(num_value = 4)]
    Canceled,
}

impl HoldStatus {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Upcoming | Self::Active)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveEnum;

    #[test]
    fn hold_status_round_trips_through_db_value() {
        assert_eq!(HoldStatus::Active.to_value(), 2);
        assert_eq!(HoldStatus::try_from_value(&4).unwrap(), HoldStatus::Canceled);
        assert!(HoldStatus::try_from_value(&9).is_err());
    }

    #[test]
    fn only_upcoming_and_active_are_open() {
        assert!(HoldStatus::Upcoming.is_open());
        assert!(HoldStatus::Active.is_open());
        assert!(HoldStatus::Expired.is_terminal());
        assert!(HoldStatus::Canceled.is_terminal());
    }

    #[test]
    fn canceled_membership_is_not_date_driven() {
        assert!(MembershipStatus::Hold.is_date_driven());
        assert!(!MembershipStatus::Canceled.is_date_driven());
        assert!(!MembershipStatus::Pending.is_date_driven());
        assert_eq!(serde_json::to_string(&MembershipStatus::Hold).unwrap(), "\"hold\"");
    }
}
