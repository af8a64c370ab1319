use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Membership = models::org_user_plan::Model;
pub type Hold = models::org_user_plan_hold::Model;

/// Request to place a hold on a membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub notify_email: bool,
    #[serde(default)]
    pub notify_push: bool,
}

/// Change to an existing hold. `start` is ignored when it matches the
/// current start; an Active hold rejects any other value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyHold {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub notify_email: bool,
    #[serde(default)]
    pub notify_push: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndHold {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub ended_by: Option<String>,
    #[serde(default)]
    pub notify_email: bool,
    #[serde(default)]
    pub notify_push: bool,
}

/// Per-membership hold switches. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHoldSettings {
    #[serde(default)]
    pub is_hold_enabled: Option<bool>,
    #[serde(default)]
    pub can_be_modified: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelHold {
    #[serde(default)]
    pub note: Option<String>,
}

/// How a candidate interval intersects an existing hold (closed intervals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapKind {
    /// The existing hold covers the whole candidate interval.
    InsideExisting,
    /// The candidate interval covers the whole existing hold.
    ContainsExisting,
    /// The candidate starts inside the existing hold and ends after it.
    StartsInsideExisting,
    /// The candidate starts before the existing hold and ends inside it.
    EndsInsideExisting,
}

/// Which rule set applied to a new hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    ActiveMembershipNewHold,
    UpcomingMembershipNewHold,
}

/// Outcome of a successful eligibility check. `start` may have been moved
/// forward to the membership start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub scenario: Scenario,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlappingHold {
    pub hold: Hold,
    pub kind: OverlapKind,
}

/// Memberships targeted by a bulk create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipSelection {
    Ids(Vec<Uuid>),
    /// Every non-deleted membership of the org, optionally one plan only.
    Org { plan_name: Option<String> },
}

/// Holds targeted by a bulk end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldSelection {
    Ids(Vec<Uuid>),
    /// Open holds carrying this group tag.
    Group(String),
}

/// Everything one hold operation persists. Applied atomically.
#[derive(Debug, Clone)]
pub struct HoldWrite {
    pub hold: Hold,
    pub membership: Membership,
    pub is_new: bool,
    pub audit: String,
}

/// Counts from one status sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub activated: usize,
    pub expired: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn merge(&mut self, other: SweepReport) {
        self.activated += other.activated;
        self.expired += other.expired;
        self.failed += other.failed;
    }
}
