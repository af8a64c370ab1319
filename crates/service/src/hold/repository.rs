use async_trait::async_trait;
use chrono::NaiveDate;
use common::pagination::Pagination;
use uuid::Uuid;

use super::domain::{Hold, HoldSelection, HoldWrite, Membership, MembershipSelection};
use super::errors::HoldError;

/// Repository abstraction for hold persistence. Every lookup is scoped by
/// org except those keyed by an already-scoped membership.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    async fn find_membership(&self, org_id: Uuid, id: Uuid) -> Result<Option<Membership>, HoldError>;
    async fn find_hold(&self, org_id: Uuid, id: Uuid) -> Result<Option<Hold>, HoldError>;

    /// Non-canceled Upcoming/Active holds of a membership, by start date.
    async fn open_holds(&self, membership_id: Uuid) -> Result<Vec<Hold>, HoldError>;
    /// Open holds intersecting `[start, end]` (closed), minus `exclude`.
    async fn overlapping_holds(
        &self,
        membership_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: &[Uuid],
    ) -> Result<Vec<Hold>, HoldError>;
    /// All holds of a membership, newest start first.
    async fn list_holds(&self, org_id: Uuid, membership_id: Uuid, page: Pagination) -> Result<Vec<Hold>, HoldError>;

    async fn select_memberships(&self, org_id: Uuid, selection: &MembershipSelection) -> Result<Vec<Membership>, HoldError>;
    async fn select_holds(&self, org_id: Uuid, selection: &HoldSelection) -> Result<Vec<Hold>, HoldError>;

    /// Upcoming holds whose start has arrived and Active holds past their end.
    async fn due_holds(&self, org_id: Uuid, today: NaiveDate) -> Result<Vec<Hold>, HoldError>;
    async fn org_ids(&self) -> Result<Vec<Uuid>, HoldError>;

    /// Persist hold, membership and audit note in one transaction.
    async fn save(&self, write: HoldWrite) -> Result<Hold, HoldError>;
    /// Update a membership row on its own, outside any hold write.
    async fn save_membership(&self, membership: Membership) -> Result<Membership, HoldError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Mutex, MutexGuard};

    use models::HoldStatus;

    #[derive(Default)]
    struct State {
        memberships: HashMap<Uuid, Membership>,
        holds: HashMap<Uuid, Hold>,
        notes: Vec<(Uuid, String)>,
        fail_saves: HashSet<Uuid>,
        fail_queries: bool,
        saves: usize,
    }

    #[derive(Default)]
    pub struct MockHoldRepository {
        state: Mutex<State>,
    }

    impl MockHoldRepository {
        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|p| p.into_inner())
        }

        pub fn insert_membership(&self, membership: Membership) {
            self.state().memberships.insert(membership.id, membership);
        }

        pub fn insert_hold(&self, hold: Hold) {
            self.state().holds.insert(hold.id, hold);
        }

        pub fn membership(&self, id: Uuid) -> Option<Membership> {
            self.state().memberships.get(&id).cloned()
        }

        pub fn hold(&self, id: Uuid) -> Option<Hold> {
            self.state().holds.get(&id).cloned()
        }

        pub fn holds_of(&self, membership_id: Uuid) -> Vec<Hold> {
            let mut holds: Vec<Hold> = self
                .state()
                .holds
                .values()
                .filter(|h| h.org_user_plan_id == membership_id)
                .cloned()
                .collect();
            holds.sort_by_key(|h| (h.start_date, h.id));
            holds
        }

        /// Audit notes written for a hold.
        pub fn notes_for(&self, hold_id: Uuid) -> Vec<String> {
            self.state().notes.iter().filter(|(id, _)| *id == hold_id).map(|(_, n)| n.clone()).collect()
        }

        /// Successful `save` calls so far.
        pub fn save_count(&self) -> usize {
            self.state().saves
        }

        /// Make every `save` touching this hold or membership id fail.
        pub fn fail_saves_for(&self, id: Uuid) {
            self.state().fail_saves.insert(id);
        }

        /// Make every read fail, as if the database were unreachable.
        pub fn fail_queries(&self, fail: bool) {
            self.state().fail_queries = fail;
        }

        fn check_queries(state: &State) -> Result<(), HoldError> {
            if state.fail_queries {
                return Err(HoldError::Persistence("connection refused".into()));
            }
            Ok(())
        }

        fn sorted(mut holds: Vec<Hold>) -> Vec<Hold> {
            holds.sort_by_key(|h| (h.start_date, h.id));
            holds
        }
    }

    #[async_trait]
    impl HoldRepository for MockHoldRepository {
        async fn find_membership(&self, org_id: Uuid, id: Uuid) -> Result<Option<Membership>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            Ok(state.memberships.get(&id).filter(|m| m.org_id == org_id).cloned())
        }

        async fn find_hold(&self, org_id: Uuid, id: Uuid) -> Result<Option<Hold>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            Ok(state.holds.get(&id).filter(|h| h.org_id == org_id).cloned())
        }

        async fn open_holds(&self, membership_id: Uuid) -> Result<Vec<Hold>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            Ok(Self::sorted(
                state
                    .holds
                    .values()
                    .filter(|h| h.org_user_plan_id == membership_id && h.is_open())
                    .cloned()
                    .collect(),
            ))
        }

        async fn overlapping_holds(
            &self,
            membership_id: Uuid,
            start: NaiveDate,
            end: NaiveDate,
            exclude: &[Uuid],
        ) -> Result<Vec<Hold>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            Ok(Self::sorted(
                state
                    .holds
                    .values()
                    .filter(|h| h.org_user_plan_id == membership_id && h.is_open() && !exclude.contains(&h.id))
                    .filter(|h| h.start_date <= end && h.end_date >= start)
                    .cloned()
                    .collect(),
            ))
        }

        async fn list_holds(&self, org_id: Uuid, membership_id: Uuid, page: Pagination) -> Result<Vec<Hold>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            let (page_idx, per_page) = page.normalize();
            let mut holds: Vec<Hold> = state
                .holds
                .values()
                .filter(|h| h.org_id == org_id && h.org_user_plan_id == membership_id)
                .cloned()
                .collect();
            holds.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)));
            Ok(holds.into_iter().skip((page_idx * per_page) as usize).take(per_page as usize).collect())
        }

        async fn select_memberships(&self, org_id: Uuid, selection: &MembershipSelection) -> Result<Vec<Membership>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            let mut rows: Vec<Membership> = state
                .memberships
                .values()
                .filter(|m| m.org_id == org_id)
                .filter(|m| match selection {
                    MembershipSelection::Ids(ids) => ids.contains(&m.id),
                    MembershipSelection::Org { plan_name } => {
                        !m.is_deleted && plan_name.as_ref().map_or(true, |p| &m.plan_name == p)
                    }
                })
                .cloned()
                .collect();
            rows.sort_by_key(|m| (m.created_at, m.id));
            Ok(rows)
        }

        async fn select_holds(&self, org_id: Uuid, selection: &HoldSelection) -> Result<Vec<Hold>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            Ok(Self::sorted(
                state
                    .holds
                    .values()
                    .filter(|h| h.org_id == org_id)
                    .filter(|h| match selection {
                        HoldSelection::Ids(ids) => ids.contains(&h.id),
                        HoldSelection::Group(group) => h.is_open() && h.group_name.as_deref() == Some(group.as_str()),
                    })
                    .cloned()
                    .collect(),
            ))
        }

        async fn due_holds(&self, org_id: Uuid, today: NaiveDate) -> Result<Vec<Hold>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            Ok(Self::sorted(
                state
                    .holds
                    .values()
                    .filter(|h| h.org_id == org_id && !h.is_canceled)
                    .filter(|h| match h.status {
                        HoldStatus::Upcoming => h.start_date <= today,
                        HoldStatus::Active => h.end_date < today,
                        _ => false,
                    })
                    .cloned()
                    .collect(),
            ))
        }

        async fn org_ids(&self) -> Result<Vec<Uuid>, HoldError> {
            let state = self.state();
            Self::check_queries(&state)?;
            let mut ids: Vec<Uuid> = state.memberships.values().map(|m| m.org_id).collect();
            ids.sort();
            ids.dedup();
            Ok(ids)
        }

        async fn save(&self, write: HoldWrite) -> Result<Hold, HoldError> {
            let mut state = self.state();
            if state.fail_saves.contains(&write.hold.id) || state.fail_saves.contains(&write.membership.id) {
                return Err(HoldError::Persistence(format!("write failed for hold {}", write.hold.id)));
            }
            let exists = state.holds.contains_key(&write.hold.id);
            if write.is_new == exists {
                return Err(HoldError::Persistence(format!("hold {} insert/update mismatch", write.hold.id)));
            }
            if !state.memberships.contains_key(&write.membership.id) {
                return Err(HoldError::Persistence(format!("membership {} vanished", write.membership.id)));
            }
            state.memberships.insert(write.membership.id, write.membership);
            state.holds.insert(write.hold.id, write.hold.clone());
            state.notes.push((write.hold.id, write.audit));
            state.saves += 1;
            Ok(write.hold)
        }

        async fn save_membership(&self, membership: Membership) -> Result<Membership, HoldError> {
            let mut state = self.state();
            if state.fail_saves.contains(&membership.id) {
                return Err(HoldError::Persistence(format!("write failed for membership {}", membership.id)));
            }
            if !state.memberships.contains_key(&membership.id) {
                return Err(HoldError::Persistence(format!("membership {} vanished", membership.id)));
            }
            state.memberships.insert(membership.id, membership.clone());
            Ok(membership)
        }
    }
}
