use std::sync::Arc;

use chrono::NaiveDate;
use common::pagination::Pagination;
use models::{HoldStatus, MembershipStatus};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::domain::{
    Assessment, CancelHold, EndHold, Hold, HoldRequest, HoldWrite, Membership, ModifyHold, OverlappingHold,
    SweepReport, UpdateHoldSettings,
};
use super::errors::{HoldError, Rejection};
use super::repository::HoldRepository;
use super::validator;
use crate::clock::Clock;
use crate::legacy::LegacyJobDispatcher;
use crate::metrics;
use crate::notify::{HoldEvent, HoldNotification, NotificationDispatcher};

/// Job class the legacy worker runs when a hold expires.
pub const LEGACY_HOLD_EXPIRED_JOB: &str = "HoldExpiredJob";

const OP_CREATE: &str = "create";
const OP_CANCEL: &str = "cancel";
const OP_END: &str = "end";
const OP_MODIFY: &str = "modify";
const OP_SYNC: &str = "sync";

/// Hold engine tunables
#[derive(Clone, Debug)]
pub struct HoldSettings {
    pub max_hold_days: i64,
}

impl Default for HoldSettings {
    fn default() -> Self { Self { max_hold_days: 365 } }
}

impl From<&configs::HoldsConfig> for HoldSettings {
    fn from(cfg: &configs::HoldsConfig) -> Self { Self { max_hold_days: cfg.max_hold_days } }
}

enum Transition {
    Activated,
    Expired,
}

/// Hold lifecycle service independent of web framework
pub struct HoldService<R: HoldRepository + ?Sized> {
    repo: Arc<R>,
    notifier: Arc<dyn NotificationDispatcher>,
    legacy: Arc<dyn LegacyJobDispatcher>,
    clock: Arc<dyn Clock>,
    settings: HoldSettings,
}

impl<R: HoldRepository + ?Sized> HoldService<R> {
    pub fn new(
        repo: Arc<R>,
        notifier: Arc<dyn NotificationDispatcher>,
        legacy: Arc<dyn LegacyJobDispatcher>,
        clock: Arc<dyn Clock>,
        settings: HoldSettings,
    ) -> Self {
        Self { repo, notifier, legacy, clock, settings }
    }

    pub fn repository(&self) -> &Arc<R> { &self.repo }

    pub fn today(&self) -> NaiveDate { self.clock.today() }

    pub async fn get_membership(&self, org_id: Uuid, id: Uuid) -> Result<Membership, HoldError> {
        self.repo.find_membership(org_id, id).await?.ok_or_else(|| HoldError::not_found("membership"))
    }

    pub async fn get_hold(&self, org_id: Uuid, id: Uuid) -> Result<Hold, HoldError> {
        self.repo.find_hold(org_id, id).await?.ok_or_else(|| HoldError::not_found("hold"))
    }

    /// Flip the switches that gate new holds and changes to existing ones.
    #[instrument(skip_all, fields(org_id = %org_id, membership_id = %membership_id))]
    pub async fn update_hold_settings(
        &self,
        org_id: Uuid,
        membership_id: Uuid,
        input: UpdateHoldSettings,
    ) -> Result<Membership, HoldError> {
        let mut membership = self.get_membership(org_id, membership_id).await?;
        if let Some(enabled) = input.is_hold_enabled {
            membership.is_hold_enabled = enabled;
        }
        if let Some(modifiable) = input.can_be_modified {
            membership.can_be_modified = modifiable;
        }
        membership.updated_at = self.clock.now().into();
        let saved = self.repo.save_membership(membership).await?;
        info!(is_hold_enabled = saved.is_hold_enabled, can_be_modified = saved.can_be_modified, "hold settings updated");
        Ok(saved)
    }

    /// Eligibility of a new hold on `membership` as of today. Used by bulk
    /// jobs to classify items before creating.
    pub async fn assess_new_hold(
        &self,
        membership: &Membership,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Assessment, HoldError> {
        let open = self.repo.open_holds(membership.id).await?;
        let assessment =
            validator::assess_new_hold(membership, start, end, &open, self.today(), self.settings.max_hold_days)?;
        Ok(assessment)
    }

    /// Place a hold on a membership.
    ///
    /// Limits and enablement are skipped when `is_bulk` is set; dates,
    /// overlap, active-hold and membership status are always enforced.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::clock::FixedClock;
    /// use service::hold::{HoldService, HoldSettings};
    /// use service::hold::domain::HoldRequest;
    /// use service::hold::repository::mock::MockHoldRepository;
    /// use service::legacy::mock::RecordingLegacyDispatcher;
    /// use service::notify::mock::RecordingNotificationDispatcher;
    ///
    /// let today: chrono::NaiveDate = "2024-06-01".parse().unwrap();
    /// let repo = Arc::new(MockHoldRepository::default());
    /// let now = chrono::Utc::now().into();
    /// let membership = models::org_user_plan::Model {
    ///     id: uuid::Uuid::new_v4(), org_id: uuid::Uuid::new_v4(), org_user_id: uuid::Uuid::new_v4(),
    ///     plan_name: "Monthly".into(), status: models::MembershipStatus::Active,
    ///     start_date_loc: "2024-01-01".parse().unwrap(), end_date_loc: "2024-12-31".parse().unwrap(),
    ///     hold_count: 0, hold_days: 0, hold_limit_count: 0, hold_limit_days: 0,
    ///     can_be_modified: true, is_hold_enabled: true, is_deleted: false,
    ///     created_at: now, updated_at: now,
    /// };
    /// repo.insert_membership(membership.clone());
    /// let svc = HoldService::new(
    ///     repo.clone(),
    ///     Arc::new(RecordingNotificationDispatcher::default()),
    ///     Arc::new(RecordingLegacyDispatcher::default()),
    ///     Arc::new(FixedClock::new(today)),
    ///     HoldSettings::default(),
    /// );
    /// let request = HoldRequest {
    ///     start: "2024-06-10".parse().unwrap(), end: "2024-06-20".parse().unwrap(),
    ///     note: None, group_name: None, notify_email: false, notify_push: false,
    /// };
    /// let hold = tokio_test::block_on(svc.create_hold(membership.org_id, membership.id, request, false)).unwrap();
    /// assert_eq!(hold.status, models::HoldStatus::Upcoming);
    /// ```
    #[instrument(skip_all, fields(org_id = %org_id, membership_id = %membership_id, is_bulk = is_bulk))]
    pub async fn create_hold(
        &self,
        org_id: Uuid,
        membership_id: Uuid,
        request: HoldRequest,
        is_bulk: bool,
    ) -> Result<Hold, HoldError> {
        let today = self.today();
        let membership = self.get_membership(org_id, membership_id).await?;
        let assessment = self
            .assess_new_hold(&membership, request.start, request.end)
            .await
            .map_err(|e| self.rejected(OP_CREATE, e))?;
        let length = validator::days_between(assessment.start, assessment.end);
        if !is_bulk {
            validator::check_enablement(&membership)
                .and_then(|_| validator::check_limits(&membership, length))
                .map_err(|r| self.rejected(OP_CREATE, r.into()))?;
        }

        let status = if assessment.start <= today { HoldStatus::Active } else { HoldStatus::Upcoming };
        let now = self.clock.now().into();
        let hold = Hold {
            id: Uuid::new_v4(),
            org_id,
            org_user_id: membership.org_user_id,
            org_user_plan_id: membership.id,
            start_date: assessment.start,
            end_date: assessment.end,
            status,
            is_canceled: false,
            group_name: request.group_name.clone(),
            notify_email: request.notify_email,
            notify_push: request.notify_push,
            note: request.note.clone(),
            ended_by: None,
            created_at: now,
            updated_at: now,
        };
        let mut updated = membership;
        updated.hold_count += 1;
        updated.hold_days += clamp_i32(length);
        if status == HoldStatus::Active {
            updated.status = MembershipStatus::Hold;
        }
        updated.updated_at = now;

        let audit = format!(
            "Hold {} to {} ({} days) created as {}{}",
            assessment.start,
            assessment.end,
            length,
            status.label(),
            note_suffix(request.note.as_deref())
        );
        let saved = self
            .persist(OP_CREATE, HoldWrite { hold, membership: updated, is_new: true, audit })
            .await?;
        info!(hold_id = %saved.id, status = saved.status.label(), scenario = ?assessment.scenario, "hold_created");
        self.notify(&saved, HoldEvent::Created, request.notify_email, request.notify_push).await;
        Ok(saved)
    }

    /// Cancel an Upcoming or Active hold.
    ///
    /// An Active hold credits the days already used back onto the membership
    /// end; the unused remainder and (for Upcoming holds) the hold itself are
    /// refunded from the counters.
    #[instrument(skip_all, fields(org_id = %org_id, hold_id = %hold_id))]
    pub async fn cancel_hold(&self, org_id: Uuid, hold_id: Uuid, input: CancelHold) -> Result<Hold, HoldError> {
        let today = self.today();
        let hold = self.get_hold(org_id, hold_id).await?;
        if hold.is_canceled || hold.status == HoldStatus::Canceled {
            return Err(self.rejected(OP_CANCEL, Rejection::AlreadyCanceled.into()));
        }
        if hold.status == HoldStatus::Expired {
            return Err(self.rejected(OP_CANCEL, Rejection::AlreadyExpired.into()));
        }
        let mut membership = self.get_membership(org_id, hold.org_user_plan_id).await?;
        let length = hold.length_days();
        let credited = match hold.status {
            HoldStatus::Active => {
                let used = validator::days_between(hold.start_date, today).clamp(0, length);
                membership.end_date_loc = validator::shift_days(membership.end_date_loc, used);
                membership.hold_days -= clamp_i32(length - used);
                used
            }
            _ => {
                membership.hold_count -= 1;
                membership.hold_days -= clamp_i32(length);
                0
            }
        };
        membership.hold_count = membership.hold_count.max(0);
        membership.hold_days = membership.hold_days.max(0);
        restore_membership_status(&mut membership, today);

        let now = self.clock.now().into();
        membership.updated_at = now;
        let mut updated = hold;
        updated.is_canceled = true;
        updated.status = HoldStatus::Canceled;
        updated.updated_at = now;

        let audit = format!(
            "Hold {} to {} canceled; {} day(s) credited{}",
            updated.start_date,
            updated.end_date,
            credited,
            note_suffix(input.note.as_deref())
        );
        let saved = self
            .persist(OP_CANCEL, HoldWrite { hold: updated, membership, is_new: false, audit })
            .await?;
        info!(hold_id = %saved.id, credited, "hold_canceled");
        self.notify(&saved, HoldEvent::Cancelled, saved.notify_email, saved.notify_push).await;
        Ok(saved)
    }

    /// End an Active hold today. Upcoming holds must be canceled instead.
    #[instrument(skip_all, fields(org_id = %org_id, hold_id = %hold_id))]
    pub async fn end_hold(&self, org_id: Uuid, hold_id: Uuid, input: EndHold) -> Result<Hold, HoldError> {
        let today = self.today();
        let hold = self.get_hold(org_id, hold_id).await?;
        if hold.is_canceled || hold.status == HoldStatus::Canceled {
            return Err(self.rejected(OP_END, Rejection::AlreadyCanceled.into()));
        }
        match hold.status {
            HoldStatus::Expired => return Err(self.rejected(OP_END, Rejection::AlreadyExpired.into())),
            HoldStatus::Upcoming => return Err(self.rejected(OP_END, Rejection::NotStarted.into())),
            _ => {}
        }
        let membership = self.get_membership(org_id, hold.org_user_plan_id).await?;
        let saved = self
            .finish(OP_END, hold, membership, today, input.ended_by.clone(), input.note.as_deref())
            .await?;
        self.notify(&saved, HoldEvent::Ended, input.notify_email, input.notify_push).await;
        Ok(saved)
    }

    /// Change the dates of an Upcoming or Active hold.
    #[instrument(skip_all, fields(org_id = %org_id, hold_id = %hold_id))]
    pub async fn modify_hold(&self, org_id: Uuid, hold_id: Uuid, input: ModifyHold) -> Result<Hold, HoldError> {
        let hold = self.get_hold(org_id, hold_id).await?;
        if hold.is_canceled {
            return Err(self.rejected(OP_MODIFY, Rejection::StatusNotModifiable { status: HoldStatus::Canceled }.into()));
        }
        let membership = self.get_membership(org_id, hold.org_user_plan_id).await?;
        match hold.status {
            HoldStatus::Upcoming => self.modify_upcoming(hold, membership, input).await,
            HoldStatus::Active => self.modify_active(hold, membership, input).await,
            status => Err(self.rejected(OP_MODIFY, Rejection::StatusNotModifiable { status }.into())),
        }
    }

    async fn modify_upcoming(&self, hold: Hold, membership: Membership, input: ModifyHold) -> Result<Hold, HoldError> {
        let today = self.today();
        let requested_start = input.start.unwrap_or(hold.start_date);
        let open = self.repo.open_holds(membership.id).await?;
        let start = validator::check_enablement(&membership)
            .and_then(|_| {
                validator::validate_dates(&membership, requested_start, input.end, today, self.settings.max_hold_days)
            })
            .and_then(|start| {
                validator::check_overlapping_holds(&open, start, input.end, &[hold.id])?;
                validator::check_active_holds(&open, &[hold.id])?;
                let delta = validator::days_between(start, input.end) - hold.length_days();
                validator::check_day_limit(&membership, delta)?;
                Ok(start)
            })
            .map_err(|r| self.rejected(OP_MODIFY, r.into()))?;

        let delta = validator::days_between(start, input.end) - hold.length_days();
        let now = self.clock.now().into();
        let mut updated = hold;
        let (old_start, old_end) = (updated.start_date, updated.end_date);
        updated.start_date = start;
        updated.end_date = input.end;
        updated.status = if start <= today { HoldStatus::Active } else { HoldStatus::Upcoming };
        updated.notify_email = input.notify_email;
        updated.notify_push = input.notify_push;
        if input.note.is_some() {
            updated.note = input.note.clone();
        }
        updated.updated_at = now;

        let mut membership = membership;
        membership.hold_days = (membership.hold_days + clamp_i32(delta)).max(0);
        if updated.status == HoldStatus::Active {
            membership.status = MembershipStatus::Hold;
        }
        membership.updated_at = now;

        let audit = format!(
            "Hold moved from {} to {} to {} to {}{}",
            old_start,
            old_end,
            updated.start_date,
            updated.end_date,
            note_suffix(input.note.as_deref())
        );
        let saved = self
            .persist(OP_MODIFY, HoldWrite { hold: updated, membership, is_new: false, audit })
            .await?;
        info!(hold_id = %saved.id, status = saved.status.label(), delta, "hold_modified");
        self.notify(&saved, HoldEvent::Modified, input.notify_email, input.notify_push).await;
        Ok(saved)
    }

    async fn modify_active(&self, hold: Hold, membership: Membership, input: ModifyHold) -> Result<Hold, HoldError> {
        let today = self.today();
        if input.start.is_some_and(|s| s != hold.start_date) {
            return Err(self.rejected(OP_MODIFY, Rejection::StartImmutable.into()));
        }
        if input.end <= today {
            debug!(hold_id = %hold.id, end = %input.end, "new end not after today; ending hold");
            let saved = self
                .finish(OP_MODIFY, hold, membership, today, None, input.note.as_deref())
                .await?;
            self.notify(&saved, HoldEvent::Ended, input.notify_email, input.notify_push).await;
            return Ok(saved);
        }

        let open = self.repo.open_holds(membership.id).await?;
        let delta = validator::days_between(hold.start_date, input.end) - hold.length_days();
        validator::check_length(hold.start_date, input.end, self.settings.max_hold_days)
            .and_then(|_| validator::check_overlapping_holds(&open, hold.start_date, input.end, &[hold.id]))
            .and_then(|_| validator::check_day_limit(&membership, delta))
            .map_err(|r| self.rejected(OP_MODIFY, r.into()))?;

        let now = self.clock.now().into();
        let old_end = hold.end_date;
        let mut updated = hold;
        updated.end_date = input.end;
        updated.notify_email = input.notify_email;
        updated.notify_push = input.notify_push;
        if input.note.is_some() {
            updated.note = input.note.clone();
        }
        updated.updated_at = now;
        let mut membership = membership;
        membership.hold_days = (membership.hold_days + clamp_i32(delta)).max(0);
        membership.updated_at = now;

        let audit = format!(
            "Active hold end moved from {} to {}{}",
            old_end,
            updated.end_date,
            note_suffix(input.note.as_deref())
        );
        let saved = self
            .persist(OP_MODIFY, HoldWrite { hold: updated, membership, is_new: false, audit })
            .await?;
        info!(hold_id = %saved.id, delta, "hold_modified");
        self.notify(&saved, HoldEvent::Modified, input.notify_email, input.notify_push).await;
        Ok(saved)
    }

    /// First open hold on the membership intersecting `[start, end]`.
    #[instrument(skip_all, fields(org_id = %org_id, membership_id = %membership_id, start = %start, end = %end))]
    pub async fn get_overlapping_hold(
        &self,
        org_id: Uuid,
        membership_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: &[Uuid],
    ) -> Result<Option<OverlappingHold>, HoldError> {
        let membership = self.get_membership(org_id, membership_id).await?;
        let rows = self.repo.overlapping_holds(membership.id, start, end, exclude).await?;
        Ok(validator::first_overlap(&rows, start, end, exclude)
            .map(|(hold, kind)| OverlappingHold { hold: hold.clone(), kind }))
    }

    pub async fn list_holds(&self, org_id: Uuid, membership_id: Uuid, page: Pagination) -> Result<Vec<Hold>, HoldError> {
        let membership = self.get_membership(org_id, membership_id).await?;
        self.repo.list_holds(org_id, membership.id, page).await
    }

    /// Apply date-driven transitions for one org: Upcoming holds whose start
    /// has arrived become Active, Active holds past their end expire.
    /// Per-hold failures are counted and logged, not propagated.
    #[instrument(skip_all, fields(org_id = %org_id))]
    pub async fn sync_hold_statuses(&self, org_id: Uuid) -> Result<SweepReport, HoldError> {
        let today = self.today();
        let due = self.repo.due_holds(org_id, today).await?;
        let mut report = SweepReport::default();
        for hold in due {
            let hold_id = hold.id;
            match self.apply_due_transition(org_id, hold, today).await {
                Ok(Transition::Activated) => report.activated += 1,
                Ok(Transition::Expired) => report.expired += 1,
                Err(e) => {
                    warn!(hold_id = %hold_id, error = %e, "status sync failed for hold");
                    report.failed += 1;
                }
            }
        }
        if report != SweepReport::default() {
            info!(activated = report.activated, expired = report.expired, failed = report.failed, "hold_statuses_synced");
        }
        Ok(report)
    }

    async fn apply_due_transition(&self, org_id: Uuid, hold: Hold, today: NaiveDate) -> Result<Transition, HoldError> {
        let mut membership = self.get_membership(org_id, hold.org_user_plan_id).await?;
        if hold.status == HoldStatus::Upcoming && hold.end_date >= today {
            let now = self.clock.now().into();
            let mut updated = hold;
            updated.status = HoldStatus::Active;
            updated.updated_at = now;
            if membership.status.is_date_driven() {
                membership.status = MembershipStatus::Hold;
            }
            membership.updated_at = now;
            let audit = format!("Hold {} to {} became active", updated.start_date, updated.end_date);
            self.persist(OP_SYNC, HoldWrite { hold: updated, membership, is_new: false, audit }).await?;
            return Ok(Transition::Activated);
        }
        // Active past its end, or an Upcoming hold whose whole window was missed
        let end = hold.end_date;
        let saved = self.finish(OP_SYNC, hold, membership, end, None, None).await?;
        self.notify(&saved, HoldEvent::Ended, saved.notify_email, saved.notify_push).await;
        Ok(Transition::Expired)
    }

    /// Expire a hold as of `end_date`, credit the used days to the
    /// membership, and hand the expiry to the legacy worker.
    async fn finish(
        &self,
        op: &'static str,
        hold: Hold,
        mut membership: Membership,
        end_date: NaiveDate,
        ended_by: Option<String>,
        note: Option<&str>,
    ) -> Result<Hold, HoldError> {
        let today = self.today();
        let length = hold.length_days();
        let used = validator::days_between(hold.start_date, end_date).clamp(0, length);
        let now = self.clock.now().into();

        membership.end_date_loc = validator::shift_days(membership.end_date_loc, used);
        membership.hold_days = (membership.hold_days - clamp_i32(length - used)).max(0);
        restore_membership_status(&mut membership, today);
        membership.updated_at = now;

        let mut updated = hold;
        updated.end_date = validator::shift_days(updated.start_date, used);
        updated.status = HoldStatus::Expired;
        if ended_by.is_some() {
            updated.ended_by = ended_by;
        }
        updated.updated_at = now;

        let audit = format!(
            "Hold {} to {} ended; membership extended by {} day(s) to {}{}",
            updated.start_date,
            updated.end_date,
            used,
            membership.end_date_loc,
            note_suffix(note)
        );
        let saved = self.persist(op, HoldWrite { hold: updated, membership, is_new: false, audit }).await?;
        info!(hold_id = %saved.id, used, "hold_ended");
        self.dispatch_legacy_expiry(&saved).await;
        Ok(saved)
    }

    async fn persist(&self, op: &'static str, write: HoldWrite) -> Result<Hold, HoldError> {
        let hold_id = write.hold.id;
        match self.repo.save(write).await {
            Ok(saved) => {
                metrics::record_hold_op(op, "applied");
                Ok(saved)
            }
            Err(e) => {
                error!(op, hold_id = %hold_id, error = %e, "hold write rolled back");
                metrics::record_hold_op(op, "failed");
                Err(e)
            }
        }
    }

    fn rejected(&self, op: &'static str, err: HoldError) -> HoldError {
        if let HoldError::Rejected(r) = &err {
            info!(op, reason = r.skip_reason().as_str(), detail = %r, "hold_rejected");
            metrics::record_hold_op(op, "rejected");
        }
        err
    }

    async fn notify(&self, hold: &Hold, event: HoldEvent, email: bool, push: bool) {
        if !email && !push {
            return;
        }
        let notification = HoldNotification { org_id: hold.org_id, hold_id: hold.id, event, email, push };
        if let Err(e) = self.notifier.dispatch(notification).await {
            warn!(hold_id = %hold.id, event = event.as_str(), error = %e, "notification dispatch failed");
        }
    }

    async fn dispatch_legacy_expiry(&self, hold: &Hold) {
        let payload = json!({
            "hold_id": hold.id,
            "org_id": hold.org_id,
            "org_user_id": hold.org_user_id,
            "org_user_plan_id": hold.org_user_plan_id,
            "end_date": hold.end_date,
        });
        if let Err(e) = self.legacy.dispatch(LEGACY_HOLD_EXPIRED_JOB, payload).await {
            warn!(hold_id = %hold.id, error = %e, "legacy dispatch failed");
        }
    }
}

/// Recompute a date-driven membership status from its window.
fn restore_membership_status(membership: &mut Membership, today: NaiveDate) {
    if membership.status.is_date_driven() {
        membership.status = membership.window_status(today);
    }
}

fn note_suffix(note: Option<&str>) -> String {
    match note.map(str::trim) {
        Some(n) if !n.is_empty() => format!(": {}", n),
        _ => String::new(),
    }
}

fn clamp_i32(days: i64) -> i32 {
    days.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
