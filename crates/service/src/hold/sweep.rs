use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::SweepReport;
use super::errors::HoldError;
use super::repository::HoldRepository;
use super::service::HoldService;

/// One status sync pass over every org. An org whose sync fails is logged
/// and skipped; only failing to list orgs is an error.
pub async fn run_once<R>(service: &HoldService<R>) -> Result<SweepReport, HoldError>
where
    R: HoldRepository + ?Sized,
{
    let mut total = SweepReport::default();
    for org_id in service.repository().org_ids().await? {
        match service.sync_hold_statuses(org_id).await {
            Ok(report) => total.merge(report),
            Err(e) => {
                warn!(org_id = %org_id, error = %e, "org status sync failed");
                total.failed += 1;
            }
        }
    }
    Ok(total)
}

/// Run `run_once` every `interval` until the runtime shuts down.
pub fn spawn_sweeper<R>(service: Arc<HoldService<R>>, interval: Duration) -> JoinHandle<()>
where
    R: HoldRepository + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "hold status sweeper started");
        loop {
            ticker.tick().await;
            match run_once(&service).await {
                Ok(report) => debug!(
                    activated = report.activated,
                    expired = report.expired,
                    failed = report.failed,
                    "sweep finished"
                ),
                Err(e) => warn!(error = %e, "sweep could not list orgs"),
            }
        }
    })
}
