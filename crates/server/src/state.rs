use std::sync::Arc;

use service::hold::repository::HoldRepository;
use service::hold::HoldService;
use service::jobs::JobQueue;

use crate::auth::ServerAuthConfig;

#[derive(Clone)]
pub struct ServerState {
    pub holds: Arc<HoldService<dyn HoldRepository>>,
    pub queue: JobQueue,
    pub auth: ServerAuthConfig,
}
