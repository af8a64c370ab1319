use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Handle returned when work is accepted onto the job queue.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Accepted {
    pub job_id: String,
    pub job: String,
}
