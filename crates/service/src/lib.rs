//! Service layer for the membership hold engine.
//! - Hold lifecycle rules live in `hold` and never touch the web framework.
//! - Persistence is reached through `hold::repository::HoldRepository`.
//! - Long-running and side-effecting work goes through the `jobs` queue.

pub mod clock;
pub mod metrics;
pub mod hold;
pub mod bulk;
pub mod jobs;
pub mod notify;
pub mod legacy;
#[cfg(test)]
pub mod test_support;
