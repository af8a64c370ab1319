//! Hold lifecycle.
//!
//! - `domain`: input and result types shared by the service and bulk jobs.
//! - `validator`: pure eligibility rules (dates, overlap, limits, enablement).
//! - `repository`: persistence seam plus an in-memory mock; `repo::seaorm` is
//!   the database implementation.
//! - `service`: create / cancel / end / modify / overlap lookup / status sync.
//! - `sweep`: periodic status sync across orgs.

pub mod domain;
pub mod errors;
pub mod validator;
pub mod repository;
pub mod repo;
pub mod service;
pub mod sweep;

pub use errors::{HoldError, Rejection, SkipReason};
pub use service::{HoldService, HoldSettings};
