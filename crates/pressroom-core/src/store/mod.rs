//! Durable orchestrator state.
//!
//! One redb file holds every entity family; serialized write transactions
//! give the run guard, control flag, and versioned transitions the atomic
//! read-validate-write they require. The audit trail lives in a separate
//! sqlite file opened alongside.

pub mod db;

pub use db::{NewApproval, NewContent, NewJob, Store};
