pub mod access;
pub mod approval;
pub mod audit;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod guardrail;
pub mod io;
pub mod job;
pub mod keyword;
pub mod paths;
pub mod schedule;
pub mod simulate;
pub mod store;
pub mod types;

pub use error::{PressError, Result};
