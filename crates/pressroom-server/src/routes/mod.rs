pub mod approvals;
pub mod audit;
pub mod content;
pub mod engine;
pub mod events;
pub mod health;
pub mod jobs;
pub mod schedules;
pub mod worker;
