pub mod approval;
pub mod audit;
pub mod config;
pub mod content;
pub mod engine;
pub mod init;
pub mod job;
pub mod keyword;
pub mod schedule;
pub mod serve;
