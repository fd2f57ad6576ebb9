pub mod config;
pub mod logging;

pub mod controller;
pub mod engine;
pub mod job_db;
pub mod options;
pub mod submission;
