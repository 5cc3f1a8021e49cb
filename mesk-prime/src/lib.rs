pub mod config;
pub mod points;
pub mod report;
