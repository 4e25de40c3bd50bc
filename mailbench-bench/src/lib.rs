pub mod cli;
pub mod payload;
pub mod report;
pub mod runner;
pub mod stats;
