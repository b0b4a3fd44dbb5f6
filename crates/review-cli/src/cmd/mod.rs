pub mod assign;
pub mod config;
pub mod init;
pub mod queue;
pub mod schedule;
