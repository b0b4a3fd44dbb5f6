pub mod assignment;
pub mod availability;
pub mod collab;
pub mod config;
pub mod error;
pub mod google;
pub mod http;
pub mod io;
pub mod jira;
pub mod notify;
pub mod paths;
pub mod reviewer;
pub mod rotation;
pub mod scheduling;
pub mod store;

#[cfg(test)]
mod fakes;

pub use error::{Result, ReviewError};
