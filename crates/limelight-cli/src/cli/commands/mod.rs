//! CLI command handlers.

pub mod config;
pub mod lottery;
pub mod replay;
pub mod run;
