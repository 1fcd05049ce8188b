//! CLI module for ratedesk

pub mod app;
pub mod commands;

pub use app::{Authentication, CallReport, RateDeskApp};
pub use commands::{Cli, Commands, PolicyArgs, ServeArgs};
