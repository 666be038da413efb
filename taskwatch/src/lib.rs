//! taskwatch library crate.
//!
//! Polls a Notion task database, diffs each poll against the last saved
//! snapshot and posts review-workflow changes to Discord webhooks.

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod panic_hook;
pub mod snapshot;
pub mod utils;

pub use error::{Error, Result};
