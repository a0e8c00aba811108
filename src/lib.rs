pub mod commands;
pub mod config;
pub mod error;
pub mod page;
pub mod rate_limit;
pub mod sanitize;
pub mod state;
pub mod storage;

pub use error::{Result, ShareError};
