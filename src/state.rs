use std::time::Duration;

use crate::config::{Args, Settings};
use crate::error::Result;
use crate::rate_limit::RateLimiter;
use crate::storage::{ObjectStore, S3Store};

// per-process state, built once in main and handed to each command

pub struct AppState {
    pub settings: Settings,
    pub store: Box<dyn ObjectStore>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(settings: Settings, store: Box<dyn ObjectStore>, rate_limiter: RateLimiter) -> Self {
        Self {
            settings,
            store,
            rate_limiter,
        }
    }

    // settings file + flags -> S3 store and limiter
    pub fn from_args(args: &Args) -> Result<Self> {
        let settings = Settings::load(args)?;
        let store = S3Store::new(&settings)?;
        let rate_limiter = RateLimiter::new(args.rate_limit, Duration::from_secs(args.rate_window));
        Ok(Self::new(settings, Box::new(store), rate_limiter))
    }
}
