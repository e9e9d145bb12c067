// src/adapter/scheduler.rs
// Clock and sleep implementations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::service::Scheduler;

/// Wall clock and tokio timers
#[derive(Debug, Default, Clone)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock. `sleep` advances time instantly, records the requested
/// duration and yields to the runtime.
pub struct ManualScheduler {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        let mut now = match self.now.lock() {
            Ok(now) => now,
            Err(poisoned) => poisoned.into_inner(),
        };
        *now = *now + step;
    }

    /// Every duration passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        match self.sleeps.lock() {
            Ok(sleeps) => sleeps.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut sleeps = match self.sleeps.lock() {
                Ok(sleeps) => sleeps,
                Err(poisoned) => poisoned.into_inner(),
            };
            sleeps.push(duration);
        }
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}
