use crate::domain::ports::Clock;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_REQUESTS: usize = 20;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub max_requests: usize,
    pub cooldown: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sliding-window admission gate in front of every outbound fetch.
///
/// Once `max_requests` admissions fall inside `window`, the caller is held
/// for the full `cooldown` and the window is emptied. Bursts are over-penalised
/// rather than smoothed.
pub struct RateLimiter {
    settings: RateLimitSettings,
    clock: Arc<dyn Clock>,
    // Most recent first.
    admissions: VecDeque<Instant>,
    cooldowns: u64,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            admissions: VecDeque::with_capacity(settings.max_requests),
            cooldowns: 0,
        }
    }

    pub fn settings(&self) -> RateLimitSettings {
        self.settings
    }

    /// Returns once one more fetch may be issued. Never fails.
    pub async fn admit(&mut self) {
        let now = self.clock.now();
        self.admissions.push_front(now);

        while let Some(oldest) = self.admissions.back() {
            if now.saturating_duration_since(*oldest) > self.settings.window {
                self.admissions.pop_back();
            } else {
                break;
            }
        }

        if self.admissions.len() >= self.settings.max_requests {
            self.cooldowns += 1;
            tracing::warn!(
                "⏳ {} requests within {:?}, cooling down for {:?}",
                self.admissions.len(),
                self.settings.window,
                self.settings.cooldown
            );
            self.clock.sleep(self.settings.cooldown).await;
            self.admissions.clear();
            tracing::info!("Rate limit window cleared");
        }
    }

    /// Admissions still counted against the current window.
    pub fn in_window(&self) -> usize {
        self.admissions.len()
    }

    pub fn cooldowns(&self) -> u64 {
        self.cooldowns
    }
}
