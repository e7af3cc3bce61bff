use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ScaleConfig;
use crate::error::ScaleError;
use crate::session::Session;

/// Result of [`ReconnectController::try_reconnect`].
#[derive(Debug)]
pub enum ReconnectOutcome {
    /// Too soon after the previous attempt; nothing was done.
    NotYet,
    /// Handshake succeeded and the session is ready.
    Connected,
    /// The attempt failed. `attempts` counts failures since the last reset.
    Failed { attempts: u32, error: ScaleError },
}

/// Rate-limited reconnect policy for a session that lost readiness.
///
/// Attempts are spaced at least `interval` apart. After `ceiling` failures
/// a warning is logged on every failure; at twice the ceiling the counter
/// starts over, so retries never stop.
#[derive(Debug, Clone)]
pub struct ReconnectController {
    interval: Duration,
    ceiling: u32,
    last_attempt: Option<Instant>,
    attempts: u32,
}

impl ReconnectController {
    pub fn new(interval: Duration, ceiling: u32) -> Self {
        Self {
            interval,
            ceiling,
            last_attempt: None,
            attempts: 0,
        }
    }

    pub fn from_config(config: &ScaleConfig) -> Self {
        Self::new(config.reconnect_interval, config.reconnect_ceiling)
    }

    /// Failed attempts since the last success or reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn try_reconnect(&mut self, session: &mut Session) -> ReconnectOutcome {
        self.try_reconnect_at(session, Instant::now())
    }

    /// Same as [`try_reconnect`](Self::try_reconnect) with an explicit clock.
    pub fn try_reconnect_at(&mut self, session: &mut Session, now: Instant) -> ReconnectOutcome {
        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.interval {
                return ReconnectOutcome::NotYet;
            }
        }

        self.last_attempt = Some(now);
        self.attempts += 1;
        info!(attempt = self.attempts, "reconnecting to scale");

        match session.connect() {
            Ok(()) => {
                self.attempts = 0;
                ReconnectOutcome::Connected
            }
            Err(error) => {
                let attempts = self.attempts;
                if attempts >= self.ceiling {
                    warn!(
                        attempts,
                        ceiling = self.ceiling,
                        "reconnect attempts reached the limit"
                    );
                    if attempts >= self.ceiling.saturating_mul(2) {
                        self.attempts = 0;
                    }
                }
                ReconnectOutcome::Failed { attempts, error }
            }
        }
    }
}
