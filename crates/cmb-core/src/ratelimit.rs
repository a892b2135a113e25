use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::domain::UserId;

// ============== Per-user Cooldown ==============

/// Per-user cooldown gate: a user is admitted at most once per `cooldown`.
///
/// The check and the timestamp update happen under one lock, so two
/// near-simultaneous messages from the same user can never both be admitted.
/// The map is bounded by sweeping users whose cooldown has already elapsed once
/// it grows past `max_tracked`; dropping such an entry cannot change any future
/// admission decision.
#[derive(Debug)]
pub struct CooldownLimiter {
    cooldown: Duration,
    max_tracked: usize,
    last_accepted: Mutex<HashMap<UserId, Instant>>,
}

impl CooldownLimiter {
    pub fn new(cooldown: Duration, max_tracked: usize) -> Self {
        Self {
            cooldown,
            max_tracked: max_tracked.max(1),
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    pub fn admit(&self, user_id: UserId) -> bool {
        self.admit_at(user_id, Instant::now())
    }

    pub fn admit_at(&self, user_id: UserId, now: Instant) -> bool {
        let mut map = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(last) = map.get(&user_id) {
            if now.saturating_duration_since(*last) < self.cooldown {
                return false;
            }
        }
        map.insert(user_id, now);

        if map.len() > self.max_tracked {
            let before = map.len();
            sweep_expired(&mut map, self.cooldown, now);
            debug!(before, after = map.len(), "swept rate limit entries");
            if map.len() > self.max_tracked {
                warn!(
                    tracked = map.len(),
                    max = self.max_tracked,
                    "rate limiter over capacity with every entry still cooling down"
                );
            }
        }
        true
    }

    /// Drop every entry whose cooldown has elapsed. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut map = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = map.len();
        sweep_expired(&mut map, self.cooldown, now);
        before - map.len()
    }

    pub fn tracked_users(&self) -> usize {
        self.last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

fn sweep_expired(map: &mut HashMap<UserId, Instant>, cooldown: Duration, now: Instant) {
    map.retain(|_, last| now.saturating_duration_since(*last) < cooldown);
}
