use chrono::{DateTime, Duration, Utc};
use compose::Compose;
use serde::Serialize;

use crate::provider::ActionFamily;

const MILLIS_PER_HOUR: i64 = 3_600_000;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Expiry {
    pub is_expired: bool,
    pub remaining_hours: u32,
}

/// Lifetime of a compose's download link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ExpiryWindow {
    pub fn new(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self { created_at, expires_at }
    }

    pub fn lifetime(&self) -> Duration {
        self.expires_at - self.created_at
    }

    /// Expiry as observed at `now`. Pure; callers supply the clock.
    pub fn at(&self, now: DateTime<Utc>) -> Expiry {
        let is_expired = now >= self.expires_at;
        let remaining_ms = (self.expires_at - now).num_milliseconds();
        let remaining_hours = if is_expired || remaining_ms <= 0 {
            0
        } else {
            // ceil
            let hours = (remaining_ms + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR;
            u32::try_from(hours).unwrap_or(u32::MAX)
        };
        Expiry { is_expired, remaining_hours }
    }
}

pub fn compute_expiry(
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Expiry {
    ExpiryWindow::new(created_at, expires_at).at(now)
}

/// How long the delivered artifact stays reachable, per action family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub download_lifetime: Option<Duration>,
    pub object_storage_lifetime: Option<Duration>,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            download_lifetime: Some(Duration::hours(6)),
            object_storage_lifetime: Some(Duration::days(7)),
        }
    }
}

impl ExpiryPolicy {
    pub fn lifetime(&self, family: ActionFamily) -> Option<Duration> {
        match family {
            ActionFamily::Download => self.download_lifetime,
            ActionFamily::ObjectStorageLink => self.object_storage_lifetime,
            ActionFamily::Launch(_) | ActionFamily::Unsupported => None,
        }
    }

    pub fn window_for(&self, compose: &Compose) -> Option<ExpiryWindow> {
        let image_type = compose.image_request()?.image_type;
        let lifetime = self.lifetime(ActionFamily::of(image_type))?;
        // an unrepresentable end is treated as no window
        let expires_at = compose.created_at.checked_add_signed(lifetime)?;
        Some(ExpiryWindow::new(compose.created_at, expires_at))
    }
}
