use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::ports::UserRepository;

/// Best-effort `last_seen` tracking.
#[derive(Clone)]
pub struct Presence {
    users: Arc<dyn UserRepository>,
}

impl Presence {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Record that `user_id` was active at `now`. Failures are logged, never
    /// returned, so the triggering request carries on.
    pub async fn touch(&self, user_id: i64, now: DateTime<Utc>) {
        if let Err(e) = self.users.touch_last_seen(user_id, now).await {
            tracing::warn!(user_id, error = %e, "Failed to record last_seen");
        }
    }
}
