use serde::{Deserialize, Serialize};

/// Directed edge: `follower_id` reads `followed_id`'s posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: i64,
    pub followed_id: i64,
}

impl FollowEdge {
    pub fn new(follower_id: i64, followed_id: i64) -> Self {
        Self {
            follower_id,
            followed_id,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.follower_id == self.followed_id
    }
}

/// Size of a user's neighbourhood in the follow graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}
