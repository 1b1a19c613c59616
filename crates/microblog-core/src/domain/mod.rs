//! Domain entities - the core business objects.

mod follow;
mod page;
mod post;
mod user;

pub use follow::{FollowCounts, FollowEdge};
pub use page::{MAX_PER_PAGE, Page, PageRequest};
pub use post::{AuthorSummary, FeedEntry, MAX_BODY_CHARS, NewPost, Post};
pub use user::{NewUser, ProfileUpdate, User};
