//! Domain to DTO mapping shared by the handlers.

use microblog_core::domain::{FeedEntry, Page, User};
use microblog_shared::dto::{AuthorResponse, PageResponse, PostResponse, UserResponse};

const AVATAR_SIZE: u32 = 128;

pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        about_me: user.about_me.clone(),
        avatar: user.avatar(AVATAR_SIZE),
        last_seen: user.last_seen.to_rfc3339(),
    }
}

pub fn post_response(entry: FeedEntry) -> PostResponse {
    PostResponse {
        id: entry.post.id,
        body: entry.post.body,
        timestamp: entry.post.timestamp.to_rfc3339(),
        author: AuthorResponse {
            id: entry.author.id,
            username: entry.author.username,
            avatar_hash: entry.author.avatar_hash,
        },
    }
}

/// Convert a page, carrying the neighbour page numbers for navigation.
pub fn page_response<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let next_page = page.next_num();
    let prev_page = page.prev_num();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        has_next: page.has_next,
        has_prev: page.has_prev,
        next_page,
        prev_page,
    }
}
