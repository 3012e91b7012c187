use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::records::PostId;

/// Stamp of one feed request (full list or search).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedTicket(u64);

/// Stamp of one comment-list request for one post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommentTicket {
    render: u64,
    seq: u64,
}

/// Decides whether a response that just arrived may still touch the page.
///
/// Feed responses: only the most recently issued feed request wins.
/// Comment responses: only the latest request for that post, and only if the
/// feed it was issued for is still the one on screen.
#[derive(Debug, Default)]
pub struct Generations {
    feed_issued: Cell<u64>,
    render: Cell<u64>,
    comment_issued: RefCell<HashMap<PostId, u64>>,
}

impl Generations {
    pub fn issue_feed(&self) -> FeedTicket {
        let next = self.feed_issued.get() + 1;
        self.feed_issued.set(next);
        FeedTicket(next)
    }

    pub fn is_current_feed(&self, ticket: FeedTicket) -> bool {
        ticket.0 == self.feed_issued.get()
    }

    /// Called right before a new feed replaces the old one; every comment
    /// request still in flight for the old feed becomes stale.
    pub fn begin_render(&self) -> u64 {
        let next = self.render.get() + 1;
        self.render.set(next);
        self.comment_issued.borrow_mut().clear();
        next
    }

    pub fn issue_comments(&self, post_id: PostId) -> CommentTicket {
        let mut issued = self.comment_issued.borrow_mut();
        let seq = issued.entry(post_id).or_insert(0);
        *seq += 1;

        CommentTicket {
            render: self.render.get(),
            seq: *seq,
        }
    }

    pub fn is_current_comments(&self, post_id: PostId, ticket: CommentTicket) -> bool {
        ticket.render == self.render.get()
            && self.comment_issued.borrow().get(&post_id) == Some(&ticket.seq)
    }
}
