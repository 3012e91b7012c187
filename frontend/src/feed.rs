//! Feed rendering and the per-post comment loads it triggers.

use std::rc::Rc;

use crate::app::Forum;
use crate::generation::FeedTicket;
use crate::records::{Post, PostId};
use crate::view::{feed_cards, CommentLine};

pub const FIRST_PAGE: u32 = 1;

/// Where a feed snapshot comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedSource {
    Page(u32),
    Search(String),
}

impl FeedSource {
    /// An empty search box means the unfiltered first page.
    pub fn for_query(query: String) -> Self {
        if query.is_empty() {
            FeedSource::Page(FIRST_PAGE)
        } else {
            FeedSource::Search(query)
        }
    }
}

impl Forum {
    pub fn load_feed(self: &Rc<Self>, page: u32) {
        self.fetch_feed(FeedSource::Page(page));
    }

    /// Fetches a snapshot and, if it is still the newest one asked for,
    /// replaces the feed with it. A failed fetch leaves the old feed up.
    pub fn fetch_feed(self: &Rc<Self>, source: FeedSource) {
        let ticket = self.generations.issue_feed();
        let forum = Rc::clone(self);

        self.spawn(async move {
            let fetched = match &source {
                FeedSource::Page(page) => forum.api.list_posts(*page).await,
                FeedSource::Search(query) => forum.api.search_posts(query).await,
            };

            match fetched {
                Ok(posts) => forum.apply_feed(ticket, &posts),
                Err(err) => log::error!("failed to load posts ({:?}): {}", source, err),
            }
        });
    }

    fn apply_feed(self: &Rc<Self>, ticket: FeedTicket, posts: &[Post]) {
        if !self.generations.is_current_feed(ticket) {
            log::debug!("discarding superseded feed of {} posts", posts.len());
            return;
        }
        self.render_feed(posts);
    }

    /// Full replacement, then one independent comment load per post.
    pub fn render_feed(self: &Rc<Self>, posts: &[Post]) {
        let generation = self.generations.begin_render();
        let cards = feed_cards(posts, &self.session, &self.config.api_url);
        self.surface.replace_feed(&cards);
        log::debug!("rendered feed generation {} ({} posts)", generation, posts.len());

        for post in posts {
            self.load_comments(post.id);
        }
    }

    pub fn load_comments(self: &Rc<Self>, post_id: PostId) {
        let ticket = self.generations.issue_comments(post_id);
        let forum = Rc::clone(self);

        self.spawn(async move {
            let comments = match forum.api.list_comments(post_id).await {
                Ok(comments) => comments,
                Err(err) => {
                    log::error!("failed to load comments for post {}: {}", post_id, err);
                    return;
                }
            };

            if !forum.generations.is_current_comments(post_id, ticket) {
                log::debug!("discarding stale comments for post {}", post_id);
                return;
            }

            let lines: Vec<CommentLine> = comments.iter().map(CommentLine::from).collect();
            if !forum.surface.replace_comments(post_id, &lines) {
                log::debug!("post {} no longer displayed", post_id);
            }
        });
    }
}
