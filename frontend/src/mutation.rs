//! Create-post, create-comment and delete-post.
//!
//! Each action either is blocked locally or sends exactly one request. On
//! success the affected scope is re-fetched: the whole feed for post
//! changes, one comment container for comments. A rejected request and a
//! non-2xx status end up in the same place: a generic notice.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;

use crate::app::Forum;
use crate::error::ClientError;
use crate::feed::FIRST_PAGE;
use crate::records::{NewPost, PostId};

pub const LOGIN_TO_POST: &'static str = "Please log in to create a post!";
pub const LOGIN_TO_COMMENT: &'static str = "Please log in to comment!";
pub const LOGIN_TO_DELETE: &'static str = "Please log in to delete posts!";
pub const CONFIRM_DELETE: &'static str = "Are you sure you want to delete this post?";

pub const POST_FAILED: &'static str = "Error creating post";
pub const COMMENT_FAILED: &'static str = "Error adding comment";
pub const DELETE_FAILED: &'static str = "Error deleting post";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reset {
    Nothing,
    PostForm,
    CommentForm(PostId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    Feed,
    Comments(PostId),
}

pub struct Mutation {
    pub request: LocalBoxFuture<'static, Result<(), ClientError>>,
    pub reset: Reset,
    pub refresh: Refresh,
    pub failure: &'static str,
}

impl Forum {
    pub fn create_post(self: &Rc<Self>, post: NewPost) -> Result<(), ClientError> {
        self.require_login(LOGIN_TO_POST)?;

        let api = self.api.clone();
        self.submit(Mutation {
            request: Box::pin(async move { api.create_post(post).await }),
            reset: Reset::PostForm,
            refresh: Refresh::Feed,
            failure: POST_FAILED,
        });
        Ok(())
    }

    pub fn create_comment(self: &Rc<Self>, post_id: PostId, text: String) -> Result<(), ClientError> {
        self.require_login(LOGIN_TO_COMMENT)?;

        let api = self.api.clone();
        self.submit(Mutation {
            request: Box::pin(async move { api.create_comment(post_id, &text).await }),
            reset: Reset::CommentForm(post_id),
            refresh: Refresh::Comments(post_id),
            failure: COMMENT_FAILED,
        });
        Ok(())
    }

    /// The server decides who may delete; the page only asks for confirmation.
    pub fn delete_post(self: &Rc<Self>, post_id: PostId) -> Result<(), ClientError> {
        self.require_login(LOGIN_TO_DELETE)?;

        if !self.surface.confirm(CONFIRM_DELETE) {
            log::debug!("deletion of post {} cancelled", post_id);
            return Ok(());
        }

        let api = self.api.clone();
        self.submit(Mutation {
            request: Box::pin(async move { api.delete_post(post_id).await }),
            reset: Reset::Nothing,
            refresh: Refresh::Feed,
            failure: DELETE_FAILED,
        });
        Ok(())
    }

    /// Sends the request, then on success resets the form and re-fetches.
    pub fn submit(self: &Rc<Self>, mutation: Mutation) {
        let forum = Rc::clone(self);

        self.spawn(async move {
            let Mutation {
                request,
                reset,
                refresh,
                failure,
            } = mutation;

            if let Err(err) = request.await {
                log::error!("{}: {}", failure, err);
                forum.surface.notify(failure);
                return;
            }

            match reset {
                Reset::Nothing => {}
                Reset::PostForm => forum.surface.reset_post_form(),
                Reset::CommentForm(post_id) => forum.surface.reset_comment_form(post_id),
            }

            match refresh {
                Refresh::Feed => forum.load_feed(FIRST_PAGE),
                Refresh::Comments(post_id) => forum.load_comments(post_id),
            }
        });
    }

    fn require_login(&self, message: &str) -> Result<(), ClientError> {
        if self.session.is_authenticated() {
            return Ok(());
        }

        self.surface.notify(message);
        Err(ClientError::AuthenticationRequired)
    }
}
