use url::Url;

use crate::records::{Comment, Post, PostId};
use crate::session::Session;

/// Everything one feed card shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostCard {
    pub post_id: PostId,
    pub title: String,
    pub content: String,
    pub image_src: Option<String>,
    pub byline: String,
    pub can_delete: bool,
}

impl PostCard {
    pub fn new(post: &Post, session: &Session, api_url: &Url) -> Self {
        PostCard {
            post_id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            image_src: post.image_path().map(|path| media_url(api_url, path)),
            byline: format!("Posted by {} on {}", post.author, post.created_at),
            can_delete: session.is_admin(),
        }
    }
}

/// Cards in server order; never re-sorted here.
pub fn feed_cards(posts: &[Post], session: &Session, api_url: &Url) -> Vec<PostCard> {
    posts
        .iter()
        .map(|post| PostCard::new(post, session, api_url))
        .collect()
}

/// Upload paths are served by the API host under the same base path as the
/// endpoints, e.g. `/uploads/x.png` on `https://host/api/` is
/// `https://host/api/uploads/x.png`. Absolute URLs are kept as they are.
pub fn media_url(api_url: &Url, path: &str) -> String {
    if let Ok(absolute) = Url::parse(path) {
        return absolute.into();
    }

    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = api_url.clone();
    let joined = format!(
        "{}/{}",
        api_url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.set_query(query);
    url.into()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentLine {
    pub author: String,
    pub text: String,
    pub created_at: String,
}

impl From<&Comment> for CommentLine {
    fn from(comment: &Comment) -> Self {
        CommentLine {
            author: comment.author.clone(),
            text: comment.comment.clone(),
            created_at: comment.created_at.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Banner {
    Guest,
    Member { username: String, role: String },
}

impl Banner {
    pub fn for_session(session: &Session) -> Self {
        if !session.is_authenticated() {
            return Banner::Guest;
        }

        Banner::Member {
            username: session.username.clone().unwrap_or_default(),
            role: session.role.clone().unwrap_or_default(),
        }
    }

    /// The new-post form is only offered to logged-in users.
    pub fn shows_post_form(&self) -> bool {
        matches!(self, Banner::Member { .. })
    }
}

/// The rendered page, as far as the feed pipeline is concerned.
///
/// `replace_feed` discards whatever the feed region held and rebuilds it, and
/// with it the per-post comment containers. There is no diffing.
pub trait Surface {
    fn show_banner(&self, banner: &Banner);

    fn replace_feed(&self, cards: &[PostCard]);

    /// `false` when `post_id` is not part of the displayed feed any more.
    fn replace_comments(&self, post_id: PostId, lines: &[CommentLine]) -> bool;

    fn search_query(&self) -> String;

    fn reset_post_form(&self);

    fn reset_comment_form(&self, post_id: PostId);

    /// Blocking notice, e.g. `window.alert`.
    fn notify(&self, message: &str);

    fn confirm(&self, message: &str) -> bool;

    fn reload(&self);
}
