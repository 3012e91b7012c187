#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures_util::future::LocalBoxFuture;

use forum_frontend::app::{Forum, Ports};
use forum_frontend::config::Config;
use forum_frontend::connection::{Body, FormValue, Method, Request, Response, Transport};
use forum_frontend::error::ClientError;
use forum_frontend::records::{Comment, Post, PostId};
use forum_frontend::schedule::{Scheduler, TimerId};
use forum_frontend::session::{MemoryStore, Session};
use forum_frontend::view::{Banner, CommentLine, PostCard, Surface};

pub const PAGE_SIZE: usize = 10;
pub const NOW: &str = "2025-03-01 10:00:00";

pub fn post(id: PostId, title: &str, content: &str) -> Post {
    Post {
        id,
        title: title.to_owned(),
        content: content.to_owned(),
        image_url: None,
        author: "lan".to_owned(),
        created_at: format!("2025-02-{:02} 08:00:00", id),
    }
}

pub fn comment(author: &str, text: &str) -> Comment {
    Comment {
        author: author.to_owned(),
        comment: text.to_owned(),
        created_at: NOW.to_owned(),
    }
}

pub fn guest() -> Session {
    Session::default()
}

pub fn member(username: &str, role: &str) -> Session {
    Session {
        token: Some(format!("tok-{}", username)),
        username: Some(username.to_owned()),
        role: Some(role.to_owned()),
    }
}

#[derive(Clone, Debug)]
pub enum Failure {
    Status(u16),
    Network,
}

type Parked = (Request, oneshot::Sender<Result<Response, ClientError>>);

/// In-memory stand-in for the forum API.
///
/// Posts are kept newest first, like the real `ORDER BY created_at DESC`.
/// Tokens are `tok-<username>`; `root` is the only admin.
#[derive(Default)]
pub struct FakeServer {
    posts: RefCell<Vec<Post>>,
    comments: RefCell<HashMap<PostId, Vec<Comment>>>,
    next_id: Cell<PostId>,
    log: RefCell<Vec<String>>,
    bearers: RefCell<Vec<Option<String>>>,
    failures: RefCell<Vec<(Method, String, Failure)>>,
    holding: Cell<bool>,
    parked: RefCell<Vec<Parked>>,
}

impl FakeServer {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|post| post.id).max().unwrap_or(0) + 1;
        let server = FakeServer::default();
        *server.posts.borrow_mut() = posts;
        server.next_id.set(next_id);
        server
    }

    pub fn add_comment(&self, post_id: PostId, comment: Comment) {
        self.comments
            .borrow_mut()
            .entry(post_id)
            .or_default()
            .push(comment);
    }

    /// Every later `method` request whose path starts with `prefix` fails.
    pub fn fail(&self, method: Method, prefix: &str, failure: Failure) {
        self.failures
            .borrow_mut()
            .push((method, prefix.to_owned(), failure));
    }

    pub fn heal(&self) {
        self.failures.borrow_mut().clear();
    }

    /// Park requests until released, to control response order.
    pub fn hold(&self) {
        self.holding.set(true);
    }

    pub fn parked(&self) -> Vec<String> {
        self.parked
            .borrow()
            .iter()
            .map(|(request, _)| describe(request))
            .collect()
    }

    /// Answers the oldest parked request matching `line`, e.g. `GET /comments/1`.
    pub fn release(&self, line: &str) {
        let parked = {
            let mut parked = self.parked.borrow_mut();
            let index = parked
                .iter()
                .position(|(request, _)| describe(request) == line)
                .unwrap_or_else(|| panic!("nothing parked for {:?}", line));
            parked.remove(index)
        };
        let (request, reply) = parked;
        let _ = reply.send(self.answer(&request));
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn bearers(&self) -> Vec<Option<String>> {
        self.bearers.borrow().clone()
    }

    pub fn forget_requests(&self) {
        self.log.borrow_mut().clear();
        self.bearers.borrow_mut().clear();
    }

    pub fn post_ids(&self) -> Vec<PostId> {
        self.posts.borrow().iter().map(|post| post.id).collect()
    }

    fn user(&self, request: &Request) -> Option<(String, &'static str)> {
        let username = request.bearer.as_deref()?.strip_prefix("tok-")?.to_owned();
        let role = if username == "root" { "admin" } else { "student" };
        Some((username, role))
    }

    fn answer(&self, request: &Request) -> Result<Response, ClientError> {
        let path = request.url.path().to_owned();
        let failure = self
            .failures
            .borrow()
            .iter()
            .find(|(method, prefix, _)| *method == request.method && path.starts_with(prefix.as_str()))
            .map(|(_, _, failure)| failure.clone());

        match failure {
            Some(Failure::Network) => Err(ClientError::Network("connection refused".into())),
            Some(Failure::Status(status)) => Ok(reply(status, r#"{"error": "failed"}"#.into())),
            None => Ok(self.route(request)),
        }
    }

    fn route(&self, request: &Request) -> Response {
        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|segments| segments.map(str::to_owned).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let query: HashMap<String, String> = request.url.query_pairs().into_owned().collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["posts"]) => {
                let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                let posts: Vec<Post> = self
                    .posts
                    .borrow()
                    .iter()
                    .skip((page.max(1) - 1) * PAGE_SIZE)
                    .take(PAGE_SIZE)
                    .cloned()
                    .collect();
                json(200, &posts)
            }
            (Method::Get, ["posts", "search"]) => {
                let needle = query.get("q").cloned().unwrap_or_default();
                if needle.is_empty() {
                    return reply(400, r#"{"error": "missing query"}"#.into());
                }
                let posts: Vec<Post> = self
                    .posts
                    .borrow()
                    .iter()
                    .filter(|post| post.title.contains(&needle) || post.content.contains(&needle))
                    .cloned()
                    .collect();
                json(200, &posts)
            }
            (Method::Post, ["posts"]) => {
                let Some((author, _)) = self.user(request) else {
                    return reply(401, String::new());
                };
                let Body::Form(fields) = &request.body else {
                    return reply(400, String::new());
                };
                let text = |name: &str| {
                    fields.iter().find_map(|field| match &field.value {
                        FormValue::Text(value) if field.name == name => Some(value.clone()),
                        _ => None,
                    })
                };
                let image_url = fields.iter().find_map(|field| match &field.value {
                    FormValue::File { file_name, .. } if field.name == "image" => {
                        Some(format!("/uploads/{}", file_name))
                    }
                    _ => None,
                });
                let (Some(title), Some(content)) = (text("title"), text("content")) else {
                    return reply(400, String::new());
                };
                if title.is_empty() || content.is_empty() {
                    return reply(400, String::new());
                }

                let id = self.next_id.get();
                self.next_id.set(id + 1);
                self.posts.borrow_mut().insert(
                    0,
                    Post {
                        id,
                        title,
                        content,
                        image_url,
                        author,
                        created_at: NOW.to_owned(),
                    },
                );
                reply(201, r#"{"message": "created"}"#.into())
            }
            (Method::Delete, ["posts", id]) => {
                let Some((_, role)) = self.user(request) else {
                    return reply(401, String::new());
                };
                if role != "admin" {
                    return reply(403, String::new());
                }
                let id: PostId = id.parse().unwrap_or_default();
                let mut posts = self.posts.borrow_mut();
                let Some(index) = posts.iter().position(|post| post.id == id) else {
                    return reply(404, String::new());
                };
                posts.remove(index);
                self.comments.borrow_mut().remove(&id);
                reply(200, r#"{"message": "deleted"}"#.into())
            }
            (Method::Get, ["comments", id]) => {
                let id: PostId = id.parse().unwrap_or_default();
                let comments = self.comments.borrow().get(&id).cloned().unwrap_or_default();
                json(200, &comments)
            }
            (Method::Post, ["comments", id]) => {
                let Some((author, _)) = self.user(request) else {
                    return reply(401, String::new());
                };
                let Body::Json(body) = &request.body else {
                    return reply(400, String::new());
                };
                let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
                let Some(text) = parsed.get("comment").and_then(|c| c.as_str()) else {
                    return reply(400, String::new());
                };
                let id: PostId = id.parse().unwrap_or_default();
                self.add_comment(id, comment(&author, text));
                reply(201, r#"{"message": "added"}"#.into())
            }
            _ => reply(404, String::new()),
        }
    }
}

impl Transport for FakeServer {
    fn send(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, ClientError>> {
        self.log.borrow_mut().push(describe(&request));
        self.bearers.borrow_mut().push(request.bearer.clone());

        if self.holding.get() {
            let (sender, receiver) = oneshot::channel();
            self.parked.borrow_mut().push((request, sender));
            return Box::pin(async move {
                receiver
                    .await
                    .unwrap_or_else(|_| Err(ClientError::Network("request dropped".into())))
            });
        }

        let answer = self.answer(&request);
        Box::pin(async move { answer })
    }
}

pub fn describe(request: &Request) -> String {
    match request.url.query() {
        Some(query) => format!("{} {}?{}", request.method.as_str(), request.url.path(), query),
        None => format!("{} {}", request.method.as_str(), request.url.path()),
    }
}

fn reply(status: u16, body: String) -> Response {
    Response { status, body }
}

fn json<T: serde::Serialize>(status: u16, value: &T) -> Response {
    reply(status, serde_json::to_string(value).unwrap())
}

/// Records what the pipeline asked the page to show.
pub struct RecordingSurface {
    pub banner: RefCell<Option<Banner>>,
    pub feed: RefCell<Vec<PostCard>>,
    pub feed_renders: Cell<usize>,
    pub comments: RefCell<HashMap<PostId, Vec<CommentLine>>>,
    pub query: RefCell<String>,
    pub notices: RefCell<Vec<String>>,
    pub confirm_answer: Cell<bool>,
    pub confirmations: RefCell<Vec<String>>,
    pub post_form_resets: Cell<usize>,
    pub comment_form_resets: RefCell<Vec<PostId>>,
    pub reloads: Cell<usize>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        RecordingSurface {
            banner: RefCell::new(None),
            feed: RefCell::new(Vec::new()),
            feed_renders: Cell::new(0),
            comments: RefCell::new(HashMap::new()),
            query: RefCell::new(String::new()),
            notices: RefCell::new(Vec::new()),
            confirm_answer: Cell::new(true),
            confirmations: RefCell::new(Vec::new()),
            post_form_resets: Cell::new(0),
            comment_form_resets: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
        }
    }
}

impl RecordingSurface {
    pub fn feed_ids(&self) -> Vec<PostId> {
        self.feed.borrow().iter().map(|card| card.post_id).collect()
    }

    pub fn comments_of(&self, post_id: PostId) -> Option<Vec<CommentLine>> {
        self.comments.borrow().get(&post_id).cloned()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }
}

impl Surface for RecordingSurface {
    fn show_banner(&self, banner: &Banner) {
        *self.banner.borrow_mut() = Some(banner.clone());
    }

    fn replace_feed(&self, cards: &[PostCard]) {
        *self.feed.borrow_mut() = cards.to_vec();
        *self.comments.borrow_mut() = cards.iter().map(|card| (card.post_id, Vec::new())).collect();
        self.feed_renders.set(self.feed_renders.get() + 1);
    }

    fn replace_comments(&self, post_id: PostId, lines: &[CommentLine]) -> bool {
        match self.comments.borrow_mut().get_mut(&post_id) {
            Some(container) => {
                *container = lines.to_vec();
                true
            }
            None => false,
        }
    }

    fn search_query(&self) -> String {
        self.query.borrow().clone()
    }

    fn reset_post_form(&self) {
        self.post_form_resets.set(self.post_form_resets.get() + 1);
    }

    fn reset_comment_form(&self, post_id: PostId) {
        self.comment_form_resets.borrow_mut().push(post_id);
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_owned());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirmations.borrow_mut().push(message.to_owned());
        self.confirm_answer.get()
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}

struct Timer {
    id: TimerId,
    due: u64,
    task: Box<dyn FnOnce()>,
}

/// Timers on a clock that only moves when told to.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<i32>,
    timers: RefCell<Vec<Timer>>,
}

impl ManualScheduler {
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Fires every timer due at or before `time`, in due order.
    pub fn advance_to(&self, time: u64) {
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= time)
                    .min_by_key(|(_, timer)| (timer.due, timer.id.0))
                    .map(|(index, _)| index);
                due.map(|index| timers.remove(index))
            };

            match next {
                Some(timer) => {
                    self.now.set(timer.due);
                    (timer.task)();
                }
                None => break,
            }
        }
        self.now.set(self.now.get().max(time));
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TimerId> {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.timers.borrow_mut().push(Timer {
            id,
            due: self.now.get() + u64::from(delay_ms),
            task,
        });
        Some(id)
    }

    fn cancel(&self, timer: TimerId) {
        self.timers.borrow_mut().retain(|pending| pending.id != timer);
    }
}

pub struct Harness {
    pub pool: LocalPool,
    pub server: Rc<FakeServer>,
    pub surface: Rc<RecordingSurface>,
    pub scheduler: Rc<ManualScheduler>,
    pub store: Rc<MemoryStore>,
    pub forum: Rc<Forum>,
}

impl Harness {
    pub fn new(session: Session, server: FakeServer) -> Self {
        let pool = LocalPool::new();
        let store = Rc::new(MemoryStore::new());
        session.persist(store.as_ref());

        let server = Rc::new(server);
        let surface = Rc::new(RecordingSurface::default());
        let scheduler = Rc::new(ManualScheduler::default());

        let forum = Forum::new(
            Config::default(),
            Ports {
                store: store.clone(),
                transport: server.clone(),
                surface: surface.clone(),
                scheduler: scheduler.clone(),
                spawner: Rc::new(pool.spawner()),
            },
        );

        Harness {
            pool,
            server,
            surface,
            scheduler,
            store,
            forum,
        }
    }

    /// Page load, run to quiescence, request log emptied.
    pub fn started(session: Session, server: FakeServer) -> Self {
        let mut harness = Harness::new(session, server);
        harness.forum.start();
        harness.settle();
        harness.server.forget_requests();
        harness
    }

    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Types `value` into the search box at time `at`.
    pub fn type_search(&mut self, at: u64, value: &str) {
        self.scheduler.advance_to(at);
        self.settle();
        *self.surface.query.borrow_mut() = value.to_owned();
        self.forum.search_input();
    }

    pub fn advance_to(&mut self, time: u64) {
        self.scheduler.advance_to(time);
        self.settle();
    }
}
