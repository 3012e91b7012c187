//! The [`Surface`] of a real page.
//!
//! Expects the static skeleton served with the app:
//! `#user-info`, `#post-form` (wrapping `#new-post-form`), `#search-input`
//! and `#posts`. Post data is always inserted as text, never as markup.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlTextAreaElement, Window,
};

use crate::app::UiEvent;
use crate::error::PageError;
use crate::records::{ImageUpload, NewPost, PostId};
use crate::view::{Banner, CommentLine, PostCard, Surface};

pub const USER_INFO_SELECTOR: &'static str = "#user-info";
pub const POST_PANEL_SELECTOR: &'static str = "#post-form";
pub const POST_FORM_SELECTOR: &'static str = "#new-post-form";
pub const SEARCH_INPUT_SELECTOR: &'static str = "#search-input";
pub const POSTS_SELECTOR: &'static str = "#posts";

pub type Dispatch = Rc<dyn Fn(UiEvent)>;

type Listener = Closure<dyn FnMut(Event)>;

/// A displayed post: its card subtree and the parts of it that are updated
/// after rendering. Dropping it detaches its listeners.
struct RenderTarget {
    root: Element,
    comments: Element,
    comment_form: HtmlFormElement,
    _listeners: Vec<Listener>,
}

pub struct DomSurface {
    window: Window,
    document: Document,
    user_info: Element,
    post_panel: HtmlElement,
    post_form: HtmlFormElement,
    search_input: HtmlInputElement,
    posts: Element,
    targets: RefCell<HashMap<PostId, RenderTarget>>,
    banner_listeners: RefCell<Vec<Listener>>,
    page_listeners: RefCell<Vec<Listener>>,
    dispatch: RefCell<Option<Dispatch>>,
}

fn query<T: JsCast>(document: &Document, selector: &'static str) -> Result<T, PageError> {
    document
        .query_selector(selector)
        .map_err(PageError::js)?
        .ok_or(PageError::MissingElement(selector))?
        .dyn_into::<T>()
        .map_err(|_| PageError::MissingElement(selector))
}

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Listener, PageError> {
    let listener = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
        .map_err(PageError::js)?;
    Ok(listener)
}

fn set_attributes(element: &Element, attributes: &[(&str, &str)]) -> Result<(), PageError> {
    for (name, value) in attributes {
        element.set_attribute(name, value).map_err(PageError::js)?;
    }
    Ok(())
}

impl DomSurface {
    pub fn attach(window: Window) -> Result<Self, PageError> {
        let document = window
            .document()
            .ok_or(PageError::MissingElement("document"))?;

        Ok(DomSurface {
            user_info: query(&document, USER_INFO_SELECTOR)?,
            post_panel: query(&document, POST_PANEL_SELECTOR)?,
            post_form: query(&document, POST_FORM_SELECTOR)?,
            search_input: query(&document, SEARCH_INPUT_SELECTOR)?,
            posts: query(&document, POSTS_SELECTOR)?,
            targets: RefCell::new(HashMap::new()),
            banner_listeners: RefCell::new(Vec::new()),
            page_listeners: RefCell::new(Vec::new()),
            dispatch: RefCell::new(None),
            window,
            document,
        })
    }

    /// Routes page events to `dispatch`: search typing, new-post submit, and
    /// everything later rendered into cards and the banner.
    pub fn bind(&self, dispatch: Dispatch) -> Result<(), PageError> {
        let on_input = {
            let dispatch = dispatch.clone();
            listen(&self.search_input, "input", move |_event| {
                dispatch(UiEvent::SearchInput)
            })?
        };

        let on_submit = {
            let dispatch = dispatch.clone();
            let form = self.post_form.clone();
            listen(&self.post_form, "submit", move |event: Event| {
                event.prevent_default();
                let dispatch = dispatch.clone();
                let form = form.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match read_post_form(&form).await {
                        Ok(post) => dispatch(UiEvent::SubmitPost(post)),
                        Err(err) => log::error!("could not read the post form: {}", err),
                    }
                });
            })?
        };

        *self.page_listeners.borrow_mut() = vec![on_input, on_submit];
        *self.dispatch.borrow_mut() = Some(dispatch);
        Ok(())
    }

    fn dispatcher(&self) -> Result<Dispatch, PageError> {
        self.dispatch
            .borrow()
            .clone()
            .ok_or(PageError::MissingElement("event dispatcher"))
    }

    fn element(&self, tag: &str, class: &str) -> Result<Element, PageError> {
        let element = self.document.create_element(tag).map_err(PageError::js)?;
        if !class.is_empty() {
            element.set_class_name(class);
        }
        Ok(element)
    }

    fn child(&self, parent: &Element, tag: &str, class: &str) -> Result<Element, PageError> {
        let element = self.element(tag, class)?;
        parent.append_child(&element).map_err(PageError::js)?;
        Ok(element)
    }

    fn text_child(
        &self,
        parent: &Element,
        tag: &str,
        class: &str,
        text: &str,
    ) -> Result<Element, PageError> {
        let element = self.child(parent, tag, class)?;
        element.set_text_content(Some(text));
        Ok(element)
    }

    fn try_show_banner(&self, banner: &Banner) -> Result<(), PageError> {
        self.user_info.set_inner_html("");
        let mut listeners = Vec::new();

        match banner {
            Banner::Guest => {
                let login = self.text_child(&self.user_info, "a", "btn btn-outline-primary me-2", "Log in")?;
                login.set_attribute("href", "/login").map_err(PageError::js)?;
                let register = self.text_child(&self.user_info, "a", "btn btn-outline-success", "Register")?;
                register.set_attribute("href", "/register").map_err(PageError::js)?;
            }
            Banner::Member { username, role } => {
                self.text_child(
                    &self.user_info,
                    "span",
                    "navbar-text me-2",
                    &format!("Hello, {} ({})", username, role),
                )?;
                let logout = self.text_child(&self.user_info, "button", "btn btn-outline-danger", "Log out")?;
                let dispatch = self.dispatcher()?;
                listeners.push(listen(&logout, "click", move |_event| {
                    dispatch(UiEvent::Logout)
                })?);
            }
        }

        let display = if banner.shows_post_form() { "block" } else { "none" };
        self.post_panel
            .style()
            .set_property("display", display)
            .map_err(PageError::js)?;

        *self.banner_listeners.borrow_mut() = listeners;
        Ok(())
    }

    fn build_card(&self, card: &PostCard, dispatch: &Dispatch) -> Result<(Element, RenderTarget), PageError> {
        let root = self.element("div", "card post-card")?;
        let body = self.child(&root, "div", "card-body")?;

        self.text_child(&body, "h5", "card-title", &card.title)?;
        self.text_child(&body, "p", "card-text", &card.content)?;
        if let Some(src) = &card.image_src {
            let image = self.child(&body, "img", "img-fluid mb-3")?;
            set_attributes(&image, &[("src", src.as_str()), ("alt", "Post image")])?;
        }
        let meta = self.child(&body, "p", "card-text")?;
        self.text_child(&meta, "small", "text-muted", &card.byline)?;

        let post_id = card.post_id;
        let mut listeners = Vec::new();

        if card.can_delete {
            let delete = self.text_child(&body, "button", "btn btn-danger btn-sm", "Delete")?;
            delete.set_attribute("type", "button").map_err(PageError::js)?;
            let dispatch = dispatch.clone();
            listeners.push(listen(&delete, "click", move |_event| {
                dispatch(UiEvent::DeletePost(post_id))
            })?);
        }

        let comments = self.child(&body, "div", "comments")?;

        let comment_form: HtmlFormElement = self
            .child(&body, "form", "comment-form mt-2")?
            .dyn_into()
            .map_err(|_| PageError::MissingElement("comment form"))?;
        let group = self.child(&comment_form, "div", "input-group")?;
        let input = self.child(&group, "input", "form-control")?;
        set_attributes(
            &input,
            &[
                ("type", "text"),
                ("name", "comment"),
                ("placeholder", "Write a comment..."),
                ("required", ""),
            ],
        )?;
        let send = self.text_child(&group, "button", "btn btn-primary", "Send")?;
        send.set_attribute("type", "submit").map_err(PageError::js)?;

        let input: HtmlInputElement = input
            .dyn_into()
            .map_err(|_| PageError::MissingElement("comment input"))?;
        let dispatch = dispatch.clone();
        listeners.push(listen(&comment_form, "submit", move |event: Event| {
            event.prevent_default();
            dispatch(UiEvent::SubmitComment {
                post_id,
                text: input.value(),
            })
        })?);

        Ok((
            root.clone(),
            RenderTarget {
                root,
                comments,
                comment_form,
                _listeners: listeners,
            },
        ))
    }

    fn comment_node(&self, line: &CommentLine) -> Result<Element, PageError> {
        let node = self.element("div", "comment")?;
        self.text_child(&node, "strong", "", &line.author)?;
        let text = self.document.create_text_node(&format!(": {} ", line.text));
        node.append_child(&text).map_err(PageError::js)?;
        self.text_child(&node, "small", "", &format!("({})", line.created_at))?;
        Ok(node)
    }
}

impl Surface for DomSurface {
    fn show_banner(&self, banner: &Banner) {
        if let Err(err) = self.try_show_banner(banner) {
            log::error!("could not render user info: {}", err);
        }
    }

    fn replace_feed(&self, cards: &[PostCard]) {
        let dispatch = match self.dispatcher() {
            Ok(dispatch) => dispatch,
            Err(err) => {
                log::error!("feed not rendered: {}", err);
                return;
            }
        };

        self.posts.set_inner_html("");
        let mut targets = HashMap::new();

        for card in cards {
            let built = self.build_card(card, &dispatch).and_then(|(root, target)| {
                self.posts.append_child(&root).map_err(PageError::js)?;
                Ok(target)
            });
            match built {
                Ok(target) => {
                    targets.insert(card.post_id, target);
                }
                Err(err) => log::error!("could not render post {}: {}", card.post_id, err),
            }
        }

        *self.targets.borrow_mut() = targets;
    }

    fn replace_comments(&self, post_id: PostId, lines: &[CommentLine]) -> bool {
        let targets = self.targets.borrow();
        let Some(target) = targets.get(&post_id).filter(|target| target.root.is_connected())
        else {
            return false;
        };

        target.comments.set_inner_html("");
        for line in lines {
            let appended = self
                .comment_node(line)
                .and_then(|node| target.comments.append_child(&node).map_err(PageError::js));
            if let Err(err) = appended {
                log::error!("could not render a comment on post {}: {}", post_id, err);
            }
        }
        true
    }

    fn search_query(&self) -> String {
        self.search_input.value()
    }

    fn reset_post_form(&self) {
        self.post_form.reset();
    }

    fn reset_comment_form(&self, post_id: PostId) {
        if let Some(target) = self.targets.borrow().get(&post_id) {
            target.comment_form.reset();
        }
    }

    fn notify(&self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            log::error!("alert failed: {:?}", err);
        }
    }

    fn confirm(&self, message: &str) -> bool {
        self.window.confirm_with_message(message).unwrap_or_else(|err| {
            log::error!("confirm failed: {:?}", err);
            false
        })
    }

    fn reload(&self) {
        if let Err(err) = self.window.location().reload() {
            log::error!("reload failed: {:?}", err);
        }
    }
}

fn named(form: &HtmlFormElement, name: &str) -> Result<Option<Element>, PageError> {
    form.query_selector(&format!("[name=\"{}\"]", name))
        .map_err(PageError::js)
}

fn control_value(form: &HtmlFormElement, name: &'static str) -> Result<String, PageError> {
    let element = named(form, name)?.ok_or(PageError::MissingElement(name))?;

    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Ok(input.value());
    }
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        return Ok(area.value());
    }
    Err(PageError::MissingElement(name))
}

async fn read_image(form: &HtmlFormElement) -> Result<Option<ImageUpload>, PageError> {
    let Some(input) = named(form, "image")?.and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    else {
        return Ok(None);
    };
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        return Ok(None);
    };

    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(PageError::js)?;

    Ok(Some(ImageUpload {
        file_name: file.name(),
        content_type: file.type_(),
        bytes: Uint8Array::new(&buffer).to_vec(),
    }))
}

pub async fn read_post_form(form: &HtmlFormElement) -> Result<NewPost, PageError> {
    Ok(NewPost {
        title: control_value(form, "title")?,
        content: control_value(form, "content")?,
        image: read_image(form).await?,
    })
}
