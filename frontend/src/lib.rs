//! Browser client of the forum: feed of posts with their comments, search,
//! and the post/comment/delete actions, all re-synchronized with the HTTP API.
//!
//! The pipeline ([`app::Forum`]) only talks to the page through the ports in
//! [`app::Ports`]; [`bootstrap`] plugs in the browser implementations.
extern crate console_error_panic_hook;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod api;
pub mod app;
pub mod config;
pub mod connection;
pub mod dom;
pub mod error;
pub mod feed;
pub mod generation;
pub mod logger;
pub mod mutation;
pub mod records;
pub mod schedule;
pub mod search;
pub mod session;
pub mod view;

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::app::{Forum, Ports, UiEvent};
use crate::config::Config;
use crate::connection::FetchTransport;
use crate::dom::DomSurface;
use crate::error::PageError;
use crate::schedule::{BrowserScheduler, BrowserSpawner};
use crate::session::LocalStorageStore;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(contents: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(contents: &str);
}

/// Page-load entry point, called once the skeleton is in the DOM.
#[wasm_bindgen]
pub fn bootstrap() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    logger::init_logger(log::LevelFilter::Info);

    let window = web_sys::window().ok_or(PageError::MissingElement("window"))?;
    let document = window
        .document()
        .ok_or(PageError::MissingElement("document"))?;
    let body = document.body().ok_or(PageError::MissingElement("body"))?;

    let config = Config::from_element(&body)?;
    let store = Rc::new(LocalStorageStore::from_window(&window)?);
    let surface = Rc::new(DomSurface::attach(window.clone())?);

    let forum = Forum::new(
        config,
        Ports {
            store,
            transport: Rc::new(FetchTransport),
            surface: surface.clone(),
            scheduler: Rc::new(BrowserScheduler::new(window)),
            spawner: Rc::new(BrowserSpawner),
        },
    );

    // the surface keeps the forum alive for as long as the page exists
    let handler = forum.clone();
    surface.bind(Rc::new(move |event: UiEvent| handler.handle(event)))?;

    log::info!("forum client started against {}", forum.config().api_url);
    forum.start();
    Ok(())
}
