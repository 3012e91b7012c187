use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use futures_util::task::{LocalSpawn, LocalSpawnExt};

use crate::api::ApiClient;
use crate::config::Config;
use crate::connection::Transport;
use crate::feed::FIRST_PAGE;
use crate::generation::Generations;
use crate::records::{NewPost, PostId};
use crate::schedule::{Scheduler, TimerId};
use crate::session::{Session, SessionStore};
use crate::view::{Banner, Surface};

/// What the page reports back to the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    SearchInput,
    SubmitPost(NewPost),
    SubmitComment { post_id: PostId, text: String },
    DeletePost(PostId),
    Logout,
}

/// The platform pieces the pipeline runs on.
pub struct Ports {
    pub store: Rc<dyn SessionStore>,
    pub transport: Rc<dyn Transport>,
    pub surface: Rc<dyn Surface>,
    pub scheduler: Rc<dyn Scheduler>,
    pub spawner: Rc<dyn LocalSpawn>,
}

pub struct Forum {
    pub(crate) config: Config,
    pub(crate) session: Session,
    pub(crate) store: Rc<dyn SessionStore>,
    pub(crate) api: ApiClient,
    pub(crate) surface: Rc<dyn Surface>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
    spawner: Rc<dyn LocalSpawn>,
    pub(crate) generations: Generations,
    pub(crate) pending_search: Cell<Option<TimerId>>,
}

impl Forum {
    /// Reads the session once; it is not re-read until the next page load.
    pub fn new(config: Config, ports: Ports) -> Rc<Self> {
        let session = Session::load(ports.store.as_ref());
        let api = ApiClient::new(
            ports.transport,
            config.api_url.clone(),
            session.token.clone(),
        );

        Rc::new(Forum {
            config,
            session,
            store: ports.store,
            api,
            surface: ports.surface,
            scheduler: ports.scheduler,
            spawner: ports.spawner,
            generations: Generations::default(),
            pending_search: Cell::new(None),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Page load.
    pub fn start(self: &Rc<Self>) {
        self.surface.show_banner(&Banner::for_session(&self.session));
        self.load_feed(FIRST_PAGE);
    }

    pub fn handle(self: &Rc<Self>, event: UiEvent) {
        log::debug!("ui event: {:?}", event);

        let outcome = match event {
            UiEvent::SearchInput => {
                self.search_input();
                Ok(())
            }
            UiEvent::SubmitPost(post) => self.create_post(post),
            UiEvent::SubmitComment { post_id, text } => self.create_comment(post_id, text),
            UiEvent::DeletePost(post_id) => self.delete_post(post_id),
            UiEvent::Logout => {
                self.logout();
                Ok(())
            }
        };

        if let Err(err) = outcome {
            log::info!("action blocked: {}", err);
        }
    }

    pub fn logout(&self) {
        Session::clear(self.store.as_ref());
        self.surface.reload();
    }

    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        if let Err(err) = self.spawner.spawn_local(future) {
            log::error!("could not spawn task: {}", err);
        }
    }
}
