use std::rc::Rc;

use crate::app::Forum;
use crate::feed::FeedSource;

impl Forum {
    /// Restarts the quiet period; only the last input of a burst searches.
    pub fn search_input(self: &Rc<Self>) {
        if let Some(timer) = self.pending_search.take() {
            self.scheduler.cancel(timer);
        }

        let forum = Rc::clone(self);
        let timer = self.scheduler.schedule(
            self.config.search_debounce_ms,
            Box::new(move || {
                forum.pending_search.set(None);
                forum.run_search();
            }),
        );
        self.pending_search.set(timer);
    }

    fn run_search(self: &Rc<Self>) {
        let query = self.surface.search_query();
        log::debug!("searching for {:?}", query);
        self.fetch_feed(FeedSource::for_query(query));
    }
}
