use futures_util::task::{LocalFutureObj, LocalSpawn, SpawnError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub i32);

/// One-shot timers.
pub trait Scheduler {
    /// Runs `task` after `delay_ms`, unless cancelled first. `None` if the
    /// timer could not be armed.
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TimerId>;

    fn cancel(&self, timer: TimerId);
}

pub struct BrowserScheduler {
    window: Window,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        BrowserScheduler { window }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TimerId> {
        let callback = Closure::once_into_js(move || task());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);

        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        {
            Ok(handle) => Some(TimerId(handle)),
            Err(err) => {
                log::error!("could not arm timer: {:?}", err);
                None
            }
        }
    }

    fn cancel(&self, timer: TimerId) {
        self.window.clear_timeout_with_handle(timer.0);
    }
}

/// Runs futures on the page's microtask queue.
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
