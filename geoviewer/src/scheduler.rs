//! Boundary between the interaction path and background work.

use std::future::Future;
use std::pin::Pin;

use maybe_sync::{MaybeSend, MaybeSync};

/// Unit of background work.
pub type Task = Pin<Box<dyn Future<Output = ()> + MaybeSend + 'static>>;

/// Runs tasks off the interaction path.
///
/// Construction of 3D assets is the only asynchronous work of the crate. It is handed to a
/// scheduler so that the calling code never blocks and tests can control when the work completes.
pub trait Scheduler: MaybeSend + MaybeSync {
    /// Starts the task. The scheduler must eventually poll it to completion.
    fn spawn(&self, task: Task);
}

/// Scheduler that spawns tasks on the async runtime of the platform: `tokio` on native targets and
/// the browser event loop on `wasm32`.
///
/// On native targets the tasks must be spawned from inside a `tokio` runtime.
#[derive(Debug, Default, Copy, Clone)]
pub struct RuntimeScheduler;

impl Scheduler for RuntimeScheduler {
    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, task: Task) {
        tokio::spawn(task);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, task: Task) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
