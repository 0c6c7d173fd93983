use maybe_sync::{MaybeSend, MaybeSync};

/// Notifies the host application that the map has to be redrawn.
pub trait Messenger: MaybeSend + MaybeSync {
    /// Requests a redraw of the 2D map.
    fn request_redraw(&self);
}

/// Messenger that ignores all requests.
#[derive(Debug, Default, Copy, Clone)]
pub struct DummyMessenger;

impl Messenger for DummyMessenger {
    fn request_redraw(&self) {}
}

impl<T: Fn() + MaybeSend + MaybeSync> Messenger for T {
    fn request_redraw(&self) {
        self()
    }
}
