//! Notification channel from the engine to the application event loop.

/// Messenger is used to notify the application that the map must be redrawn.
///
/// An instance is given to the engine by the application. Whenever annotation content changes in
/// a way that affects the rendered image, the engine calls [`Messenger::request_redraw`]. The
/// application is then expected to schedule a render pass on the owner context; the engine never
/// renders on its own.
pub trait Messenger: Send + Sync {
    /// Notifies the application that the map image has changed and must be redrawn.
    fn request_redraw(&self);
}

/// Messenger that does nothing. Useful for tests and off-screen rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyMessenger;

impl Messenger for DummyMessenger {
    fn request_redraw(&self) {}
}
