//! Outbound view event channel.

use tokio::sync::mpsc;
use zipbum_core::view::ViewEvent;

/// Sending side of a controller's view channel.
///
/// Publishing never blocks and never fails: when the front end has gone
/// away the event is dropped.
#[derive(Clone)]
pub struct ViewPublisher {
    sender: mpsc::UnboundedSender<ViewEvent>,
}

impl ViewPublisher {
    pub fn new(sender: mpsc::UnboundedSender<ViewEvent>) -> Self {
        Self { sender }
    }

    pub fn publish(&self, event: ViewEvent) {
        // Non-blocking send - if the receiver is dropped, we just skip
        let _ = self.sender.send(event);
    }
}

/// Creates a publisher and the receiver the front end drains.
pub fn view_channel() -> (ViewPublisher, mpsc::UnboundedReceiver<ViewEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ViewPublisher::new(sender), receiver)
}
