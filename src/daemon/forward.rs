use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error};

use super::event::TimerEvent;

/// Represents a destination for timer values. Abstracts over the status bar
/// so the pipeline can be tested against a recording sink.
pub trait TimerSink {
    fn process_next(&mut self, event: TimerEvent) -> impl std::future::Future<Output = Result<()>>;

    /// Called once the channel closes, before the process exits.
    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}

/// Receives timer changes and pushes them into the sink. A failed push is
/// logged and dropped, the next change will repaint the item anyway.
pub struct ForwardingModule<Sink> {
    receiver: Receiver<TimerEvent>,
    sink: Sink,
}

impl<S: TimerSink> ForwardingModule<S> {
    pub fn new(receiver: Receiver<TimerEvent>, sink: S) -> Self {
        Self { receiver, sink }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Forwarding event {:?}", event);
            if let Err(e) = self.sink.process_next(event.clone()).await {
                error!("Error forwarding event {:?}: {e:?}", event)
            }
        }

        let result = self.sink.finalize().await;
        self.receiver.close();
        result
    }
}
