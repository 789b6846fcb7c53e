use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{cdp::probe::TimerProbe, timer::find_timer, utils::clock::Clock};

use super::event::TimerEvent;

/// Polls the page on a fixed interval and pushes timer changes downstream.
/// Probe failures are logged and skipped, the app might simply not be up yet.
pub struct TimerSamplingModule {
    next: mpsc::Sender<TimerEvent>,
    probe: Box<dyn TimerProbe>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
    last_label: Option<Arc<str>>,
}

impl TimerSamplingModule {
    pub fn new(
        next: mpsc::Sender<TimerEvent>,
        probe: Box<dyn TimerProbe>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            probe,
            shutdown,
            poll_interval,
            time_provider,
            last_label: None,
        }
    }

    async fn sample(&mut self) -> Result<Option<TimerEvent>> {
        let text = self.probe.read_timer_text().await?;
        let Some(label) = find_timer(&text) else {
            debug!("No timer in page text");
            return Ok(None);
        };
        if self.last_label.as_deref() == Some(label) {
            return Ok(None);
        }

        let label: Arc<str> = label.into();
        self.last_label = Some(label.clone());
        Ok(Some(TimerEvent {
            label,
            timestamp: self.time_provider.time(),
        }))
    }

    /// Executes the sampling event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.time_provider.instant();
        loop {
            poll_point += self.poll_interval;

            match self.sample().await {
                Ok(Some(event)) => {
                    debug!("Timer changed to {}", event.label);
                    self.next
                        .send(event)
                        .await
                        .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Couldn't read the timer, will retry: {e:?}")
                }
            }

            tokio::select! {
                // Cancelation means we stop execution of the event loop. Which means we also drop
                // the sender channel and consequently stop the forwarding module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(poll_point) => ()
            }
        }
    }
}
