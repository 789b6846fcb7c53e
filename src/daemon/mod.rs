use std::time::Duration;

use anyhow::Result;
use forward::ForwardingModule;
use sampler::TimerSamplingModule;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    cdp::probe::TimerProbe,
    status::sketchybar::SketchybarSink,
    utils::clock::{Clock, DefaultClock},
};

pub mod event;
pub mod forward;
pub mod sampler;
pub mod shutdown;

use event::TimerEvent;
use forward::TimerSink;

/// Represents the starting point for the polling daemon. Runs until Ctrl-C,
/// then lets the sink clear the status bar item.
pub async fn start_daemon(
    probe: Box<dyn TimerProbe>,
    item: String,
    poll_interval: Duration,
) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<TimerEvent>(10);

    let shutdown_token = CancellationToken::new();

    let sampler = create_sampler(sender, probe, &shutdown_token, poll_interval, DefaultClock);

    let forwarder = create_forwarder(receiver, SketchybarSink::new(item));

    let (_, sampling_result, forwarding_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        sampler.run(),
        forwarder.run(),
    );

    if let Err(sampling_result) = sampling_result {
        error!("Sampling module got an error {:?}", sampling_result);
    }

    if let Err(forwarding_result) = forwarding_result {
        error!("Forwarding module got an error {:?}", forwarding_result);
    }

    Ok(())
}

fn create_sampler(
    sender: mpsc::Sender<TimerEvent>,
    probe: Box<dyn TimerProbe>,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> TimerSamplingModule {
    TimerSamplingModule::new(
        sender,
        probe,
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}

fn create_forwarder<S: TimerSink>(
    receiver: mpsc::Receiver<TimerEvent>,
    sink: S,
) -> ForwardingModule<S> {
    ForwardingModule::new(receiver, sink)
}

#[cfg(test)]
mod daemon_tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use crate::{
        cdp::probe::MockTimerProbe,
        daemon::{create_forwarder, create_sampler, event::TimerEvent, forward::TimerSink},
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn page_texts() -> Vec<&'static str> {
        vec![
            "Deep focus - 12:34 remaining",
            "Deep focus - 12:34 remaining",
            "loading...",
            "Deep focus - 12:33 remaining",
        ]
    }

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Utc>,
        reference: Instant,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        labels: Arc<Mutex<Vec<String>>>,
        finalized: Arc<AtomicBool>,
    }

    impl TimerSink for RecordingSink {
        async fn process_next(&mut self, event: TimerEvent) -> Result<()> {
            self.labels.lock().unwrap().push(event.label.to_string());
            Ok(())
        }

        async fn finalize(&mut self) -> Result<()> {
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Very simple smoke test to check if the pipeline is working properly:
    /// changed values go through once, repeats are ignored, shutdown clears.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let mut mock_probe = MockTimerProbe::new();
        let mut texts = page_texts().into_iter();
        mock_probe
            .expect_read_timer_text()
            .returning(move || Ok(texts.next().unwrap_or(page_texts()[3]).to_string()));

        let shutdown_token = CancellationToken::new();

        let (sender, receiver) = mpsc::channel::<TimerEvent>(10);
        let test_clock = TestClock {
            start_time: Utc.from_utc_datetime(&TEST_START_DATE),
            reference: Instant::now(),
        };
        let sampler = create_sampler(
            sender,
            Box::new(mock_probe),
            &shutdown_token,
            Duration::from_millis(100),
            test_clock.clone(),
        );

        let sink = RecordingSink::default();
        let forwarder = create_forwarder(receiver, sink.clone());

        let (_, sampling_result, forwarding_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(550)).await;
                shutdown_token.cancel()
            },
            sampler.run(),
            forwarder.run(),
        );

        sampling_result?;
        forwarding_result?;

        let labels = sink.labels.lock().unwrap().clone();
        assert_eq!(labels, vec!["12:34".to_string(), "12:33".to_string()]);
        assert!(sink.finalized.load(Ordering::SeqCst));

        Ok(())
    }
}
