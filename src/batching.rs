use crate::{
    batch::BatchedLogEventSink, diagnostics, event::LogEvent, options::BatchingOptions,
    sink::LogEventSink, Error,
};
use std::{sync::Mutex, time::Duration};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Collects events into batches and hands them to a [`BatchedLogEventSink`].
///
/// A batch is flushed when it reaches the size limit or when the period elapses, whichever comes
/// first. Flushes never overlap. When the queue is full, new events are dropped and reported
/// through [`diagnostics`](crate::diagnostics).
///
/// ```no_run
/// use gelf_sink::{BatchGelfSink, BatchingOptions, GelfSinkOptions, LogEvent, LogLevel, PeriodicBatcher};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let sink = BatchGelfSink::new(GelfSinkOptions::from_endpoint("tcp://graylog:12201")?);
/// let batcher = PeriodicBatcher::spawn(sink, BatchingOptions::default())?;
/// batcher.emit(LogEvent::new(LogLevel::Information, "started"));
/// batcher.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PeriodicBatcher {
    sender: mpsc::Sender<LogEvent>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicBatcher {
    /// Start the background flush loop on the current Tokio runtime.
    pub fn spawn<S>(sink: S, options: BatchingOptions) -> Result<Self, Error>
    where
        S: BatchedLogEventSink + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::spawn_on(&runtime, sink, options))
    }

    /// Start the background flush loop on the given runtime.
    pub fn spawn_on<S>(runtime: &Handle, sink: S, options: BatchingOptions) -> Self
    where
        S: BatchedLogEventSink + 'static,
    {
        let (sender, receiver) = mpsc::channel(options.queue_limit.max(1));
        let cancel = CancellationToken::new();
        let worker = runtime.spawn(run(sink, options, receiver, cancel.clone()));
        Self {
            sender,
            cancel,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue an event for the next batch.
    pub fn emit(&self, event: LogEvent) {
        if let Err(err) = self.sender.try_send(event) {
            let err = match err {
                TrySendError::Full(_) => Error::QueueFull,
                TrySendError::Closed(_) => Error::Closed,
            };
            diagnostics::handle_error(&err);
        }
    }

    /// Stop accepting events, flush what is queued and wait for the flush to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                if err.is_panic() {
                    diagnostics::handle_error(&Error::Panicked(
                        "periodic batcher flush loop panicked".into(),
                    ));
                }
            }
        }
    }
}

impl LogEventSink for PeriodicBatcher {
    fn emit(&self, event: LogEvent) {
        PeriodicBatcher::emit(self, event)
    }
}

impl Drop for PeriodicBatcher {
    fn drop(&mut self) {
        // The loop still flushes queued events after this.
        self.cancel.cancel();
    }
}

async fn run<S: BatchedLogEventSink>(
    sink: S,
    options: BatchingOptions,
    mut receiver: mpsc::Receiver<LogEvent>,
    cancel: CancellationToken,
) {
    let batch_size_limit = options.batch_size_limit.max(1);
    let period = options.period.max(MIN_PERIOD);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut batch = Vec::with_capacity(batch_size_limit);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => flush(&sink, &mut batch).await,
            event = receiver.recv() => match event {
                Some(event) => {
                    batch.push(event);
                    if batch.len() >= batch_size_limit {
                        flush(&sink, &mut batch).await;
                        ticker.reset();
                    }
                }
                None => break,
            },
        }
    }

    receiver.close();
    while let Ok(event) = receiver.try_recv() {
        batch.push(event);
    }
    while !batch.is_empty() {
        let rest = batch.split_off(batch_size_limit.min(batch.len()));
        flush(&sink, &mut batch).await;
        batch = rest;
    }
    debug!("periodic batcher stopped");
}

async fn flush<S: BatchedLogEventSink>(sink: &S, batch: &mut Vec<LogEvent>) {
    if batch.is_empty() {
        sink.on_empty_batch().await;
        return;
    }
    let outcome = sink.emit_batch(std::mem::take(batch)).await;
    debug!(
        sent = outcome.sent,
        failed = outcome.failed,
        "flushed GELF batch"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{batch::BatchOutcome, event::LogLevel};
    use async_trait::async_trait;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Recording {
        batches: Mutex<Vec<Vec<String>>>,
        empty: Mutex<usize>,
    }

    #[async_trait]
    impl BatchedLogEventSink for Arc<Recording> {
        async fn emit_batch(&self, batch: Vec<LogEvent>) -> BatchOutcome {
            let sent = batch.len();
            self.batches.lock().unwrap().push(
                batch
                    .iter()
                    .map(|event| event.message_template().text().to_string())
                    .collect(),
            );
            BatchOutcome {
                sent,
                ..BatchOutcome::default()
            }
        }

        async fn on_empty_batch(&self) {
            *self.empty.lock().unwrap() += 1;
        }
    }

    fn event(message: &str) -> LogEvent {
        LogEvent::new(LogLevel::Information, message)
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_when_size_limit_is_reached() {
        let recording = Arc::new(Recording::default());
        let options = BatchingOptions {
            batch_size_limit: 2,
            period: Duration::from_secs(3600),
            ..BatchingOptions::default()
        };
        let batcher = PeriodicBatcher::spawn(Arc::clone(&recording), options).unwrap();
        batcher.emit(event("a"));
        batcher.emit(event("b"));
        batcher.emit(event("c"));
        time::sleep(Duration::from_millis(10)).await;

        assert_eq!(vec![vec!["a", "b"]], *recording.batches.lock().unwrap());

        batcher.shutdown().await;
        assert_eq!(
            vec![vec!["a", "b"], vec!["c"]],
            *recording.batches.lock().unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_periodically_and_reports_empty_periods() {
        let recording = Arc::new(Recording::default());
        let options = BatchingOptions {
            period: Duration::from_secs(2),
            ..BatchingOptions::default()
        };
        let batcher = PeriodicBatcher::spawn(Arc::clone(&recording), options).unwrap();
        batcher.emit(event("a"));
        time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(vec![vec!["a"]], *recording.batches.lock().unwrap());

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(1, *recording.empty.lock().unwrap());
        batcher.shutdown().await;
    }

    #[tokio::test]
    async fn full_queue_drops_events() {
        let recording = Arc::new(Recording::default());
        let options = BatchingOptions {
            batch_size_limit: 100,
            period: Duration::from_secs(3600),
            queue_limit: 1,
        };
        let batcher = PeriodicBatcher::spawn(Arc::clone(&recording), options).unwrap();
        // The current-thread runtime does not run the loop until we yield.
        batcher.emit(event("kept"));
        batcher.emit(event("dropped"));
        batcher.shutdown().await;
        assert_eq!(vec![vec!["kept"]], *recording.batches.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_still_flushes() {
        let recording = Arc::new(Recording::default());
        let options = BatchingOptions {
            period: Duration::ZERO,
            ..BatchingOptions::default()
        };
        let batcher = PeriodicBatcher::spawn(Arc::clone(&recording), options).unwrap();
        batcher.emit(event("a"));
        time::sleep(Duration::from_millis(5)).await;
        batcher.emit(event("b"));
        batcher.shutdown().await;

        let batches = recording.batches.lock().unwrap();
        let delivered: Vec<_> = batches.iter().flatten().map(String::as_str).collect();
        assert_eq!(vec!["a", "b"], delivered);
    }

    #[test]
    fn spawn_needs_runtime() {
        let result = PeriodicBatcher::spawn(Arc::new(Recording::default()), BatchingOptions::default());
        assert!(matches!(result, Err(Error::NoRuntime)));
    }
}
