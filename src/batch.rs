use crate::{
    components::{catch_panic, report, SinkComponents},
    diagnostics,
    event::LogEvent,
    models::GelfMessage,
    options::GelfSinkOptions,
    transport::Transport,
    Error,
};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;

/// Receives log events in batches, e.g. from a [`PeriodicBatcher`](crate::PeriodicBatcher).
#[async_trait]
pub trait BatchedLogEventSink: Send + Sync {
    /// Deliver a batch. Resolves once every event has been sent or has failed.
    async fn emit_batch(&self, batch: Vec<LogEvent>) -> BatchOutcome;

    /// Called when a period elapsed without any events.
    async fn on_empty_batch(&self) {}
}

/// Result of delivering one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Events that were sent.
    pub sent: usize,
    /// Events that were dropped because of an error.
    pub failed: usize,
    /// Errors that caused the drops. One error may account for several events.
    pub errors: Vec<Error>,
}

impl BatchOutcome {
    /// Whether every event of the batch was sent.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Sends the events of a batch concurrently over one shared transport.
///
/// Events are encoded in batch order. A failing event does not affect the others; every failure
/// is reported through [`diagnostics`](crate::diagnostics) and counted in the [`BatchOutcome`].
#[derive(Debug, Clone)]
pub struct BatchGelfSink {
    components: Arc<SinkComponents>,
}

impl BatchGelfSink {
    /// Sink that creates its transport from the options.
    pub fn new(options: GelfSinkOptions) -> Self {
        Self {
            components: Arc::new(SinkComponents::new(options)),
        }
    }

    /// Sink that sends through the given transport. Transport options are ignored.
    pub fn with_transport(options: GelfSinkOptions, transport: impl Transport + 'static) -> Self {
        Self {
            components: Arc::new(SinkComponents::with_transport(options, Arc::new(transport))),
        }
    }

    /// The GELF message an event is sent as, without sending it.
    pub fn gelf_message(&self, event: &LogEvent) -> GelfMessage {
        self.components.gelf_message(event)
    }

    /// Close the transport. Calling this more than once has no further effect.
    pub fn close(&self) {
        self.components.close();
    }
}

#[async_trait]
impl BatchedLogEventSink for BatchGelfSink {
    async fn emit_batch(&self, batch: Vec<LogEvent>) -> BatchOutcome {
        let components = &self.components;
        let events: Vec<_> = batch
            .into_iter()
            .filter(|event| components.is_enabled(event.level()))
            .collect();
        if events.is_empty() {
            return BatchOutcome::default();
        }

        let transport = match components.transport().await {
            Ok(transport) => transport,
            Err(err) => {
                diagnostics::handle_error(&err);
                return BatchOutcome {
                    sent: 0,
                    failed: events.len(),
                    errors: vec![err],
                };
            }
        };

        // join_all polls in order, so every event is encoded before its first await point.
        let results = join_all(events.iter().map(|event| {
            catch_panic(async move {
                let payload = components.encode(event)?;
                transport.send(payload).await
            })
        }))
        .await;

        let mut outcome = BatchOutcome::default();
        for result in results {
            report(&result);
            match result {
                Ok(()) => outcome.sent += 1,
                Err(err) => {
                    outcome.failed += 1;
                    outcome.errors.push(err);
                }
            }
        }
        if outcome.failed > 0 {
            tracing::debug!(
                sent = outcome.sent,
                failed = outcome.failed,
                "GELF batch partially failed"
            );
        }
        outcome
    }
}
