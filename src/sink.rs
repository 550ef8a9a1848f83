use crate::{
    components::{catch_panic, report, SinkComponents},
    diagnostics,
    event::LogEvent,
    models::GelfMessage,
    options::GelfSinkOptions,
    transport::Transport,
    Error,
};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Receives log events one at a time.
///
/// Emitting never blocks on delivery and never fails; delivery errors are reported through
/// [`diagnostics`](crate::diagnostics).
pub trait LogEventSink {
    /// Hand one event to the sink.
    fn emit(&self, event: LogEvent);
}

/// Sends every event on its own, in a background task.
///
/// The GELF converter and the transport are created when the first event is sent. Events below
/// the configured minimum level are dropped right away.
///
/// ```no_run
/// use gelf_sink::{GelfSink, GelfSinkOptions, LogEvent, LogLevel};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let sink = GelfSink::new(GelfSinkOptions::default().with_host("graylog"));
/// sink.emit(LogEvent::new(LogLevel::Information, "Hello {Name}").with_property("Name", "world"));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GelfSink {
    components: Arc<SinkComponents>,
    runtime: Option<Handle>,
}

impl GelfSink {
    /// Sink that creates its transport from the options.
    pub fn new(options: GelfSinkOptions) -> Self {
        Self {
            components: Arc::new(SinkComponents::new(options)),
            runtime: None,
        }
    }

    /// Sink that sends through the given transport. Transport options are ignored.
    pub fn with_transport(options: GelfSinkOptions, transport: impl Transport + 'static) -> Self {
        Self {
            components: Arc::new(SinkComponents::with_transport(options, Arc::new(transport))),
            runtime: None,
        }
    }

    /// Spawn delivery tasks on this runtime instead of the runtime current at emit time.
    ///
    /// Needed when events are emitted from threads outside any Tokio runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Convert and send one event in the background.
    pub fn emit(&self, event: LogEvent) {
        if !self.components.is_enabled(event.level()) {
            return;
        }

        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                diagnostics::handle_error(&Error::NoRuntime);
                return;
            }
        };
        let components = Arc::clone(&self.components);
        runtime.spawn(async move {
            report(&catch_panic(components.send_event(&event)).await);
        });
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

impl LogEventSink for GelfSink {
    fn emit(&self, event: LogEvent) {
        GelfSink::emit(self, event)
    }
}
