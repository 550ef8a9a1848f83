use crate::{
    template::MessageTemplate,
    value::{LogEventProperty, PropertyValue},
};
use serde::Deserialize;
use std::{
    error::Error as StdError,
    fmt::{self, Display},
    time::SystemTime,
};

/// Severity of a log event, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum LogLevel {
    /// Tracing information, usually switched off.
    Verbose,
    /// Internal details useful when debugging.
    Debug,
    /// Normal operation.
    Information,
    /// Something unexpected that the application recovered from.
    Warning,
    /// A failed operation.
    Error,
    /// The application cannot continue.
    Fatal,
}

impl LogLevel {
    /// Name of the level, as sent in `_stringLevel`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "Verbose",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Fatal => "Fatal",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error associated with a log event, including its chain of causes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Type name of the error, if known.
    pub type_name: Option<String>,
    /// Display message of the error.
    pub message: String,
    /// Stack trace or backtrace, if captured.
    pub stack_trace: Option<String>,
    /// The error that caused this one.
    pub source: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    /// Create an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            type_name: None,
            message: message.into(),
            stack_trace: None,
            source: None,
        }
    }

    /// Capture a typed error and walk its [`source`](StdError::source) chain.
    pub fn from_error<E: StdError + 'static>(error: &E) -> Self {
        let mut info = Self::from_dyn(error);
        info.type_name = Some(std::any::type_name::<E>().to_string());
        info
    }

    fn from_dyn(error: &(dyn StdError + 'static)) -> Self {
        Self {
            type_name: None,
            message: error.to_string(),
            stack_trace: None,
            source: error.source().map(|source| Box::new(Self::from_dyn(source))),
        }
    }

    /// Set the type name.
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the stack trace.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Set the causing error.
    pub fn with_source(mut self, source: ErrorInfo) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// This error followed by its causes.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorInfo> {
        std::iter::successors(Some(self), |info| info.source.as_deref())
    }
}

/// A log event as produced by the host logging pipeline. Immutable once built.
///
/// ```
/// use gelf_sink::{LogEvent, LogLevel};
///
/// let event = LogEvent::new(LogLevel::Information, "Processed {Count} orders")
///     .with_property("Count", 3);
/// assert_eq!("Processed 3 orders", event.render_message());
/// ```
#[derive(Debug, Clone)]
pub struct LogEvent {
    timestamp: SystemTime,
    level: LogLevel,
    message_template: MessageTemplate,
    rendered_message: Option<String>,
    properties: Vec<LogEventProperty>,
    error: Option<ErrorInfo>,
}

impl LogEvent {
    /// Create an event with the current time.
    pub fn new(level: LogLevel, message_template: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            message_template: MessageTemplate::parse(message_template),
            rendered_message: None,
            properties: Vec::new(),
            error: None,
        }
    }

    /// Set the time the event occurred.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add a property. A property with the same name is replaced.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let property = LogEventProperty::new(name, value);
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
        self
    }

    /// Attach an error.
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Use an already rendered message instead of rendering the template.
    pub fn with_rendered_message(mut self, message: impl Into<String>) -> Self {
        self.rendered_message = Some(message.into());
        self
    }

    /// Time the event occurred.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Severity.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Unrendered message template.
    pub fn message_template(&self) -> &MessageTemplate {
        &self.message_template
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &[LogEventProperty] {
        &self.properties
    }

    /// Associated error.
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// The pre-rendered message, or the template with properties substituted.
    pub fn render_message(&self) -> String {
        match &self.rendered_message {
            Some(message) => message.clone(),
            None => self.message_template.render(&self.properties),
        }
    }
}
