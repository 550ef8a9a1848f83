use crate::{
    convert::{flatten_property, time_to_unix_seconds},
    event::{ErrorInfo, LogEvent},
    models::{GelfMessage, SyslogLevel, GELF_VERSION},
    options::EncodingOptions,
};
use serde_json::{Map, Value};
use std::fmt::Debug;

const EXCEPTION_MESSAGE_SEPARATOR: &str = " - ";
const INNER_STACK_TRACE_SEPARATOR: &str = "--- Inner exception stack trace ---";

/// Builds the GELF message for one log event.
pub(crate) trait MessageBuilder: Debug + Send + Sync {
    fn build(&self, event: &LogEvent) -> GelfMessage;
}

/// Builds messages from the event's message and properties.
#[derive(Debug)]
pub(crate) struct GelfMessageBuilder {
    host: String,
    options: EncodingOptions,
}

impl GelfMessageBuilder {
    pub(crate) fn new(host: String, options: EncodingOptions) -> Self {
        Self { host, options }
    }

    fn build_with(&self, event: &LogEvent, extra_fields: Vec<(String, Value)>) -> GelfMessage {
        let message = event.render_message();
        let max_length = self.options.short_message_max_length;
        let (short_message, full_message) = match message.char_indices().nth(max_length) {
            Some((cut, _)) => (message[..cut].to_string(), Some(message)),
            None => (message, None),
        };

        let mut additional_fields = Map::new();
        additional_fields.insert(
            "_stringLevel".into(),
            Value::String(event.level().to_string()),
        );
        additional_fields.insert(
            "_facility".into(),
            self.options
                .facility
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );

        let template = event.message_template();
        for property in event.properties() {
            if self.options.exclude_message_template_properties
                && template.has_property(&property.name)
            {
                continue;
            }
            additional_fields.extend(flatten_property(
                &property.name,
                &property.value,
                self.options.explode_array_values,
            ));
        }
        additional_fields.extend(extra_fields);

        if self.options.include_message_template {
            additional_fields.insert(
                format!("_{}", self.options.message_template_field_name),
                Value::String(template.text().to_string()),
            );
        }

        GelfMessage {
            version: GELF_VERSION,
            host: self.host.clone(),
            short_message,
            full_message,
            timestamp: time_to_unix_seconds(event.timestamp()),
            level: SyslogLevel::from(event.level()),
            additional_fields,
        }
    }
}

impl MessageBuilder for GelfMessageBuilder {
    fn build(&self, event: &LogEvent) -> GelfMessage {
        self.build_with(event, Vec::new())
    }
}

/// Builds messages for events with an associated error. Adds `_ExceptionType`,
/// `_ExceptionMessage` and `_StackTrace` on top of the regular fields.
#[derive(Debug)]
pub(crate) struct ExceptionMessageBuilder {
    base: GelfMessageBuilder,
}

impl ExceptionMessageBuilder {
    pub(crate) fn new(host: String, options: EncodingOptions) -> Self {
        Self {
            base: GelfMessageBuilder::new(host, options),
        }
    }
}

impl MessageBuilder for ExceptionMessageBuilder {
    fn build(&self, event: &LogEvent) -> GelfMessage {
        match event.error() {
            Some(error) => self.base.build_with(event, exception_fields(error)),
            None => self.base.build(event),
        }
    }
}

/// Sent as given, without numeric coercion or template property exclusion.
fn exception_fields(error: &ErrorInfo) -> Vec<(String, Value)> {
    let message = error
        .chain()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(EXCEPTION_MESSAGE_SEPARATOR);
    let stack_traces: Vec<_> = error
        .chain()
        .filter_map(|e| e.stack_trace.as_deref())
        .collect();

    let mut fields = vec![
        (
            "_ExceptionType".to_string(),
            error
                .type_name
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        ),
        ("_ExceptionMessage".to_string(), Value::String(message)),
    ];
    if !stack_traces.is_empty() {
        fields.push((
            "_StackTrace".to_string(),
            Value::String(stack_traces.join(INNER_STACK_TRACE_SEPARATOR)),
        ));
    }
    fields
}

/// Picks the message builder for an event: the exception builder when the event carries an
/// error, the plain builder otherwise.
#[derive(Debug)]
pub(crate) struct GelfConverter {
    message: GelfMessageBuilder,
    exception: ExceptionMessageBuilder,
}

impl GelfConverter {
    pub(crate) fn new(host: String, options: EncodingOptions) -> Self {
        Self {
            message: GelfMessageBuilder::new(host.clone(), options.clone()),
            exception: ExceptionMessageBuilder::new(host, options),
        }
    }

    /// Host name from the options, falling back to the local host name.
    pub(crate) fn from_options(options: &EncodingOptions) -> Self {
        let host = options
            .hostname_override
            .clone()
            .or_else(sysinfo::System::host_name)
            .unwrap_or_else(|| "localhost".into());
        Self::new(host, options.clone())
    }

    pub(crate) fn gelf_message(&self, event: &LogEvent) -> GelfMessage {
        let builder: &dyn MessageBuilder = if event.error().is_some() {
            &self.exception
        } else {
            &self.message
        };
        builder.build(event)
    }
}
