use crate::{
    batch::{BatchGelfSink, BatchedLogEventSink},
    event::{ErrorInfo, LogEvent, LogLevel},
    value::{PropertyValue, ScalarValue},
};
use opentelemetry::{
    logs::{AnyValue, Severity},
    InstrumentationScope,
};
use opentelemetry_sdk::{
    error::OTelSdkResult,
    logs::{LogBatch, LogExporter, SdkLogRecord},
};
use opentelemetry_semantic_conventions as semcov;
use std::time::SystemTime;

#[derive(Default)]
struct ExceptionAttributes {
    type_name: Option<String>,
    message: Option<String>,
    stack_trace: Option<String>,
}

impl ExceptionAttributes {
    fn into_error(self) -> Option<ErrorInfo> {
        if self.type_name.is_none() && self.message.is_none() {
            return None;
        }
        let mut error = ErrorInfo::new(self.message.unwrap_or_default());
        error.type_name = self.type_name;
        error.stack_trace = self.stack_trace;
        Some(error)
    }
}

fn log_event_from_record(record: &SdkLogRecord, _scope: &InstrumentationScope) -> LogEvent {
    let message = record
        .body()
        .as_ref()
        .map(|body| any_value_to_string(body))
        .unwrap_or_default();
    let level = record
        .severity_number()
        .map(LogLevel::from)
        .unwrap_or(LogLevel::Information);
    let timestamp = record
        .timestamp()
        .or(record.observed_timestamp())
        .unwrap_or_else(SystemTime::now);

    let mut event = LogEvent::new(level, message.clone())
        .with_rendered_message(message)
        .with_timestamp(timestamp);
    if let Some(target) = record.target() {
        event = event.with_property("target", target.to_string());
    }

    let mut exception = ExceptionAttributes::default();
    for (key, value) in record.attributes_iter() {
        match key.as_str() {
            semcov::trace::EXCEPTION_TYPE => exception.type_name = Some(any_value_to_string(value)),
            semcov::trace::EXCEPTION_MESSAGE => exception.message = Some(any_value_to_string(value)),
            semcov::trace::EXCEPTION_STACKTRACE => {
                exception.stack_trace = Some(any_value_to_string(value))
            }
            name => event = event.with_property(name, PropertyValue::from(value)),
        }
    }
    if let Some(error) = exception.into_error() {
        event = event.with_error(error);
    }
    event
}

fn any_value_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::String(value) => value.as_str().to_string(),
        other => PropertyValue::from(other).render_unquoted(),
    }
}

impl From<&AnyValue> for PropertyValue {
    fn from(value: &AnyValue) -> Self {
        match value {
            AnyValue::Int(value) => (*value).into(),
            AnyValue::Double(value) => (*value).into(),
            AnyValue::String(value) => value.as_str().into(),
            AnyValue::Boolean(value) => (*value).into(),
            AnyValue::Bytes(bytes) => {
                PropertyValue::Sequence(bytes.iter().map(|byte| (*byte).into()).collect())
            }
            AnyValue::ListAny(values) => {
                PropertyValue::Sequence(values.iter().map(PropertyValue::from).collect())
            }
            AnyValue::Map(map) => {
                let mut entries: Vec<_> = map
                    .iter()
                    .map(|(key, value)| {
                        (
                            ScalarValue::String(key.as_str().to_string()),
                            PropertyValue::from(value),
                        )
                    })
                    .collect();
                entries.sort_by(|(a, _), (b, _)| a.to_raw_string().cmp(&b.to_raw_string()));
                PropertyValue::Dictionary(entries)
            }
            _ => PropertyValue::null(),
        }
    }
}

impl From<Severity> for LogLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Trace | Severity::Trace2 | Severity::Trace3 | Severity::Trace4 => {
                LogLevel::Verbose
            }
            Severity::Debug | Severity::Debug2 | Severity::Debug3 | Severity::Debug4 => {
                LogLevel::Debug
            }
            Severity::Info | Severity::Info2 | Severity::Info3 | Severity::Info4 => {
                LogLevel::Information
            }
            Severity::Warn | Severity::Warn2 | Severity::Warn3 | Severity::Warn4 => {
                LogLevel::Warning
            }
            Severity::Error | Severity::Error2 | Severity::Error3 | Severity::Error4 => {
                LogLevel::Error
            }
            Severity::Fatal | Severity::Fatal2 | Severity::Fatal3 | Severity::Fatal4 => {
                LogLevel::Fatal
            }
        }
    }
}

/// Delivery failures are reported through [`diagnostics`](crate::diagnostics); the export
/// itself always succeeds.
#[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
impl LogExporter for BatchGelfSink {
    fn export(
        &self,
        batch: LogBatch<'_>,
    ) -> impl std::future::Future<Output = OTelSdkResult> + Send {
        let sink = self.clone();
        let events: Vec<_> = batch
            .iter()
            .map(|(record, scope)| log_event_from_record(record, scope))
            .collect();

        async move {
            sink.emit_batch(events).await;
            Ok(())
        }
    }
}
