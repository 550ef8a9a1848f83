use crate::event::LogLevel;
use serde_repr::Serialize_repr;

/// Syslog severity as used by the GELF `level` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum SyslogLevel {
    /// System is unusable.
    Emergency = 0,
    /// Action must be taken immediately.
    Alert = 1,
    /// Critical conditions.
    Critical = 2,
    /// Error conditions.
    Error = 3,
    /// Warning conditions.
    Warning = 4,
    /// Normal but significant condition.
    Notice = 5,
    /// Informational messages.
    Informational = 6,
    /// Debug-level messages.
    Debug = 7,
}

impl From<LogLevel> for SyslogLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Verbose | LogLevel::Debug => SyslogLevel::Debug,
            LogLevel::Information => SyslogLevel::Informational,
            LogLevel::Warning => SyslogLevel::Warning,
            LogLevel::Error => SyslogLevel::Error,
            LogLevel::Fatal => SyslogLevel::Critical,
        }
    }
}
