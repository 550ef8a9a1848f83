mod gelf_message;
mod severity_level;

pub use gelf_message::*;
pub use severity_level::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogLevel;
    use serde_json::{json, Map};
    use test_case::test_case;

    #[test]
    fn serialization_format() {
        let mut additional_fields = Map::new();
        additional_fields.insert("_stringLevel".into(), json!("Warning"));
        additional_fields.insert("_facility".into(), json!("test"));
        additional_fields.insert("_count".into(), json!(3));
        let message = GelfMessage {
            version: GELF_VERSION,
            host: "example.org".into(),
            short_message: "hello world".into(),
            full_message: None,
            timestamp: 1592736000.25,
            level: SyslogLevel::Warning,
            additional_fields,
        };
        let serialized = serde_json::to_string(&message).unwrap();
        let expected = "{\"version\":\"1.1\",\"host\":\"example.org\",\"short_message\":\"hello world\",\"timestamp\":1592736000.25,\"level\":4,\"_count\":3,\"_facility\":\"test\",\"_stringLevel\":\"Warning\"}";
        assert_eq!(expected, serialized);
    }

    #[test]
    fn full_message_is_serialized_when_set() {
        let message = GelfMessage {
            version: GELF_VERSION,
            host: "h".into(),
            short_message: "ab".into(),
            full_message: Some("abc".into()),
            timestamp: 0.5,
            level: SyslogLevel::Debug,
            additional_fields: Map::new(),
        };
        let serialized = serde_json::to_string(&message).unwrap();
        assert!(serialized.contains("\"full_message\":\"abc\""));
    }

    #[test_case(LogLevel::Verbose, 7 ; "verbose")]
    #[test_case(LogLevel::Debug, 7 ; "debug")]
    #[test_case(LogLevel::Information, 6 ; "information")]
    #[test_case(LogLevel::Warning, 4 ; "warning")]
    #[test_case(LogLevel::Error, 3 ; "error")]
    #[test_case(LogLevel::Fatal, 2 ; "fatal")]
    fn level_mapping(level: LogLevel, expected: u8) {
        assert_eq!(expected, SyslogLevel::from(level) as u8);
    }
}
