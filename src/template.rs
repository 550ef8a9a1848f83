use crate::value::{LogEventProperty, PropertyValue, ScalarValue};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Property { name: String, raw: String },
}

/// A parsed message template such as `"User {UserId} logged in from {@Client}"`.
///
/// Placeholders are `{Name}`, optionally with a `@` or `$` prefix, an alignment (`,10`) and a
/// format (`:000`). Alignment and format are kept in the raw text but not applied. `{{` and `}}`
/// are literal braces. Malformed placeholders are treated as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

impl MessageTemplate {
    /// Parse a template.
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = tokenize(&text);
        Self { text, tokens }
    }

    /// Unparsed template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names of all placeholders, in order of appearance.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Property { name, .. } => Some(name.as_str()),
            Token::Text(_) => None,
        })
    }

    /// Whether the template has a placeholder with the given name.
    pub fn has_property(&self, name: &str) -> bool {
        self.property_names().any(|n| n == name)
    }

    /// Substitute placeholders with the matching property. Text values are inserted without
    /// quotes, other values in their rendered form. Unknown placeholders are kept as written.
    pub fn render(&self, properties: &[LogEventProperty]) -> String {
        let mut rendered = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                Token::Text(text) => rendered.push_str(text),
                Token::Property { name, raw } => {
                    match properties.iter().find(|p| &p.name == name) {
                        Some(LogEventProperty {
                            value: PropertyValue::Scalar(ScalarValue::String(s)),
                            ..
                        }) => rendered.push_str(s),
                        Some(property) => rendered.push_str(&property.value.to_string()),
                        None => rendered.push_str(raw),
                    }
                }
            }
        }
        rendered
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("{{") || rest.starts_with("}}") {
            literal.push(c);
            rest = &rest[2..];
            continue;
        }
        if c == '{' {
            if let Some(end) = rest.find('}') {
                let raw = &rest[..=end];
                if let Some(name) = property_name(&raw[1..raw.len() - 1]) {
                    if !literal.is_empty() {
                        tokens.push(Token::Text(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Property {
                        name: name.to_string(),
                        raw: raw.to_string(),
                    });
                    rest = &rest[end + 1..];
                    continue;
                }
            }
        }
        literal.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    tokens
}

/// Name of a placeholder body like `@User`, `Count:000` or `Name,-10`.
fn property_name(body: &str) -> Option<&str> {
    let body = body.strip_prefix(['@', '$']).unwrap_or(body);
    let name = body.split([':', ',']).next().unwrap_or_default();
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Some(name)
    } else {
        None
    }
}
