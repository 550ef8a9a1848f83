use std::fmt::{self, Display, Write as _};

/// A primitive property value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    I64(i64),
    /// Unsigned integer.
    U64(u64),
    /// Floating point number.
    F64(f64),
    /// Text.
    String(String),
}

impl ScalarValue {
    /// Plain text form, without quotes around text values. `None` for [`ScalarValue::Null`].
    pub fn to_raw_string(&self) -> Option<String> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Bool(v) => Some(v.to_string()),
            ScalarValue::I64(v) => Some(v.to_string()),
            ScalarValue::U64(v) => Some(v.to_string()),
            ScalarValue::F64(v) => Some(v.to_string()),
            ScalarValue::String(v) => Some(v.clone()),
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Bool(v) => Display::fmt(v, f),
            ScalarValue::I64(v) => Display::fmt(v, f),
            ScalarValue::U64(v) => Display::fmt(v, f),
            ScalarValue::F64(v) => Display::fmt(v, f),
            ScalarValue::String(v) => {
                f.write_char('"')?;
                for c in v.chars() {
                    if c == '"' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
        }
    }
}

/// A named property of a log event or of a [`PropertyValue::Structure`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEventProperty {
    /// Property name.
    pub name: String,
    /// Property value.
    pub value: PropertyValue,
}

impl LogEventProperty {
    /// Create a new property.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Structured value attached to a log event.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A primitive value.
    Scalar(ScalarValue),
    /// Ordered list of values.
    Sequence(Vec<PropertyValue>),
    /// Object with named members and an optional type tag.
    Structure {
        /// Type name, used only when rendering.
        type_tag: Option<String>,
        /// Members in declaration order.
        properties: Vec<LogEventProperty>,
    },
    /// Mapping from scalar keys to values.
    Dictionary(Vec<(ScalarValue, PropertyValue)>),
}

impl PropertyValue {
    /// Null scalar.
    pub fn null() -> Self {
        PropertyValue::Scalar(ScalarValue::Null)
    }

    /// Structure without type tag.
    pub fn structure(properties: impl IntoIterator<Item = LogEventProperty>) -> Self {
        PropertyValue::Structure {
            type_tag: None,
            properties: properties.into_iter().collect(),
        }
    }

    /// Rendered form with surrounding quotes removed, as used for GELF string fields.
    pub(crate) fn render_unquoted(&self) -> String {
        self.to_string().trim_matches('"').to_string()
    }
}

/// Renders `"text"`, `null`, `42`, `[a, b]`, `Tag { A: 1 }` and `[("key": value)]`.
impl Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(scalar) => Display::fmt(scalar, f),
            PropertyValue::Sequence(elements) => {
                f.write_char('[')?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(element, f)?;
                }
                f.write_char(']')
            }
            PropertyValue::Structure {
                type_tag,
                properties,
            } => {
                if let Some(type_tag) = type_tag {
                    write!(f, "{} ", type_tag)?;
                }
                f.write_str("{ ")?;
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", property.name, property.value)?;
                }
                f.write_str(" }")
            }
            PropertyValue::Dictionary(elements) => {
                f.write_char('[')?;
                for (i, (key, value)) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "({}: {})", key, value)?;
                }
                f.write_char(']')
            }
        }
    }
}

impl From<ScalarValue> for PropertyValue {
    fn from(value: ScalarValue) -> Self {
        PropertyValue::Scalar(value)
    }
}

macro_rules! scalar_from {
    ($($t:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$t> for PropertyValue {
                fn from(value: $t) -> Self {
                    PropertyValue::Scalar(ScalarValue::$variant(<$target>::from(value)))
                }
            }
        )*
    };
}

scalar_from!(
    bool => Bool as bool,
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    f32 => F64 as f64,
    f64 => F64 as f64,
    String => String as String,
    &str => String as String,
);

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(PropertyValue::null)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        PropertyValue::Sequence(value.into_iter().map(Into::into).collect())
    }
}
