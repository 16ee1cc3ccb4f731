use std::fmt;

use indexmap::IndexMap;

/// A runtime value.
///
/// Values are what endpoint bodies compute over: the scalar types, plus
/// arrays and objects that may nest to any depth and round-trip through
/// JSON at the request/response boundary.
///
/// Integers and floats are kept distinct: arithmetic on two integers
/// stays integral, and any float operand promotes the result to float.
///
/// # Examples
///
/// ```
/// use glue_lang::Value;
/// use indexmap::IndexMap;
///
/// let integer = Value::Integer(42);
/// let float = Value::Float(3.5);
/// let string = Value::String("hello".to_string());
///
/// let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
///
/// let mut members = IndexMap::new();
/// members.insert("msg".to_string(), Value::String("hi".to_string()));
/// let object = Value::Object(members);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value, produced by dot access against a missing object
    /// key or a negative array index
    Null,

    /// Boolean, produced by comparisons and logical operators
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Immutable string; comparisons are byte-lexicographic
    String(String),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// String-keyed mapping, insertion order preserved for JSON output
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Human-readable type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// The form `print` writes: scalars native-formatted, strings raw,
/// compound values as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(_) | Value::Object(_) => {
                write!(f, "{}", crate::json::to_json_string(self))
            }
        }
    }
}
