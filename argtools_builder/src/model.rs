use std::collections::BTreeMap;

/// The cardinality of inputs to match for an argument/option.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// `N`: Precisely `N` values.
    Precisely(u8),
    /// `?`: Zero or one value.
    /// When zero values are given, the option's constant is used.
    ZeroOrOne,
    /// `*`: May be any number of values, including `0`.
    Any,
    /// `+`: At least one value must be specified.
    AtLeastOne,
}

impl Nargs {
    pub(crate) fn is_multiple(&self) -> bool {
        match self {
            Nargs::Precisely(n) => *n > 1,
            Nargs::ZeroOrOne => false,
            Nargs::Any | Nargs::AtLeastOne => true,
        }
    }
}

impl std::fmt::Display for Nargs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A resolved value, as produced by parsing the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A plain string.
    Str(String),
    /// An integer (see [`ValueType::Int`](./enum.ValueType.html#variant.Int)).
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// Multiple values, from a multi-value `Nargs` or an `Append` action.
    List(Vec<Value>),
}

impl Value {
    /// Get the string, if this is a `Value::Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer, if this is a `Value::Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float, if this is a `Value::Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Get the boolean, if this is a `Value::Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the items, if this is a `Value::List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(value: Vec<V>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

/// The result of parsing: a mapping from destination name to resolved value.
///
/// A destination that was neither given on the command line nor defaulted maps to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: BTreeMap<String, Option<Value>>,
}

impl Namespace {
    pub(crate) fn insert(&mut self, dest: impl Into<String>, value: Option<Value>) {
        self.values.insert(dest.into(), value);
    }

    pub(crate) fn extend(&mut self, other: Namespace) {
        self.values.extend(other.values);
    }

    /// Get the value for `dest`.
    /// Returns `None` both when `dest` is unknown and when its value is absent; see [`Namespace::contains`].
    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest).and_then(Option::as_ref)
    }

    /// Whether `dest` is a destination of the parsed scope(s), regardless of its value.
    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    /// Get the string value for `dest`.
    pub fn get_str(&self, dest: &str) -> Option<&str> {
        self.get(dest).and_then(Value::as_str)
    }

    /// Get the integer value for `dest`.
    pub fn get_int(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(Value::as_int)
    }

    /// Get the boolean value for `dest`.
    pub fn get_bool(&self, dest: &str) -> Option<bool> {
        self.get(dest).and_then(Value::as_bool)
    }

    /// Iterate the destinations in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values
            .iter()
            .map(|(dest, value)| (dest.as_str(), value.as_ref()))
    }

    /// The number of destinations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no destinations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Option<Value>); N]> for Namespace {
    fn from(values: [(K, Option<Value>); N]) -> Self {
        Namespace {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .values
            .iter()
            .map(|(dest, value)| match value {
                Some(Value::Str(s)) => format!("'{dest}': '{s}'"),
                Some(v) => format!("'{dest}': {v}"),
                None => format!("'{dest}': None"),
            })
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
