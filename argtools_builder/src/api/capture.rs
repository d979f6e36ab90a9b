use std::sync::Arc;
use thiserror::Error;

use crate::model::Value;

type Coercion = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// The coercion applied to each string value of an option, whether it comes from the command line or from a string default.
///
/// Environment sourced defaults are always strings, so they flow through the same coercion as command line tokens.
#[derive(Clone)]
pub enum ValueType {
    /// Keep the string as-is.
    Str,
    /// Parse a base-10 `i64`.
    Int,
    /// Parse a `f64`.
    Float,
    /// Truthiness: the empty string is `false`; everything else (including `"0"` and `"false"`) is `true`.
    Bool,
    /// A user supplied coercion, along with the name to report in conversion errors.
    Custom(&'static str, Arc<Coercion>),
}

impl ValueType {
    /// Create a user supplied coercion.
    ///
    /// ### Example
    /// ```
    /// # use argtools_builder as argtools;
    /// use argtools::{Value, ValueType};
    ///
    /// let port = ValueType::custom("port", |token| match token.parse::<u16>() {
    ///     Ok(p) if p > 1024 => Ok(Value::Int(p as i64)),
    ///     _ => Err("must be an unprivileged port".to_string()),
    /// });
    /// ```
    pub fn custom(
        name: &'static str,
        coercion: impl Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        ValueType::Custom(name, Arc::new(coercion))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ValueType::Str => "str",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Custom(name, _) => name,
        }
    }

    pub(crate) fn coerce(&self, token: &str) -> Result<Value, InvalidConversion> {
        let invalid = |reason: Option<String>| InvalidConversion {
            token: token.to_string(),
            type_name: self.name(),
            reason,
        };

        match self {
            ValueType::Str => Ok(Value::Str(token.to_string())),
            ValueType::Int => token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid(None)),
            ValueType::Float => token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid(None)),
            ValueType::Bool => Ok(Value::Bool(!token.is_empty())),
            ValueType::Custom(_, coercion) => coercion(token).map_err(|reason| invalid(Some(reason))),
        }
    }
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType::Str
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueType::Custom(a, f), ValueType::Custom(b, g)) => a == b && Arc::ptr_eq(f, g),
            (ValueType::Custom(..), _) | (_, ValueType::Custom(..)) => false,
            _ => self.name() == other.name(),
        }
    }
}

impl std::fmt::Debug for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueType[{}]", self.name())
    }
}

/// The behaviour applied when an option is matched on the command line.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#action>
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Store the (coerced) value(s).
    Store,
    /// Store the given constant; takes no values.
    StoreConst(Value),
    /// Store `true`; takes no values and defaults to `false`.
    StoreTrue,
    /// Store `false`; takes no values and defaults to `true`.
    StoreFalse,
    /// Append the (coerced) value(s) to a list.
    Append,
    /// Count the number of times the option appears; takes no values.
    Count,
}

impl Action {
    pub(crate) fn takes_values(&self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Action::Store => "store",
            Action::StoreConst(_) => "store_const",
            Action::StoreTrue => "store_true",
            Action::StoreFalse => "store_false",
            Action::Append => "append",
            Action::Count => "count",
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Store
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[doc(hidden)]
pub struct InvalidConversion {
    pub(crate) token: String,
    pub(crate) type_name: &'static str,
    pub(crate) reason: Option<String>,
}

impl std::fmt::Display for InvalidConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(
                f,
                "'{t}' cannot convert to {n}: {reason}.",
                t = self.token,
                n = self.type_name
            ),
            None => write!(
                f,
                "'{t}' cannot convert to {n}.",
                t = self.token,
                n = self.type_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ValueType::Str, "abc", Value::Str("abc".to_string()))]
    #[case(ValueType::Str, "", Value::Str("".to_string()))]
    #[case(ValueType::Int, "12", Value::Int(12))]
    #[case(ValueType::Int, "-3", Value::Int(-3))]
    #[case(ValueType::Float, "1.25", Value::Float(1.25))]
    #[case(ValueType::Bool, "444", Value::Bool(true))]
    #[case(ValueType::Bool, "true", Value::Bool(true))]
    #[case(ValueType::Bool, "", Value::Bool(false))]
    #[case(ValueType::Bool, "0", Value::Bool(true))]
    #[case(ValueType::Bool, "False", Value::Bool(true))]
    #[case(ValueType::Bool, "no", Value::Bool(true))]
    #[case(ValueType::Bool, "OFF", Value::Bool(true))]
    fn coerce(#[case] value_type: ValueType, #[case] token: &str, #[case] expected: Value) {
        assert_eq!(value_type.coerce(token).unwrap(), expected);
    }

    #[rstest]
    #[case(ValueType::Int, "abc", "'abc' cannot convert to int.")]
    #[case(ValueType::Int, "", "'' cannot convert to int.")]
    #[case(ValueType::Float, "1.2.3", "'1.2.3' cannot convert to float.")]
    fn coerce_invalid(#[case] value_type: ValueType, #[case] token: &str, #[case] expected: &str) {
        assert_eq!(value_type.coerce(token).unwrap_err().to_string(), expected);
    }

    #[test]
    fn coerce_custom() {
        let value_type = ValueType::custom("even", |token| match token.parse::<i64>() {
            Ok(n) if n % 2 == 0 => Ok(Value::Int(n)),
            _ => Err("must be even".to_string()),
        });

        assert_eq!(value_type.coerce("4").unwrap(), Value::Int(4));
        assert_eq!(
            value_type.coerce("3").unwrap_err().to_string(),
            "'3' cannot convert to even: must be even."
        );
        assert_eq!(format!("{value_type:?}"), "ValueType[even]");
    }

    #[rstest]
    #[case(Action::Store, true)]
    #[case(Action::Append, true)]
    #[case(Action::StoreConst(Value::Int(1)), false)]
    #[case(Action::StoreTrue, false)]
    #[case(Action::StoreFalse, false)]
    #[case(Action::Count, false)]
    fn action_takes_values(#[case] action: Action, #[case] expected: bool) {
        assert_eq!(action.takes_values(), expected);
    }
}
