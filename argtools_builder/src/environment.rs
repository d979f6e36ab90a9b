use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{Action, ValueType};
use crate::model::{Nargs, Value};
use crate::parser::ConfigError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// A read-only snapshot of environment variables.
///
/// Environment backed defaults are resolved against a snapshot, rather than the live process environment.
/// By default, a [`CommandLineParser`](./struct.CommandLineParser.html) captures the process environment when created.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::Environment;
///
/// let environment = Environment::from([("MYVAR_FENV", "11")]);
/// assert_eq!(environment.get("MYVAR_FENV"), Some("11"));
/// assert_eq!(environment.get("myvar_fenv"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    variables: Arc<HashMap<String, String>>,
}

impl Environment {
    /// Capture the current process environment.
    /// Variables whose key or value isn't valid unicode are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// An environment without any variables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the value of the variable `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Whether the variable `key` is set (possibly to the empty string).
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Produce a copy of this environment with the variable `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.variables).insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            variables: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Environment {
    fn from(variables: [(K, V); N]) -> Self {
        variables.into_iter().collect()
    }
}

/// Source an option's default from an environment variable.
///
/// The variable key is `uppercase(prefix + dest)`.
/// The lookup happens once, when the option is registered onto the parser (not when the command line is parsed).
/// * If the variable is set, its value becomes the option's default, overriding any hardcoded default.
/// A required option is no longer required: the variable satisfies the requirement.
/// * If the variable isn't set and [`EnvDefault::required`] is on, registration fails with [`ConfigError::EnvironmentVarRequired`].
/// * Otherwise, the hardcoded default (if any) applies.
///
/// Values given on the command line always override the default.
///
/// The help message shows the option's metavar as `prefix + (metavar or uppercase(dest))`, so the variable is self-documenting.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, CommandLineParser, EnvDefault, Environment};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program").environment(Environment::from([("MYVAR_FENV", "11")])),
///     add_argument("--fenv").env(EnvDefault::new().prefix("MYVAR_")),
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(&[]).unwrap();
/// assert_eq!(namespace.get_str("fenv"), Some("11"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefault {
    prefix: String,
    required: bool,
    strict: bool,
}

impl EnvDefault {
    /// Create an environment default, without a prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to the destination when forming the variable key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Require the variable to be set in the environment.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Reject options that define both a hardcoded default and an environment value ([`ConfigError::TooManyDefaultsDefined`]).
    /// By default, the environment value silently wins.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The environment variable key for `dest`.
    ///
    /// ### Example
    /// ```
    /// # use argtools_builder as argtools;
    /// use argtools::EnvDefault;
    ///
    /// assert_eq!(EnvDefault::new().prefix("myvar_").key("fenv"), "MYVAR_FENV");
    /// ```
    pub fn key(&self, dest: &str) -> String {
        format!("{p}{dest}", p = self.prefix).to_uppercase()
    }

    /// The help metavar for `dest`.
    pub fn metavar(&self, dest: &str, explicit: Option<&str>) -> String {
        match explicit {
            Some(metavar) => format!("{p}{metavar}", p = self.prefix),
            None => format!("{p}{d}", p = self.prefix, d = dest.to_uppercase()),
        }
    }

    /// Translate the option's action into one that accepts a free-form (environment) value.
    ///
    /// Switch style actions take no values, so they become an optional value with the switch constant used when the flag is given alone.
    /// An untyped (`Str`) constant option takes on its constant's type, so the environment value and the flag agree.
    pub(crate) fn adapt(&self, dest: &str, shape: Shape) -> Result<Shape, ConfigError> {
        let Shape {
            action,
            nargs,
            constant,
            value_type,
        } = shape;

        let (constant, value_type) = match action {
            Action::Store => {
                return Ok(Shape {
                    action,
                    nargs,
                    constant,
                    value_type,
                })
            }
            Action::StoreConst(value) => {
                let value_type = match (&value, value_type) {
                    (Value::Int(_), ValueType::Str) => ValueType::Int,
                    (Value::Float(_), ValueType::Str) => ValueType::Float,
                    (Value::Bool(_), ValueType::Str) => ValueType::Bool,
                    (_, value_type) => value_type,
                };
                (value, value_type)
            }
            Action::StoreTrue => (Value::Bool(true), ValueType::Bool),
            Action::StoreFalse => (Value::Bool(false), ValueType::Bool),
            Action::Append | Action::Count => {
                return Err(ConfigError::InvalidEnvAction {
                    dest: dest.to_string(),
                    action: action.name(),
                });
            }
        };

        Ok(Shape {
            action: Action::Store,
            nargs: Some(Nargs::ZeroOrOne),
            constant: Some(constant),
            value_type,
        })
    }

    /// Resolve the default & required-ness of `dest` against the environment.
    pub(crate) fn resolve(
        &self,
        dest: &str,
        default: Option<Value>,
        required: bool,
        environment: &Environment,
    ) -> Result<Resolution, ConfigError> {
        let key = self.key(dest);

        match environment.get(&key) {
            Some(value) => {
                if self.strict && default.is_some() {
                    return Err(ConfigError::TooManyDefaultsDefined {
                        dest: dest.to_string(),
                        key,
                    });
                }

                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Default for '{dest}' sourced from environment variable '{key}'.");
                }

                Ok(Resolution {
                    default: Some(Value::Str(value.to_string())),
                    required: false,
                })
            }
            None if self.required => Err(ConfigError::EnvironmentVarRequired(key)),
            None => {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Environment variable '{key}' not set; '{dest}' keeps its default.");
                }

                Ok(Resolution { default, required })
            }
        }
    }
}

/// The parts of an option that decide how it consumes values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Shape {
    pub(crate) action: Action,
    pub(crate) nargs: Option<Nargs>,
    pub(crate) constant: Option<Value>,
    pub(crate) value_type: ValueType,
}

#[derive(Debug, PartialEq)]
pub(crate) struct Resolution {
    pub(crate) default: Option<Value>,
    pub(crate) required: bool,
}
