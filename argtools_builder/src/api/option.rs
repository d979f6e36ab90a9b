use crate::api::{Action, Parameter, ParameterClass, ValueType};
use crate::environment::{EnvDefault, Environment, Resolution, Shape};
use crate::model::{Nargs, Value};
use crate::parser::ConfigError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// A single option (or positional argument) definition, built up by chaining its attributes.
///
/// Nothing is validated until the option is applied to a parser (see [`Fragment`](./trait.Fragment.html)).
/// A function that returns a `SingleOption` makes a shareable definition, which downstream code may further adjust before applying.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, CommandLineParser, SingleOption};
///
/// fn shared_level() -> SingleOption {
///     add_argument("--level").default("cannot override this")
/// }
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     shared_level().required(true).help("The level."),
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(vec!["--level", "3"].as_slice()).unwrap();
/// assert_eq!(namespace.get_str("level"), Some("3"));
/// ```
#[derive(Debug, Clone)]
pub struct SingleOption {
    flag: String,
    short: Option<char>,
    dest: Option<String>,
    action: Action,
    nargs: Option<Nargs>,
    default: Option<Value>,
    constant: Option<Value>,
    required: bool,
    value_type: ValueType,
    metavar: Option<String>,
    help: Option<String>,
    choices: Vec<String>,
    meta: Option<Vec<String>>,
    env: Option<EnvDefault>,
}

/// Define an option from its `flag`: either `--long`, `-s`, or a positional name.
///
/// The destination is derived from the long name (with `-` replaced by `_`), the short character, or the positional name.
pub fn add_argument(flag: impl Into<String>) -> SingleOption {
    SingleOption {
        flag: flag.into(),
        short: None,
        dest: None,
        action: Action::default(),
        nargs: None,
        default: None,
        constant: None,
        required: false,
        value_type: ValueType::default(),
        metavar: None,
        help: None,
        choices: Vec::default(),
        meta: None,
        env: None,
    }
}

impl SingleOption {
    /// Add a short flag to a `--long` option.
    pub fn short(mut self, short: char) -> Self {
        self.short.replace(short);
        self
    }

    /// Override the derived destination.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest.replace(dest.into());
        self
    }

    /// The behaviour when the option is matched (default [`Action::Store`]).
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Override the number of values the option consumes.
    /// By default, value taking actions consume precisely one value; the others consume none.
    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs.replace(nargs);
        self
    }

    /// The default value.
    /// String defaults are coerced by the option's [`ValueType`], just like command line values.
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default.replace(default.into());
        self
    }

    /// The value used when a `Nargs::ZeroOrOne` option is given without a value.
    pub fn constant(mut self, constant: impl Into<Value>) -> Self {
        self.constant.replace(constant.into());
        self
    }

    /// Require the option be given (positional arguments are always required).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// The coercion applied to the values (default [`ValueType::Str`]).
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// The name of the value in the help message.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar.replace(metavar.into());
        self
    }

    /// Document the option.
    /// If repeated, only the final help message will apply.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help.replace(help.into());
        self
    }

    /// Restrict the values to the `choices`.
    pub fn choices<S: Into<String>>(mut self, choices: impl IntoIterator<Item = S>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Extra columns to show to the right of the help message.
    pub fn meta<S: Into<String>>(mut self, meta: impl IntoIterator<Item = S>) -> Self {
        self.meta.replace(meta.into_iter().map(Into::into).collect());
        self
    }

    /// Source the default from the environment; see [`EnvDefault`].
    pub fn env(mut self, env: EnvDefault) -> Self {
        self.env.replace(env);
        self
    }

    /// Resolve the definition into a parameter, looking up its environment default (if any).
    pub(crate) fn register(&self, environment: &Environment) -> Result<Parameter, ConfigError> {
        let (class, derived_dest) = self.class()?;
        let dest = self.dest.clone().unwrap_or(derived_dest);
        let positional = class == ParameterClass::Arg;
        let shape = Shape {
            action: self.action.clone(),
            nargs: self.nargs,
            constant: self.constant.clone(),
            value_type: self.value_type.clone(),
        };

        let (shape, resolution) = match &self.env {
            Some(_) if positional => return Err(ConfigError::EnvPositional(dest)),
            Some(env_default) => (
                env_default.adapt(&dest, shape)?,
                env_default.resolve(&dest, self.default.clone(), self.required, environment)?,
            ),
            None => (
                shape,
                Resolution {
                    default: self.default.clone(),
                    required: self.required,
                },
            ),
        };
        let Shape {
            action,
            nargs,
            constant,
            value_type,
        } = shape;

        validate(&dest, positional, &action, nargs, resolution.required)?;

        let nargs = nargs.unwrap_or(if action.takes_values() {
            Nargs::Precisely(1)
        } else {
            Nargs::Precisely(0)
        });
        let default = match (&action, resolution.default) {
            (_, Some(default)) => Some(default),
            (Action::StoreTrue, None) => Some(Value::Bool(false)),
            (Action::StoreFalse, None) => Some(Value::Bool(true)),
            (_, None) => None,
        };
        let metavar = match (&self.env, &self.metavar) {
            (Some(env_default), explicit) => env_default.metavar(&dest, explicit.as_deref()),
            (None, Some(metavar)) => metavar.clone(),
            (None, None) if positional => dest.clone(),
            (None, None) => dest.to_uppercase(),
        };

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Resolved '{f}' to dest '{dest}' with default {default:?}.", f = self.flag);
        }

        Ok(Parameter {
            class,
            dest,
            action,
            nargs,
            default,
            constant,
            required: resolution.required,
            value_type,
            metavar,
            help: self.help.clone(),
            choices: self.choices.clone(),
            meta: self.meta.clone(),
            section: None,
            exclusion: None,
        })
    }

    fn class(&self) -> Result<(ParameterClass, String), ConfigError> {
        let flag = self.flag.as_str();
        let invalid = |flag: &str| ConfigError::InvalidFlag(flag.to_string());

        if let Some(long) = flag.strip_prefix("--") {
            if !is_name(long) {
                return Err(invalid(flag));
            }

            if let Some(short) = self.short {
                if !short.is_ascii_alphanumeric() {
                    return Err(invalid(&format!("-{short}")));
                }
            }

            Ok((
                ParameterClass::Opt {
                    long: Some(long.to_string()),
                    short: self.short,
                },
                long.replace('-', "_"),
            ))
        } else if let Some(short) = flag.strip_prefix('-') {
            let mut chars = short.chars();

            match (chars.next(), chars.next(), self.short) {
                (Some(c), None, None) if c.is_ascii_alphanumeric() => Ok((
                    ParameterClass::Opt {
                        long: None,
                        short: Some(c),
                    },
                    c.to_string(),
                )),
                _ => Err(invalid(flag)),
            }
        } else if is_name(flag) && self.short.is_none() {
            Ok((ParameterClass::Arg, flag.to_string()))
        } else {
            Err(invalid(flag))
        }
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();

    matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate(
    dest: &str,
    positional: bool,
    action: &Action,
    nargs: Option<Nargs>,
    required: bool,
) -> Result<(), ConfigError> {
    let invalid_nargs = |nargs: Nargs| ConfigError::InvalidNargs {
        dest: dest.to_string(),
        action: action.name(),
        nargs,
    };

    if positional {
        if !action.takes_values() {
            return Err(ConfigError::InvalidPositionalAction {
                dest: dest.to_string(),
                action: action.name(),
            });
        }

        if required {
            return Err(ConfigError::RequiredPositional(dest.to_string()));
        }
    }

    match nargs {
        Some(nargs) if !action.takes_values() => Err(invalid_nargs(nargs)),
        Some(Nargs::Precisely(0)) => Err(invalid_nargs(Nargs::Precisely(0))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn register(option: SingleOption) -> Result<Parameter, ConfigError> {
        option.register(&Environment::empty())
    }

    #[rstest]
    #[case("--flag", Some("flag"), None, "flag", "FLAG")]
    #[case("--super-flag", Some("super-flag"), None, "super_flag", "SUPER_FLAG")]
    #[case("--snake_case", Some("snake_case"), None, "snake_case", "SNAKE_CASE")]
    #[case("-f", None, Some('f'), "f", "F")]
    #[case("-1", None, Some('1'), "1", "1")]
    fn register_option(
        #[case] flag: &str,
        #[case] long: Option<&str>,
        #[case] short: Option<char>,
        #[case] dest: &str,
        #[case] metavar: &str,
    ) {
        // Execute
        let parameter = register(add_argument(flag)).unwrap();

        // Verify
        assert_eq!(
            parameter.class,
            ParameterClass::Opt {
                long: long.map(str::to_string),
                short,
            }
        );
        assert_eq!(parameter.dest, dest);
        assert_eq!(parameter.metavar, metavar);
        assert_eq!(parameter.nargs, Nargs::Precisely(1));
        assert_eq!(parameter.default, None);
        assert!(!parameter.required);
    }

    #[rstest]
    #[case("src")]
    #[case("src-file")]
    #[case("Item_2")]
    fn register_positional(#[case] name: &str) {
        let parameter = register(add_argument(name)).unwrap();

        assert_eq!(parameter.class, ParameterClass::Arg);
        assert_eq!(parameter.dest, name);
        assert_eq!(parameter.metavar, name);
    }

    #[rstest]
    #[case(add_argument(""))]
    #[case(add_argument("-"))]
    #[case(add_argument("--"))]
    #[case(add_argument("---flag"))]
    #[case(add_argument("-ab"))]
    #[case(add_argument("--fl ag"))]
    #[case(add_argument("fl=ag"))]
    #[case(add_argument("-f").short('g'))]
    #[case(add_argument("src").short('s'))]
    fn register_invalid_flag(#[case] option: SingleOption) {
        assert_matches!(register(option), Err(ConfigError::InvalidFlag(_)));
    }

    #[test]
    fn register_attributes() {
        // Execute
        let parameter = register(
            add_argument("--level")
                .short('l')
                .dest("verbosity")
                .nargs(Nargs::ZeroOrOne)
                .constant(1)
                .default(0)
                .value_type(ValueType::Int)
                .metavar("N")
                .help("How loud.")
                .choices(["0", "1", "2"])
                .meta(["x"]),
        )
        .unwrap();

        // Verify
        assert_eq!(
            parameter.class,
            ParameterClass::Opt {
                long: Some("level".to_string()),
                short: Some('l'),
            }
        );
        assert_eq!(parameter.dest, "verbosity");
        assert_eq!(parameter.nargs, Nargs::ZeroOrOne);
        assert_eq!(parameter.constant, Some(Value::Int(1)));
        assert_eq!(parameter.default, Some(Value::Int(0)));
        assert_eq!(parameter.value_type, ValueType::Int);
        assert_eq!(parameter.metavar, "N");
        assert_eq!(parameter.help.as_deref(), Some("How loud."));
        assert_eq!(parameter.choices, vec!["0", "1", "2"]);
        assert_eq!(parameter.meta, Some(vec!["x".to_string()]));
    }

    #[rstest]
    #[case(Action::StoreTrue, Some(Value::Bool(false)))]
    #[case(Action::StoreFalse, Some(Value::Bool(true)))]
    #[case(Action::StoreConst(Value::from("c")), None)]
    #[case(Action::Count, None)]
    fn register_switch(#[case] action: Action, #[case] default: Option<Value>) {
        let parameter = register(add_argument("--switch").action(action)).unwrap();

        assert_eq!(parameter.nargs, Nargs::Precisely(0));
        assert_eq!(parameter.default, default);
    }

    #[rstest]
    #[case(add_argument("--a").action(Action::StoreTrue).nargs(Nargs::Precisely(1)), "store_true", Nargs::Precisely(1))]
    #[case(add_argument("--a").action(Action::Count).nargs(Nargs::Any), "count", Nargs::Any)]
    #[case(add_argument("--a").nargs(Nargs::Precisely(0)), "store", Nargs::Precisely(0))]
    #[case(add_argument("--a").action(Action::Append).nargs(Nargs::Precisely(0)), "append", Nargs::Precisely(0))]
    #[case(add_argument("a").nargs(Nargs::Precisely(0)), "store", Nargs::Precisely(0))]
    fn register_invalid_nargs(
        #[case] option: SingleOption,
        #[case] action: &'static str,
        #[case] nargs: Nargs,
    ) {
        assert_eq!(
            register(option).unwrap_err(),
            ConfigError::InvalidNargs {
                dest: "a".to_string(),
                action,
                nargs,
            }
        );
    }

    #[test]
    fn register_invalid_positional() {
        assert_eq!(
            register(add_argument("a").action(Action::StoreTrue)).unwrap_err(),
            ConfigError::InvalidPositionalAction {
                dest: "a".to_string(),
                action: "store_true",
            }
        );
        assert_eq!(
            register(add_argument("a").required(true)).unwrap_err(),
            ConfigError::RequiredPositional("a".to_string())
        );
        assert_eq!(
            register(add_argument("a").env(EnvDefault::new())).unwrap_err(),
            ConfigError::EnvPositional("a".to_string())
        );
    }

    #[rstest]
    #[case(vec![], None, None)]
    #[case(vec![], Some(Value::from(123)), Some(Value::from(123)))]
    #[case(vec![("OPT1", "444")], None, Some(Value::from("444")))]
    #[case(vec![("OPT1", "444")], Some(Value::from(123)), Some(Value::from("444")))]
    #[case(vec![("opt1", "444")], None, None)]
    fn register_env(
        #[case] variables: Vec<(&str, &str)>,
        #[case] default: Option<Value>,
        #[case] expected: Option<Value>,
    ) {
        // Setup
        let environment: Environment = variables.into_iter().collect();
        let mut option = add_argument("--opt1").env(EnvDefault::new());

        if let Some(default) = default {
            option = option.default(default);
        }

        // Execute
        let parameter = option.register(&environment).unwrap();

        // Verify
        assert_eq!(parameter.default, expected);
        assert_eq!(parameter.metavar, "OPT1");
    }

    #[rstest]
    #[case(vec![], true)]
    #[case(vec![("OPT1", "x")], false)]
    fn register_env_required(#[case] variables: Vec<(&str, &str)>, #[case] required: bool) {
        let environment: Environment = variables.into_iter().collect();

        let parameter = add_argument("--opt1")
            .required(true)
            .env(EnvDefault::new())
            .register(&environment)
            .unwrap();

        assert_eq!(parameter.required, required);
    }

    #[test]
    fn register_env_switch() {
        let parameter = add_argument("--flag")
            .action(Action::StoreTrue)
            .env(EnvDefault::new().prefix("app_"))
            .register(&Environment::empty())
            .unwrap();

        assert_eq!(parameter.action, Action::Store);
        assert_eq!(parameter.nargs, Nargs::ZeroOrOne);
        assert_eq!(parameter.constant, Some(Value::Bool(true)));
        assert_eq!(parameter.value_type, ValueType::Bool);
        assert_eq!(parameter.default, None);
        assert_eq!(parameter.metavar, "app_FLAG");
    }

    #[test]
    fn register_env_metavar() {
        let parameter = add_argument("--metavar2")
            .metavar("customvarname2")
            .env(EnvDefault::new().prefix("MYVAR_"))
            .register(&Environment::empty())
            .unwrap();

        assert_eq!(parameter.metavar, "MYVAR_customvarname2");
    }
}
