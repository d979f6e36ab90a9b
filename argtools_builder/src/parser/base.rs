use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use crate::api::{Action, InvalidConversion, Parameter};
use crate::constant::*;
use crate::matcher::*;
use crate::model::{Nargs, Namespace, Value};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// A mistake in the configuration of the parser.
///
/// These are raised while fragments are applied (before any command line input is processed), and are never recovered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The flag is neither `--long`, `-s`, nor a positional name.
    #[error("Config error: invalid flag '{0}'; expected '--long', '-s', or a positional name.")]
    InvalidFlag(String),

    /// Two parameters share a destination within the same scope.
    #[error("Config error: cannot duplicate the destination '{0}'.")]
    DuplicateDestination(String),

    /// Two parameters share a long flag within the same scope (includes the reserved `--help`).
    #[error("Config error: cannot duplicate the option '--{0}'.")]
    DuplicateOption(String),

    /// Two parameters share a short flag within the same scope (includes the reserved `-h`).
    #[error("Config error: cannot duplicate the short option '-{0}'.")]
    DuplicateShortOption(char),

    /// The nargs doesn't fit the action.
    #[error("Config error: nargs {nargs} is invalid for the '{action}' action of '{dest}'.")]
    InvalidNargs {
        /// The destination of the option.
        dest: String,
        /// The action of the option.
        action: &'static str,
        /// The offending nargs.
        nargs: Nargs,
    },

    /// The action cannot be used on a positional argument.
    #[error("Config error: the '{action}' action is invalid for the positional '{dest}'.")]
    InvalidPositionalAction {
        /// The destination of the positional.
        dest: String,
        /// The offending action.
        action: &'static str,
    },

    /// Positional arguments are always required; they cannot be declared so.
    #[error("Config error: 'required' is invalid for the positional '{0}'.")]
    RequiredPositional(String),

    /// A group setting was given that doesn't apply to the kind of group.
    #[error("Config error: group '{label}' does not recognize the setting '{setting}'.")]
    UnrecognizedGroupSetting {
        /// The group label.
        label: String,
        /// The offending setting.
        setting: &'static str,
    },

    /// Mutually exclusive groups only accept options.
    #[error("Config error: mutually exclusive group member '{0}' cannot be positional.")]
    ExclusivePositional(String),

    /// Mutually exclusive groups cannot contain required options.
    #[error("Config error: mutually exclusive group member '{0}' cannot be required.")]
    ExclusiveRequired(String),

    /// A positional with a variable number of values would swallow the sub-command name.
    #[error("Config error: positional '{0}' takes a variable number of values, so it cannot precede sub-commands.")]
    VariablePositionalBeforeSubCommands(String),

    /// A parser may define at most one sub-command set.
    #[error("Config error: cannot define multiple sets of sub-commands.")]
    MultipleSubCommands,

    /// Sub-commands are defined on a parser, not within a group.
    #[error("Config error: sub-commands cannot be defined within a group.")]
    SubCommandsInGroup,

    /// Two sub-commands share a name.
    #[error("Config error: cannot duplicate the sub-command '{0}'.")]
    DuplicateSubCommand(String),

    /// A sub-command setting refers to a sub-command that doesn't exist.
    #[error("Config error: unknown sub-command '{0}'.")]
    UnknownSubCommand(String),

    /// The action cannot source its default from the environment.
    #[error("Config error: environment backed option '{dest}' cannot use the '{action}' action.")]
    InvalidEnvAction {
        /// The destination of the option.
        dest: String,
        /// The offending action.
        action: &'static str,
    },

    /// Positional arguments cannot source their default from the environment.
    #[error("Config error: the positional '{0}' cannot be environment backed.")]
    EnvPositional(String),

    /// The environment variable is required, but isn't set.
    #[error("Config error: environment variable '{0}' is required.")]
    EnvironmentVarRequired(String),

    /// Both a hardcoded default and an environment value are present (strict policy only).
    #[error("Config error: '{dest}' defines a default and the environment variable '{key}' is set.")]
    TooManyDefaultsDefined {
        /// The destination of the option.
        dest: String,
        /// The environment variable key.
        key: String,
    },
}

impl From<TokenMatcherError> for ConfigError {
    fn from(error: TokenMatcherError) -> Self {
        match error {
            TokenMatcherError::DuplicateOption(long) => ConfigError::DuplicateOption(long),
            TokenMatcherError::DuplicateShortOption(short) => {
                ConfigError::DuplicateShortOption(short)
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("Parse error: {0}")]
pub(crate) struct ParseError(pub(crate) String);

impl From<MatchError> for ParseError {
    fn from(error: MatchError) -> Self {
        ParseError(error.to_string())
    }
}

impl ParseError {
    fn invalid_value(parameter: &Parameter, error: InvalidConversion) -> Self {
        ParseError(format!(
            "Invalid value for parameter '{l}': {error}",
            l = parameter.label()
        ))
    }
}

/// A mutual exclusion, as registered onto a parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Exclusion {
    pub(crate) required: bool,
    pub(crate) members: Vec<String>,
}

/// The sub-command discriminator of a parser: the pseudo-positional that selects the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Discriminator {
    pub(crate) key: String,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    Continue {
        namespace: Namespace,
        discriminee: Option<OffsetValue>,
        remaining: Vec<String>,
    },
    PrintHelp,
}

/// Captures the parameters of a single scope from the command line tokens.
pub(crate) struct Parser {
    token_matcher: TokenMatcher,
    parameters: Vec<Parameter>,
    exclusions: Vec<Exclusion>,
    discriminator: Option<Discriminator>,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("parameters", &self.parameters)
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

impl Parser {
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self::new(Vec::default(), Vec::default(), None).unwrap()
    }

    pub(crate) fn new(
        parameters: Vec<Parameter>,
        exclusions: Vec<Exclusion>,
        discriminator: Option<Discriminator>,
    ) -> Result<Self, ConfigError> {
        let help_config = OptionConfig::new(
            HELP_KEY,
            Some(HELP_NAME.to_string()),
            Some(HELP_SHORT),
            Bound::Range(0, 0),
        );
        let mut option_configs = vec![help_config];
        let mut argument_configs = VecDeque::default();
        let mut dests = HashSet::new();

        for parameter in &parameters {
            if !dests.insert(parameter.dest.as_str()) {
                return Err(ConfigError::DuplicateDestination(parameter.dest.clone()));
            }

            if let Some(option_config) = parameter.option_config() {
                option_configs.push(option_config);
            }

            if let Some(argument_config) = parameter.argument_config() {
                argument_configs.push_back(argument_config);
            }
        }

        // The discriminator always follows the positional arguments of its scope.
        if let Some(Discriminator { key, .. }) = &discriminator {
            argument_configs.push_back(ArgumentConfig::new(key.clone(), Bound::Range(1, 1)));
        }

        let token_matcher = TokenMatcher::new(option_configs, argument_configs)?;

        Ok(Self {
            token_matcher,
            parameters,
            exclusions,
            discriminator,
        })
    }

    pub(crate) fn consume(self, tokens: &[&str]) -> Result<Outcome, (usize, ParseError)> {
        let Parser {
            mut token_matcher,
            parameters,
            exclusions,
            discriminator,
        } = self;

        let mut token_iter = tokens.iter();
        let minimal_consume = discriminator.is_some();
        let mut fed = 0;

        // 1. Feed the raw token strings to the matcher.
        // With sub-commands, stop as soon as the discriminator is satisfied: the remaining tokens belong to the sub-command.
        for token in token_iter.by_ref() {
            token_matcher
                .feed(token)
                .map_err(|e| (fed, ParseError::from(e)))?;
            fed += token.len();

            if minimal_consume && token_matcher.can_close() {
                break;
            }
        }

        let matches = match token_matcher.close() {
            Ok(matches) | Err((_, _, matches)) if matches.contains(HELP_KEY) => {
                return Ok(Outcome::PrintHelp);
            }
            Ok(matches) => matches,
            Err((offset, e, _)) => return Err((offset, ParseError::from(e))),
        };

        // 2. Capture the values for each match, in command line order.
        let indices: HashMap<&str, usize> = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.dest.as_str(), i))
            .collect();
        let mut captured: HashMap<usize, (usize, Option<Value>)> = HashMap::default();
        let mut discriminee: Option<OffsetValue> = None;

        for match_tokens in matches.values {
            if let Some(Discriminator { key, .. }) = &discriminator {
                if key == &match_tokens.key {
                    match &match_tokens.values[..] {
                        [value] => discriminee = Some(value.clone()),
                        _ => unreachable!(
                            "internal error - discriminator must result in precisely 1 token"
                        ),
                    };
                    continue;
                }
            }

            let index = *indices
                .get(match_tokens.key.as_str())
                .ok_or_else(|| {
                    (
                        match_tokens.offset,
                        ParseError(format!("Unknown parameter '{}'.", match_tokens.key)),
                    )
                })?;
            let parameter = &parameters[index];
            let previous = captured.remove(&index).and_then(|(_, value)| value);
            let value = capture(parameter, previous, &match_tokens)?;

            #[cfg(feature = "tracing_debug")]
            {
                debug!("Captured {parameter:?}: {value:?}.");
            }

            captured.insert(index, (match_tokens.offset, value));
        }

        // 3. Validate the combination of parameters.
        for exclusion in &exclusions {
            let mut present: Vec<(usize, &Parameter)> = exclusion
                .members
                .iter()
                .filter_map(|dest| indices.get(dest.as_str()))
                .filter_map(|i| captured.get(i).map(|(offset, _)| (*offset, &parameters[*i])))
                .collect();
            present.sort_by_key(|(offset, _)| *offset);

            if let [(_, first), (offset, second), ..] = &present[..] {
                return Err((
                    *offset,
                    ParseError(format!(
                        "Parameter '{s}' is not allowed with '{f}'.",
                        s = second.label(),
                        f = first.label()
                    )),
                ));
            }

            if exclusion.required && present.is_empty() {
                let labels: Vec<String> = exclusion
                    .members
                    .iter()
                    .filter_map(|dest| indices.get(dest.as_str()))
                    .map(|i| parameters[*i].label())
                    .collect();
                return Err((
                    fed,
                    ParseError(format!(
                        "One of the parameters {} is required.",
                        labels.join(" ")
                    )),
                ));
            }
        }

        let missing: Vec<String> = parameters
            .iter()
            .enumerate()
            .filter(|(i, p)| p.required && !captured.contains_key(i))
            .map(|(_, p)| p.label())
            .collect();

        if !missing.is_empty() {
            return Err((
                fed,
                ParseError(format!(
                    "The following parameters are required: {}.",
                    missing.join(", ")
                )),
            ));
        }

        // 4. Resolve the namespace, falling back to defaults.
        let mut namespace = Namespace::default();

        for (i, parameter) in parameters.iter().enumerate() {
            let value = match captured.remove(&i) {
                Some((_, value)) => value,
                None => resolve_default(parameter).map_err(|e| (0, e))?,
            };
            namespace.insert(parameter.dest.clone(), value);
        }

        Ok(Outcome::Continue {
            namespace,
            discriminee,
            remaining: token_iter.map(|s| s.to_string()).collect(),
        })
    }
}

fn capture(
    parameter: &Parameter,
    previous: Option<Value>,
    match_tokens: &MatchTokens,
) -> Result<Option<Value>, (usize, ParseError)> {
    match &parameter.action {
        Action::StoreConst(value) => Ok(Some(value.clone())),
        Action::StoreTrue => Ok(Some(Value::Bool(true))),
        Action::StoreFalse => Ok(Some(Value::Bool(false))),
        Action::Count => {
            let count = match previous.or_else(|| parameter.default.clone()) {
                Some(Value::Int(count)) => count,
                _ => 0,
            };
            Ok(Some(Value::Int(count + 1)))
        }
        Action::Store => {
            let values = coerce_all(parameter, match_tokens)?;

            if values.is_empty() && parameter.is_positional() {
                return resolve_default(parameter).map_err(|e| (match_tokens.offset, e));
            }

            Ok(pack(parameter, values))
        }
        Action::Append => {
            let values = coerce_all(parameter, match_tokens)?;
            let mut items = match previous {
                Some(Value::List(items)) => items,
                _ => Vec::default(),
            };

            if let Some(value) = pack(parameter, values) {
                items.push(value);
            }

            Ok(Some(Value::List(items)))
        }
    }
}

fn coerce_all(
    parameter: &Parameter,
    match_tokens: &MatchTokens,
) -> Result<Vec<Value>, (usize, ParseError)> {
    match_tokens
        .values
        .iter()
        .map(|(offset, token)| {
            if !parameter.choices.is_empty() && !parameter.choices.contains(token) {
                return Err((
                    *offset,
                    ParseError(format!(
                        "Invalid choice '{token}' for parameter '{l}' (choose from {c}).",
                        l = parameter.label(),
                        c = parameter.choices.join(", ")
                    )),
                ));
            }

            parameter
                .value_type
                .coerce(token)
                .map_err(|error| (*offset, ParseError::invalid_value(parameter, error)))
        })
        .collect()
}

fn pack(parameter: &Parameter, mut values: Vec<Value>) -> Option<Value> {
    if parameter.nargs.is_multiple() {
        Some(Value::List(values))
    } else if values.is_empty() {
        // Only an option's `ZeroOrOne` may match without values.
        parameter.constant.clone()
    } else {
        values.pop()
    }
}

fn resolve_default(parameter: &Parameter) -> Result<Option<Value>, ParseError> {
    match (&parameter.action, &parameter.default) {
        (Action::Store | Action::Append, Some(Value::Str(token))) => parameter
            .value_type
            .coerce(token)
            .map(Some)
            .map_err(|error| ParseError::invalid_value(parameter, error)),
        (Action::Store, None) if parameter.is_positional() && parameter.nargs == Nargs::Any => {
            Ok(Some(Value::List(Vec::default())))
        }
        (_, default) => Ok(default.clone()),
    }
}
