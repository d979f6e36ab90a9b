use std::collections::BTreeMap;

use crate::api::{CommandLineParser, Scope, SingleOption};
use crate::parser::ConfigError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

const EXCLUSIVE_LABEL: &str = "mutually exclusive";

/// A composable unit of parser configuration.
///
/// Applying a fragment registers its definitions into the scope.
/// Applying a sequence of fragments is the same as applying each, in order, to the same scope.
/// The first error aborts the application, leaving the scope partially configured.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::prelude::*;
/// use argtools::{add_argument, build_arg_parser, group, CommandLineParser};
///
/// fn output_options() -> Box<dyn Fragment> {
///     group(
///         "output",
///         argtools::fragments![add_argument("--quiet").action(argtools::Action::StoreTrue)],
///     )
///     .boxed()
/// }
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     argtools::fragments![add_argument("--level").default(1), output_options()],
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(vec!["--quiet"].as_slice()).unwrap();
/// assert_eq!(namespace.get_bool("quiet"), Some(true));
/// ```
pub trait Fragment {
    /// Register this fragment's definitions into the `scope`.
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError>;

    /// Box the fragment, so that it may be listed alongside fragments of other types.
    fn boxed(self) -> Box<dyn Fragment>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Build a list of (boxed) fragments of any types.
#[macro_export]
macro_rules! fragments {
    ($($fragment:expr),* $(,)?) => {
        vec![$($crate::Fragment::boxed($fragment)),*] as Vec<Box<dyn $crate::Fragment>>
    };
}

impl Fragment for SingleOption {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        scope.add_argument(self)
    }
}

impl<F: Fragment + ?Sized> Fragment for Box<F> {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        (**self).apply(scope)
    }
}

impl<F: Fragment + ?Sized> Fragment for &F {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        (**self).apply(scope)
    }
}

// Absent fragments are skipped.
impl<F: Fragment> Fragment for Option<F> {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        match self {
            Some(fragment) => fragment.apply(scope),
            None => Ok(()),
        }
    }
}

impl<F: Fragment> Fragment for Vec<F> {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        self.iter().try_for_each(|fragment| fragment.apply(scope))
    }
}

impl<F: Fragment, const N: usize> Fragment for [F; N] {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        self.iter().try_for_each(|fragment| fragment.apply(scope))
    }
}

/// A group of fragments: either a named help section, or a mutual exclusion.
pub struct Group {
    label: String,
    fragments: Box<dyn Fragment>,
    exclusive: bool,
    description: Option<String>,
    required: Option<bool>,
}

/// Group the `fragments` under a named help section titled `label`.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, group, CommandLineParser};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     group(
///         "optgroup1: a group of options",
///         argtools::fragments![
///             add_argument("--some_setting").action(argtools::Action::StoreTrue),
///             add_argument("--another_setting").default(5),
///         ],
///     ),
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(&[]).unwrap();
/// assert_eq!(namespace.get_bool("some_setting"), Some(false));
/// assert_eq!(namespace.get_int("another_setting"), Some(5));
/// ```
pub fn group(label: impl Into<String>, fragments: impl Fragment + 'static) -> Group {
    Group {
        label: label.into(),
        fragments: fragments.boxed(),
        exclusive: false,
        description: None,
        required: None,
    }
}

impl Group {
    /// Turn the group into a mutual exclusion (the label then only names the group in errors).
    pub fn mutually_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Describe the help section (named groups only).
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description.replace(description.into());
        self
    }

    /// Require one of the members be given (mutually exclusive groups only).
    pub fn required(mut self, required: bool) -> Self {
        self.required.replace(required);
        self
    }
}

impl Fragment for Group {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        let unrecognized = |setting: &'static str| ConfigError::UnrecognizedGroupSetting {
            label: self.label.clone(),
            setting,
        };

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Applying group '{l}' (exclusive={e}).", l = self.label, e = self.exclusive);
        }

        if self.exclusive {
            if self.description.is_some() {
                return Err(unrecognized("description"));
            }

            let mut exclusion = scope.add_mutually_exclusive_group(self.required.unwrap_or(false));
            self.fragments.apply(&mut exclusion)
        } else {
            if self.required.is_some() {
                return Err(unrecognized("required"));
            }

            let mut section = scope.add_argument_group(&self.label, self.description.clone());
            self.fragments.apply(&mut section)
        }
    }
}

/// A mutual exclusion: at most one of its members may be given on the command line.
pub struct MutuallyExclusiveGroup {
    inner: Group,
}

/// Make the options of the `fragments` mutually exclusive.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, mutually_exclusive, CommandLineParser};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     mutually_exclusive(argtools::fragments![add_argument("--only_this"), add_argument("--xor_this")]),
/// )
/// .unwrap();
///
/// assert!(parser.parse_tokens(vec!["--only_this", "1"].as_slice()).is_ok());
/// // Prints an error.
/// assert_eq!(parser.parse_tokens(vec!["--only_this", "1", "--xor_this", "2"].as_slice()), Err(1));
/// ```
pub fn mutually_exclusive(fragments: impl Fragment + 'static) -> MutuallyExclusiveGroup {
    MutuallyExclusiveGroup {
        inner: group(EXCLUSIVE_LABEL, fragments).mutually_exclusive(true),
    }
}

impl MutuallyExclusiveGroup {
    /// Require precisely one of the members be given.
    pub fn required(mut self, required: bool) -> Self {
        self.inner = self.inner.required(required);
        self
    }
}

impl Fragment for MutuallyExclusiveGroup {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        self.inner.apply(scope)
    }
}

/// The sub-commands of a parser: selecting precisely one is mandatory.
pub struct SubparserSet {
    commands: Vec<(String, Box<dyn Fragment>)>,
    dest: Option<String>,
    help: Option<String>,
    abouts: BTreeMap<String, String>,
}

/// Define the sub-commands, each as its own (independently scoped) set of fragments.
///
/// The sub-commands are set up in name order, regardless of the order given.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, add_subparsers, build_arg_parser, CommandLineParser};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     argtools::fragments![
///         add_argument("--shared_option1").default(12345),
///         add_subparsers([
///             ("optionA", argtools::fragments![add_argument("--opt2")]),
///             ("optionB", argtools::fragments![add_argument("--another_setting")]),
///         ])
///         .dest("command"),
///     ],
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(vec!["optionA", "--opt2", "x"].as_slice()).unwrap();
/// assert_eq!(namespace.get_str("command"), Some("optionA"));
/// assert_eq!(namespace.get_int("shared_option1"), Some(12345));
/// assert_eq!(namespace.get_str("opt2"), Some("x"));
/// assert!(!namespace.contains("another_setting"));
/// ```
pub fn add_subparsers<N, F>(commands: impl IntoIterator<Item = (N, F)>) -> SubparserSet
where
    N: Into<String>,
    F: Fragment + 'static,
{
    SubparserSet {
        commands: commands
            .into_iter()
            .map(|(name, fragment)| (name.into(), fragment.boxed()))
            .collect(),
        dest: None,
        help: None,
        abouts: BTreeMap::default(),
    }
}

impl SubparserSet {
    /// Store the selected sub-command's name under `dest`.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest.replace(dest.into());
        self
    }

    /// Document the sub-commands as a whole.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help.replace(help.into());
        self
    }

    /// Document the sub-command `name`.
    pub fn about(mut self, name: impl Into<String>, about: impl Into<String>) -> Self {
        self.abouts.insert(name.into(), about.into());
        self
    }
}

impl Fragment for SubparserSet {
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        if let Some(name) = self
            .abouts
            .keys()
            .find(|name| !self.commands.iter().any(|(command, _)| command == *name))
        {
            return Err(ConfigError::UnknownSubCommand(name.clone()));
        }

        let mut sub_commands = scope.add_subparsers(self.dest.clone(), self.help.clone())?;
        let mut ordered: Vec<&(String, Box<dyn Fragment>)> = self.commands.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, fragment) in ordered {
            let sub_command = sub_commands.add_parser(name.clone(), self.abouts.get(name).cloned())?;
            fragment.apply(&mut Scope::root(sub_command))?;
        }

        Ok(())
    }
}

/// A fragment from a closure over the scope.
pub struct Custom<F>(F);

/// Wrap the closure `f` as a fragment, for configuration the other fragments don't express.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, custom, CommandLineParser};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     custom(|scope| {
///         let mut section = scope.add_argument_group("generated", None);
///         for name in ["--a", "--b"] {
///             section.add_argument(&add_argument(name))?;
///         }
///         Ok(())
///     }),
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(vec!["--b", "2"].as_slice()).unwrap();
/// assert_eq!(namespace.get_str("b"), Some("2"));
/// ```
pub fn custom<F>(f: F) -> Custom<F>
where
    F: Fn(&mut Scope<'_>) -> Result<(), ConfigError>,
{
    Custom(f)
}

impl<F> Fragment for Custom<F>
where
    F: Fn(&mut Scope<'_>) -> Result<(), ConfigError>,
{
    fn apply(&self, scope: &mut Scope<'_>) -> Result<(), ConfigError> {
        (self.0)(scope)
    }
}

/// Apply the `fragments`, in order, to the root scope of the `parser`.
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, CommandLineParser};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program"),
///     argtools::fragments![add_argument("--a"), None::<argtools::SingleOption>],
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(vec!["--a", "1"].as_slice()).unwrap();
/// assert_eq!(namespace.get_str("a"), Some("1"));
/// ```
pub fn build_arg_parser(
    mut parser: CommandLineParser,
    fragments: impl Fragment,
) -> Result<CommandLineParser, ConfigError> {
    fragments.apply(&mut Scope::root(&mut parser))?;
    Ok(parser)
}

/// Build the parser now, handing it out later via [`ParserFactory::make`].
pub fn deferred_arg_parser(
    parser: CommandLineParser,
    fragments: impl Fragment,
) -> Result<ParserFactory, ConfigError> {
    Ok(ParserFactory {
        parser: build_arg_parser(parser, fragments)?,
    })
}

/// Hands out the configured parser.
#[derive(Debug, Clone)]
pub struct ParserFactory {
    parser: CommandLineParser,
}

impl ParserFactory {
    /// Make a parser (each call hands out an equivalent copy).
    pub fn make(&self) -> CommandLineParser {
        self.parser.clone()
    }
}
