use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::env;

use crate::api::{Parameter, SingleOption};
use crate::constant::*;
use crate::environment::Environment;
use crate::model::{Namespace, Nargs};
use crate::parser::{run, ConfigError, ConsoleInterface, Exclusion, UserInterface};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The base command line parser.
///
/// Options are registered by applying fragments (see [`build_arg_parser`](./fn.build_arg_parser.html)).
///
/// ### Example
/// ```
/// # use argtools_builder as argtools;
/// use argtools::{add_argument, build_arg_parser, CommandLineParser};
///
/// let parser = build_arg_parser(
///     CommandLineParser::new("program").about("My program that does awesome stuff."),
///     add_argument("--a").default(1),
/// )
/// .unwrap();
///
/// let namespace = parser.parse_tokens(vec!["--a", "2"].as_slice()).unwrap();
/// assert_eq!(namespace.get_str("a"), Some("2"));
/// ```
#[derive(Debug, Clone)]
pub struct CommandLineParser {
    pub(crate) program: String,
    pub(crate) about: Option<String>,
    pub(crate) environment: Environment,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) sections: Vec<Section>,
    pub(crate) exclusions: Vec<Exclusion>,
    pub(crate) sub_commands: Option<SubCommands>,
}

/// A named group of options, for help organization only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct SubCommands {
    pub(crate) dest: Option<String>,
    pub(crate) help: Option<String>,
    pub(crate) commands: BTreeMap<String, CommandLineParser>,
}

impl SubCommands {
    /// The discriminator key, ex: `{build,run}`.
    pub(crate) fn key(&self) -> String {
        let names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        format!("{{{}}}", names.join(","))
    }

    pub(crate) fn name(&self) -> String {
        match &self.dest {
            Some(dest) => dest.to_uppercase(),
            None => COMMAND_NAME.to_string(),
        }
    }
}

impl CommandLineParser {
    /// Create a command line parser.
    /// The process environment is captured at this point, for use by environment backed options.
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_environment(program, Environment::capture())
    }

    fn with_environment(program: impl Into<String>, environment: Environment) -> Self {
        Self {
            program: program.into(),
            about: None,
            environment,
            parameters: Vec::default(),
            sections: Vec::default(),
            exclusions: Vec::default(),
            sub_commands: None,
        }
    }

    /// Document the about message for this command line parser.
    /// If repeated, only the final about message will apply.
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.about.replace(description.into());
        self
    }

    /// Replace the environment snapshot that environment backed options resolve against.
    ///
    /// Resolution happens when an option is registered, so the environment must be set before fragments are applied.
    ///
    /// ### Example
    /// ```
    /// # use argtools_builder as argtools;
    /// use argtools::{add_argument, build_arg_parser, CommandLineParser, EnvDefault, Environment};
    ///
    /// let parser = build_arg_parser(
    ///     CommandLineParser::new("program").environment(Environment::from([("LEVEL", "3")])),
    ///     add_argument("--level").env(EnvDefault::new()),
    /// )
    /// .unwrap();
    ///
    /// let namespace = parser.parse_tokens(&[]).unwrap();
    /// assert_eq!(namespace.get_str("level"), Some("3"));
    /// ```
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub(crate) fn parse_tokens_with(
        &self,
        tokens: &[&str],
        user_interface: &(impl UserInterface + ?Sized),
    ) -> Result<Namespace, i32> {
        run(self, tokens, user_interface)
    }

    /// Run the command line parser against the input tokens.
    ///
    /// Parsing happens in two phases:
    /// 1. Token matching aligns the tokens to arguments and options.
    /// All tokens must be matched successfully in order to proceed to the next phase.
    /// 2. Token capturing coerces the tokens by their respective [`ValueType`](./enum.ValueType.html), and falls back to defaults.
    ///
    /// If at any point the parser encounters an error (ex: un-matched token, un-coercible token, etc), it will return with `Err(1)`.
    ///
    /// If the help switch (`-h` or `--help`) is encountered, the parser will display the help message and return with `Err(0)`.
    ///
    /// In the case of a sub-command based command line parser, this process is repeated: once for the root parser, and again for the selected sub-command.
    pub fn parse_tokens(&self, tokens: &[&str]) -> Result<Namespace, i32> {
        self.parse_tokens_with(tokens, &ConsoleInterface::default())
    }

    /// Run the command line parser against the Cli [`env::args`].
    ///
    /// On an error or help, exits with the respective code (via [`std::process::exit`]); see [`CommandLineParser::parse_tokens`].
    pub fn parse(&self) -> Namespace {
        let command_input: Vec<String> = env::args().skip(1).collect();

        match self.parse_tokens(
            command_input
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .as_slice(),
        ) {
            Ok(namespace) => namespace,
            Err(exit_code) => std::process::exit(exit_code),
        }
    }
}

/// The mutable view of a parser that fragments apply to.
///
/// A scope is either the parser itself, or a group within it.
/// Options registered into a group scope belong to the group's help section and/or mutual exclusion.
pub struct Scope<'p> {
    parser: &'p mut CommandLineParser,
    section: Option<usize>,
    exclusion: Option<usize>,
}

impl<'p> Scope<'p> {
    pub(crate) fn root(parser: &'p mut CommandLineParser) -> Self {
        Self {
            parser,
            section: None,
            exclusion: None,
        }
    }

    /// The environment snapshot of the underlying parser.
    pub fn environment(&self) -> &Environment {
        &self.parser.environment
    }

    /// Register a single option into this scope.
    pub fn add_argument(&mut self, option: &SingleOption) -> Result<(), ConfigError> {
        let mut parameter = option.register(&self.parser.environment)?;
        parameter.section = self.section;
        parameter.exclusion = self.exclusion;
        self.check(&parameter)?;

        if let Some(index) = self.exclusion {
            if let Some(exclusion) = self.parser.exclusions.get_mut(index) {
                exclusion.members.push(parameter.dest.clone());
            }
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Registered {parameter:?} onto '{p}'.", p = self.parser.program);
        }

        self.parser.parameters.push(parameter);
        Ok(())
    }

    fn check(&self, parameter: &Parameter) -> Result<(), ConfigError> {
        let existing = &self.parser.parameters;
        let sub_commands_dest = self
            .parser
            .sub_commands
            .as_ref()
            .and_then(|sub_commands| sub_commands.dest.as_deref());

        if existing.iter().any(|p| p.dest == parameter.dest)
            || sub_commands_dest == Some(parameter.dest.as_str())
        {
            return Err(ConfigError::DuplicateDestination(parameter.dest.clone()));
        }

        if let Some(long) = parameter.long() {
            if long == HELP_NAME || existing.iter().any(|p| p.long() == Some(long)) {
                return Err(ConfigError::DuplicateOption(long.to_string()));
            }
        }

        if let Some(short) = parameter.short() {
            if short == HELP_SHORT || existing.iter().any(|p| p.short() == Some(short)) {
                return Err(ConfigError::DuplicateShortOption(short));
            }
        }

        if self.parser.sub_commands.is_some() && is_variable_positional(parameter) {
            return Err(ConfigError::VariablePositionalBeforeSubCommands(
                parameter.dest.clone(),
            ));
        }

        if self.exclusion.is_some() {
            if parameter.is_positional() {
                return Err(ConfigError::ExclusivePositional(parameter.dest.clone()));
            }

            if parameter.required {
                return Err(ConfigError::ExclusiveRequired(parameter.dest.clone()));
            }
        }

        Ok(())
    }

    /// Open a named help section, returning its scope.
    pub fn add_argument_group(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Scope<'_> {
        self.parser.sections.push(Section {
            title: title.into(),
            description,
        });

        Scope {
            section: Some(self.parser.sections.len() - 1),
            exclusion: self.exclusion,
            parser: &mut *self.parser,
        }
    }

    /// Open a mutual exclusion, returning its scope.
    /// At most one of its members may be given; when `required`, precisely one must be.
    pub fn add_mutually_exclusive_group(&mut self, required: bool) -> Scope<'_> {
        self.parser.exclusions.push(Exclusion {
            required,
            members: Vec::default(),
        });

        Scope {
            section: self.section,
            exclusion: Some(self.parser.exclusions.len() - 1),
            parser: &mut *self.parser,
        }
    }

    /// Open the sub-command set of the parser.
    /// When `dest` is set, the selected sub-command's name is stored there.
    pub fn add_subparsers(
        &mut self,
        dest: Option<String>,
        help: Option<String>,
    ) -> Result<SubCommandScope<'_>, ConfigError> {
        if self.section.is_some() || self.exclusion.is_some() {
            return Err(ConfigError::SubCommandsInGroup);
        }

        if self.parser.sub_commands.is_some() {
            return Err(ConfigError::MultipleSubCommands);
        }

        if let Some(dest) = &dest {
            if self.parser.parameters.iter().any(|p| &p.dest == dest) {
                return Err(ConfigError::DuplicateDestination(dest.clone()));
            }
        }

        if let Some(parameter) = self.parser.parameters.iter().find(|p| is_variable_positional(p)) {
            return Err(ConfigError::VariablePositionalBeforeSubCommands(
                parameter.dest.clone(),
            ));
        }

        let program = self.parser.program.clone();
        let environment = self.parser.environment.clone();
        let sub_commands = self.parser.sub_commands.insert(SubCommands {
            dest,
            help,
            commands: BTreeMap::default(),
        });

        Ok(SubCommandScope {
            program,
            environment,
            sub_commands,
        })
    }
}

// The sub-command name is matched after the positionals, so only fixed arity positionals may come first.
fn is_variable_positional(parameter: &Parameter) -> bool {
    parameter.is_positional() && !matches!(parameter.nargs, Nargs::Precisely(_))
}

/// The sub-command set of a parser, where each sub-command is added as an independent parser.
pub struct SubCommandScope<'p> {
    program: String,
    environment: Environment,
    sub_commands: &'p mut SubCommands,
}

impl SubCommandScope<'_> {
    /// Add the sub-command `name`, returning its parser.
    /// The sub-command inherits the environment snapshot of its parent.
    pub fn add_parser(
        &mut self,
        name: impl Into<String>,
        about: Option<String>,
    ) -> Result<&mut CommandLineParser, ConfigError> {
        match self.sub_commands.commands.entry(name.into()) {
            Entry::Occupied(entry) => Err(ConfigError::DuplicateSubCommand(entry.key().clone())),
            Entry::Vacant(entry) => {
                let mut sub_command = CommandLineParser::with_environment(
                    format!("{p} {n}", p = self.program, n = entry.key()),
                    self.environment.clone(),
                );
                sub_command.about = about;
                Ok(entry.insert(sub_command))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{add_argument, Action};
    use crate::model::Value;
    use crate::parser::util::InMemoryInterface;
    use rstest::rstest;

    fn parser() -> CommandLineParser {
        CommandLineParser::new("program").environment(Environment::empty())
    }

    #[rstest]
    #[case(Nargs::Any)]
    #[case(Nargs::AtLeastOne)]
    #[case(Nargs::ZeroOrOne)]
    fn scope_variable_positional_sub_commands(#[case] nargs: Nargs) {
        let expected = Some(ConfigError::VariablePositionalBeforeSubCommands(
            "items".to_string(),
        ));

        // Positional first.
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);
        scope.add_argument(&add_argument("items").nargs(nargs)).unwrap();
        assert_eq!(scope.add_subparsers(None, None).err(), expected);

        // Sub-commands first.
        let mut parser = self::parser();
        let mut scope = Scope::root(&mut parser);
        scope.add_subparsers(None, None).unwrap();
        assert_eq!(
            scope.add_argument(&add_argument("items").nargs(nargs)).err(),
            expected
        );
    }

    #[test]
    fn scope_fixed_positional_sub_commands() {
        // Setup
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);
        scope
            .add_argument(&add_argument("pair").nargs(Nargs::Precisely(2)))
            .unwrap();

        // Execute
        let mut sub_commands = scope.add_subparsers(None, None).unwrap();
        sub_commands.add_parser("run", None).unwrap();

        // Verify
        let namespace = parser
            .parse_tokens_with(&["a", "b", "run"], &InMemoryInterface::default())
            .unwrap();
        assert_eq!(
            namespace.get("pair"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn scope_add_argument() {
        // Setup
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);

        // Execute
        scope.add_argument(&add_argument("--a")).unwrap();
        scope.add_argument(&add_argument("b")).unwrap();

        // Verify
        assert_eq!(parser.parameters.len(), 2);
        assert_eq!(parser.parameters[0].dest, "a");
        assert_eq!(parser.parameters[1].dest, "b");
        assert!(parser.parameters[1].is_positional());
    }

    #[test]
    fn scope_duplicates() {
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);
        scope
            .add_argument(&add_argument("--item").short('i'))
            .unwrap();

        assert_eq!(
            scope.add_argument(&add_argument("--other").dest("item")),
            Err(ConfigError::DuplicateDestination("item".to_string()))
        );
        assert_eq!(
            scope.add_argument(&add_argument("--item").dest("other")),
            Err(ConfigError::DuplicateOption("item".to_string()))
        );
        assert_eq!(
            scope.add_argument(&add_argument("--other").short('i')),
            Err(ConfigError::DuplicateShortOption('i'))
        );
        assert_eq!(
            scope.add_argument(&add_argument("--help")),
            Err(ConfigError::DuplicateOption("help".to_string()))
        );
        assert_eq!(
            scope.add_argument(&add_argument("-h")),
            Err(ConfigError::DuplicateShortOption('h'))
        );
        assert_eq!(parser.parameters.len(), 1);
    }

    #[test]
    fn scope_groups() {
        // Setup
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);

        // Execute
        {
            let mut section = scope.add_argument_group("Section", Some("Described.".to_string()));
            section.add_argument(&add_argument("--a")).unwrap();
            let mut exclusion = section.add_mutually_exclusive_group(true);
            exclusion.add_argument(&add_argument("--b")).unwrap();
            exclusion.add_argument(&add_argument("--c")).unwrap();
        }
        scope.add_argument(&add_argument("--d")).unwrap();

        // Verify
        let placement: Vec<(&str, Option<usize>, Option<usize>)> = parser
            .parameters
            .iter()
            .map(|p| (p.dest.as_str(), p.section, p.exclusion))
            .collect();
        assert_eq!(
            placement,
            vec![
                ("a", Some(0), None),
                ("b", Some(0), Some(0)),
                ("c", Some(0), Some(0)),
                ("d", None, None),
            ]
        );
        assert_eq!(
            parser.sections,
            vec![Section {
                title: "Section".to_string(),
                description: Some("Described.".to_string()),
            }]
        );
        assert_eq!(
            parser.exclusions,
            vec![Exclusion {
                required: true,
                members: vec!["b".to_string(), "c".to_string()],
            }]
        );
    }

    #[test]
    fn scope_exclusion_members() {
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);
        let mut exclusion = scope.add_mutually_exclusive_group(false);

        assert_eq!(
            exclusion.add_argument(&add_argument("src")),
            Err(ConfigError::ExclusivePositional("src".to_string()))
        );
        assert_eq!(
            exclusion.add_argument(&add_argument("--a").required(true)),
            Err(ConfigError::ExclusiveRequired("a".to_string()))
        );
    }

    #[test]
    fn scope_sub_commands() {
        // Setup
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);

        // Execute
        let mut sub_commands = scope
            .add_subparsers(Some("command".to_string()), None)
            .unwrap();
        sub_commands
            .add_parser("build", Some("Build it.".to_string()))
            .unwrap();
        let error = sub_commands.add_parser("build", None).unwrap_err();

        // Verify
        assert_eq!(error, ConfigError::DuplicateSubCommand("build".to_string()));
        assert_eq!(
            scope.add_subparsers(None, None).err(),
            Some(ConfigError::MultipleSubCommands)
        );
        assert_eq!(
            scope.add_argument(&add_argument("--command")),
            Err(ConfigError::DuplicateDestination("command".to_string()))
        );
        let sub_commands = parser.sub_commands.as_ref().unwrap();
        assert_eq!(sub_commands.key(), "{build}");
        assert_eq!(sub_commands.name(), "COMMAND");
        let build = &sub_commands.commands["build"];
        assert_eq!(build.program, "program build");
        assert_eq!(build.about.as_deref(), Some("Build it."));
    }

    #[test]
    fn scope_sub_commands_in_group() {
        let mut parser = parser();
        let mut scope = Scope::root(&mut parser);
        let mut section = scope.add_argument_group("Section", None);

        assert_eq!(
            section.add_subparsers(None, None).err(),
            Some(ConfigError::SubCommandsInGroup)
        );
    }

    #[test]
    fn sub_command_inherits_environment() {
        let mut parser = CommandLineParser::new("program").environment(Environment::from([("A", "1")]));
        let mut scope = Scope::root(&mut parser);
        let mut sub_commands = scope.add_subparsers(None, None).unwrap();

        let sub_command = sub_commands.add_parser("x", None).unwrap();

        assert_eq!(sub_command.environment.get("A"), Some("1"));
    }

    #[test]
    fn parse_tokens_with() {
        // Setup
        let mut parser = parser();
        Scope::root(&mut parser)
            .add_argument(&add_argument("--flag").action(Action::StoreTrue))
            .unwrap();
        let interface = InMemoryInterface::default();

        // Execute
        let namespace = parser.parse_tokens_with(&["--flag"], &interface).unwrap();

        // Verify
        assert_eq!(namespace.get("flag"), Some(&Value::Bool(true)));
        // The parser is reusable.
        let namespace = parser.parse_tokens_with(&[], &interface).unwrap();
        assert_eq!(namespace.get("flag"), Some(&Value::Bool(false)));
    }
}
