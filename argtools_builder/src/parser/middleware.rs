use crate::api::CommandLineParser;
use crate::constant::*;
use crate::model::{Namespace, Value};
use crate::parser::base::*;
use crate::parser::interface::UserInterface;
use crate::parser::printer::Printer;
use crate::parser::ErrorContext;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

struct ParseUnit {
    parser: Parser,
    printer: Printer,
}

impl ParseUnit {
    fn build(command: &CommandLineParser) -> Result<Self, ConfigError> {
        let discriminator = command
            .sub_commands
            .as_ref()
            .map(|sub_commands| Discriminator {
                key: sub_commands.key(),
            });
        let parser = Parser::new(
            command.parameters.clone(),
            command.exclusions.clone(),
            discriminator,
        )?;

        Ok(Self {
            parser,
            printer: Printer::terminal(command),
        })
    }

    fn invoke(self, tokens: &[&str], user_interface: &(impl UserInterface + ?Sized)) -> ParseResult {
        let ParseUnit { parser, printer } = self;

        match parser.consume(tokens) {
            Ok(Outcome::Continue {
                namespace,
                discriminee,
                remaining,
            }) => match discriminee {
                Some((offset, variant)) => ParseResult::Incomplete {
                    namespace,
                    variant_offset: offset,
                    variant,
                    remaining,
                },
                None => ParseResult::Complete(namespace),
            },
            Ok(Outcome::PrintHelp) => {
                printer.print_help(user_interface);
                ParseResult::Exit(EXIT_HELP)
            }
            Err((offset, parse_error)) => {
                user_interface.print_error(parse_error);
                user_interface.print_error_context(ErrorContext::new(offset, tokens));
                ParseResult::Exit(EXIT_ERROR)
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum ParseResult {
    Complete(Namespace),
    Incomplete {
        namespace: Namespace,
        variant_offset: usize,
        variant: String,
        remaining: Vec<String>,
    },
    Exit(i32),
}

/// Parse the tokens against the `command`, descending into the selected sub-command (if any).
///
/// Errors and help are reported to the `user_interface`, returning the exit code.
pub(crate) fn run(
    command: &CommandLineParser,
    tokens: &[&str],
    user_interface: &(impl UserInterface + ?Sized),
) -> Result<Namespace, i32> {
    let parse_unit = match ParseUnit::build(command) {
        Ok(parse_unit) => parse_unit,
        Err(error) => {
            user_interface.print_error(ParseError(error.to_string()));
            return Err(EXIT_ERROR);
        }
    };

    match parse_unit.invoke(tokens, user_interface) {
        ParseResult::Complete(namespace) => Ok(namespace),
        ParseResult::Exit(code) => Err(code),
        ParseResult::Incomplete {
            mut namespace,
            variant_offset,
            variant,
            remaining,
        } => {
            let sub_commands = command
                .sub_commands
                .as_ref()
                .ok_or(EXIT_ERROR)?;

            match sub_commands.commands.get(&variant) {
                Some(sub_command) => {
                    #[cfg(feature = "tracing_debug")]
                    {
                        debug!("Descending into sub-command '{variant}' with {remaining:?}.");
                    }

                    let remaining: Vec<&str> = remaining.iter().map(AsRef::as_ref).collect();
                    let sub_namespace = run(sub_command, &remaining, user_interface)?;

                    if let Some(dest) = &sub_commands.dest {
                        namespace.insert(dest.clone(), Some(Value::Str(variant)));
                    }

                    namespace.extend(sub_namespace);
                    Ok(namespace)
                }
                None => {
                    user_interface.print_error(ParseError(format!(
                        "Unknown sub-command '{variant}' for parameter '{n}'.",
                        n = sub_commands.name()
                    )));
                    user_interface.print_error_context(ErrorContext::new(variant_offset, tokens));
                    Err(EXIT_ERROR)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::*;
    use crate::environment::Environment;
    use crate::parser::util::InMemoryInterface;
    use crate::test::assert_contains;
    use rstest::rstest;

    fn command() -> CommandLineParser {
        build_arg_parser(
            CommandLineParser::new("program").environment(Environment::empty()),
            crate::fragments![
                add_argument("--verbose").action(Action::StoreTrue),
                add_subparsers([
                    (
                        "build",
                        crate::fragments![
                            add_argument("--fast").action(Action::StoreTrue),
                            add_argument("target"),
                        ],
                    ),
                    ("run", crate::fragments![add_argument("--times").value_type(ValueType::Int)]),
                ])
                .dest("command"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn run_simple() {
        // Setup
        let command = build_arg_parser(
            CommandLineParser::new("program").environment(Environment::empty()),
            crate::fragments![
                add_argument("--verbose").action(Action::StoreTrue),
                add_argument("src"),
            ],
        )
        .unwrap();
        let interface = InMemoryInterface::default();

        // Execute
        let namespace = run(&command, &["src.txt", "--verbose"], &interface).unwrap();

        // Verify
        assert_eq!(
            namespace,
            Namespace::from([
                ("src", Some(Value::from("src.txt"))),
                ("verbose", Some(Value::from(true))),
            ])
        );
        assert_eq!(interface.consume(), (None, None, None));
    }

    #[rstest]
    #[case(vec!["build", "x"], false, "x")]
    #[case(vec!["--verbose", "build", "x", "--fast"], true, "x")]
    #[case(vec!["build", "--fast", "--", "--x"], false, "--x")]
    fn run_sub_command(
        #[case] tokens: Vec<&str>,
        #[case] verbose: bool,
        #[case] target: &str,
    ) {
        // Setup
        let command = command();
        let interface = InMemoryInterface::default();

        // Execute
        let namespace = run(&command, tokens.as_slice(), &interface).unwrap();

        // Verify
        assert_eq!(namespace.get_bool("verbose"), Some(verbose));
        assert_eq!(namespace.get_str("command"), Some("build"));
        assert_eq!(namespace.get_str("target"), Some(target));
        assert!(!namespace.contains("times"));
    }

    #[test]
    fn run_sub_command_values() {
        let command = command();
        let interface = InMemoryInterface::default();

        let namespace = run(&command, &["run", "--times", "3"], &interface).unwrap();

        assert_eq!(
            namespace,
            Namespace::from([
                ("command", Some(Value::from("run"))),
                ("times", Some(Value::from(3))),
                ("verbose", Some(Value::from(false))),
            ])
        );
    }

    #[rstest]
    #[case(vec!["-h"], "usage: program [-h] [--verbose] {build,run} ...")]
    #[case(vec!["--verbose", "--help"], "usage: program [-h] [--verbose] {build,run} ...")]
    #[case(vec!["build", "-h"], "usage: program build [-h] [--fast] target")]
    #[case(vec!["run", "--times", "x", "--help"], "usage: program run [-h] [--times TIMES]")]
    fn run_help(#[case] tokens: Vec<&str>, #[case] usage: &str) {
        // Setup
        let command = command();
        let interface = InMemoryInterface::default();

        // Execute
        let result = run(&command, tokens.as_slice(), &interface);

        // Verify
        assert_eq!(result, Err(EXIT_HELP));
        let message = interface.consume_message();
        assert_eq!(message.lines().next().unwrap(), usage);
    }

    #[rstest]
    #[case(vec![], 0, &[], "Not enough tokens provided to parameter '{build,run}'.")]
    #[case(vec!["--verbose", "--flag"], 9, &["--verbose", "--flag"], "Option '--flag' does not exist.")]
    #[case(vec!["run", "--times", "x"], 7, &["--times", "x"], "Invalid value for parameter '--times': 'x' cannot convert to int.")]
    #[case(vec!["build"], 0, &[], "Not enough tokens provided to parameter 'target'.")]
    fn run_error(
        #[case] tokens: Vec<&str>,
        #[case] offset: usize,
        #[case] context: &[&str],
        #[case] message: &str,
    ) {
        // Setup
        let command = command();
        let interface = InMemoryInterface::default();

        // Execute
        let result = run(&command, tokens.as_slice(), &interface);

        // Verify
        assert_eq!(result, Err(EXIT_ERROR));
        let (help, error, error_context) = interface.consume();
        assert_eq!(help, None);
        assert_eq!(error.unwrap(), format!("Parse error: {message}"));
        assert_eq!(error_context.unwrap(), ErrorContext::new(offset, context));
    }

    #[rstest]
    #[case(None, "COMMAND")]
    #[case(Some("action"), "ACTION")]
    fn run_unknown_sub_command(#[case] dest: Option<&str>, #[case] name: &str) {
        // Setup
        let mut sub_commands = add_subparsers([("build", crate::fragments![])]);

        if let Some(dest) = dest {
            sub_commands = sub_commands.dest(dest);
        }

        let command = build_arg_parser(
            CommandLineParser::new("program").environment(Environment::empty()),
            crate::fragments![add_argument("--verbose").action(Action::StoreTrue), sub_commands],
        )
        .unwrap();
        let interface = InMemoryInterface::default();

        // Execute
        let result = run(&command, &["--verbose", "deploy", "x"], &interface);

        // Verify
        assert_eq!(result, Err(EXIT_ERROR));
        let (_, error, error_context) = interface.consume();
        let error = error.unwrap();
        assert_contains!(
            error,
            &format!("Unknown sub-command 'deploy' for parameter '{name}'.")
        );
        assert_eq!(
            error_context.unwrap(),
            ErrorContext::new(9, &["--verbose", "deploy", "x"])
        );
    }

    #[test]
    fn run_nested_sub_commands() {
        // Setup
        let command = build_arg_parser(
            CommandLineParser::new("program").environment(Environment::empty()),
            add_subparsers([(
                "remote",
                add_subparsers([("add", add_argument("name"))]).dest("remote_command"),
            )])
            .dest("command"),
        )
        .unwrap();
        let interface = InMemoryInterface::default();

        // Execute
        let namespace = run(&command, &["remote", "add", "origin"], &interface).unwrap();

        // Verify
        assert_eq!(namespace.get_str("command"), Some("remote"));
        assert_eq!(namespace.get_str("remote_command"), Some("add"));
        assert_eq!(namespace.get_str("name"), Some("origin"));
    }
}
