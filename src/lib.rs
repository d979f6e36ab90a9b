//! `argtools` shares a standardized set of command line options within your codebase.
//!
//! Programs in the same codebase tend to accept many of the same options: a log level, a database url, an output format.
//! Declaring those options in every program invites drift between their names, defaults, and help messages.
//! `argtools` instead lets you declare each of them once, as a *fragment*, and compose fragments into parsers.
//! Specifically, `argtools` attempts to prioritize the following design concerns:
//! * *Composition over copying*:
//! A fragment is a plain value (an option, a group, a set of sub-commands) which any number of parsers may apply.
//! * *Adjustable sharing*:
//! A shared definition is a function returning a builder, so each program may tweak the attributes it cares about before applying it.
//! * *Environment backed defaults*:
//! Any option may take its default from an environment variable, via [`EnvDefault`].
//! * *Fail fast configuration*:
//! Invalid or conflicting definitions are reported as a [`ConfigError`] when the parser is built, not when it is used.
//!
//! # Usage
//! More examples are outlined in the `demos/` directory of the repository.
//!
//! Declare the shared fragments:
//! ```
//! use argtools::{add_argument, group, Action, Group, SingleOption};
//!
//! pub fn opt1() -> SingleOption {
//!     add_argument("--shared_option1").default(12345)
//! }
//!
//! pub fn optgroup1() -> Group {
//!     group(
//!         "optgroup1",
//!         argtools::fragments![
//!             add_argument("--some_setting").action(Action::StoreTrue),
//!             add_argument("--another_setting").default(5),
//!         ],
//!     )
//!     .description("a group of options")
//! }
//! ```
//!
//! And compose them into a program:
//! ```
//! # use argtools::{add_argument, group, Action, Group, SingleOption};
//! # fn opt1() -> SingleOption { add_argument("--shared_option1").default(12345) }
//! # fn optgroup1() -> Group {
//! #     group("optgroup1", argtools::fragments![
//! #         add_argument("--some_setting").action(Action::StoreTrue),
//! #         add_argument("--another_setting").default(5),
//! #     ])
//! # }
//! use argtools::{build_arg_parser, CommandLineParser, EnvDefault, Environment};
//!
//! let parser = build_arg_parser(
//!     CommandLineParser::new("runthis")
//!         .about("An example program that uses shared arguments.")
//!         .environment(Environment::from([("MYVAR_FENV", "11")])),
//!     argtools::fragments![
//!         opt1(),
//!         optgroup1(),
//!         add_argument("--custom_arg").default(1),
//!         add_argument("--fenv").env(EnvDefault::new().prefix("MYVAR_")),
//!     ],
//! )
//! .expect("Invalid argument parser configuration");
//!
//! let namespace = parser.parse_tokens(vec!["--some_setting"].as_slice()).unwrap();
//! assert_eq!(namespace.get_int("shared_option1"), Some(12345));
//! assert_eq!(namespace.get_bool("some_setting"), Some(true));
//! assert_eq!(namespace.get_int("another_setting"), Some(5));
//! assert_eq!(namespace.get_str("fenv"), Some("11"));
//! ```
//!
//! Which generates the Cli program:
//! ```console
//! $ runthis -h
//! usage: runthis [-h] [--shared_option1 SHARED_OPTION1] [--some_setting] [--another_setting ANOTHER_SETTING] [--custom_arg CUSTOM_ARG] [--fenv MYVAR_FENV]
//!
//! An example program that uses shared arguments.
//! ...
//!
//! $ runthis --bogus
//! Parse error: Option '--bogus' does not exist.
//! --bogus
//! ^
//! ```
//!
//! # Fragments
//! Configure `argtools` by starting with a [`CommandLineParser`] and applying [`Fragment`]s via [`build_arg_parser`].
//! The fragments are applied in order, each registering its definitions into the parser's root scope.
//! * [`add_argument`]: a single option (`--name`, `-n`) or positional argument (`name`).
//! * [`group`]: a titled section of the help message, optionally mutually exclusive.
//! * [`mutually_exclusive`]: an untitled set of options, of which at most one may be specified.
//! * [`add_subparsers`]: a set of named sub-commands, each with its own scope of fragments.
//! * [`custom`]: any closure over the [`Scope`], for configuration the other fragments don't cover.
//!
//! A list of fragments (see [`fragments!`]), a boxed fragment, and an optional fragment are all fragments too.
//! `None` fragments are skipped, which lets a program conditionally include shared definitions.
//!
//! Construction fails fast: the first fragment to fail aborts the build with its [`ConfigError`].
//!
//! # Environment Defaults
//! An option configured with [`SingleOption::env`] takes its default from the environment variable `uppercase(prefix + dest)`.
//! * When the variable is set, its value replaces any hardcoded default, and the option is no longer required.
//! * When the variable is absent, the hardcoded default (if any) applies.
//! * When the variable is absent but [`EnvDefault::required`], the build fails with [`ConfigError::EnvironmentVarRequired`].
//! * When [`EnvDefault::strict`], an option with both a hardcoded default and a set variable fails with [`ConfigError::TooManyDefaultsDefined`].
//!
//! Switch actions (ex: [`Action::StoreTrue`]) accept an optional value when environment backed.
//! The variable is then read as a boolean: empty is false while anything else (even `0` or `false`) is true.
//!
//! The environment is captured when the [`CommandLineParser`] is created.
//! Use [`CommandLineParser::environment`] to supply a specific snapshot instead (ex: in tests).
//!
//! # Sub-commands
//! [`add_subparsers`] configures a set of sub-commands, at most once per parser.
//! The sub-command is a required positional, matched after all the other positionals of its parent.
//! Those positionals must take a fixed number of values, otherwise the build fails with [`ConfigError::VariablePositionalBeforeSubCommands`].
//! Each sub-command parses the remaining tokens in its own scope, so its options are only available after its name.
//! The resulting [`Namespace`] merges the parent's values with the selected sub-command's values.
//! ```console
//! $ subparsers optionA --opt2 x
//! {'command': 'optionA', 'opt2': 'x', 'shared_option1': 12345}
//! ```
//!
//! # Features
//! * `tracing_debug`: Emit debug logs via [`tracing`](https://docs.rs/tracing) while building and parsing.
pub use argtools_builder::*;
