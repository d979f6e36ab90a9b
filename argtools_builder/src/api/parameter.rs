use crate::api::{Action, ValueType};
use crate::matcher::{ArgumentConfig, Bound, OptionConfig};
use crate::model::{Nargs, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParameterClass {
    Opt {
        long: Option<String>,
        short: Option<char>,
    },
    Arg,
}

/// An option definition, as registered onto a parser.
/// Every attribute is resolved (environment defaults, metavar, effective nargs).
#[derive(Clone)]
pub(crate) struct Parameter {
    pub(crate) class: ParameterClass,
    pub(crate) dest: String,
    pub(crate) action: Action,
    pub(crate) nargs: Nargs,
    pub(crate) default: Option<Value>,
    pub(crate) constant: Option<Value>,
    pub(crate) required: bool,
    pub(crate) value_type: ValueType,
    pub(crate) metavar: String,
    pub(crate) help: Option<String>,
    pub(crate) choices: Vec<String>,
    pub(crate) meta: Option<Vec<String>>,
    pub(crate) section: Option<usize>,
    pub(crate) exclusion: Option<usize>,
}

impl Parameter {
    pub(crate) fn is_positional(&self) -> bool {
        matches!(self.class, ParameterClass::Arg)
    }

    pub(crate) fn long(&self) -> Option<&str> {
        match &self.class {
            ParameterClass::Opt { long, .. } => long.as_deref(),
            ParameterClass::Arg => None,
        }
    }

    pub(crate) fn short(&self) -> Option<char> {
        match &self.class {
            ParameterClass::Opt { short, .. } => *short,
            ParameterClass::Arg => None,
        }
    }

    /// The name used to refer to this parameter in error messages.
    pub(crate) fn label(&self) -> String {
        match (&self.class, self.long(), self.short()) {
            (ParameterClass::Arg, _, _) => self.metavar.clone(),
            (_, Some(long), _) => format!("--{long}"),
            (_, None, Some(short)) => format!("-{short}"),
            (_, None, None) => self.dest.clone(),
        }
    }

    /// The value grammar, ex: `M`, `[M]`, `[M ...]`, `M [...]`.
    pub(crate) fn grammar(&self) -> String {
        let metavar = &self.metavar;

        match self.nargs {
            Nargs::Precisely(n) => (0..n)
                .map(|_| metavar.clone())
                .collect::<Vec<String>>()
                .join(" "),
            Nargs::ZeroOrOne => format!("[{metavar}]"),
            Nargs::Any => format!("[{metavar} ...]"),
            Nargs::AtLeastOne => format!("{metavar} [...]"),
        }
    }

    /// The usage form of the parameter, ex: `-f FLAG`, `--flag`, `SRC`.
    pub(crate) fn usage(&self) -> String {
        let grammar = self.grammar();

        match &self.class {
            ParameterClass::Arg => grammar,
            ParameterClass::Opt { long, short } => {
                let flag = match (short, long) {
                    (Some(s), _) => format!("-{s}"),
                    (None, Some(l)) => format!("--{l}"),
                    (None, None) => self.dest.clone(),
                };

                if grammar.is_empty() {
                    flag
                } else {
                    format!("{flag} {grammar}")
                }
            }
        }
    }

    /// The help listing form of the parameter, ex: `-f FLAG, --flag FLAG`.
    pub(crate) fn flags(&self) -> String {
        let grammar = self.grammar();
        let with_grammar = |flag: String| {
            if grammar.is_empty() {
                flag
            } else {
                format!("{flag} {grammar}")
            }
        };

        match &self.class {
            ParameterClass::Arg => grammar.clone(),
            ParameterClass::Opt { long, short } => {
                let mut flags = Vec::default();

                if let Some(s) = short {
                    flags.push(with_grammar(format!("-{s}")));
                }

                if let Some(l) = long {
                    flags.push(with_grammar(format!("--{l}")));
                }

                flags.join(", ")
            }
        }
    }

    pub(crate) fn option_config(&self) -> Option<OptionConfig> {
        match &self.class {
            ParameterClass::Opt { long, short } => Some(OptionConfig::new(
                self.dest.clone(),
                long.clone(),
                *short,
                Bound::from(self.nargs),
            )),
            ParameterClass::Arg => None,
        }
    }

    pub(crate) fn argument_config(&self) -> Option<ArgumentConfig> {
        match &self.class {
            ParameterClass::Opt { .. } => None,
            ParameterClass::Arg => Some(ArgumentConfig::new(
                self.dest.clone(),
                Bound::from(self.nargs),
            )),
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let class = match &self.class {
            ParameterClass::Opt { .. } => "Opt",
            ParameterClass::Arg => "Arg",
        };
        let help = match &self.help {
            Some(h) => format!(", {h}"),
            None => String::default(),
        };

        write!(
            f,
            "{class}[{t:?}, {a}, {nargs}, {label}, dest={d}{help}]",
            t = self.value_type,
            a = self.action.name(),
            nargs = self.nargs,
            label = self.label(),
            d = self.dest,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::test::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Nargs::Precisely(0), "")]
    #[case(Nargs::Precisely(1), "ITEM")]
    #[case(Nargs::Precisely(2), "ITEM ITEM")]
    #[case(Nargs::ZeroOrOne, "[ITEM]")]
    #[case(Nargs::Any, "[ITEM ...]")]
    #[case(Nargs::AtLeastOne, "ITEM [...]")]
    fn grammar(#[case] nargs: Nargs, #[case] expected: &str) {
        assert_eq!(option("item", nargs).grammar(), expected);
    }

    #[test]
    fn flags() {
        let mut parameter = option("flag", Nargs::Precisely(1));
        assert_eq!(parameter.flags(), "--flag FLAG");
        assert_eq!(parameter.usage(), "--flag FLAG");
        assert_eq!(parameter.label(), "--flag");

        parameter.class = ParameterClass::Opt {
            long: Some("flag".to_string()),
            short: Some('f'),
        };
        assert_eq!(parameter.flags(), "-f FLAG, --flag FLAG");
        assert_eq!(parameter.usage(), "-f FLAG");

        parameter.nargs = Nargs::Precisely(0);
        assert_eq!(parameter.flags(), "-f, --flag");
        assert_eq!(parameter.usage(), "-f");
    }

    #[test]
    fn flags_argument() {
        let parameter = argument("src", Nargs::AtLeastOne);
        assert_eq!(parameter.flags(), "src [...]");
        assert_eq!(parameter.usage(), "src [...]");
        assert_eq!(parameter.label(), "src");
        assert!(parameter.option_config().is_none());
        assert_eq!(
            parameter.argument_config().unwrap().bound(),
            Bound::Lower(1)
        );
    }

    #[test]
    fn debug() {
        let mut parameter = option("super-flag", Nargs::ZeroOrOne);
        parameter.help = Some("message".to_string());
        assert_eq!(
            format!("{parameter:?}"),
            "Opt[ValueType[str], store, ZeroOrOne, --super-flag, dest=super_flag, message]"
        );
    }
}
