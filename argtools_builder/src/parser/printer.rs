use std::collections::HashSet;
use terminal_size::{terminal_size, Width};

use crate::api::{Action, CommandLineParser, Parameter};
use crate::constant::*;
use crate::model::Value;
use crate::parser::interface::{UserInterface, MINIMUM_MIDDLE_WIDTH};
use crate::parser::ColumnRenderer;

const PADDING_WIDTH: usize = 3;
const MAIN_INDENT: usize = 1;
const CHOICE_INDENT: usize = 2;

struct Row {
    left: String,
    middle: String,
    rights: Vec<String>,
}

impl Row {
    fn new(left: impl Into<String>, middle: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            middle: middle.into(),
            rights: Vec::default(),
        }
    }

    fn parameter(parameter: &Parameter) -> Self {
        let mut middle = String::default();

        if !parameter.choices.is_empty() {
            middle.push_str(&format!("{{{}}} ", parameter.choices.join(", ")));
        }

        if let Some(help) = &parameter.help {
            middle.push_str(help);

            if let Some(default) = documented_default(parameter) {
                middle.push_str(&format!(" (default: {default})"));
            }
        }

        Self {
            left: parameter.flags(),
            middle: middle.trim_end().to_string(),
            rights: parameter.meta.clone().unwrap_or_default(),
        }
    }
}

struct Block {
    title: String,
    description: Option<String>,
    rows: Vec<Row>,
}

/// Prints the help message of a single parser (sub-commands print their own).
pub(crate) struct Printer {
    program: String,
    about: Option<String>,
    usage: String,
    blocks: Vec<Block>,
    terminal_width: Option<usize>,
}

impl Printer {
    pub(crate) fn terminal(command: &CommandLineParser) -> Self {
        let terminal_width = terminal_size().map(|(Width(width), _)| width as usize);
        Self::new(command, terminal_width)
    }

    pub(crate) fn new(command: &CommandLineParser, terminal_width: Option<usize>) -> Self {
        let mut positionals = Vec::default();
        let mut options = vec![Row::new(
            format!("-{HELP_SHORT}, --{HELP_NAME}"),
            HELP_MESSAGE,
        )];
        let mut sections: Vec<Block> = command
            .sections
            .iter()
            .map(|section| Block {
                title: section.title.clone(),
                description: section.description.clone(),
                rows: Vec::default(),
            })
            .collect();

        for parameter in &command.parameters {
            let row = Row::parameter(parameter);

            match parameter.section.and_then(|i| sections.get_mut(i)) {
                Some(block) => block.rows.push(row),
                None if parameter.is_positional() => positionals.push(row),
                None => options.push(row),
            }
        }

        if let Some(sub_commands) = &command.sub_commands {
            positionals.push(Row::new(
                sub_commands.key(),
                sub_commands.help.clone().unwrap_or_default(),
            ));

            for (name, sub_command) in &sub_commands.commands {
                positionals.push(Row::new(
                    format!("{:CHOICE_INDENT$}{name}", ""),
                    sub_command.about.clone().unwrap_or_default(),
                ));
            }
        }

        let mut blocks = Vec::default();

        if !positionals.is_empty() {
            blocks.push(Block {
                title: "positional arguments".to_string(),
                description: None,
                rows: positionals,
            });
        }

        blocks.push(Block {
            title: "options".to_string(),
            description: None,
            rows: options,
        });
        blocks.extend(
            sections
                .into_iter()
                .filter(|block| !block.rows.is_empty() || block.description.is_some()),
        );

        Self {
            program: command.program.clone(),
            about: command.about.clone(),
            usage: usage(command),
            blocks,
            terminal_width,
        }
    }

    pub(crate) fn print_help(&self, user_interface: &(impl UserInterface + ?Sized)) {
        let column_renderer = self.column_renderer();

        user_interface.print(format!(
            "usage: {p} {u}",
            p = self.program,
            u = self.usage
        ));

        if let Some(about) = &self.about {
            user_interface.print(String::default());
            user_interface.print(about.clone());
        }

        for Block {
            title,
            description,
            rows,
        } in &self.blocks
        {
            user_interface.print(String::default());
            user_interface.print(format!("{title}:"));

            if let Some(description) = description {
                user_interface.print(format!("{:MAIN_INDENT$}{description}", ""));
            }

            for row in rows {
                for line in column_renderer.render(MAIN_INDENT, &row.left, &row.middle, &row.rights)
                {
                    user_interface.print(line);
                }
            }
        }
    }

    fn column_renderer(&self) -> ColumnRenderer {
        let rows = || self.blocks.iter().flat_map(|block| block.rows.iter());
        let left = rows().map(|row| row.left.len()).max().unwrap_or_default();
        let middle = rows().map(|row| row.middle.len()).max().unwrap_or_default() + MAIN_INDENT;
        let mut rights: Vec<usize> = Vec::default();

        for row in rows() {
            for (i, right) in row.rights.iter().enumerate() {
                let width = std::cmp::max(1, right.len());

                match rights.get_mut(i) {
                    Some(current) => *current = std::cmp::max(*current, width),
                    None => rights.push(width),
                }
            }
        }

        match self.terminal_width {
            Some(total) => ColumnRenderer::guided(PADDING_WIDTH, left, middle, rights, total),
            None => ColumnRenderer::new(
                PADDING_WIDTH,
                left,
                std::cmp::min(middle, MINIMUM_MIDDLE_WIDTH),
                rights,
            ),
        }
    }
}

// Switches always carry a default, which says nothing the flag doesn't.
fn documented_default(parameter: &Parameter) -> Option<&Value> {
    match parameter.action {
        Action::StoreTrue | Action::StoreFalse => None,
        _ => parameter.default.as_ref(),
    }
}

fn usage(command: &CommandLineParser) -> String {
    let mut summary = vec![format!("[-{HELP_SHORT}]")];
    let mut exclusions_seen = HashSet::new();

    for parameter in command.parameters.iter().filter(|p| !p.is_positional()) {
        match parameter.exclusion {
            Some(index) => {
                if !exclusions_seen.insert(index) {
                    continue;
                }

                let members: Vec<String> = command
                    .parameters
                    .iter()
                    .filter(|p| p.exclusion == Some(index))
                    .map(Parameter::usage)
                    .collect();
                let required = command
                    .exclusions
                    .get(index)
                    .map_or(false, |exclusion| exclusion.required);

                if required {
                    summary.push(format!("({})", members.join(" | ")));
                } else {
                    summary.push(format!("[{}]", members.join(" | ")));
                }
            }
            None if parameter.required => summary.push(parameter.usage()),
            None => summary.push(format!("[{}]", parameter.usage())),
        }
    }

    summary.extend(
        command
            .parameters
            .iter()
            .filter(|p| p.is_positional())
            .map(Parameter::usage),
    );

    if let Some(sub_commands) = &command.sub_commands {
        summary.push(format!("{} ...", sub_commands.key()));
    }

    summary.join(" ")
}

/// Points at the `offset` within the command line tokens.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ErrorContext {
    offset: usize,
    tokens: Vec<String>,
}

impl ErrorContext {
    pub(crate) fn new(offset: usize, tokens: &[&str]) -> Self {
        Self {
            offset,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Offsets count the token characters only, while the projection joins tokens with a space.
        let total: usize = self.tokens.iter().map(String::len).sum();
        let mut consumed = 0;
        let spaces = self
            .tokens
            .iter()
            .take(self.tokens.len().saturating_sub(1))
            .filter(|token| {
                consumed += token.len();
                consumed <= self.offset
            })
            .count();
        let caret = std::cmp::min(self.offset, total.saturating_sub(1)) + spaces;

        write!(f, "{}\n{:caret$}^", self.tokens.join(" "), "")
    }
}
