use crate::parser::{ErrorContext, ParseError};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

// Aim a little short of the terminal width, so the help never fills it edge to edge.
const TARGET_TOTAL_FACTOR: f64 = 0.95;

// Three average (5 letter) words with a space between each.
pub(crate) const MINIMUM_MIDDLE_WIDTH: usize = 17;

/// Lays out rows of `left | middle | right..` text, wrapping the middle column.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ColumnRenderer {
    padding: usize,
    left: usize,
    middle: usize,
    rights: Vec<usize>,
}

impl ColumnRenderer {
    /// A renderer with exactly the given widths.
    /// The middle column is at least 2 wide, so that words may be hyphenated.
    pub(crate) fn new(padding: usize, left: usize, middle: usize, rights: Vec<usize>) -> Self {
        Self {
            padding: std::cmp::max(padding, 1),
            left,
            middle: std::cmp::max(middle, 2),
            rights,
        }
    }

    /// A renderer that picks the middle width to fit the `total` width.
    pub(crate) fn guided(
        padding: usize,
        left: usize,
        middle: usize,
        rights: Vec<usize>,
        total: usize,
    ) -> Self {
        let fixed = left + padding + rights.iter().map(|right| right + padding).sum::<usize>();
        let target = (total as f64 * TARGET_TOTAL_FACTOR) as usize;
        let preferred = std::cmp::max(middle, MINIMUM_MIDDLE_WIDTH);

        let selected = if preferred + fixed <= target {
            preferred
        } else if fixed < total {
            std::cmp::min(
                preferred,
                std::cmp::max(total - fixed, MINIMUM_MIDDLE_WIDTH),
            )
        } else {
            MINIMUM_MIDDLE_WIDTH
        };

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Columns {fixed} within total {total} (target {target}).  Selecting middle: {selected}.");
        }

        Self::new(padding, left, selected, rights)
    }

    pub(crate) fn render(
        &self,
        indent: usize,
        left: &str,
        middle: &str,
        rights: &[String],
    ) -> Vec<String> {
        let padding = " ".repeat(self.padding);
        let left_width = self.left;
        let middle_width = std::cmp::max(self.middle.saturating_sub(indent), 2);
        let right = if rights.is_empty() {
            None
        } else {
            let cells: Vec<String> = rights
                .iter()
                .enumerate()
                .map(|(i, item)| match self.rights.get(i) {
                    Some(&width) if i + 1 < rights.len() => format!("{item:width$}"),
                    _ => item.clone(),
                })
                .collect();
            Some(cells.join(&padding))
        };

        let mut parts = chunk(middle, middle_width);

        if parts.is_empty() {
            parts.push(String::default());
        }

        parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let head = if i == 0 { left } else { "" };
                let line = match &right {
                    Some(right) if i == 0 => format!(
                        "{:indent$}{head:left_width$}{padding}{part:middle_width$}{padding}{right}",
                        ""
                    ),
                    _ => format!("{:indent$}{head:left_width$}{padding}{part}", ""),
                };
                line.trim_end().to_string()
            })
            .collect()
    }
}

/// Break the paragraph into lines no wider than `width`, hyphenating words that don't fit on their own.
fn chunk(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::default();
    let mut current = String::default();

    for word in paragraph.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 <= width {
            current.push(' ');
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        current = hyphenate(word, width, &mut lines);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Push the `width` sized (hyphenated) heads of `word` onto `lines`, returning the tail.
fn hyphenate(word: &str, width: usize, lines: &mut Vec<String>) -> String {
    let letters: Vec<char> = word.chars().collect();
    let step = width - 1;
    let mut start = 0;

    while letters.len() - start > width {
        let head: String = letters[start..start + step].iter().collect();
        lines.push(format!("{head}-"));
        start += step;
    }

    letters[start..].iter().collect()
}

pub(crate) trait UserInterface {
    fn print(&self, message: String);
    fn print_error(&self, error: ParseError);
    fn print_error_context(&self, error_context: ErrorContext);
}

#[derive(Default)]
pub(crate) struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        println!("{message}");
    }

    fn print_error(&self, error: ParseError) {
        eprintln!("{error}");
    }

    fn print_error_context(&self, error_context: ErrorContext) {
        eprintln!("{error_context}");
    }
}

#[cfg(test)]
pub(crate) mod util {
    use crate::parser::{ErrorContext, ParseError, UserInterface};
    use std::cell::RefCell;

    #[derive(Default)]
    pub(crate) struct InMemoryInterface {
        message: RefCell<Vec<String>>,
        error: RefCell<Option<String>>,
        error_context: RefCell<Option<ErrorContext>>,
    }

    impl UserInterface for InMemoryInterface {
        fn print(&self, message: String) {
            // Allows for print() to be called many times, concatenating the messages.
            self.message.borrow_mut().push(message);
        }

        fn print_error(&self, error: ParseError) {
            // Assumes print_error() is only ever called once.
            self.error.borrow_mut().replace(error.to_string());
        }

        fn print_error_context(&self, error_context: ErrorContext) {
            // Assumes print_error_context() is only ever called once.
            self.error_context.borrow_mut().replace(error_context);
        }
    }

    impl InMemoryInterface {
        pub(crate) fn consume(self) -> (Option<String>, Option<String>, Option<ErrorContext>) {
            let InMemoryInterface {
                message,
                error,
                error_context,
            } = self;
            let message = message.into_inner();

            (
                if message.is_empty() {
                    None
                } else {
                    Some(message.join("\n"))
                },
                error.into_inner(),
                error_context.into_inner(),
            )
        }

        pub(crate) fn consume_message(self) -> String {
            let (message, error, error_context) = self.consume();
            assert_eq!(error, None);
            assert_eq!(error_context, None);
            message.unwrap()
        }
    }
}
