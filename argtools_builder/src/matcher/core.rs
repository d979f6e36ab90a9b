use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use crate::matcher::api::*;
use crate::matcher::model::*;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

const TERMINATOR: &str = "--";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TokenMatcherError {
    #[error("Cannot duplicate the option '--{0}'.")]
    DuplicateOption(String),

    #[error("Cannot duplicate the short option '-{0}'.")]
    DuplicateShortOption(char),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum MatchError {
    #[error("Not enough tokens provided to parameter '{0}'.")]
    Undercomplete(String),

    #[error("Too many tokens provided to parameter '{0}'.")]
    Overcomplete(String),

    #[error("No more arguments to match against.")]
    ArgumentsExhausted,

    #[error("Option '--{0}' does not exist.")]
    InvalidOption(String),

    #[error("Short option '-{0}' does not exist.")]
    InvalidShortOption(char),
}

/// Aligns raw command line tokens to the options and positional arguments of a single scope.
///
/// Options may appear any number of times; each occurrence produces its own `MatchTokens`.
/// Everything after a standalone `--` is matched to the positional arguments.
#[derive(Debug)]
pub(crate) struct TokenMatcher {
    option_keys: HashSet<String>,
    long_options: HashMap<String, (String, Bound)>,
    short_options: HashMap<char, (String, Bound)>,
    labels: HashMap<String, String>,
    arguments: VecDeque<ArgumentConfig>,
    fed: usize,
    matches: Vec<MatchTokens>,
    buffer: Option<MatchBuffer>,
    terminated: bool,
}

impl TokenMatcher {
    pub(crate) fn new(
        options: Vec<OptionConfig>,
        arguments: VecDeque<ArgumentConfig>,
    ) -> Result<Self, TokenMatcherError> {
        let mut option_keys = HashSet::default();
        let mut long_options = HashMap::default();
        let mut short_options = HashMap::default();
        let mut labels = HashMap::default();

        for option_config in options.into_iter() {
            let key = option_config.key().to_string();
            let entry = (key.clone(), option_config.bound());

            if let Some(long) = option_config.long() {
                if long_options.insert(long.to_string(), entry.clone()).is_some() {
                    return Err(TokenMatcherError::DuplicateOption(long.to_string()));
                }
            }

            if let Some(short) = option_config.short() {
                if short_options.insert(short, entry).is_some() {
                    return Err(TokenMatcherError::DuplicateShortOption(short));
                }
            }

            let label = match (option_config.long(), option_config.short()) {
                (Some(long), _) => format!("--{long}"),
                (None, Some(short)) => format!("-{short}"),
                (None, None) => key.clone(),
            };
            labels.insert(key.clone(), label);
            option_keys.insert(key);
        }

        for argument_config in &arguments {
            labels.insert(
                argument_config.key().to_string(),
                argument_config.key().to_string(),
            );
        }

        Ok(Self {
            option_keys,
            long_options,
            short_options,
            labels,
            arguments,
            fed: 0,
            matches: Vec::default(),
            buffer: None,
            terminated: false,
        })
    }

    pub(crate) fn feed(&mut self, token: &str) -> Result<(), MatchError> {
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Feeding token '{token}' at offset {}.", self.fed);
        }

        // 1. After the terminator, every token is an argument.
        // 2. Find a 'long' flag, such as:
        //  --initial
        //  --initial ..
        //  --initial=..
        // 3. Find 'short' flag(s), such as (both -i and -v are example short flags):
        //  -i
        //  -i ..
        //  -i=..
        //  -iv
        //  -iv ..
        //  -iv=..
        // 4. Match against an argument (including '-' and negative numbers).
        let result = if self.terminated {
            self.match_argument(token)
        } else if token == TERMINATOR {
            self.terminated = true;
            self.close_option_buffer()
        } else if let Some(flag) = token.strip_prefix("--") {
            self.match_option(split_equals_delimiter(flag))
        } else if token.len() > 1 && token.starts_with('-') && !self.is_negative_number(token) {
            self.match_option_short(split_equals_delimiter(&token[1..]))
        } else {
            self.match_argument(token)
        };

        self.fed += token.len();
        result
    }

    fn is_negative_number(&self, token: &str) -> bool {
        let digits = &token[1..];

        digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
            && digits.parse::<f64>().is_ok()
            && !self.short_options.keys().any(char::is_ascii_digit)
    }

    fn match_argument(&mut self, token: &str) -> Result<(), MatchError> {
        let mut match_buffer = match self.buffer.take() {
            Some(match_buffer) if match_buffer.is_open() => match_buffer,
            Some(match_buffer) => {
                // Flip to the next argument.
                let match_tokens = self.close_buffer(match_buffer)?;
                self.matches.push(match_tokens);
                self.next_argument()?
            }
            None => self.next_argument()?,
        };

        match_buffer.push(self.fed, token.to_string());
        self.buffer = Some(match_buffer);
        Ok(())
    }

    fn next_argument(&mut self) -> Result<MatchBuffer, MatchError> {
        match self.arguments.pop_front() {
            Some(argument_config) => Ok(MatchBuffer::new(
                argument_config.key(),
                self.fed,
                argument_config.bound(),
            )),
            None => Err(MatchError::ArgumentsExhausted),
        }
    }

    fn match_option(
        &mut self,
        (option_name, single_argument): (&str, Option<&str>),
    ) -> Result<(), MatchError> {
        let (key, bound) = self
            .long_options
            .get(option_name)
            .cloned()
            .ok_or_else(|| MatchError::InvalidOption(option_name.to_string()))?;
        self.update_buffer(None)?;
        let mut match_buffer = MatchBuffer::new(key, self.fed, bound);

        match single_argument {
            Some(value) => {
                // The 3 comes from the option specifier '--' and argument specifier '='.
                match_buffer.push(self.fed + option_name.len() + 3, value.to_string());

                // Options using k=v syntax cannot follow up with more values afterwards.
                let match_tokens = self.close_buffer(match_buffer)?;
                self.matches.push(match_tokens);
            }
            None => {
                self.buffer = Some(match_buffer);
            }
        };

        Ok(())
    }

    fn match_option_short(
        &mut self,
        (short_option_name, single_argument): (&str, Option<&str>),
    ) -> Result<(), MatchError> {
        let singles: Vec<char> = short_option_name.chars().collect();

        if singles.is_empty() {
            return Err(MatchError::InvalidOption(String::default()));
        }

        for (index, single) in singles.iter().enumerate() {
            let (key, bound) = self
                .short_options
                .get(single)
                .cloned()
                .ok_or(MatchError::InvalidShortOption(*single))?;
            self.update_buffer(None)?;
            let mut match_buffer = MatchBuffer::new(key, self.fed, bound);

            if index + 1 < singles.len() {
                // All characters in the head of the short option token must allow no values.
                let match_tokens = self.close_buffer(match_buffer)?;
                self.matches.push(match_tokens);
                continue;
            }

            // Only the final option may accept values.
            match single_argument {
                Some(value) => {
                    // The 2 comes from the short option specifier '-' and argument specifier '='.
                    match_buffer.push(
                        self.fed + short_option_name.len() + 2,
                        value.to_string(),
                    );
                    let match_tokens = self.close_buffer(match_buffer)?;
                    self.matches.push(match_tokens);
                }
                None => {
                    self.buffer = Some(match_buffer);
                }
            };
        }

        Ok(())
    }

    fn close_option_buffer(&mut self) -> Result<(), MatchError> {
        let is_option = self
            .buffer
            .as_ref()
            .map(|match_buffer| self.option_keys.contains(match_buffer.key()))
            .unwrap_or(false);

        if is_option {
            self.update_buffer(None)
        } else {
            Ok(())
        }
    }

    fn update_buffer(&mut self, next_buffer: Option<MatchBuffer>) -> Result<(), MatchError> {
        let previous_buffer = std::mem::replace(&mut self.buffer, next_buffer);

        if let Some(match_buffer) = previous_buffer {
            let match_tokens = self.close_buffer(match_buffer)?;
            self.matches.push(match_tokens);
        }

        Ok(())
    }

    fn close_buffer(&self, match_buffer: MatchBuffer) -> Result<MatchTokens, MatchError> {
        match_buffer.close().map_err(|error| self.match_error(error))
    }

    fn match_error(&self, error: CloseError) -> MatchError {
        let label = |key: String| self.labels.get(&key).cloned().unwrap_or(key);

        match error {
            CloseError::TooFewValues { key, .. } => MatchError::Undercomplete(label(key)),
            CloseError::TooManyValues { key, .. } => MatchError::Overcomplete(label(key)),
        }
    }

    pub(crate) fn can_close(&self) -> bool {
        if let Some(match_buffer) = &self.buffer {
            if !match_buffer.can_close() {
                return false;
            }
        }

        self.arguments.iter().all(|argument_config| {
            MatchBuffer::new(argument_config.key(), self.fed, argument_config.bound()).can_close()
        })
    }

    pub(crate) fn close(mut self) -> Result<Matches, (usize, MatchError, Matches)> {
        let mut close_error: Option<MatchError> = None;

        if let Some(match_buffer) = self.buffer.take() {
            match self.close_buffer(match_buffer) {
                Ok(match_tokens) => self.matches.push(match_tokens),
                Err(error) => close_error = Some(error),
            };
        }

        for argument_config in std::mem::take(&mut self.arguments) {
            let match_buffer =
                MatchBuffer::new(argument_config.key(), self.fed, argument_config.bound());

            match self.close_buffer(match_buffer) {
                Ok(match_tokens) => self.matches.push(match_tokens),
                Err(error) => {
                    // Only track the first error.
                    close_error.get_or_insert(error);
                }
            };
        }

        let matches = Matches {
            values: self.matches,
        };

        match close_error {
            Some(error) => Err((self.fed, error, matches)),
            None => Ok(matches),
        }
    }
}

fn split_equals_delimiter(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (token, None),
    }
}
