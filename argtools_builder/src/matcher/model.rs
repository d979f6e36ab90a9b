use thiserror::Error;

use crate::matcher::api::*;

/// The tokens matched to a single occurrence of a parameter.
/// `offset` locates the occurrence itself (the flag, or the first value of a positional).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MatchTokens {
    pub key: String,
    pub offset: usize,
    pub values: Vec<OffsetValue>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(super) enum CloseError {
    #[error("too few values provided for '{key}' (provided={provided}, expected={expected}).")]
    TooFewValues {
        key: String,
        provided: usize,
        expected: u8,
    },

    #[error("too many values provided for '{key}' (provided={provided}, expected={expected}).")]
    TooManyValues {
        key: String,
        provided: usize,
        expected: u8,
    },
}

#[derive(Debug)]
pub(super) struct MatchBuffer {
    key: String,
    offset: usize,
    bound: Bound,
    values: Vec<OffsetValue>,
}

impl MatchBuffer {
    pub(super) fn new(key: impl Into<String>, offset: usize, bound: Bound) -> Self {
        Self {
            key: key.into(),
            offset,
            bound,
            values: Vec::default(),
        }
    }

    pub(super) fn key(&self) -> &str {
        &self.key
    }

    pub(super) fn push(&mut self, offset: usize, value: String) {
        self.values.push((offset, value));
    }

    pub(super) fn is_open(&self) -> bool {
        match self.bound {
            Bound::Range(_, upper) => self.values.len() < upper as usize,
            Bound::Lower(_) => true,
        }
    }

    pub(super) fn can_close(&self) -> bool {
        let lower = match self.bound {
            Bound::Range(lower, _) | Bound::Lower(lower) => lower,
        };
        self.values.len() >= lower as usize
    }

    pub(super) fn close(self) -> Result<MatchTokens, CloseError> {
        let provided = self.values.len();

        match self.bound {
            Bound::Lower(lower) | Bound::Range(lower, _) if provided < lower as usize => {
                return Err(CloseError::TooFewValues {
                    key: self.key,
                    provided,
                    expected: lower,
                });
            }
            Bound::Range(_, upper) if provided > upper as usize => {
                return Err(CloseError::TooManyValues {
                    key: self.key,
                    provided,
                    expected: upper,
                });
            }
            _ => {}
        };

        Ok(MatchTokens {
            key: self.key,
            offset: self.offset,
            values: self.values,
        })
    }
}
