use crate::matcher::MatchTokens;
use crate::model::Nargs;

pub(crate) type OffsetValue = (usize, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Bound {
    Range(u8, u8),
    Lower(u8),
}

impl From<Nargs> for Bound {
    fn from(value: Nargs) -> Self {
        match value {
            Nargs::Precisely(n) => Bound::Range(n, n),
            Nargs::ZeroOrOne => Bound::Range(0, 1),
            Nargs::Any => Bound::Lower(0),
            Nargs::AtLeastOne => Bound::Lower(1),
        }
    }
}

#[cfg(test)]
impl rand::distributions::Distribution<Bound> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Bound {
        match rng.gen_range(0..2) {
            0 => {
                let upper: u8 = rng.gen();

                if upper == 0 {
                    Bound::Range(0, upper)
                } else {
                    Bound::Range(rng.gen_range(0..upper), upper)
                }
            }
            1 => Bound::Lower(rng.gen()),
            _ => unreachable!("internal error - impossible gen_range()"),
        }
    }
}

/// A positional parameter, as seen by the matcher.
#[derive(Debug, Clone)]
pub(crate) struct ArgumentConfig {
    key: String,
    bound: Bound,
}

impl ArgumentConfig {
    pub(crate) fn new(key: impl Into<String>, bound: Bound) -> Self {
        Self {
            key: key.into(),
            bound,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn bound(&self) -> Bound {
        self.bound
    }
}

/// A flagged parameter, as seen by the matcher.
/// At least one of `long` or `short` is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OptionConfig {
    key: String,
    long: Option<String>,
    short: Option<char>,
    bound: Bound,
}

impl OptionConfig {
    pub(crate) fn new(
        key: impl Into<String>,
        long: Option<String>,
        short: Option<char>,
        bound: Bound,
    ) -> Self {
        Self {
            key: key.into(),
            long,
            short,
            bound,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub(crate) fn short(&self) -> Option<char> {
        self.short
    }

    pub(crate) fn bound(&self) -> Bound {
        self.bound
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Matches {
    pub values: Vec<MatchTokens>,
}

impl Matches {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.values.iter().any(|mt| mt.key == key)
    }
}
