mod base;
mod interface;
mod middleware;
mod printer;

pub use base::ConfigError;
pub(crate) use base::{Exclusion, ParseError};
pub(crate) use interface::{ColumnRenderer, ConsoleInterface, UserInterface};
pub(crate) use middleware::run;
pub(crate) use printer::ErrorContext;

#[cfg(test)]
pub(crate) use interface::util;
