mod capture;
mod core;
mod fragment;
mod option;
mod parameter;

pub use self::core::{CommandLineParser, Scope, SubCommandScope};
pub use capture::*;
pub use fragment::*;
pub use option::*;
pub(crate) use parameter::*;
