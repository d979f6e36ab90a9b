//! Traits which, typically, may be imported without concern: `use argtools::prelude::*`.

// Needs to be imported in order to call `Fragment::boxed` or `Fragment::apply`.
pub use crate::api::Fragment;
