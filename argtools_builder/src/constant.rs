pub(crate) const HELP_NAME: &str = "help";
pub(crate) const HELP_SHORT: char = 'h';
pub(crate) const HELP_MESSAGE: &str = "Show this help message and exit.";
pub(crate) const HELP_KEY: &str = "--help";

// Display name of the sub-command discriminator, when the sub-commands don't carry a `dest`.
pub(crate) const COMMAND_NAME: &str = "COMMAND";

pub(crate) const EXIT_HELP: i32 = 0;
pub(crate) const EXIT_ERROR: i32 = 1;
