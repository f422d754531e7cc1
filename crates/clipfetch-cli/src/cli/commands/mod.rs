//! CLI command handlers, one file per command.

mod check;
mod completions;
mod fetch;
mod install;
mod rules;

pub use check::run_check;
pub use completions::run_completions;
pub use fetch::{run_fetch, FetchArgs};
pub use install::run_install;
pub use rules::run_rules;
